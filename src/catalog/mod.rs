// Media catalog access
//
// The catalog is the media server that knows which videos exist, where they
// live on disk and which streams they carry:
// - Jellyfin: REST client for Jellyfin/Emby compatible servers

pub mod jellyfin;

use async_trait::async_trait;

use crate::config::CatalogConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Episode,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

impl StreamKind {
    pub fn from_catalog(value: &str) -> Self {
        match value {
            "Video" => Self::Video,
            "Audio" => Self::Audio,
            "Subtitle" => Self::Subtitle,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub kind: StreamKind,
    pub language: Option<String>,
    /// Stream comes from a file outside the container
    pub is_external: bool,
}

/// One video asset as reported by the catalog. Built fresh per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    pub kind: MediaKind,
    /// Nominal path; may point at a container rather than the file itself
    pub path: Option<String>,
    /// Paths of the item's media sources, first one authoritative
    pub source_paths: Vec<String>,
    pub series_name: Option<String>,
    pub season_name: Option<String>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub production_year: Option<u32>,
    pub streams: Vec<StreamDescriptor>,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            path: None,
            source_paths: Vec::new(),
            series_name: None,
            season_name: None,
            season_number: None,
            episode_number: None,
            production_year: None,
            streams: Vec::new(),
        }
    }

    /// The file location to place subtitles against: the first media
    /// source path when present, otherwise the nominal path.
    pub fn physical_path(&self) -> Option<&str> {
        self.source_paths
            .first()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .or_else(|| self.path.as_deref().filter(|p| !p.is_empty()))
    }

    /// Query string the subtitle provider indexes by.
    ///
    /// Episodes: `"<series> S<ss>E<ee>"`. Movies: `"<name> <year>"`, or just
    /// the name when the year is unknown.
    pub fn search_query(&self) -> String {
        match self.kind {
            MediaKind::Episode => {
                if let Some(series) = self.series_name.as_deref().filter(|s| !s.is_empty()) {
                    return format!(
                        "{} S{:02}E{:02}",
                        series,
                        self.season_number.unwrap_or(0),
                        self.episode_number.unwrap_or(0)
                    );
                }
            }
            MediaKind::Movie => {
                if let Some(year) = self.production_year.filter(|y| *y > 0) {
                    return format!("{} {}", self.name, year);
                }
            }
            MediaKind::Other => {}
        }
        self.name.clone()
    }
}

/// Operations the acquisition pipeline needs from the catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// All movies and episodes, with paths and stream descriptors
    async fn list_items(&self) -> Result<Vec<MediaItem>>;

    /// A single item by identifier
    async fn get_item(&self, item_id: &str) -> Result<MediaItem>;

    /// Ask the catalog to rescan the item so new sidecar files show up
    async fn refresh_metadata(&self, item_id: &str) -> Result<()>;
}

/// Factory for creating catalog clients
pub struct CatalogFactory;

impl CatalogFactory {
    pub fn create_default(config: CatalogConfig) -> Result<Box<dyn CatalogService>> {
        Ok(Box::new(jellyfin::JellyfinClient::new(config)?))
    }
}
