//! Where a subtitle file ends up.
//!
//! A media-adjacent target is only chosen after the mapped directory passes a
//! write probe; everything else lands in the staging directory.

use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::config::PlacementConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveLocation {
    /// Next to the video, picked up by the catalog on rescan
    Media,
    /// Holding directory; needs manual placement
    Staging,
}

impl fmt::Display for SaveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Media => write!(f, "media"),
            Self::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    pub path: PathBuf,
    pub location: SaveLocation,
}

/// `<stem>.<tag>.srt` for a media path
pub fn subtitle_file_name(media_path: &str, language_tag: &str) -> String {
    let stem = Path::new(media_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}.{}.srt", stem, language_tag)
}

pub struct PathResolver {
    config: PlacementConfig,
}

impl PathResolver {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.config.staging_dir
    }

    /// Translate a catalog path into the local view by swapping the
    /// configured prefix. Paths outside the prefix pass through unchanged.
    pub fn map_path(&self, catalog_path: &str) -> String {
        let from = &self.config.source_prefix;
        let to = &self.config.destination_prefix;
        if from.is_empty() || to.is_empty() {
            return catalog_path.to_string();
        }

        match catalog_path.strip_prefix(from.as_str()) {
            Some(rest) => format!("{}{}", to, rest),
            None => catalog_path.to_string(),
        }
    }

    /// Decide where the subtitle for `media_path` should be written.
    pub async fn resolve(&self, media_path: &str, language_tag: &str) -> SaveTarget {
        let file_name = subtitle_file_name(media_path, language_tag);

        if self.config.direct_save {
            let mapped = self.map_path(media_path);
            let media_dir = Path::new(&mapped)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();

            if can_write_to_directory(&media_dir).await {
                let path = media_dir.join(&file_name);
                info!("Will save subtitle to media directory: {}", path.display());
                return SaveTarget { path, location: SaveLocation::Media };
            }
            warn!("Cannot write to media directory {}, falling back to staging", media_dir.display());
        }

        if let Err(e) = fs::create_dir_all(&self.config.staging_dir).await {
            warn!("Could not create staging directory {}: {}", self.config.staging_dir.display(), e);
        }

        let path = self.config.staging_dir.join(&file_name);
        info!("Will save subtitle to staging directory: {}", path.display());
        SaveTarget { path, location: SaveLocation::Staging }
    }
}

/// Create the directory if needed, then create and remove a marker file.
pub async fn can_write_to_directory(dir: &Path) -> bool {
    if dir.as_os_str().is_empty() {
        return false;
    }

    if fs::metadata(dir).await.is_err() {
        if let Err(e) = fs::create_dir_all(dir).await {
            warn!("Cannot create directory {}: {}", dir.display(), e);
            return false;
        }
    }

    let marker = dir.join(format!(".subhunter-write-test-{}", uuid::Uuid::new_v4()));
    match fs::File::create(&marker).await {
        Ok(file) => {
            drop(file);
            if let Err(e) = fs::remove_file(&marker).await {
                warn!("Failed to remove write probe {}: {}", marker.display(), e);
            }
            true
        }
        Err(e) => {
            warn!("Cannot write to directory {}: {}", dir.display(), e);
            false
        }
    }
}
