//! Decide which catalog items still need a target-language subtitle.

use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::{MediaItem, MediaKind, StreamKind};
use crate::placement::{subtitle_file_name, PathResolver};

/// Secondary signal: is there already a sidecar file for a language tag?
pub trait SidecarCheck: Send + Sync {
    fn sidecar_exists(&self, media_path: &str, language_tag: &str) -> bool;
}

/// Never reports a sidecar; only embedded streams count.
pub struct NoSidecarCheck;

impl SidecarCheck for NoSidecarCheck {
    fn sidecar_exists(&self, _media_path: &str, _language_tag: &str) -> bool {
        false
    }
}

/// Looks for `<basename>.<tag>.srt` beside the media, after prefix mapping.
pub struct FsSidecarCheck {
    resolver: PathResolver,
}

impl FsSidecarCheck {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }
}

impl SidecarCheck for FsSidecarCheck {
    fn sidecar_exists(&self, media_path: &str, language_tag: &str) -> bool {
        let mapped = self.resolver.map_path(media_path);
        match Path::new(&mapped).parent() {
            Some(dir) => dir.join(subtitle_file_name(media_path, language_tag)).is_file(),
            None => false,
        }
    }
}

pub struct DiscoveryFilter {
    target_tags: Vec<String>,
    sidecar: Box<dyn SidecarCheck>,
}

impl DiscoveryFilter {
    pub fn new(target_tags: Vec<String>, sidecar: Box<dyn SidecarCheck>) -> Self {
        Self { target_tags, sidecar }
    }

    fn is_target_tag(&self, tag: &str) -> bool {
        self.target_tags.iter().any(|t| t == tag)
    }

    /// True when an embedded (non-external) subtitle stream carries one of
    /// the target tags, or a sidecar file for one of them exists.
    pub fn has_target_subtitle(&self, item: &MediaItem) -> bool {
        let embedded = item.streams.iter().any(|s| {
            s.kind == StreamKind::Subtitle
                && !s.is_external
                && s.language.as_deref().is_some_and(|l| self.is_target_tag(l))
        });
        if embedded {
            return true;
        }

        match item.physical_path() {
            Some(path) => self.target_tags.iter().any(|tag| self.sidecar.sidecar_exists(path, tag)),
            None => false,
        }
    }

    /// Items lacking the target subtitle, in catalog order
    pub fn filter(&self, items: Vec<MediaItem>) -> Vec<MediaItem> {
        items.into_iter().filter(|item| !self.has_target_subtitle(item)).collect()
    }
}

/// Candidates arranged for display: series → season → episodes, plus movies.
#[derive(Debug, Default)]
pub struct CandidateListing {
    pub series: BTreeMap<String, BTreeMap<u32, Vec<MediaItem>>>,
    pub movies: Vec<MediaItem>,
}

pub fn group_candidates(items: Vec<MediaItem>) -> CandidateListing {
    let mut listing = CandidateListing::default();

    for item in items {
        if item.kind == MediaKind::Episode {
            let series = item
                .series_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown Series".to_string());
            let season = item.season_number.filter(|s| *s > 0).unwrap_or(1);

            listing.series.entry(series).or_default().entry(season).or_default().push(item);
        } else {
            listing.movies.push(item);
        }
    }

    for seasons in listing.series.values_mut() {
        for episodes in seasons.values_mut() {
            episodes.sort_by_key(|e| e.episode_number.unwrap_or(0));
        }
    }
    listing.movies.sort_by(|a, b| a.name.cmp(&b.name));

    listing
}

/// Heading for a season group: the catalog's season name when the episodes
/// carry one, else `Season N`.
pub fn season_label(season: u32, episodes: &[MediaItem]) -> String {
    episodes
        .iter()
        .filter_map(|e| e.season_name.as_deref())
        .find(|name| !name.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("Season {}", season))
}
