// Subtitle provider access
//
// - OpenSubtitles: REST v1 client (search + two-step download)

pub mod opensubtitles;

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::error::Result;

/// A search hit. Only the file identifier can be used to download it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCandidate {
    pub id: String,
    pub file_id: Option<u64>,
    pub language: String,
    pub file_name: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtitleProvider: Send + Sync {
    /// Candidates for a release-title query in one language, in provider order
    async fn search(&self, query: &str, language: &str) -> Result<Vec<SubtitleCandidate>>;

    /// Raw subtitle file contents
    async fn download(&self, candidate: &SubtitleCandidate) -> Result<Vec<u8>>;
}

/// Factory for creating subtitle provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_default(config: ProviderConfig) -> Result<Box<dyn SubtitleProvider>> {
        Ok(Box::new(opensubtitles::OpenSubtitlesClient::new(config)?))
    }
}
