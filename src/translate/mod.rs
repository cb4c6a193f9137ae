// Translation architecture
//
// - TranslationBackend: opaque text-in/text-out service (Google gtx endpoint)
// - RetryingTranslator: per-entry translation with linear backoff that keeps
//   the original text when an entry cannot be translated

pub mod google;
pub mod retry;

use async_trait::async_trait;

pub use retry::*;
use crate::config::TranslateConfig;
use crate::error::Result;

/// A remote machine-translation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate plain text between two language codes
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String>;
}

/// Factory for creating translation backends
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_backend(config: &TranslateConfig) -> Result<Box<dyn TranslationBackend>> {
        Ok(Box::new(google::GoogleTranslator::new(config.endpoint.clone())?))
    }
}
