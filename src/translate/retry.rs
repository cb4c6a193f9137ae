use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, HunterError};
use crate::subtitle::SubtitleEntry;
use super::TranslationBackend;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("space pattern is valid"));

/// Remove markup tags and collapse whitespace runs to single spaces
pub fn clean_text(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, "");
    SPACE_RE.replace_all(stripped.trim(), " ").into_owned()
}

/// Translates subtitle entries one at a time against a backend.
///
/// Each entry gets up to `max_retries` attempts; attempt `n` is preceded by
/// a wait of `(n - 1) * backoff`. An entry that still fails keeps its
/// original text, so one bad entry never fails the document.
pub struct RetryingTranslator<'a> {
    backend: &'a dyn TranslationBackend,
    max_retries: u32,
    backoff: Duration,
}

impl<'a> RetryingTranslator<'a> {
    pub fn new(backend: &'a dyn TranslationBackend, config: &TranslateConfig) -> Self {
        Self {
            backend,
            max_retries: config.max_retries.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// Translate every entry's text; indices and timestamps are untouched.
    pub async fn translate_entries(
        &self,
        entries: &[SubtitleEntry],
        source_language: &str,
        target_language: &str,
    ) -> Vec<SubtitleEntry> {
        let total = entries.len();
        let mut translated = Vec::with_capacity(total);
        let mut degraded = 0usize;

        for (i, entry) in entries.iter().enumerate() {
            if i % 10 == 0 {
                info!("Translating entry {}/{}...", i + 1, total);
            }

            let cleaned = clean_text(&entry.text);
            if cleaned.is_empty() {
                debug!("Entry {} has nothing to translate after cleanup", entry.index);
                translated.push(entry.clone());
                continue;
            }

            let text = match self.translate_with_retry(&cleaned, source_language, target_language).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        "Failed to translate entry {} ('{}'): {}. Using original text.",
                        entry.index, entry.text, e
                    );
                    degraded += 1;
                    entry.text.clone()
                }
            };

            translated.push(SubtitleEntry { text, ..entry.clone() });
        }

        if degraded > 0 {
            warn!("{}/{} entries kept their original text", degraded, total);
        }
        translated
    }

    async fn translate_with_retry(&self, text: &str, source_language: &str, target_language: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let wait = self.backoff * (attempt - 1);
                warn!("Retrying translation attempt {}/{} after {:?}...", attempt, self.max_retries, wait);
                tokio::time::sleep(wait).await;
            }

            match self.backend.translate(text, source_language, target_language).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!("Translation attempt {} failed: {}", attempt, e);
                    last_error = Some(e);
                }
            }
        }

        Err(HunterError::Translation(format!(
            "translation failed after {} attempts: {}",
            self.max_retries,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}
