use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, HunterError};
use super::TranslationBackend;

/// Client for the public Google Translate `gtx` endpoint
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(HunterError::Http)?;

        Ok(Self { client, endpoint })
    }
}

/// Extract the translated text from a `translate_a/single` response body.
///
/// The body is a nested JSON array; the first element lists translated
/// segments whose first member is the text. An HTML body means the service
/// is throttling or blocking us and is reported as such.
pub fn parse_response(body: &str) -> Result<String> {
    if body.trim_start().starts_with('<') {
        return Err(HunterError::BackendThrottled(
            "translation service returned an HTML page, possibly rate limited or blocked".to_string(),
        ));
    }

    let value: Value = serde_json::from_str(body)?;

    let segments = value
        .as_array()
        .ok_or_else(|| HunterError::Translation("Unexpected response format".to_string()))?
        .first()
        .ok_or_else(|| HunterError::Translation("Empty translation response".to_string()))?
        .as_array()
        .ok_or_else(|| HunterError::Translation("Unexpected response format".to_string()))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.as_array()?.first()?.as_str())
        .collect())
}

#[async_trait]
impl TranslationBackend for GoogleTranslator {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let response = self.client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| HunterError::Translation(format!("Failed to call translation API: {}", e)))?;

        let body = response.text().await
            .map_err(|e| HunterError::Translation(format!("Failed to read response: {}", e)))?;

        debug!("Translation response: {} bytes", body.len());
        parse_response(&body)
    }
}
