use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{Result, HunterError};
use super::{SubtitleCandidate, SubtitleProvider};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    attributes: SearchAttributes,
}

#[derive(Debug, Deserialize)]
struct SearchAttributes {
    #[serde(default)]
    subtitle_id: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    files: Vec<SearchFile>,
}

#[derive(Debug, Deserialize)]
struct SearchFile {
    file_id: u64,
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
}

impl From<SearchHit> for SubtitleCandidate {
    fn from(hit: SearchHit) -> Self {
        let first_file = hit.attributes.files.into_iter().next();
        SubtitleCandidate {
            id: hit.attributes.subtitle_id,
            language: hit.attributes.language,
            file_id: first_file.as_ref().map(|f| f.file_id),
            file_name: first_file.and_then(|f| f.file_name),
        }
    }
}

/// OpenSubtitles REST API client
pub struct OpenSubtitlesClient {
    client: Client,
    config: ProviderConfig,
}

impl OpenSubtitlesClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(HunterError::Http)?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitlesClient {
    async fn search(&self, query: &str, language: &str) -> Result<Vec<SubtitleCandidate>> {
        let response = self.client
            .get(self.endpoint("subtitles"))
            .query(&[("query", query), ("languages", language)])
            .header("Api-Key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| HunterError::Provider(format!("Failed to search subtitles: {}", e)))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| HunterError::Provider(format!("Failed to read search response: {}", e)))?;

        if !status.is_success() {
            return Err(HunterError::Provider(format!("Search API error (status {}): {}", status, body)));
        }

        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| HunterError::Provider(format!("Failed to parse search response: {}", e)))?;

        let candidates: Vec<SubtitleCandidate> = parsed.data.into_iter().map(SubtitleCandidate::from).collect();
        debug!("Provider returned {} candidates for '{}' [{}]", candidates.len(), query, language);
        Ok(candidates)
    }

    async fn download(&self, candidate: &SubtitleCandidate) -> Result<Vec<u8>> {
        let file_id = candidate.file_id.ok_or_else(|| {
            HunterError::Provider(format!("Subtitle {} has no downloadable file", candidate.id))
        })?;

        let request = json!({
            "file_id": file_id,
            "sub_format": "srt",
        });
        debug!("Download request body: {}", request);

        let response = self.client
            .post(self.endpoint("download"))
            .header("Api-Key", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| HunterError::Provider(format!("Failed to download subtitle: {}", e)))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| HunterError::Provider(format!("Failed to read download response: {}", e)))?;

        if !status.is_success() {
            return Err(HunterError::Provider(format!("Download API error (status {}): {}", status, body)));
        }

        let link: DownloadResponse = serde_json::from_str(&body)
            .map_err(|e| HunterError::Provider(format!("Failed to parse download response (body: {}): {}", body, e)))?;

        let file = self.client
            .get(&link.link)
            .send()
            .await
            .map_err(|e| HunterError::Provider(format!("Failed to download file: {}", e)))?;

        if !file.status().is_success() {
            return Err(HunterError::Provider(format!("File download failed with status {}", file.status())));
        }

        let bytes = file.bytes().await
            .map_err(|e| HunterError::Provider(format!("Failed to read subtitle file: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
