use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::error::{Result, HunterError};
use super::{CatalogService, MediaItem, MediaKind, StreamDescriptor, StreamKind};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<JellyfinItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JellyfinItem {
    id: String,
    name: Option<String>,
    #[serde(rename = "Type")]
    item_type: Option<String>,
    path: Option<String>,
    series_name: Option<String>,
    season_name: Option<String>,
    index_number: Option<u32>,
    parent_index_number: Option<u32>,
    production_year: Option<u32>,
    #[serde(default)]
    media_sources: Vec<JellyfinMediaSource>,
    #[serde(default)]
    media_streams: Vec<JellyfinMediaStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JellyfinMediaSource {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JellyfinMediaStream {
    #[serde(rename = "Type")]
    stream_type: Option<String>,
    language: Option<String>,
    #[serde(default)]
    is_external: bool,
}

impl From<JellyfinItem> for MediaItem {
    fn from(item: JellyfinItem) -> Self {
        let kind = match item.item_type.as_deref().unwrap_or_default() {
            "Movie" => MediaKind::Movie,
            "Episode" => MediaKind::Episode,
            _ => MediaKind::Other,
        };

        MediaItem {
            id: item.id,
            name: item.name.unwrap_or_default(),
            kind,
            path: item.path,
            source_paths: item.media_sources.into_iter().filter_map(|s| s.path).collect(),
            series_name: item.series_name,
            season_name: item.season_name,
            season_number: item.parent_index_number,
            episode_number: item.index_number,
            production_year: item.production_year,
            streams: item
                .media_streams
                .into_iter()
                .map(|s| StreamDescriptor {
                    kind: StreamKind::from_catalog(s.stream_type.as_deref().unwrap_or_default()),
                    language: s.language,
                    is_external: s.is_external,
                })
                .collect(),
        }
    }
}

/// Client for Jellyfin/Emby compatible catalog servers
pub struct JellyfinClient {
    client: Client,
    base_url: String,
    api_key: String,
    user_id: String,
}

impl JellyfinClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(HunterError::Http)?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            user_id: config.user_id,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, what: &str) -> Result<T> {
        debug!("Calling catalog API: {}", url);

        let response = self.client
            .get(url)
            .header("X-Emby-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| HunterError::Catalog(format!("Failed to fetch {}: {}", what, e)))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| HunterError::Catalog(format!("Failed to read {} response: {}", what, e)))?;

        if status == StatusCode::NOT_FOUND {
            return Err(HunterError::NotFound(format!("{} not found (status {})", what, status)));
        }
        if !status.is_success() {
            return Err(HunterError::Catalog(format!("API error (status {}): {}", status, body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| HunterError::Catalog(format!("Failed to parse {} (response: {}): {}", what, body, e)))
    }
}

#[async_trait]
impl CatalogService for JellyfinClient {
    async fn list_items(&self) -> Result<Vec<MediaItem>> {
        let url = format!(
            "{}/Users/{}/Items?Recursive=true&IncludeItemTypes=Movie,Episode&Fields=Path,MediaSources,MediaStreams",
            self.base_url, self.user_id
        );

        let response: ItemsResponse = self.get_json(&url, "items").await?;
        debug!("Catalog returned {} items", response.items.len());
        Ok(response.items.into_iter().map(MediaItem::from).collect())
    }

    async fn get_item(&self, item_id: &str) -> Result<MediaItem> {
        let url = format!("{}/Users/{}/Items/{}", self.base_url, self.user_id, item_id);
        let item: JellyfinItem = self.get_json(&url, &format!("item {}", item_id)).await?;
        Ok(item.into())
    }

    async fn refresh_metadata(&self, item_id: &str) -> Result<()> {
        let url = format!(
            "{}/Items/{}/Refresh?metadataRefreshMode=FullRefresh&replaceAllMetadata=false",
            self.base_url, item_id
        );

        let response = self.client
            .post(&url)
            .header("X-Emby-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| HunterError::Catalog(format!("Failed to refresh metadata: {}", e)))?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            status => Err(HunterError::Catalog(format!("Unexpected status code: {}", status))),
        }
    }
}
