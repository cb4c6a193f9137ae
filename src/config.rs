use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, HunterError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub provider: ProviderConfig,
    pub translate: TranslateConfig,
    pub language: LanguageConfig,
    pub placement: PlacementConfig,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the media catalog server
    pub url: String,
    /// API token sent as X-Emby-Token
    pub api_key: String,
    /// User whose library view is queried
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Subtitle provider API key
    pub api_key: String,
    /// REST API base URL
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Translation endpoint URL
    pub endpoint: String,
    /// Attempts per subtitle entry before keeping the original text
    pub max_retries: u32,
    /// Backoff unit in milliseconds; attempt n waits (n - 1) units
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Tag written into the sidecar filename
    pub target_tag: String,
    /// Language code used when searching the provider for a direct match
    pub target_search_language: String,
    /// Stream language tags treated as "already has the target subtitle"
    pub target_equivalents: Vec<String>,
    /// Language searched when no direct match exists
    pub fallback_language: String,
    /// Language code handed to the translation backend
    pub translation_target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Try to write next to the media file before using the staging directory
    pub direct_save: bool,
    /// Path prefix as the catalog reports it
    pub source_prefix: String,
    /// Replacement prefix as seen from this process
    pub destination_prefix: String,
    /// Holding directory when direct placement is not possible
    pub staging_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Look for `<basename>.<tag>.srt` files next to the media
    pub check_sidecar_files: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8096".to_string(),
            api_key: String::new(),
            user_id: String::new(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.opensubtitles.com/api/v1".to_string(),
            user_agent: format!("subhunter v{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            max_retries: 3,
            backoff_ms: 1000,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            target_tag: "zh-Hant".to_string(),
            target_search_language: "zh-TW".to_string(),
            target_equivalents: vec!["zh-TW".to_string(), "zh-Hant".to_string(), "chi".to_string()],
            fallback_language: "en".to_string(),
            translation_target: "zh-TW".to_string(),
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            direct_save: true,
            source_prefix: String::new(),
            destination_prefix: String::new(),
            staging_dir: PathBuf::from("./downloads"),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HunterError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay values from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup; empty values are ignored
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("JELLYFIN_URL") {
            self.catalog.url = v;
        }
        if let Some(v) = get("JELLYFIN_API_KEY") {
            self.catalog.api_key = v;
        }
        if let Some(v) = get("JELLYFIN_USER_ID") {
            self.catalog.user_id = v;
        }
        if let Some(v) = get("OPENSUBTITLES_API_KEY") {
            self.provider.api_key = v;
        }
        if let Some(v) = get("SUBTITLE_DIRECTORY") {
            self.placement.staging_dir = PathBuf::from(v);
        }
        if let Some(v) = get("ENABLE_DIRECT_SAVE") {
            self.placement.direct_save = matches!(v.as_str(), "true" | "1" | "yes");
        }
        if let Some(v) = get("JELLYFIN_PATH_PREFIX") {
            self.placement.source_prefix = v;
        }
        if let Some(v) = get("CONTAINER_PATH_PREFIX") {
            self.placement.destination_prefix = v;
        }
    }

    /// Check that the credentials needed to talk to the remote services are present
    pub fn validate(&self) -> Result<()> {
        if self.catalog.api_key.is_empty() {
            return Err(HunterError::Config("catalog.api_key (JELLYFIN_API_KEY) is required".to_string()));
        }
        if self.catalog.user_id.is_empty() {
            return Err(HunterError::Config("catalog.user_id (JELLYFIN_USER_ID) is required".to_string()));
        }
        if self.provider.api_key.is_empty() {
            return Err(HunterError::Config("provider.api_key (OPENSUBTITLES_API_KEY) is required".to_string()));
        }
        if self.translate.max_retries == 0 {
            return Err(HunterError::Config("translate.max_retries must be at least 1".to_string()));
        }
        Ok(())
    }
}
