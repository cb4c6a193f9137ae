use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::catalog::{CatalogFactory, CatalogService, MediaItem};
use crate::config::Config;
use crate::discovery::{DiscoveryFilter, FsSidecarCheck, NoSidecarCheck, SidecarCheck};
use crate::error::{Result, HunterError};
use crate::placement::{PathResolver, SaveLocation, SaveTarget};
use crate::provider::{ProviderFactory, SubtitleCandidate, SubtitleProvider};
use crate::subtitle;
use crate::translate::{RetryingTranslator, TranslationBackend, TranslatorFactory};

/// Result of a successful `process` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub location: SaveLocation,
    pub saved_path: PathBuf,
}

impl ProcessOutcome {
    /// User-facing summary telling whether the catalog will pick the file up
    pub fn message(&self, staging_dir: &Path) -> String {
        match self.location {
            SaveLocation::Media => {
                "Subtitle processed successfully and saved to media directory (catalog will detect it automatically)"
                    .to_string()
            }
            SaveLocation::Staging => format!(
                "Subtitle processed successfully and saved to staging directory ({})",
                staging_dir.display()
            ),
        }
    }
}

/// Drives one item from "needs subtitle" to "subtitle placed".
///
/// Holds no per-request state; concurrent calls for different items are
/// independent, and concurrent calls for the same item race on the
/// destination file.
pub struct Workflow {
    config: Config,
    catalog: Box<dyn CatalogService>,
    provider: Box<dyn SubtitleProvider>,
    backend: Box<dyn TranslationBackend>,
    resolver: PathResolver,
    discovery: DiscoveryFilter,
}

impl Workflow {
    pub fn new(
        config: Config,
        catalog: Box<dyn CatalogService>,
        provider: Box<dyn SubtitleProvider>,
        backend: Box<dyn TranslationBackend>,
    ) -> Self {
        let sidecar: Box<dyn SidecarCheck> = if config.discovery.check_sidecar_files {
            Box::new(FsSidecarCheck::new(PathResolver::new(config.placement.clone())))
        } else {
            Box::new(NoSidecarCheck)
        };

        Self {
            resolver: PathResolver::new(config.placement.clone()),
            discovery: DiscoveryFilter::new(config.language.target_equivalents.clone(), sidecar),
            config,
            catalog,
            provider,
            backend,
        }
    }

    /// Build the workflow with the default HTTP clients
    pub fn from_config(config: Config) -> Result<Self> {
        let catalog = CatalogFactory::create_default(config.catalog.clone())?;
        let provider = ProviderFactory::create_default(config.provider.clone())?;
        let backend = TranslatorFactory::create_backend(&config.translate)?;
        Ok(Self::new(config, catalog, provider, backend))
    }

    pub fn staging_dir(&self) -> &Path {
        self.resolver.staging_dir()
    }

    /// Catalog items that lack a target-language subtitle
    pub async fn list_candidates(&self) -> Result<Vec<MediaItem>> {
        let items = self.catalog.list_items().await?;
        let total = items.len();
        let candidates = self.discovery.filter(items);
        info!("{} of {} items are missing a {} subtitle", candidates.len(), total, self.config.language.target_tag);
        Ok(candidates)
    }

    /// Find, translate if necessary, and place a subtitle for one item
    pub async fn process(&self, item_id: &str) -> Result<ProcessOutcome> {
        info!("Processing subtitle for item: {}", item_id);

        let item = self.catalog.get_item(item_id).await?;
        let video_path = item
            .physical_path()
            .ok_or_else(|| HunterError::NotFound(format!("item {} has no media path", item_id)))?
            .to_string();
        info!("Got video path: {}", video_path);

        let query = item.search_query();
        info!("Searching subtitles for: {}", query);

        let language = &self.config.language;
        let target = match self.find_first(&query, &language.target_search_language).await {
            Ok(candidate) => {
                info!("Found {} subtitle directly", language.target_search_language);
                let content = self.provider.download(&candidate).await?;
                self.save(&video_path, &content).await?
            }
            Err(e) => {
                info!("No {} subtitle ({}), searching for {}", language.target_search_language, e, language.fallback_language);
                let candidate = self
                    .find_first(&query, &language.fallback_language)
                    .await
                    .map_err(|e| {
                        let detail = match e {
                            HunterError::NotFound(message) => message,
                            other => other.to_string(),
                        };
                        HunterError::NotFound(format!("No subtitles found: {}", detail))
                    })?;

                info!("Found {} subtitle, starting translation", language.fallback_language);
                let content = self.translate_candidate(&candidate).await?;
                self.save(&video_path, content.as_bytes()).await?
            }
        };

        if let Err(e) = self.catalog.refresh_metadata(item_id).await {
            warn!("Failed to refresh metadata for {}: {}", item_id, e);
        }

        Ok(ProcessOutcome {
            location: target.location,
            saved_path: target.path,
        })
    }

    /// First provider hit for a language; provider failures count as a miss
    async fn find_first(&self, query: &str, language: &str) -> Result<SubtitleCandidate> {
        let candidates = self.provider.search(query, language).await?;
        info!("Found {} {} candidates", candidates.len(), language);
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| HunterError::NotFound(format!("no {} subtitles for '{}'", language, query)))
    }

    async fn translate_candidate(&self, candidate: &SubtitleCandidate) -> Result<String> {
        let language = &self.config.language;

        let content = self.provider.download(candidate).await?;
        info!("Downloaded {} bytes of subtitle content", content.len());

        let entries = subtitle::parse(&content);
        info!("Parsed {} subtitle entries", entries.len());

        let translator = RetryingTranslator::new(self.backend.as_ref(), &self.config.translate);
        let translated = translator
            .translate_entries(&entries, &language.fallback_language, &language.translation_target)
            .await;
        info!("Translation completed");

        Ok(subtitle::format(&translated))
    }

    async fn save(&self, video_path: &str, content: &[u8]) -> Result<SaveTarget> {
        let target = self.resolver.resolve(video_path, &self.config.language.target_tag).await;

        fs::write(&target.path, content).await.map_err(|e| {
            HunterError::Write(format!("failed to write subtitle file {}: {}", target.path.display(), e))
        })?;

        info!("Subtitle saved to {} directory: {}", target.location, target.path.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MediaKind, MockCatalogService, StreamDescriptor, StreamKind};
    use crate::config::PlacementConfig;
    use crate::provider::MockSubtitleProvider;
    use crate::translate::MockTranslationBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ENGLISH_SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello.\n\n\
                               2\n00:00:03,000 --> 00:00:04,000\nBroken line\n\n\
                               5\n00:00:05,000 --> 00:00:06,000\nBye.\n";

    fn episode() -> MediaItem {
        let mut item = MediaItem::new("ep42", "Episode Five", MediaKind::Episode);
        item.series_name = Some("Foo".into());
        item.season_number = Some(2);
        item.episode_number = Some(5);
        item.path = Some("/data/media/Foo".into());
        item.source_paths = vec!["/data/media/Foo/S02E05.mkv".into()];
        item
    }

    fn config(media_root: &Path, staging: &Path) -> Config {
        let mut config = Config::default();
        config.translate.backoff_ms = 0;
        config.placement = PlacementConfig {
            direct_save: true,
            source_prefix: "/data/media".into(),
            destination_prefix: media_root.to_str().unwrap().into(),
            staging_dir: staging.to_path_buf(),
        };
        config
    }

    fn catalog_for(item: MediaItem, refresh_ok: bool) -> MockCatalogService {
        let mut catalog = MockCatalogService::new();
        catalog
            .expect_get_item()
            .withf(|id| id == "ep42")
            .returning(move |_| Ok(item.clone()));
        catalog.expect_refresh_metadata().times(1).returning(move |_| {
            if refresh_ok {
                Ok(())
            } else {
                Err(HunterError::Catalog("refresh refused".into()))
            }
        });
        catalog
    }

    fn candidate(language: &str) -> SubtitleCandidate {
        SubtitleCandidate {
            id: format!("{}-1", language),
            file_id: Some(7),
            language: language.to_string(),
            file_name: None,
        }
    }

    /// Provider with no zh-TW hits and one English hit
    fn fallback_provider() -> MockSubtitleProvider {
        let mut provider = MockSubtitleProvider::new();
        provider.expect_search().returning(|query, language| {
            assert_eq!(query, "Foo S02E05");
            match language {
                "en" => Ok(vec![candidate("en")]),
                _ => Ok(vec![]),
            }
        });
        provider
            .expect_download()
            .returning(|c| {
                assert_eq!(c.language, "en");
                Ok(ENGLISH_SRT.as_bytes().to_vec())
            });
        provider
    }

    #[tokio::test]
    async fn test_direct_hit_saves_next_to_media() {
        let temp = tempfile::tempdir().unwrap();
        let media_root = temp.path().join("media");
        let staging = temp.path().join("staging");

        let mut provider = MockSubtitleProvider::new();
        provider
            .expect_search()
            .withf(|query, language| query == "Foo S02E05" && language == "zh-TW")
            .times(1)
            .returning(|_, _| Ok(vec![candidate("zh-TW"), candidate("zh-TW-2")]));
        provider
            .expect_download()
            .withf(|c| c.id == "zh-TW-1")
            .returning(|_| Ok(b"1\n00:00:01,000 --> 00:00:02,000\n\xe4\xbd\xa0\xe5\xa5\xbd\n".to_vec()));

        let mut backend = MockTranslationBackend::new();
        backend.expect_translate().times(0);

        let workflow = Workflow::new(
            config(&media_root, &staging),
            Box::new(catalog_for(episode(), true)),
            Box::new(provider),
            Box::new(backend),
        );

        let outcome = workflow.process("ep42").await.unwrap();
        let expected = media_root.join("Foo").join("S02E05.zh-Hant.srt");
        assert_eq!(outcome.location, SaveLocation::Media);
        assert_eq!(outcome.saved_path, expected);
        assert!(std::fs::read_to_string(&expected).unwrap().contains("你好"));
        assert!(outcome.message(workflow.staging_dir()).contains("media directory"));
    }

    #[tokio::test]
    async fn test_fallback_translates_and_degrades_per_entry() {
        let temp = tempfile::tempdir().unwrap();
        let media_root = temp.path().join("media");
        let staging = temp.path().join("staging");

        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        let mut backend = MockTranslationBackend::new();
        backend.expect_translate().returning(move |text, source, target| {
            assert_eq!(source, "en");
            assert_eq!(target, "zh-TW");
            if text == "Broken line" {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(HunterError::BackendThrottled("html".into()))
            } else {
                Ok(format!("譯:{}", text))
            }
        });

        let workflow = Workflow::new(
            config(&media_root, &staging),
            Box::new(catalog_for(episode(), false)),
            Box::new(fallback_provider()),
            Box::new(backend),
        );

        let outcome = workflow.process("ep42").await.unwrap();
        assert_eq!(outcome.location, SaveLocation::Media);
        assert_eq!(failures.load(Ordering::SeqCst), 3);

        let saved = std::fs::read_to_string(&outcome.saved_path).unwrap();
        let entries = subtitle::parse(saved.as_bytes());
        assert_eq!(entries.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 2, 5]);
        assert_eq!(entries[0].text, "譯:Hello.");
        assert_eq!(entries[1].text, "Broken line");
        assert_eq!(entries[1].start, "00:00:03,000");
        assert_eq!(entries[2].text, "譯:Bye.");
    }

    #[tokio::test]
    async fn test_unwritable_media_directory_uses_staging() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let staging = temp.path().join("staging");

        let mut backend = MockTranslationBackend::new();
        backend.expect_translate().returning(|text, _, _| Ok(text.to_uppercase()));

        let workflow = Workflow::new(
            config(&blocker, &staging),
            Box::new(catalog_for(episode(), true)),
            Box::new(fallback_provider()),
            Box::new(backend),
        );

        let outcome = workflow.process("ep42").await.unwrap();
        assert_eq!(outcome.location, SaveLocation::Staging);
        assert_eq!(outcome.saved_path, staging.join("S02E05.zh-Hant.srt"));
        assert!(outcome.saved_path.is_file());
        assert!(outcome.message(workflow.staging_dir()).contains("staging directory"));
    }

    #[tokio::test]
    async fn test_no_subtitle_in_either_language_is_not_found() {
        let temp = tempfile::tempdir().unwrap();

        let mut catalog = MockCatalogService::new();
        catalog.expect_get_item().returning(|_| Ok(episode()));
        catalog.expect_refresh_metadata().times(0);

        let mut provider = MockSubtitleProvider::new();
        provider.expect_search().returning(|_, language| match language {
            "zh-TW" => Err(HunterError::Provider("status 503".into())),
            _ => Ok(vec![]),
        });
        provider.expect_download().times(0);

        let workflow = Workflow::new(
            config(&temp.path().join("media"), &temp.path().join("staging")),
            Box::new(catalog),
            Box::new(provider),
            Box::new(MockTranslationBackend::new()),
        );

        let err = workflow.process("ep42").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Not found: No subtitles found: no en subtitles for 'Foo S02E05'");
    }

    #[tokio::test]
    async fn test_missing_item_propagates() {
        let mut catalog = MockCatalogService::new();
        catalog
            .expect_get_item()
            .returning(|id| Err(HunterError::NotFound(format!("item {} not found", id))));

        let mut provider = MockSubtitleProvider::new();
        provider.expect_search().times(0);

        let workflow = Workflow::new(
            Config::default(),
            Box::new(catalog),
            Box::new(provider),
            Box::new(MockTranslationBackend::new()),
        );

        let err = workflow.process("nope").await.unwrap_err();
        assert!(matches!(err, HunterError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_write_failure_is_terminal() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let mut catalog = MockCatalogService::new();
        catalog.expect_get_item().returning(|_| Ok(episode()));
        catalog.expect_refresh_metadata().times(0);

        let mut provider = MockSubtitleProvider::new();
        provider.expect_search().returning(|_, _| Ok(vec![candidate("zh-TW")]));
        provider.expect_download().returning(|_| Ok(b"data".to_vec()));

        // Both the media directory and the staging directory sit beneath a file
        let workflow = Workflow::new(
            config(&blocker, &blocker.join("staging")),
            Box::new(catalog),
            Box::new(provider),
            Box::new(MockTranslationBackend::new()),
        );

        let err = workflow.process("ep42").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::WriteFailure);
    }

    #[tokio::test]
    async fn test_list_candidates_filters_catalog() {
        let mut satisfied = episode();
        satisfied.id = "ep41".into();
        satisfied.streams = vec![StreamDescriptor {
            kind: StreamKind::Subtitle,
            language: Some("zh-Hant".into()),
            is_external: false,
        }];

        let mut catalog = MockCatalogService::new();
        let items = vec![satisfied, episode()];
        catalog.expect_list_items().returning(move || Ok(items.clone()));

        let workflow = Workflow::new(
            Config::default(),
            Box::new(catalog),
            Box::new(MockSubtitleProvider::new()),
            Box::new(MockTranslationBackend::new()),
        );

        let candidates = workflow.list_candidates().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "ep42");
    }
}
