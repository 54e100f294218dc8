use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use transcript_engine::{
    EngineConfig, FetchSettings, GistSettings, DEFAULT_BATCH_SIZE, DEFAULT_BLOCK_CLASS,
    GIST_PREVIEW_HOST, GIST_RAW_BASE, GITHUB_API_BASE,
};
use url::Url;

/// Per-site settings read from a RON file; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub total_pages: Option<usize>,
    pub block_class: String,
    pub batch_size: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_page_bytes: u64,
    pub preview_host: String,
    pub gist_api_base: String,
    pub gist_raw_base: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            total_pages: None,
            block_class: DEFAULT_BLOCK_CLASS.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            max_page_bytes: fetch.max_bytes,
            preview_host: GIST_PREVIEW_HOST.to_string(),
            gist_api_base: GITHUB_API_BASE.to_string(),
            gist_raw_base: GIST_RAW_BASE.to_string(),
        }
    }
}

impl SiteConfig {
    /// Reads `path`; no path or a missing file yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                engine_warn!("Config {:?} not found; using defaults", path);
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config {}", path.display()));
            }
        };

        let config: SiteConfig = ron::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        engine_info!("Loaded site config from {:?}", path);
        Ok(config)
    }

    pub fn engine_config(&self, location: Url, total_pages: usize) -> EngineConfig {
        let mut config = EngineConfig::new(location, total_pages);
        config.batch_size = self.batch_size;
        config.block_class = self.block_class.clone();
        config.fetch = FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_bytes: self.max_page_bytes,
            ..FetchSettings::default()
        };
        config.gist = GistSettings {
            preview_host: self.preview_host.clone(),
            api_base: self.gist_api_base.clone(),
            raw_base: self.gist_raw_base.clone(),
        };
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_path_uses_defaults() {
        assert_eq!(SiteConfig::load(None).unwrap(), SiteConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("site.ron");
        assert_eq!(
            SiteConfig::load(Some(absent.as_path())).unwrap(),
            SiteConfig::default()
        );
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.ron");
        fs::write(
            &path,
            r#"(total_pages: Some(12), block_class: "entry", batch_size: 5)"#,
        )
        .unwrap();

        let config = SiteConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.total_pages, Some(12));
        assert_eq!(config.block_class, "entry");
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.preview_host, GIST_PREVIEW_HOST);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.ron");
        fs::write(&path, "(batch_size: \"three\")").unwrap();

        let err = SiteConfig::load(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn settings_flow_into_engine_config() {
        let config = SiteConfig {
            batch_size: 2,
            request_timeout_secs: 7,
            max_page_bytes: 1024,
            gist_api_base: "http://127.0.0.1:9/api".to_string(),
            ..SiteConfig::default()
        };
        let location = Url::parse("https://example.com/index.html").unwrap();

        let engine = config.engine_config(location.clone(), 3);
        assert_eq!(engine.location, location);
        assert_eq!(engine.total_pages, 3);
        assert_eq!(engine.batch_size, 2);
        assert_eq!(engine.fetch.request_timeout, Duration::from_secs(7));
        assert_eq!(engine.fetch.max_bytes, 1024);
        assert_eq!(engine.gist.api_base, "http://127.0.0.1:9/api");
    }
}
