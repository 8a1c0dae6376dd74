/// Dashboard runtime configuration
///
/// Built once at startup and never mutated. The TUI holds it as an
/// `Arc<DashboardConfig>`; `HttpFetcher::new` borrows it and keeps its own copy
/// of the metrics URL. There are no setters: a different backend means a new config.

use thiserror::Error;
use url::Url;

use crate::utils::{AppConfig, DEFAULT_BACKEND_BASE_URL, METRICS_PATH};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),
}

/// Where the backend base URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Command line flag or BACKEND_BASE_URL
    Override,
    /// User config file
    File,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Override => write!(f, "command line / environment"),
            ConfigSource::File => write!(f, "config file"),
            ConfigSource::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    backend_base_url: Url,
    metrics_url: Url,
    source: ConfigSource,
}

impl DashboardConfig {
    pub fn new(backend_base_url: &str) -> Result<Self, ConfigError> {
        Self::with_source(backend_base_url, ConfigSource::Override)
    }

    fn with_source(backend_base_url: &str, source: ConfigSource) -> Result<Self, ConfigError> {
        let raw = backend_base_url.trim();
        let mut base = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(ConfigError::UnsupportedScheme(base.scheme().to_string()));
        }

        // Treat the base path as a directory so a proxy prefix is preserved
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let metrics_url = base
            .join(METRICS_PATH.trim_start_matches('/'))
            .map_err(|source| ConfigError::InvalidUrl {
                url: raw.to_string(),
                source,
            })?;

        Ok(Self {
            backend_base_url: base,
            metrics_url,
            source,
        })
    }

    /// Resolve from an explicit override (flag or environment), then the user
    /// config file, then the built-in default
    pub fn resolve(override_url: Option<&str>, app_config: &AppConfig) -> Result<Self, ConfigError> {
        if let Some(url) = override_url.filter(|u| !u.trim().is_empty()) {
            return Self::with_source(url, ConfigSource::Override);
        }

        if let Some(url) = app_config.backend_base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Self::with_source(url, ConfigSource::File);
        }

        Self::with_source(DEFAULT_BACKEND_BASE_URL, ConfigSource::Default)
    }

    pub fn backend_base_url(&self) -> &Url {
        &self.backend_base_url
    }

    pub fn metrics_url(&self) -> &Url {
        &self.metrics_url
    }

    pub fn source(&self) -> ConfigSource {
        self.source
    }
}
