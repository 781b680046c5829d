//! Application configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::route::RouteDescriptor;

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid route '{path}': {reason}")]
    InvalidRoute { path: String, reason: String },
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SsrConfig {
    /// Application metadata.
    #[serde(default)]
    pub app: AppSettings,

    /// Document composition settings.
    #[serde(default)]
    pub document: DocumentSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Cache orchestration settings.
    #[serde(default)]
    pub cache: CacheSettings,

    /// Route descriptors, in contribution order.
    #[serde(default)]
    pub routes: Vec<RouteDescriptor>,
}

impl SsrConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), routes = config.routes.len(), "loaded config");
        Ok(config)
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check route paths are absolute and unique.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for route in &self.routes {
            if !route.path.starts_with('/') {
                return Err(ConfigError::InvalidRoute {
                    path: route.path.clone(),
                    reason: "path must start with '/'".to_string(),
                });
            }
            if !seen.insert(route.path.as_str()) {
                return Err(ConfigError::InvalidRoute {
                    path: route.path.clone(),
                    reason: "path contributed more than once".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Application metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    /// Application name, used as the fallback page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Document composition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// Base path the client bundle is served under.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Client bundle file name (may carry a query string).
    #[serde(default = "default_script")]
    pub script: String,

    /// Additional stylesheet hrefs.
    #[serde(default)]
    pub stylesheets: Vec<String>,

    /// Id of the element holding rendered markup.
    #[serde(default = "default_root_id")]
    pub root_id: String,

    /// Document language.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Global name receiving the client store state.
    #[serde(default = "default_state_global")]
    pub state_global: String,

    /// Global name receiving the client query-cache state.
    #[serde(default = "default_query_state_global")]
    pub query_state_global: String,
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_script() -> String {
    "main.js".to_string()
}

fn default_root_id() -> String {
    "root".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_state_global() -> String {
    "__PRELOADED_STATE__".to_string()
}

fn default_query_state_global() -> String {
    "__QUERY_STATE__".to_string()
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            script: default_script(),
            stylesheets: Vec::new(),
            root_id: default_root_id(),
            lang: default_lang(),
            state_global: default_state_global(),
            query_state_global: default_query_state_global(),
        }
    }
}

impl DocumentSettings {
    /// Set the base path.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Set the client bundle file name.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    /// Add an extra stylesheet href.
    pub fn with_stylesheet(mut self, href: impl Into<String>) -> Self {
        self.stylesheets.push(href.into());
        self
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    Json,
    /// Human-readable format (for development).
    #[default]
    Human,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Cache orchestration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSettings {
    /// TTL applied when a contribution does not declare one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ttl_secs: Option<u64>,

    /// Serialize concurrent loads of the same key across requests.
    #[serde(default)]
    pub stampede_protection: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SsrConfig::from_toml_str("").unwrap();

        assert!(config.app.name.is_none());
        assert_eq!(config.document.base_path, "/");
        assert_eq!(config.document.script, "main.js");
        assert_eq!(config.document.root_id, "root");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Human);
        assert!(!config.cache.stampede_protection);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = SsrConfig::from_toml_str(
            r#"
            [app]
            name = "Console"

            [document]
            base_path = "/app/"
            script = "main.js?v=3"
            stylesheets = ["https://cdn.example.com/fonts.css", "extra.css"]

            [logging]
            level = "debug"
            format = "json"

            [cache]
            default_ttl_secs = 60
            stampede_protection = true

            [[routes]]
            path = "/"
            root = true

            [[routes]]
            path = "/group/:id"
            exact = true
            "#,
        )
        .unwrap();

        assert_eq!(config.app.name.as_deref(), Some("Console"));
        assert_eq!(config.document.base_path, "/app/");
        assert_eq!(config.document.stylesheets.len(), 2);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.cache.default_ttl_secs, Some(60));
        assert!(config.cache.stampede_protection);
        assert_eq!(config.routes.len(), 2);
        assert!(config.routes[0].root);
    }

    #[test]
    fn test_rejects_relative_route() {
        let err = SsrConfig::from_toml_str(
            r#"
            [[routes]]
            path = "group"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidRoute { .. }));
    }

    #[test]
    fn test_rejects_duplicate_route() {
        let err = SsrConfig::from_toml_str(
            r#"
            [[routes]]
            path = "/a"

            [[routes]]
            path = "/a"
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SsrConfig::load("/nonexistent/ssr.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
