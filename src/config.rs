use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config from {path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("Invalid backend URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub upload: UploadConfig,
    pub content: ContentConfig,
    pub tui: TuiConfig,
    pub data: DataConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the Neura API, e.g. `http://localhost:8000`.
    /// No default: operations fail with a configuration error when unset.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

/// Upload flow tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Delay between readiness checks after an upload completes.
    pub poll_interval_ms: u64,
    /// Readiness checks before giving up and navigating anyway.
    pub max_readiness_attempts: u32,
}

/// Where quiz and FAQ content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSourceKind {
    /// Bundled sample content.
    Static,
    /// Fetched per workspace from the backend.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub source: ContentSourceKind,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
    /// Enable mouse support in the terminal.
    pub mouse_enabled: bool,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory (logs live here).
    pub data_dir: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1500,
            max_readiness_attempts: 20,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            source: ContentSourceKind::Static,
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 50,
            mouse_enabled: false,
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then `~/.config/neura/config.toml`
    /// (or `path` when given), then `NEURA_*` environment variables.
    ///
    /// `NEURA_API_URL` is accepted as a shorthand for `NEURA_BACKEND__BASE_URL`.
    /// Returns `Default` if the layered sources fail to extract.
    pub fn load(path: Option<&Path>) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn try_load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        let config: AppConfig = Self::figment(&config_path)
            .extract()
            .map_err(|e| ConfigError::Extract {
                path: config_path.clone(),
                source: Box::new(e),
            })?;
        config.validate()?;
        log::info!("Loaded config (file: {})", config_path.display());
        Ok(config)
    }

    /// Reject a backend URL that does not parse as http(s).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(raw) = self.backend_url() else {
            return Ok(());
        };
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: raw.clone(),
            reason,
        };
        let parsed = url::Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(invalid(format!("unsupported scheme {other}"))),
        }
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("NEURA_").split("__"))
            .merge(
                Env::raw()
                    .only(&["NEURA_API_URL"])
                    .map(|_| "backend.base_url".into()),
            )
    }

    /// Effective settings in config-file form.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Backend base URL with any trailing slash removed, if configured.
    pub fn backend_url(&self) -> Option<String> {
        self.backend
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| u.trim_end_matches('/').to_string())
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("neura"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("neura").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tui.tick_rate_ms, 50);
        assert!(config.backend.base_url.is_none());
        assert_eq!(config.content.source, ContentSourceKind::Static);
        assert_eq!(config.upload.max_readiness_attempts, 20);
    }

    #[test]
    fn test_backend_url_trims_trailing_slash() {
        let mut config = AppConfig::default();
        config.backend.base_url = Some("http://localhost:8000/".to_string());
        assert_eq!(config.backend_url().as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_backend_url_blank_is_unset() {
        let mut config = AppConfig::default();
        config.backend.base_url = Some("   ".to_string());
        assert!(config.backend_url().is_none());
    }

    #[test]
    fn test_toml_file_layer() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "neura.toml",
                r#"
                [backend]
                base_url = "http://api.example.com"

                [content]
                source = "remote"
                "#,
            )?;
            let config: AppConfig = AppConfig::figment(Path::new("neura.toml")).extract()?;
            assert_eq!(config.backend_url().as_deref(), Some("http://api.example.com"));
            assert_eq!(config.content.source, ContentSourceKind::Remote);
            Ok(())
        });
    }

    #[test]
    fn test_env_alias_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("neura.toml", "[backend]\nbase_url = \"http://file\"")?;
            jail.set_env("NEURA_API_URL", "http://env:9000");
            let config: AppConfig = AppConfig::figment(Path::new("neura.toml")).extract()?;
            assert_eq!(config.backend_url().as_deref(), Some("http://env:9000"));
            Ok(())
        });
    }

    #[test]
    fn test_nested_env_vars() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NEURA_UPLOAD__MAX_READINESS_ATTEMPTS", "3");
            let config: AppConfig = AppConfig::figment(Path::new("missing.toml")).extract()?;
            assert_eq!(config.upload.max_readiness_attempts, 3);
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.backend.base_url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        config.backend.base_url = Some("ftp://files".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_try_load_reports_malformed_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[tui]\ntick_rate_ms = \"fast\"")?;
            let result = AppConfig::try_load(Some(Path::new("bad.toml")));
            assert!(matches!(result, Err(ConfigError::Extract { .. })));
            assert_eq!(AppConfig::load(Some(Path::new("bad.toml"))).tui.tick_rate_ms, 50);
            Ok(())
        });
    }

    #[test]
    fn test_printed_config_loads_back() {
        figment::Jail::expect_with(|jail| {
            let mut config = AppConfig::default();
            config.backend.base_url = Some("http://localhost:8000".to_string());
            config.content.source = ContentSourceKind::Remote;
            config.upload.poll_interval_ms = 250;

            let printed = config.to_toml().unwrap();
            assert!(printed.contains("[backend]"));
            jail.create_file("printed.toml", &printed)?;

            let loaded: AppConfig = AppConfig::figment(Path::new("printed.toml")).extract()?;
            assert_eq!(loaded.backend_url().as_deref(), Some("http://localhost:8000"));
            assert_eq!(loaded.content.source, ContentSourceKind::Remote);
            assert_eq!(loaded.upload.poll_interval_ms, 250);
            assert!(loaded.data.data_dir.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_data_dir_override() {
        let mut config = AppConfig::default();
        config.data.data_dir = Some(PathBuf::from("/tmp/custom"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/custom"));
    }
}
