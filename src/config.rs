//! Configuration file parser for ~/.config/pressdesk/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as a warning so typos show
//! up in the log file.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default remote API root.
pub const DEFAULT_API_BASE: &str = "https://geek.itheima.net/v1_0";

/// Environment variable that overrides `api_base_url`.
pub const API_BASE_ENV: &str = "PRESSDESK_API_BASE";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root URL of the remote API, without trailing slash.
    pub api_base_url: String,

    /// Articles requested per page.
    pub per_page: u32,

    /// Maximum size of a cover image file in bytes.
    pub cover_max_bytes: u64,

    /// Delay between a successful login and the switch to the article list.
    pub login_redirect_ms: u64,

    /// Delay between a successful publish/update and the switch to the list.
    pub publish_redirect_ms: u64,

    /// Ask before deleting an article.
    pub confirm_delete: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            per_page: 10,
            cover_max_bytes: 5 * 1024 * 1024,
            login_redirect_ms: 1000,
            publish_redirect_ms: 2000,
            confirm_delete: true,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "api_base_url",
        "per_page",
        "cover_max_bytes",
        "login_redirect_ms",
        "publish_redirect_ms",
        "confirm_delete",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(&content)?;
        if config.per_page == 0 {
            tracing::warn!("per_page = 0 is not usable, falling back to 10");
            config.per_page = 10;
        }
        tracing::info!(
            path = %path.display(),
            api_base_url = %config.api_base_url,
            per_page = config.per_page,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Pick the effective API base: CLI flag, then env var, then config file.
    pub fn resolve_api_base(&mut self, cli_override: Option<&str>, env_value: Option<String>) {
        if let Some(url) = cli_override {
            self.api_base_url = url.to_string();
        } else if let Some(url) = env_value.filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        while self.api_base_url.ends_with('/') {
            self.api_base_url.pop();
        }
    }

    pub fn login_redirect(&self) -> Duration {
        Duration::from_millis(self.login_redirect_ms)
    }

    pub fn publish_redirect(&self) -> Duration {
        Duration::from_millis(self.publish_redirect_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
