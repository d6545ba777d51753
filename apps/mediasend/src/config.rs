//! Command-line configuration.
//!
//! Stored as TOML:
//! - Linux: `~/.config/mediasend/config.toml`
//! - Windows: `%APPDATA%/mediasend/config.toml`
//!
//! ```toml
//! token_env = "MEDIASEND_BEARER_TOKEN"
//!
//! [upload]
//! base_url = "https://upload.twitter.com"
//! status_check_cap = 10
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use mediasend_upload::UploadConfig;
use serde::{Deserialize, Serialize};

/// Environment variable holding the bearer token unless overridden.
pub const DEFAULT_TOKEN_ENV: &str = "MEDIASEND_BEARER_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the environment variable that holds the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Upload session settings.
    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            upload: UploadConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the platform config file when `path` is `None`.
    ///
    /// An explicit path must exist; a missing platform file yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = config_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Reads the bearer token from the configured environment variable.
    pub fn bearer_token(&self) -> anyhow::Result<String> {
        let token = std::env::var(&self.token_env)
            .with_context(|| format!("environment variable {} is not set", self.token_env))?;
        anyhow::ensure!(!token.trim().is_empty(), "{} is empty", self.token_env);
        Ok(token.trim().to_string())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("mediasend").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let base = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
                PathBuf::from(home).join(".config")
            });
        base.join("mediasend").join("config.toml")
    }
}
