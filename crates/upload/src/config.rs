//! Upload tunables.
//!
//! Every knob that the session would otherwise read from a process-wide
//! constant lives here, so tests can shrink caps and zero the pacing delay.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default upload host.
pub const DEFAULT_BASE_URL: &str = "https://upload.twitter.com";

/// Path of the upload endpoint on [`DEFAULT_BASE_URL`].
pub const DEFAULT_UPLOAD_PATH: &str = "/1.1/media/upload.json";

/// Upload session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Scheme and host of the upload service.
    pub base_url: String,

    /// Path of the single upload endpoint.
    pub upload_path: String,

    /// Media of this many bytes or more is rejected before INIT.
    pub max_media_bytes: u64,

    /// Maximum number of STATUS calls while processing is in progress.
    pub status_check_cap: u32,

    /// Pause between launching consecutive non-final APPEND tasks.
    ///
    /// Launching chunk uploads back to back has been observed to make the
    /// service record malformed chunk boundaries.
    pub chunk_launch_delay_ms: u64,

    /// Wait used when a STATUS response omits `check_after_secs`.
    pub default_check_after_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            max_media_bytes: mediasend_transfer::MAX_MEDIA_BYTES,
            status_check_cap: 10,
            chunk_launch_delay_ms: 25,
            default_check_after_secs: 1,
        }
    }
}

impl UploadConfig {
    /// Full URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.upload_path.trim_start_matches('/')
        )
    }

    pub fn chunk_launch_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_launch_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = UploadConfig::default();
        assert_eq!(
            config.upload_url(),
            "https://upload.twitter.com/1.1/media/upload.json"
        );
        assert_eq!(config.max_media_bytes, 15 * 1024 * 1024);
        assert_eq!(config.status_check_cap, 10);
        assert_eq!(config.chunk_launch_delay(), Duration::from_millis(25));
        assert_eq!(config.default_check_after_secs, 1);
    }

    #[test]
    fn upload_url_joins_slashes() {
        let config = UploadConfig {
            base_url: "http://127.0.0.1:8080/".into(),
            upload_path: "/upload".into(),
            ..UploadConfig::default()
        };
        assert_eq!(config.upload_url(), "http://127.0.0.1:8080/upload");
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: UploadConfig =
            serde_json::from_str(r#"{"status_check_cap":3,"chunk_launch_delay_ms":0}"#).unwrap();
        assert_eq!(config.status_check_cap, 3);
        assert_eq!(config.chunk_launch_delay(), Duration::ZERO);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
