use std::fmt;

use serde::{Deserialize, Serialize};

/// Form/query field that selects the command on the shared endpoint.
pub const COMMAND_FIELD: &str = "command";

/// Multipart field name carrying APPEND chunk bytes.
pub const MEDIA_FIELD: &str = "media";

/// Upload command discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    #[serde(rename = "INIT")]
    Init,
    #[serde(rename = "APPEND")]
    Append,
    #[serde(rename = "FINALIZE")]
    Finalize,
    #[serde(rename = "STATUS")]
    Status,
}

impl Command {
    /// Returns the wire spelling of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Init => "INIT",
            Command::Append => "APPEND",
            Command::Finalize => "FINALIZE",
            Command::Status => "STATUS",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media use-case tag sent with INIT; controls remote processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaCategory {
    #[serde(rename = "tweet_image")]
    Image,
    #[serde(rename = "tweet_gif")]
    Gif,
    #[serde(rename = "tweet_video")]
    Video,
}

impl MediaCategory {
    /// Derives the category from a declared MIME type.
    ///
    /// Exact image types are matched first; any type containing `video`
    /// then wins regardless. Everything else is left unset and the remote
    /// service decides.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let exact = match content_type {
            "image/png" | "image/jpg" | "image/jpeg" | "image/webp" => Some(MediaCategory::Image),
            "image/gif" => Some(MediaCategory::Gif),
            _ => None,
        };
        if content_type.contains("video") {
            return Some(MediaCategory::Video);
        }
        exact
    }

    /// Returns the wire spelling of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::Image => "tweet_image",
            MediaCategory::Gif => "tweet_gif",
            MediaCategory::Video => "tweet_video",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
