use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque media identifier assigned by the remote service at INIT.
///
/// The service sends identifiers both as JSON numbers and as decimal
/// strings; either form decodes into the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId(u64);

impl MediaId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MediaId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(MediaId)
    }
}

impl From<u64> for MediaId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Serialize for MediaId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for MediaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MediaIdVisitor;

        impl Visitor<'_> for MediaIdVisitor {
            type Value = MediaId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a media id as an unsigned integer or decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MediaId, E> {
                Ok(MediaId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MediaId, E> {
                u64::try_from(v)
                    .map(MediaId)
                    .map_err(|_| E::custom(format!("negative media id: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MediaId, E> {
                v.parse()
                    .map_err(|_| E::custom(format!("invalid media id string: {v:?}")))
            }
        }

        deserializer.deserialize_any(MediaIdVisitor)
    }
}

/// Server-side processing state reported by FINALIZE and STATUS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Pending,
    InProgress,
    Succeeded,
    Failed,
    /// Any state string this client does not recognise.
    #[serde(other)]
    Unknown,
}

impl ProcessingState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingState::Pending => "pending",
            ProcessingState::InProgress => "in_progress",
            ProcessingState::Succeeded => "succeeded",
            ProcessingState::Failed => "failed",
            ProcessingState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error triple attached to a failed processing state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}
