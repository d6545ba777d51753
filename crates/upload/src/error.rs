//! Upload error types.

use mediasend_protocol::{Command, ProcessingState};
use mediasend_transfer::TransferError;

/// Failure class of an [`UploadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The network call itself could not be completed.
    Transport,
    /// A completed call returned a status outside 2xx.
    Protocol,
    /// A 2xx body did not have the expected shape.
    Decode,
    /// STATUS reported a terminal state other than `succeeded`.
    RemoteProcessing,
    /// STATUS stayed `in_progress` past the attempt cap.
    PollingTimeout,
    /// Local validation rejected the input before any network call.
    Precondition,
}

/// Errors produced by an upload session. Every variant is terminal.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{command} request failed: {source}")]
    Transport {
        command: Command,
        #[source]
        source: reqwest::Error,
    },

    #[error("{command} returned non-2xx status {status}: {body}")]
    Protocol {
        command: Command,
        status: u16,
        body: String,
    },

    #[error("{command} response could not be decoded: {source}")]
    Decode {
        command: Command,
        #[source]
        source: serde_json::Error,
    },

    #[error("APPEND request could not be encoded: {reason}")]
    Encode { reason: String },

    #[error("APPEND of segment {segment} failed in transport")]
    AppendTransport { segment: u32 },

    #[error("APPEND of segment {segment} returned non-2xx status {status}")]
    AppendRejected { segment: u32, status: u16 },

    #[error("APPEND of segment {segment} never reported an outcome")]
    AppendMissing { segment: u32 },

    #[error("media processing ended in state {state}: {name}: {message} (code {code})")]
    ProcessingFailed {
        state: ProcessingState,
        code: i64,
        name: String,
        message: String,
    },

    #[error("media still processing after {attempts} STATUS checks")]
    PollingTimeout { attempts: u32 },

    #[error("media is too large ({size} bytes, limit is below {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("media is empty")]
    EmptyMedia,

    #[error("no media to upload")]
    NoMedia,

    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Returns the failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::Transport { .. }
            | UploadError::Encode { .. }
            | UploadError::AppendTransport { .. }
            | UploadError::AppendMissing { .. }
            | UploadError::Io(_) => ErrorKind::Transport,
            UploadError::Protocol { .. } | UploadError::AppendRejected { .. } => {
                ErrorKind::Protocol
            }
            UploadError::Decode { .. } => ErrorKind::Decode,
            UploadError::ProcessingFailed { .. } => ErrorKind::RemoteProcessing,
            UploadError::PollingTimeout { .. } => ErrorKind::PollingTimeout,
            UploadError::TooLarge { .. }
            | UploadError::EmptyMedia
            | UploadError::NoMedia
            | UploadError::InvalidTransition { .. } => ErrorKind::Precondition,
        }
    }
}

impl From<TransferError> for UploadError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Io(e) => UploadError::Io(e),
            TransferError::EmptyMedia => UploadError::EmptyMedia,
            TransferError::TooLarge { size, limit } => UploadError::TooLarge { size, limit },
            TransferError::UnknownContentType(what) => UploadError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown content type for {what}"),
            )),
        }
    }
}
