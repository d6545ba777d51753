//! Data types shared by the scheduler, the session and the batch flow.

use std::fmt;

use mediasend_protocol::{MediaId, ProcessingState};
use tokio::sync::mpsc;

use crate::error::UploadError;

/// Status recorded for an APPEND that never produced an HTTP response.
pub const TRANSPORT_FAILURE: u16 = 0;

/// Result of one APPEND call, keyed by its segment index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub segment_index: u32,
    /// HTTP status, or [`TRANSPORT_FAILURE`].
    pub http_status: u16,
}

impl AppendOutcome {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.http_status)
    }

    /// Converts a failed outcome into its labelled error.
    pub fn check(&self) -> Result<(), UploadError> {
        if self.http_status == TRANSPORT_FAILURE {
            return Err(UploadError::AppendTransport {
                segment: self.segment_index,
            });
        }
        if !self.is_success() {
            return Err(UploadError::AppendRejected {
                segment: self.segment_index,
                status: self.http_status,
            });
        }
        Ok(())
    }
}

/// A dispatched chunk: segment index and byte length, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord {
    pub segment_index: u32,
    pub byte_length: u64,
}

/// Lifecycle of an upload session. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Initialized,
    Appending,
    Finalized,
    Processing,
    Done,
    Failed,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Initialized => "initialized",
            SessionState::Appending => "appending",
            SessionState::Finalized => "finalized",
            SessionState::Processing => "processing",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed)
    }

    /// Whether `next` is a legal forward step from `self`.
    pub fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Created, Initialized)
            | (Initialized, Appending)
            | (Appending, Finalized)
            | (Finalized, Processing)
            | (Finalized, Done)
            | (Processing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress event published while a session runs.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// INIT succeeded and the media id is bound.
    Initialized { media_id: MediaId },
    /// An APPEND task was launched.
    ChunkDispatched { segment: u32, bytes: usize },
    /// An APPEND task reported.
    ChunkCompleted { segment: u32, status: u16 },
    /// FINALIZE succeeded.
    Finalized {
        media_id: MediaId,
        needs_processing: bool,
    },
    /// STATUS reported the media is still processing.
    Processing {
        state: ProcessingState,
        progress_percent: Option<u32>,
        check_after_secs: u64,
    },
    /// The session reached `done`.
    Completed { media_id: MediaId },
    /// The session reached `failed`.
    Failed { error: String },
}

/// Best-effort event publisher; a full or closed channel drops the event.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink(Option<mpsc::Sender<UploadEvent>>);

impl EventSink {
    pub(crate) fn new(tx: Option<mpsc::Sender<UploadEvent>>) -> Self {
        Self(tx)
    }

    pub(crate) fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.try_send(event);
        }
    }
}
