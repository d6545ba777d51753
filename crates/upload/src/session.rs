//! Upload session state machine.
//!
//! One [`UploadSession`] uploads one media item:
//!
//! ```text
//! created -> initialized -> appending -> finalized -> done
//!                                           \-> processing -> done
//! ```
//!
//! Any failure moves the session to `failed`. Sessions are never reused.

use std::sync::Arc;
use std::time::Duration;

use mediasend_protocol::{InitRequest, MediaCategory, MediaId, ProcessingInfo, ProcessingState};
use mediasend_transfer::{ChunkPlan, validate_media_size};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::scheduler::AppendScheduler;
use crate::transport::MediaTransport;
use crate::types::{ChunkRecord, EventSink, SessionState, UploadEvent};

/// Drives INIT, APPEND, FINALIZE and STATUS for one media item.
pub struct UploadSession {
    transport: Arc<dyn MediaTransport>,
    config: UploadConfig,
    events: EventSink,
    state: SessionState,
    media_id: Option<MediaId>,
    total_bytes: u64,
    content_type: String,
    media_category: Option<MediaCategory>,
    chunks: Vec<ChunkRecord>,
    needs_processing_wait: bool,
    processing_state: Option<ProcessingState>,
}

impl UploadSession {
    pub fn new(
        transport: Arc<dyn MediaTransport>,
        config: UploadConfig,
        total_bytes: u64,
        content_type: impl Into<String>,
    ) -> Self {
        let content_type = content_type.into();
        let media_category = MediaCategory::from_content_type(&content_type);
        Self {
            transport,
            config,
            events: EventSink::default(),
            state: SessionState::Created,
            media_id: None,
            total_bytes,
            content_type,
            media_category,
            chunks: Vec::new(),
            needs_processing_wait: false,
            processing_state: None,
        }
    }

    /// Publishes [`UploadEvent`]s on `tx`. Full or closed channels drop events.
    pub fn with_events(mut self, tx: mpsc::Sender<UploadEvent>) -> Self {
        self.events = EventSink::new(Some(tx));
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bound after INIT succeeds.
    pub fn media_id(&self) -> Option<MediaId> {
        self.media_id
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn media_category(&self) -> Option<MediaCategory> {
        self.media_category
    }

    /// Dispatched chunks in source order.
    pub fn chunks(&self) -> &[ChunkRecord] {
        &self.chunks
    }

    pub fn needs_processing_wait(&self) -> bool {
        self.needs_processing_wait
    }

    /// Last state observed through STATUS.
    pub fn processing_state(&self) -> Option<ProcessingState> {
        self.processing_state
    }

    /// Runs the session to a terminal state, reading media from `source`.
    ///
    /// `source` must yield exactly `total_bytes` bytes.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, source: R) -> Result<MediaId, UploadError> {
        if self.state != SessionState::Created {
            return Err(UploadError::InvalidTransition {
                from: self.state.name(),
                to: SessionState::Initialized.name(),
            });
        }

        match self.drive(source).await {
            Ok(media_id) => Ok(media_id),
            Err(e) => {
                error!(
                    media_id = ?self.media_id,
                    stage = %self.state,
                    kind = ?e.kind(),
                    "upload failed: {e}"
                );
                self.state = SessionState::Failed;
                self.events.emit(UploadEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn drive<R: AsyncRead + Unpin>(&mut self, source: R) -> Result<MediaId, UploadError> {
        validate_media_size(self.total_bytes, self.config.max_media_bytes)?;
        let plan = ChunkPlan::new(self.total_bytes);

        let request = InitRequest::new(self.total_bytes, self.content_type.clone());
        let init = self.transport.init(request).await?;
        let media_id = init.media_id;
        self.media_id = Some(media_id);
        self.advance(SessionState::Initialized)?;
        info!(
            %media_id,
            total_bytes = self.total_bytes,
            content_type = %self.content_type,
            chunk_size = plan.chunk_size(),
            chunks = plan.chunk_count(),
            "upload initialized"
        );
        self.events.emit(UploadEvent::Initialized { media_id });

        self.advance(SessionState::Appending)?;
        let chunk_size = usize::try_from(plan.chunk_size()).unwrap_or(usize::MAX);
        let mut report = AppendScheduler::new(
            Arc::clone(&self.transport),
            self.config.chunk_launch_delay(),
        )
        .with_events(self.events.clone())
        .run(media_id, source, chunk_size)
        .await;
        self.chunks = std::mem::take(&mut report.chunks);
        let bytes_read = report.bytes_read;
        report.verdict()?;

        let matches_plan = plan
            .segments()
            .eq(self.chunks.iter().map(|c| (c.segment_index, c.byte_length)));
        if !matches_plan {
            warn!(
                %media_id,
                declared = self.total_bytes,
                read = bytes_read,
                planned_chunks = plan.chunk_count(),
                sent_chunks = self.chunks.len(),
                "source length differs from declared size"
            );
        }
        debug!(%media_id, chunks = self.chunks.len(), "all chunks appended");

        let finalize = self.transport.finalize(media_id).await?;
        self.advance(SessionState::Finalized)?;
        self.needs_processing_wait = finalize.needs_processing_wait();
        self.events.emit(UploadEvent::Finalized {
            media_id,
            needs_processing: self.needs_processing_wait,
        });

        if self.needs_processing_wait {
            self.advance(SessionState::Processing)?;
            info!(%media_id, "waiting for media processing");
            self.poll(media_id).await?;
        }

        self.advance(SessionState::Done)?;
        info!(%media_id, "upload complete");
        self.events.emit(UploadEvent::Completed { media_id });
        Ok(media_id)
    }

    /// Polls STATUS until it leaves `in_progress`, at most
    /// `status_check_cap` times.
    async fn poll(&mut self, media_id: MediaId) -> Result<(), UploadError> {
        let cap = self.config.status_check_cap;
        let mut attempts = 0;

        while attempts < cap {
            attempts += 1;
            debug!(%media_id, attempt = attempts, cap, "checking processing status");
            let status = self.transport.status(media_id).await?;
            let info = status.processing_info;
            self.processing_state = Some(info.state);

            if info.state != ProcessingState::InProgress {
                return check_processing(info);
            }

            let wait = info
                .check_after_secs
                .unwrap_or(self.config.default_check_after_secs);
            self.events.emit(UploadEvent::Processing {
                state: info.state,
                progress_percent: info.progress_percent,
                check_after_secs: wait,
            });
            info!(
                %media_id,
                progress = info.progress_percent.unwrap_or(0),
                check_after_secs = wait,
                "media still processing"
            );

            if attempts < cap {
                tokio::time::sleep(Duration::from_secs(wait)).await;
            }
        }

        Err(UploadError::PollingTimeout { attempts })
    }

    fn advance(&mut self, next: SessionState) -> Result<(), UploadError> {
        if !self.state.can_advance_to(next) {
            return Err(UploadError::InvalidTransition {
                from: self.state.name(),
                to: next.name(),
            });
        }
        self.state = next;
        Ok(())
    }
}

/// Only `succeeded` counts as success.
fn check_processing(info: ProcessingInfo) -> Result<(), UploadError> {
    if info.state == ProcessingState::Succeeded {
        return Ok(());
    }
    let err = info.error.unwrap_or_default();
    Err(UploadError::ProcessingFailed {
        state: info.state,
        code: err.code,
        name: err.name,
        message: err.message,
    })
}
