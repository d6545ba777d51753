//! Concurrent APPEND dispatch.
//!
//! A single producer loop reads the source chunk by chunk and launches one
//! APPEND task per chunk. Every launched task runs to completion: a failing
//! chunk neither cancels its siblings nor stops later chunks from being
//! launched, it only makes the verdict a failure.

use std::sync::Arc;
use std::time::Duration;

use mediasend_protocol::MediaId;
use mediasend_transfer::ChunkReader;
use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::error::UploadError;
use crate::task_group::TaskGroup;
use crate::transport::MediaTransport;
use crate::types::{AppendOutcome, ChunkRecord, EventSink, TRANSPORT_FAILURE, UploadEvent};

/// What the APPEND phase produced.
#[derive(Debug, Default)]
pub struct AppendReport {
    /// Dispatched chunks in source order.
    pub chunks: Vec<ChunkRecord>,
    /// Per-chunk outcomes in completion order.
    pub outcomes: Vec<AppendOutcome>,
    /// Segments whose task never reported.
    pub missing: Vec<u32>,
    /// Bytes read from the source.
    pub bytes_read: u64,
    /// Source read failure that stopped further launches.
    pub read_error: Option<UploadError>,
}

impl AppendReport {
    /// Pass/fail verdict over every outcome.
    ///
    /// A read error wins; otherwise the first failing outcome in completion
    /// order decides the error.
    pub fn verdict(self) -> Result<(), UploadError> {
        if let Some(e) = self.read_error {
            return Err(e);
        }
        for outcome in &self.outcomes {
            outcome.check()?;
        }
        if let Some(&segment) = self.missing.first() {
            return Err(UploadError::AppendMissing { segment });
        }
        Ok(())
    }
}

/// Launches one APPEND task per chunk of a source.
pub struct AppendScheduler {
    transport: Arc<dyn MediaTransport>,
    launch_delay: Duration,
    events: EventSink,
}

impl AppendScheduler {
    pub fn new(transport: Arc<dyn MediaTransport>, launch_delay: Duration) -> Self {
        Self {
            transport,
            launch_delay,
            events: EventSink::default(),
        }
    }

    pub(crate) fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Uploads `source` in `chunk_size` pieces under `media_id`.
    ///
    /// Returns after every launched task has reported. A read error stops
    /// further launches and is carried in the report next to the chunks
    /// already sent.
    pub async fn run<R: AsyncRead + Unpin>(
        &self,
        media_id: MediaId,
        source: R,
        chunk_size: usize,
    ) -> AppendReport {
        let mut reader = ChunkReader::new(source, chunk_size);
        let mut group: TaskGroup<u32, u16> = TaskGroup::new();
        let mut chunks = Vec::new();

        let read_result = loop {
            let chunk = match reader.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            };

            let segment = chunk.segment_index;
            let is_last = chunk.is_last;
            debug!(%media_id, segment, bytes = chunk.len(), is_last, "dispatching chunk");

            chunks.push(ChunkRecord {
                segment_index: segment,
                byte_length: chunk.len() as u64,
            });
            self.events.emit(UploadEvent::ChunkDispatched {
                segment,
                bytes: chunk.len(),
            });

            let transport = Arc::clone(&self.transport);
            let events = self.events.clone();
            group.spawn(segment, async move {
                let status = match transport.append(media_id, segment, chunk.data).await {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(%media_id, segment, error = %e, "append failed");
                        TRANSPORT_FAILURE
                    }
                };
                events.emit(UploadEvent::ChunkCompleted { segment, status });
                status
            });

            if is_last {
                break Ok(());
            }
            if !self.launch_delay.is_zero() {
                tokio::time::sleep(self.launch_delay).await;
            }
        };

        let results = group.join().await;
        if let Err(e) = &read_result {
            warn!(%media_id, launched = chunks.len(), error = %e, "source read failed");
        }

        let outcomes = results
            .arrivals
            .into_iter()
            .map(|(segment_index, http_status)| {
                debug!(%media_id, segment = segment_index, status = http_status, "chunk done");
                AppendOutcome {
                    segment_index,
                    http_status,
                }
            })
            .collect();

        AppendReport {
            chunks,
            outcomes,
            missing: results.missing,
            bytes_read: reader.bytes_read(),
            read_error: read_result.err().map(UploadError::from),
        }
    }
}
