//! Scripted in-memory transport for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;

use mediasend_protocol::{
    Command, FinalizeProcessingInfo, FinalizeResponse, InitRequest, InitResponse, MediaId,
    ProcessingError, ProcessingInfo, ProcessingState, StatusResponse,
};

use tokio::io::{AsyncRead, ReadBuf};

use crate::error::UploadError;
use crate::transport::{MediaTransport, TransportFuture};

type DelayFn = Box<dyn Fn(u32) -> Duration + Send + Sync>;

#[derive(Default)]
struct Calls {
    inits: Vec<InitRequest>,
    appends: Vec<(MediaId, u32, Vec<u8>)>,
    finalizes: Vec<MediaId>,
    statuses: Vec<MediaId>,
}

/// Records every call and answers from a script.
pub(crate) struct ScriptedTransport {
    media_id: MediaId,
    init_status: Option<u16>,
    append_status: HashMap<u32, u16>,
    append_encode_failures: HashSet<u32>,
    append_delay: Option<DelayFn>,
    finalize_status: Option<u16>,
    status_status: Option<u16>,
    finalize_processing: Option<FinalizeProcessingInfo>,
    statuses: Mutex<VecDeque<ProcessingInfo>>,
    calls: Mutex<Calls>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            media_id: MediaId::new(1),
            init_status: None,
            append_status: HashMap::new(),
            append_encode_failures: HashSet::new(),
            append_delay: None,
            finalize_status: None,
            status_status: None,
            finalize_processing: None,
            statuses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub(crate) fn with_media_id(mut self, id: u64) -> Self {
        self.media_id = MediaId::new(id);
        self
    }

    /// INIT answers with a non-2xx status.
    pub(crate) fn with_init_status(mut self, status: u16) -> Self {
        self.init_status = Some(status);
        self
    }

    pub(crate) fn with_append_status(mut self, segment: u32, status: u16) -> Self {
        self.append_status.insert(segment, status);
        self
    }

    /// APPEND of `segment` never completes: the call fails while building
    /// the request, as an encode failure, before any HTTP status exists.
    pub(crate) fn with_append_encode_failure(mut self, segment: u32) -> Self {
        self.append_encode_failures.insert(segment);
        self
    }

    /// FINALIZE answers with a non-2xx status.
    pub(crate) fn with_finalize_status(mut self, status: u16) -> Self {
        self.finalize_status = Some(status);
        self
    }

    /// STATUS answers with a non-2xx status.
    pub(crate) fn with_status_status(mut self, status: u16) -> Self {
        self.status_status = Some(status);
        self
    }

    pub(crate) fn with_append_delay(
        mut self,
        delay: impl Fn(u32) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.append_delay = Some(Box::new(delay));
        self
    }

    /// FINALIZE reports processing in `state`.
    pub(crate) fn with_processing(mut self, state: ProcessingState, check_after: Option<u64>) -> Self {
        self.finalize_processing = Some(FinalizeProcessingInfo {
            state,
            check_after_secs: check_after,
        });
        self
    }

    /// Queues STATUS answers. The last one repeats once the queue drains.
    pub(crate) fn with_statuses(self, script: impl IntoIterator<Item = ProcessingInfo>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .extend(script);
        self
    }

    pub(crate) fn inits(&self) -> Vec<InitRequest> {
        self.calls.lock().unwrap().inits.clone()
    }

    pub(crate) fn appends(&self) -> Vec<(MediaId, u32, Vec<u8>)> {
        self.calls.lock().unwrap().appends.clone()
    }

    pub(crate) fn finalizes(&self) -> Vec<MediaId> {
        self.calls.lock().unwrap().finalizes.clone()
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.calls.lock().unwrap().statuses.len()
    }

    pub(crate) fn total_calls(&self) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.inits.len() + calls.appends.len() + calls.finalizes.len() + calls.statuses.len()
    }
}

/// A STATUS payload in `state`.
pub(crate) fn processing(state: ProcessingState, check_after: Option<u64>) -> ProcessingInfo {
    ProcessingInfo {
        state,
        progress_percent: None,
        check_after_secs: check_after,
        error: None,
    }
}

/// A `failed` STATUS payload carrying an error triple.
pub(crate) fn processing_failed(code: i64, name: &str, message: &str) -> ProcessingInfo {
    ProcessingInfo {
        state: ProcessingState::Failed,
        progress_percent: None,
        check_after_secs: None,
        error: Some(ProcessingError {
            code,
            name: name.to_string(),
            message: message.to_string(),
        }),
    }
}

impl MediaTransport for ScriptedTransport {
    fn init(&self, request: InitRequest) -> TransportFuture<'_, InitResponse> {
        Box::pin(async move {
            self.calls.lock().unwrap().inits.push(request);
            if let Some(status) = self.init_status {
                return Err(UploadError::Protocol {
                    command: Command::Init,
                    status,
                    body: "{\"errors\":[]}".into(),
                });
            }
            Ok(InitResponse {
                media_id: self.media_id,
                media_id_string: Some(self.media_id.to_string()),
                expires_after_secs: Some(86_400),
            })
        })
    }

    fn append(
        &self,
        media_id: MediaId,
        segment_index: u32,
        chunk: Vec<u8>,
    ) -> TransportFuture<'_, u16> {
        Box::pin(async move {
            if let Some(delay) = &self.append_delay {
                tokio::time::sleep(delay(segment_index)).await;
            }
            self.calls
                .lock()
                .unwrap()
                .appends
                .push((media_id, segment_index, chunk));
            if self.append_encode_failures.contains(&segment_index) {
                return Err(UploadError::Encode {
                    reason: "chunk could not be encoded".into(),
                });
            }
            Ok(self.append_status.get(&segment_index).copied().unwrap_or(204))
        })
    }

    fn finalize(&self, media_id: MediaId) -> TransportFuture<'_, FinalizeResponse> {
        Box::pin(async move {
            self.calls.lock().unwrap().finalizes.push(media_id);
            if let Some(status) = self.finalize_status {
                return Err(UploadError::Protocol {
                    command: Command::Finalize,
                    status,
                    body: "{\"errors\":[]}".into(),
                });
            }
            Ok(FinalizeResponse {
                media_id,
                media_id_string: Some(media_id.to_string()),
                expires_after_secs: 86_400,
                size: 0,
                processing_info: self.finalize_processing.clone(),
            })
        })
    }

    fn status(&self, media_id: MediaId) -> TransportFuture<'_, StatusResponse> {
        Box::pin(async move {
            self.calls.lock().unwrap().statuses.push(media_id);
            if let Some(status) = self.status_status {
                return Err(UploadError::Protocol {
                    command: Command::Status,
                    status,
                    body: "{\"errors\":[]}".into(),
                });
            }
            let mut script = self.statuses.lock().unwrap();
            let info = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            };
            let info = info.unwrap_or_else(|| processing(ProcessingState::Succeeded, None));
            Ok(StatusResponse {
                media_id,
                media_id_string: None,
                processing_info: info,
            })
        })
    }
}

/// Serves `data` until `fail_at` bytes have been read, then fails with
/// "disk gone".
pub(crate) struct FailingReader {
    data: Vec<u8>,
    pos: usize,
    fail_at: usize,
}

impl FailingReader {
    pub(crate) fn new(data: Vec<u8>, fail_at: usize) -> Self {
        Self {
            data,
            pos: 0,
            fail_at,
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.pos >= self.fail_at {
            return Poll::Ready(Err(io::Error::other("disk gone")));
        }
        let end = self.fail_at.min(self.data.len());
        let n = buf.remaining().min(end - self.pos);
        let start = self.pos;
        buf.put_slice(&self.data[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}
