//! Transport seam between the session and the upload endpoint.
//!
//! [`HttpTransport`](crate::http::HttpTransport) is the production
//! implementation. Keeping the seam as a trait lets the scheduler and the
//! state machine run against scripted fakes.

use std::future::Future;
use std::pin::Pin;

use mediasend_protocol::{FinalizeResponse, InitRequest, InitResponse, MediaId, StatusResponse};

use crate::error::UploadError;

/// Boxed future returned by [`MediaTransport`] calls.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// One HTTP call per protocol command.
pub trait MediaTransport: Send + Sync {
    /// INIT: declares size and type, returns the assigned media id.
    fn init(&self, request: InitRequest) -> TransportFuture<'_, InitResponse>;

    /// APPEND: uploads one chunk. Resolves to the HTTP status of a
    /// completed call, whether 2xx or not; `Err` means the call never
    /// completed (encoding or transport failure).
    fn append(
        &self,
        media_id: MediaId,
        segment_index: u32,
        chunk: Vec<u8>,
    ) -> TransportFuture<'_, u16>;

    /// FINALIZE: closes the upload.
    fn finalize(&self, media_id: MediaId) -> TransportFuture<'_, FinalizeResponse>;

    /// STATUS: snapshots asynchronous processing.
    fn status(&self, media_id: MediaId) -> TransportFuture<'_, StatusResponse>;
}
