//! Chunked media upload client.
//!
//! An [`UploadSession`] takes one media item through the upload protocol:
//! INIT declares the size and type, the [`AppendScheduler`] sends the
//! chunks concurrently, FINALIZE closes the upload and, when the service
//! processes media asynchronously, STATUS is polled until it settles.
//! [`MediaBatch`] runs one session per file for a list of paths.
//!
//! Network access goes through the [`MediaTransport`] trait;
//! [`HttpTransport`] is the reqwest-backed implementation.

pub mod batch;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod scheduler;
pub mod session;
pub mod task_group;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use batch::{MediaBatch, is_special_media};
pub use config::UploadConfig;
pub use error::{ErrorKind, UploadError};
pub use http::HttpTransport;
pub use scheduler::{AppendReport, AppendScheduler};
pub use session::UploadSession;
pub use task_group::{GroupResults, TaskGroup};
pub use transport::{MediaTransport, TransportFuture};
pub use types::{AppendOutcome, ChunkRecord, SessionState, UploadEvent};
