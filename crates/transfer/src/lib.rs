//! Local side of a chunked media upload: how big the chunks are, how they
//! are read off the source, and what kind of media the source holds.

mod chunked;
mod content_type;
mod plan;
mod validation;

pub use chunked::{ChunkReader, OwnedChunk};
pub use content_type::{FALLBACK_CONTENT_TYPE, SNIFF_LEN, detect_content_type, sniff_content_type};
pub use plan::{ChunkPlan, plan_chunk_size};
pub use validation::{MAX_MEDIA_BYTES, validate_media_size};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("media is empty")]
    EmptyMedia,

    #[error("media is too large ({size} bytes, limit is below {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("could not determine content type for {0}")]
    UnknownContentType(String),
}
