//! Wire types for the chunked media upload endpoint.
//!
//! The endpoint multiplexes four commands (INIT, APPEND, FINALIZE, STATUS)
//! over a single URL. This crate only describes what goes over the wire;
//! it performs no I/O.

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{Command, MediaCategory};
pub use messages::{
    FinalizeProcessingInfo, FinalizeResponse, InitRequest, InitResponse, ProcessingInfo,
    StatusResponse,
};
pub use types::{MediaId, ProcessingError, ProcessingState};
