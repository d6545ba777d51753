use crate::TransferError;

/// Files of this many bytes or more are rejected before any network call.
pub const MAX_MEDIA_BYTES: u64 = 15 * 1024 * 1024;

/// Checks a declared media size against `limit`.
///
/// Rejects:
/// - Empty media (nothing to chunk)
/// - Media of `limit` bytes or more
pub fn validate_media_size(size: u64, limit: u64) -> Result<(), TransferError> {
    if size == 0 {
        return Err(TransferError::EmptyMedia);
    }
    if size >= limit {
        return Err(TransferError::TooLarge { size, limit });
    }
    Ok(())
}
