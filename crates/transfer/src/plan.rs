//! Chunk size planning.
//!
//! Each chunk is 30% of the whole, which keeps every APPEND far below the
//! per-chunk ceiling of the endpoint for any accepted file size.

/// Chunk size as a fraction of the total: 3/10.
const CHUNK_FRACTION_NUMERATOR: u64 = 3;
const CHUNK_FRACTION_DENOMINATOR: u64 = 10;

/// Returns `floor(total_bytes * 0.30)`, clamped to at least 1 byte for
/// non-empty inputs. Zero stays zero; callers reject empty media upstream.
pub fn plan_chunk_size(total_bytes: u64) -> u64 {
    if total_bytes == 0 {
        return 0;
    }
    (total_bytes * CHUNK_FRACTION_NUMERATOR / CHUNK_FRACTION_DENOMINATOR).max(1)
}

/// Fixed-size chunk layout for one media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    total_bytes: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            chunk_size: plan_chunk_size(total_bytes),
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Number of chunks implied by the chunk size (ceiling division).
    pub fn chunk_count(&self) -> u64 {
        if self.chunk_size == 0 {
            return 0;
        }
        self.total_bytes.div_ceil(self.chunk_size)
    }

    /// Yields `(segment_index, byte_length)` for every planned chunk, in order.
    pub fn segments(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        (0..self.chunk_count()).map(move |i| {
            let start = i * self.chunk_size;
            let len = self.chunk_size.min(self.total_bytes - start);
            (i as u32, len)
        })
    }
}
