use tokio::io::{AsyncRead, AsyncReadExt};

use crate::TransferError;

/// One chunk of source bytes, copied out of the reader's buffer.
///
/// The copy is owned by whoever receives it, so the reader is free to
/// overwrite its buffer with the next read while this chunk is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedChunk {
    /// Zero-based APPEND segment index.
    pub segment_index: u32,
    /// Byte offset of this chunk within the source.
    pub offset: u64,
    /// Chunk bytes.
    pub data: Vec<u8>,
    /// Set when the read hit end of input.
    pub is_last: bool,
}

impl OwnedChunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reads a source sequentially into a single reusable buffer of
/// `chunk_size` bytes and hands out owned copies.
///
/// The segment index advances only after a full read; the first short read
/// is the final chunk. An empty trailing read (source length is an exact
/// multiple of the chunk size) yields no chunk.
pub struct ChunkReader<R> {
    source: R,
    buf: Vec<u8>,
    next_index: u32,
    offset: u64,
    finished: bool,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    /// Wraps `source`. A `chunk_size` of 0 is treated as 1.
    pub fn new(source: R, chunk_size: usize) -> Self {
        Self {
            source,
            buf: vec![0u8; chunk_size.max(1)],
            next_index: 0,
            offset: 0,
            finished: false,
        }
    }

    /// Reads the next chunk. Returns `None` once the source is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<OwnedChunk>, TransferError> {
        if self.finished {
            return Ok(None);
        }

        let n = self.fill_buf().await?;
        let is_last = n < self.buf.len();
        if is_last {
            self.finished = true;
            if n == 0 {
                return Ok(None);
            }
        }

        let chunk = OwnedChunk {
            segment_index: self.next_index,
            offset: self.offset,
            data: self.buf[..n].to_vec(),
            is_last,
        };
        self.offset += n as u64;
        if !is_last {
            self.next_index += 1;
        }
        Ok(Some(chunk))
    }

    /// Total bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.offset
    }

    /// Reads until the buffer is full or the source reports EOF.
    async fn fill_buf(&mut self) -> Result<usize, TransferError> {
        let mut filled = 0;
        while filled < self.buf.len() {
            let n = self.source.read(&mut self.buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}
