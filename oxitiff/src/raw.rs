//! Raw I/O buffer shared by the orchestration layer and the codecs.
//!
//! On read it holds the compressed bytes of the current strip or tile with a
//! cursor marking how far the codec has consumed them. On write it collects
//! encoded output until it reaches its limit and is appended to the store.
//! The two sides use separate storage, so reading a strip back never
//! disturbs output that is still pending.

use oxitiff_core::Result;
use oxitiff_core::bits::round_up_usize;

/// Growth granularity of the read buffer.
pub const GRANULARITY: usize = 1024;

/// Smallest write buffer.
pub const MIN_WRITE_SIZE: usize = 8192;

/// Growable byte buffer with a read cursor and a write limit.
#[derive(Debug, Default)]
pub struct RawBuffer {
    data: Vec<u8>,
    cursor: usize,
    size: usize,
    out: Vec<u8>,
    limit: usize,
}

impl RawBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current read capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    // -- Read side ------------------------------------------------------

    /// Make room for a `len`-byte strip or tile. Never shrinks.
    pub fn reserve_for_read(&mut self, len: usize) -> Result<()> {
        if len > self.data.len() {
            let grown = round_up_usize(len, GRANULARITY)?;
            tracing::debug!(from = self.data.len(), to = grown, "growing raw read buffer");
            self.data.resize(grown, 0);
        }
        Ok(())
    }

    /// Prepare to hold exactly `len` compressed bytes and return the slice
    /// to fill. The cursor is reset.
    pub fn load(&mut self, len: usize) -> Result<&mut [u8]> {
        self.reserve_for_read(len)?;
        self.cursor = 0;
        self.size = len;
        Ok(&mut self.data[..len])
    }

    /// Bytes not yet consumed by the codec.
    pub fn unread(&self) -> &[u8] {
        &self.data[self.cursor..self.size]
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.size - self.cursor
    }

    /// Mark `n` bytes as consumed.
    pub fn consume(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.size);
    }

    /// Move the cursor back to the start of the loaded data.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Whole loaded strip or tile.
    pub fn loaded(&self) -> &[u8] {
        &self.data[..self.size]
    }

    // -- Write side -----------------------------------------------------

    /// Switch to writing with room for at least `size` bytes
    /// (never less than [`MIN_WRITE_SIZE`]). Pending output is discarded.
    pub fn setup_write(&mut self, size: usize) -> Result<()> {
        let want = round_up_usize(size.max(MIN_WRITE_SIZE), GRANULARITY)?;
        if want > self.limit {
            tracing::debug!(from = self.limit, to = want, "growing raw write buffer");
            self.limit = want;
        }
        self.out.clear();
        self.out.reserve(self.limit);
        Ok(())
    }

    /// Whether a write buffer has been set up.
    pub fn is_write_ready(&self) -> bool {
        self.limit != 0
    }

    /// Pending encoded output. Codecs append here.
    pub fn output(&mut self) -> &mut Vec<u8> {
        &mut self.out
    }

    /// Pending output length.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Whether there is no pending output.
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Flush threshold.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether pending output reached the flush threshold.
    pub fn is_full(&self) -> bool {
        self.out.len() >= self.limit
    }

    /// Drop pending output.
    pub fn clear(&mut self) {
        self.out.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_growth_is_rounded() {
        let mut raw = RawBuffer::new();
        raw.load(10).unwrap().copy_from_slice(&[7; 10]);
        assert_eq!(raw.remaining(), 10);
        raw.reserve_for_read(1500).unwrap();
        assert_eq!(raw.capacity(), 2048);
        // Smaller requests never shrink
        raw.reserve_for_read(5).unwrap();
        assert_eq!(raw.capacity(), 2048);
    }

    #[test]
    fn test_cursor() {
        let mut raw = RawBuffer::new();
        raw.load(4).unwrap().copy_from_slice(&[1, 2, 3, 4]);
        raw.consume(3);
        assert_eq!(raw.unread(), &[4]);
        raw.consume(10);
        assert_eq!(raw.remaining(), 0);
        raw.rewind();
        assert_eq!(raw.unread(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_write_limit() {
        let mut raw = RawBuffer::new();
        assert!(!raw.is_write_ready());
        raw.setup_write(100).unwrap();
        assert_eq!(raw.limit(), MIN_WRITE_SIZE);
        raw.setup_write(20_000).unwrap();
        assert_eq!(raw.limit(), 20_480);
        raw.setup_write(100).unwrap();
        assert_eq!(raw.limit(), 20_480);

        raw.output().extend_from_slice(&[0; 20_480]);
        assert!(raw.is_full());
        // Loading a strip for reading leaves pending output alone
        raw.load(16).unwrap();
        assert_eq!(raw.len(), 20_480);
        raw.clear();
        assert!(raw.is_empty());
    }
}
