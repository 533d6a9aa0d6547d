//! LZW decoder code table.
//!
//! Each entry stores a back-pointer to its prefix, the total string length,
//! its last byte and a cache of its first byte. Strings are therefore
//! written back to front by following the prefix chain, and no entry ever
//! owns a heap allocation.

use crate::config::{CODE_CLEAR, CODE_FIRST, LzwConfig};
use crate::error::{LzwError, Result};

/// Marker for "no prefix" in the chain.
const NO_PREFIX: u16 = u16::MAX;

#[derive(Debug, Clone, Copy)]
struct Entry {
    prefix: u16,
    length: u16,
    value: u8,
    first: u8,
}

impl Entry {
    const EMPTY: Self = Self {
        prefix: NO_PREFIX,
        length: 0,
        value: 0,
        first: 0,
    };
}

/// Code table for the decoder.
#[derive(Debug)]
pub struct CodeTable {
    entries: Vec<Entry>,
    /// Next slot to be assigned.
    free: u16,
}

impl CodeTable {
    /// Create a table sized for the given configuration.
    pub fn new(config: &LzwConfig) -> Self {
        let mut entries = vec![Entry::EMPTY; config.table_size()];
        for (code, entry) in entries.iter_mut().take(CODE_CLEAR as usize).enumerate() {
            *entry = Entry {
                prefix: NO_PREFIX,
                length: 1,
                value: code as u8,
                first: code as u8,
            };
        }
        Self {
            entries,
            free: CODE_FIRST,
        }
    }

    /// Forget every multi-byte string.
    pub fn reset(&mut self) {
        for entry in self.entries.iter_mut().skip(CODE_FIRST as usize) {
            *entry = Entry::EMPTY;
        }
        self.free = CODE_FIRST;
    }

    /// Next code that will be assigned.
    #[inline]
    pub fn next_free(&self) -> u16 {
        self.free
    }

    /// Length of the string for `code` (0 for unassigned slots).
    #[inline]
    pub fn length(&self, code: u16) -> usize {
        self.entries
            .get(code as usize)
            .map_or(0, |entry| entry.length as usize)
    }

    /// Append the string `prefix + first_byte(code)` as the next entry.
    ///
    /// When `code` is the slot being created (the KwKwK case) the new
    /// string ends in its own first byte.
    pub fn add(&mut self, prefix: u16, code: u16) -> Result<u16> {
        let slot = self.free as usize;
        if slot >= self.entries.len() {
            return Err(LzwError::TableOverflow(slot));
        }
        let head = *self
            .entries
            .get(prefix as usize)
            .ok_or(LzwError::InvalidCode {
                code: prefix,
                next_free: self.free,
            })?;
        let value = if code < self.free {
            self.entries[code as usize].first
        } else {
            head.first
        };
        self.entries[slot] = Entry {
            prefix,
            length: head.length.saturating_add(1),
            value,
            first: head.first,
        };
        self.free += 1;
        Ok(self.free)
    }

    /// Write bytes `[skip, skip + out.len())` of the string for `code`.
    ///
    /// The chain is walked from the last byte backwards, so a request for
    /// the head of a long string still visits its tail first. A chain that
    /// ends before reaching `skip` means the table is corrupt.
    pub fn copy_range(&self, code: u16, skip: usize, out: &mut [u8]) -> Result<()> {
        let length = self.length(code);
        let end = skip + out.len();
        if length == 0 {
            return Err(LzwError::ZeroLength(code));
        }
        if end > length {
            return Err(LzwError::CodeLoop(code));
        }
        if out.is_empty() {
            return Ok(());
        }
        let mut index = code;
        let mut pos = length;
        loop {
            let entry = self.entries[index as usize];
            pos -= 1;
            if pos < end {
                out[pos - skip] = entry.value;
            }
            if pos == skip {
                return Ok(());
            }
            if entry.prefix == NO_PREFIX {
                return Err(LzwError::CodeLoop(code));
            }
            index = entry.prefix;
        }
    }
}
