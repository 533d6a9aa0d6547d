//! LZW encoder (compression).
//!
//! The encoder is streaming: a strip is started with [`LzwEncoder::begin`],
//! fed through any number of [`LzwEncoder::encode`] calls and closed with
//! [`LzwEncoder::finish`]. Each `encode` call stops early once the output
//! grows past the caller's limit so that the caller can flush it.

use crate::bitstream_msb::CodeWriter;
use crate::config::{BITS_MIN, CODE_CLEAR, CODE_EOI, CODE_FIRST, LzwConfig, max_code};
use crate::error::Result;

/// Size of the string hash table; prime, about 110% of 8192.
const HSIZE: usize = 9001;

/// Shift for the primary hash.
const HSHIFT: u32 = 13 - 8;

/// Empty hash slot.
const EMPTY: i32 = -1;

/// LZW encoder for compression.
#[derive(Debug)]
pub struct LzwEncoder {
    config: LzwConfig,
    /// `(byte << 12) + prefix` for each occupied slot.
    hashes: Vec<i32>,
    /// Code assigned to the string in the same slot.
    codes: Vec<u16>,
    writer: CodeWriter,
    /// Code of the string matched so far; `None` before the first byte.
    ent: Option<u16>,
    nbits: u8,
    maxcode: u16,
    free_ent: u16,
    /// Input bytes since the last reset.
    incount: u64,
    /// Input byte count that triggers the next ratio check.
    checkpoint: u64,
    /// Compression ratio at the last checkpoint (8.8 fixed point).
    ratio: u64,
    resets: usize,
}

impl LzwEncoder {
    /// Create a new LZW encoder with the given configuration.
    pub fn new(config: LzwConfig) -> Result<Self> {
        config.validate()?;
        let mut encoder = Self {
            config,
            hashes: vec![EMPTY; HSIZE],
            codes: vec![0; HSIZE],
            writer: CodeWriter::new(),
            ent: None,
            nbits: BITS_MIN,
            maxcode: max_code(BITS_MIN),
            free_ent: CODE_FIRST,
            incount: 0,
            checkpoint: 0,
            ratio: 0,
            resets: 0,
        };
        encoder.begin();
        Ok(encoder)
    }

    /// Start a new strip.
    pub fn begin(&mut self) {
        self.writer.reset();
        self.ent = None;
        self.nbits = BITS_MIN;
        self.maxcode = max_code(BITS_MIN);
        self.free_ent = CODE_FIRST;
        self.incount = 0;
        self.checkpoint = u64::from(self.config.ratio_check_interval);
        self.ratio = 0;
        self.resets = 0;
        self.clear_hash();
    }

    /// Number of adaptive or table-full resets in the current strip.
    pub fn table_resets(&self) -> usize {
        self.resets
    }

    /// Encode bytes from `input`, appending codes to `out`.
    ///
    /// Returns how many input bytes were consumed. Fewer than `input.len()`
    /// are consumed only when `out` grew past `limit`; the caller should
    /// drain `out` and call again with the remaining input.
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>, limit: usize) -> usize {
        let mut consumed = 0;
        let mut ent = match self.ent {
            Some(ent) => ent,
            None => {
                let Some(&first) = input.first() else {
                    return 0;
                };
                self.put(out, CODE_CLEAR);
                self.incount += 1;
                consumed = 1;
                u16::from(first)
            }
        };

        'bytes: while consumed < input.len() {
            let c = input[consumed];
            let fcode = (i32::from(c) << 12) + i32::from(ent);
            let mut h = ((usize::from(c) << HSHIFT) ^ usize::from(ent)) % HSIZE;

            if self.hashes[h] == fcode {
                ent = self.codes[h];
                self.incount += 1;
                consumed += 1;
                continue;
            }
            if self.hashes[h] >= 0 {
                // Secondary probe
                let disp = if h == 0 { 1 } else { HSIZE - h };
                loop {
                    h = if h >= disp { h - disp } else { h + HSIZE - disp };
                    if self.hashes[h] == fcode {
                        ent = self.codes[h];
                        self.incount += 1;
                        consumed += 1;
                        continue 'bytes;
                    }
                    if self.hashes[h] < 0 {
                        break;
                    }
                }
            }

            // New string: emit the prefix and remember prefix + c
            if out.len() > limit {
                break;
            }
            self.incount += 1;
            consumed += 1;
            self.put(out, ent);
            ent = u16::from(c);
            self.codes[h] = self.free_ent;
            self.hashes[h] = fcode;
            self.free_ent += 1;

            if self.free_ent == self.config.max_code() - 1 {
                self.reset_table(out);
            } else if self.free_ent > self.maxcode {
                self.nbits += 1;
                self.maxcode = max_code(self.nbits);
            } else if self.incount >= self.checkpoint {
                self.checkpoint = self.incount + u64::from(self.config.ratio_check_interval);
                let rat = self.current_ratio();
                if rat <= self.ratio {
                    self.reset_table(out);
                } else {
                    self.ratio = rat;
                }
            }
        }

        self.ent = Some(ent);
        consumed
    }

    /// Flush the pending string, write EOI and pad the last byte.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if let Some(ent) = self.ent.take() {
            self.put(out, ent);
            // The decoder adds an entry for this code too; follow its width
            let free_ent = self.free_ent + 1;
            if free_ent == self.config.max_code() - 1 {
                self.writer.reset_count();
                self.put(out, CODE_CLEAR);
                self.nbits = BITS_MIN;
            } else if free_ent > self.maxcode {
                self.nbits += 1;
            }
        }
        self.put(out, CODE_EOI);
        self.writer.flush(out);
    }

    #[inline]
    fn put(&mut self, out: &mut Vec<u8>, code: u16) {
        self.writer.put(out, code, self.nbits);
    }

    /// Input-to-output ratio in 8.8 fixed point.
    fn current_ratio(&self) -> u64 {
        let outcount = self.writer.bits_written();
        if self.incount > 0x007f_ffff {
            match outcount >> 8 {
                0 => 0x7fff_ffff,
                rat => self.incount / rat,
            }
        } else if outcount == 0 {
            0x7fff_ffff
        } else {
            (self.incount << 8) / outcount
        }
    }

    fn reset_table(&mut self, out: &mut Vec<u8>) {
        self.clear_hash();
        self.ratio = 0;
        self.incount = 0;
        self.writer.reset_count();
        self.free_ent = CODE_FIRST;
        self.put(out, CODE_CLEAR);
        self.nbits = BITS_MIN;
        self.maxcode = max_code(BITS_MIN);
        self.resets += 1;
    }

    fn clear_hash(&mut self) {
        self.hashes.fill(EMPTY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(input: &[u8]) -> Vec<u8> {
        let mut encoder = LzwEncoder::new(LzwConfig::TIFF).unwrap();
        let mut out = Vec::new();
        let consumed = encoder.encode(input, &mut out, usize::MAX);
        assert_eq!(consumed, input.len());
        encoder.finish(&mut out);
        out
    }

    #[test]
    fn test_empty_strip() {
        // Just EOI, 9 bits
        let out = encode_all(b"");
        assert_eq!(out, vec![0x80, 0x80]);
    }

    #[test]
    fn test_starts_with_clear() {
        let out = encode_all(b"A");
        // CLEAR(256) 'A'(65) EOI(257) at 9 bits each
        assert_eq!(out[0], 0x80);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_repetitive_input_compresses() {
        let input = vec![7u8; 4096];
        let out = encode_all(&input);
        assert!(out.len() < 200);
    }

    #[test]
    fn test_output_limit_stops_early() {
        let input: Vec<u8> = (0..20_000u32).map(|i| (i * 7 % 251) as u8).collect();
        let mut encoder = LzwEncoder::new(LzwConfig::TIFF).unwrap();
        let mut out = Vec::new();
        let consumed = encoder.encode(&input, &mut out, 64);
        assert!(consumed < input.len());
        // Overshoot is bounded by the last code or two
        assert!(out.len() <= 64 + 4);
        let mut rest = Vec::new();
        let more = encoder.encode(&input[consumed..], &mut rest, usize::MAX);
        assert_eq!(consumed + more, input.len());
    }

    #[test]
    fn test_table_full_reset() {
        // Pseudo-random data defeats the dictionary quickly
        let mut state = 0x1234_5678u32;
        let input: Vec<u8> = (0..50_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();
        let mut encoder = LzwEncoder::new(LzwConfig::TIFF).unwrap();
        let mut out = Vec::new();
        encoder.encode(&input, &mut out, usize::MAX);
        assert!(encoder.table_resets() >= 1);
    }
}
