//! Macintosh PackBits run-length coding.
//!
//! Each record starts with a signed count byte `n`:
//!
//! - `0..=127`: copy the next `n + 1` bytes literally
//! - `-127..=-1`: repeat the next byte `-n + 1` times
//! - `-128`: no-op

use super::{Codec, DecodeIo, EncodeIo};
use oxitiff_core::{Result, TiffError};

/// Longest run or literal one record can carry.
const MAX_SPAN: usize = 128;

/// Count byte for a run of `n` (2..=128) bytes.
#[inline]
fn run_header(n: usize) -> u8 {
    (1i16 - n as i16) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing to extend.
    Base,
    /// Last record is a literal that may grow.
    Literal,
    /// Last record is a run.
    Run,
    /// A run directly follows a literal that may still absorb it.
    LiteralRun,
}

/// PackBits codec.
#[derive(Debug, Clone, Default)]
pub struct PackBitsCodec {
    /// Bytes per row; strips and tiles are encoded row by row.
    row_size: usize,
}

impl PackBitsCodec {
    /// Create the codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode one row. The encoder state does not carry across calls.
    fn encode_run(io: &mut EncodeIo<'_>, buf: &[u8]) -> Result<()> {
        let mut state = State::Base;
        let mut last_literal = 0usize;
        let mut i = 0;

        while i < buf.len() {
            let b = buf[i];
            i += 1;
            let mut n = 1usize;
            while i < buf.len() && buf[i] == b {
                n += 1;
                i += 1;
            }

            loop {
                // Room for a two-byte record
                if io.raw.len() + 2 >= io.raw.limit() {
                    if matches!(state, State::Literal | State::LiteralRun) {
                        // Keep the open literal so it can still grow
                        let slop = io.raw.output().split_off(last_literal);
                        io.flush()?;
                        io.raw.output().extend_from_slice(&slop);
                        last_literal = 0;
                    } else {
                        io.flush()?;
                    }
                }

                let out = io.raw.output();
                match state {
                    State::LiteralRun => {
                        // literal, 2-byte run, literal becomes one literal
                        let len = out.len();
                        if n == 1 && out[len - 2] == run_header(2) && out[last_literal] < 126 {
                            out[last_literal] += 2;
                            state = if out[last_literal] == 127 {
                                State::Base
                            } else {
                                State::Literal
                            };
                            out[len - 2] = out[len - 1];
                        } else {
                            state = State::Run;
                        }
                        continue;
                    }
                    _ if n > 1 => {
                        state = if state == State::Literal {
                            State::LiteralRun
                        } else {
                            State::Run
                        };
                        if n > MAX_SPAN {
                            out.push(run_header(MAX_SPAN));
                            out.push(b);
                            n -= MAX_SPAN;
                            continue;
                        }
                        out.push(run_header(n));
                        out.push(b);
                    }
                    State::Literal => {
                        out[last_literal] += 1;
                        if out[last_literal] == 127 {
                            state = State::Base;
                        }
                        out.push(b);
                    }
                    State::Base | State::Run => {
                        last_literal = out.len();
                        out.push(0);
                        out.push(b);
                        state = State::Literal;
                    }
                }
                break;
            }
        }
        Ok(())
    }

    fn encode_chunk(&self, io: &mut EncodeIo<'_>, buf: &[u8]) -> Result<()> {
        if self.row_size == 0 {
            return Err(TiffError::invalid_parameter("PackBits: zero row size"));
        }
        for row in buf.chunks(self.row_size) {
            Self::encode_run(io, row)?;
        }
        Ok(())
    }

    fn decode(io: &mut DecodeIo<'_>, buf: &mut [u8]) -> Result<()> {
        let input = io.raw.unread();
        let mut ip = 0;
        let mut op = 0;

        while ip < input.len() && op < buf.len() {
            let n = input[ip] as i8;
            ip += 1;
            let room = buf.len() - op;

            if n == -128 {
                continue;
            }
            if n < 0 {
                let mut count = (1 - i16::from(n)) as usize;
                if count > room {
                    tracing::warn!(
                        "PackBitsDecode: Discarding {} bytes to avoid buffer overrun",
                        count - room
                    );
                    count = room;
                }
                let Some(&b) = input.get(ip) else {
                    tracing::warn!("Terminating PackBitsDecode due to lack of data");
                    break;
                };
                ip += 1;
                buf[op..op + count].fill(b);
                op += count;
            } else {
                let record = n as usize + 1;
                let count = record.min(room);
                if record > room {
                    tracing::warn!(
                        "PackBitsDecode: Discarding {} bytes to avoid buffer overrun",
                        record - room
                    );
                }
                if input.len() - ip < count {
                    tracing::warn!("Terminating PackBitsDecode due to lack of data");
                    break;
                }
                buf[op..op + count].copy_from_slice(&input[ip..ip + count]);
                op += count;
                ip += record.min(input.len() - ip);
            }
        }

        io.raw.consume(ip);
        if op < buf.len() {
            return Err(TiffError::unexpected_eof(
                "PackBitsDecode",
                io.unit.to_string(),
                buf.len() - op,
            ));
        }
        Ok(())
    }
}

impl Codec for PackBitsCodec {
    fn name(&self) -> &str {
        "PackBits"
    }

    fn decode_row(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], _sample: u16) -> Result<()> {
        Self::decode(io, buf)
    }

    fn decode_strip(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], _sample: u16) -> Result<()> {
        Self::decode(io, buf)
    }

    fn decode_tile(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], _sample: u16) -> Result<()> {
        Self::decode(io, buf)
    }

    fn pre_encode(&mut self, io: &mut EncodeIo<'_>, _sample: u16) -> Result<()> {
        let size = if io.dir.is_tiled() {
            io.dir.tile_row_size()?
        } else {
            io.dir.scanline_size()?
        };
        self.row_size = size as usize;
        Ok(())
    }

    fn encode_row(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], _sample: u16) -> Result<()> {
        Self::encode_run(io, buf)
    }

    fn encode_strip(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], _sample: u16) -> Result<()> {
        self.encode_chunk(io, buf)
    }

    fn encode_tile(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], _sample: u16) -> Result<()> {
        self.encode_chunk(io, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{decode_strip, encode_strip};
    use super::*;
    use crate::directory::Directory;

    fn pack_row(data: &[u8]) -> Vec<u8> {
        let dir = Directory::new(data.len() as u32, 1);
        encode_strip(&mut PackBitsCodec::new(), &dir, data).unwrap()
    }

    #[test]
    fn test_run_of_128_is_one_record() {
        assert_eq!(pack_row(&[7; 128]), vec![0x81, 7]);
    }

    #[test]
    fn test_run_of_129_splits() {
        assert_eq!(pack_row(&[7; 129]), vec![0x81, 7, 0x00, 7]);
    }

    #[test]
    fn test_literal() {
        assert_eq!(pack_row(&[1, 2, 3]), vec![0x02, 1, 2, 3]);
    }

    #[test]
    fn test_short_run_merges_into_literal() {
        // literal, 2-byte run, literal: one literal of 5
        assert_eq!(pack_row(&[1, 2, 2, 3, 4]), vec![0x04, 1, 2, 2, 3, 4]);
        // A longer run stays a run
        assert_eq!(pack_row(&[1, 2, 2, 2, 3]), vec![0x00, 1, 0xFE, 2, 0x00, 3]);
    }

    #[test]
    fn test_long_literal_splits_at_128() {
        let data: Vec<u8> = (0..200u32).map(|i| i as u8).collect();
        let packed = pack_row(&data);
        assert_eq!(packed[0], 127);
        assert_eq!(packed[129], 71);
        assert_eq!(packed.len(), 2 + 200);
    }

    #[test]
    fn test_rows_encode_independently() {
        let dir = Directory::new(4, 2);
        let packed = encode_strip(&mut PackBitsCodec::new(), &dir, &[5; 8]).unwrap();
        assert_eq!(packed, vec![0xFD, 5, 0xFD, 5]);
        assert_eq!(decode_strip(&mut PackBitsCodec::new(), &dir, &packed, 8).unwrap(), [5; 8]);
    }

    #[test]
    fn test_decode_noop_and_overrun() {
        let dir = Directory::new(4, 1);
        let out = decode_strip(&mut PackBitsCodec::new(), &dir, &[0x80, 0xF9, 9], 4).unwrap();
        assert_eq!(out, [9; 4]);
        let out = decode_strip(&mut PackBitsCodec::new(), &dir, &[0x05, 1, 2, 3, 4, 5, 6], 4)
            .unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_lack_of_data() {
        let dir = Directory::new(8, 1);
        let err = decode_strip(&mut PackBitsCodec::new(), &dir, &[0x03, 1, 2], 8).unwrap_err();
        assert!(err.is_eof());
        let err = decode_strip(&mut PackBitsCodec::new(), &dir, &[0xFE, 1], 8).unwrap_err();
        assert!(matches!(err, TiffError::UnexpectedEof { missing: 5, .. }));
    }

    #[test]
    fn test_flush_keeps_open_literal() {
        // Alternating bytes never repeat, so the whole row is literals
        let data: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();
        let dir = Directory::new(data.len() as u32, 1);
        let packed = encode_strip(&mut PackBitsCodec::new(), &dir, &data).unwrap();
        let out = decode_strip(&mut PackBitsCodec::new(), &dir, &packed, data.len()).unwrap();
        assert_eq!(out, data);
    }
}
