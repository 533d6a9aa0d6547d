//! ThunderScan 4-bit compression (decode only).
//!
//! Every scanline starts from pixel value 0. The top two bits of each
//! control byte select the operation, the low six bits carry its data.

use super::{Codec, DecodeIo};
use crate::directory::Directory;
use oxitiff_core::{Result, TiffError};

const CODE_MASK: u8 = 0xc0;
const DATA_MASK: u8 = 0x3f;

/// Repeat the last pixel `data` times.
const RUN: u8 = 0x00;
/// Three 2-bit deltas.
const DELTAS_2BIT: u8 = 0x40;
/// Two 3-bit deltas.
const DELTAS_3BIT: u8 = 0x80;
// 0xc0: one literal pixel in the low nibble

const TWO_BIT_DELTAS: [i8; 4] = [0, 1, 0, -1];
const DELTA2_SKIP: u8 = 2;
const THREE_BIT_DELTAS: [i8; 8] = [0, 1, 2, 3, 0, -3, -2, -1];
const DELTA3_SKIP: u8 = 4;

/// Packs 4-bit pixels into one output row.
struct RowWriter<'a> {
    row: &'a mut [u8],
    max: usize,
    count: usize,
    last: u8,
}

impl RowWriter<'_> {
    /// Store `value` if there is room; the pixel is counted either way.
    fn put(&mut self, value: u8) {
        if self.count < self.max {
            let byte = &mut self.row[self.count / 2];
            if self.count & 1 == 0 {
                *byte = value << 4;
            } else {
                *byte |= value;
            }
        }
        self.count += 1;
    }

    /// Apply a delta to the last pixel. Excess deltas are dropped silently.
    fn set(&mut self, value: i16) {
        self.last = (value & 0xf) as u8;
        if self.count < self.max {
            self.put(self.last);
        }
    }

    fn delta(&self, d: i8) -> i16 {
        i16::from(self.last) + i16::from(d)
    }
}

/// ThunderScan codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThunderScanCodec;

impl ThunderScanCodec {
    /// Create the codec.
    pub fn new() -> Self {
        Self
    }

    /// Decode one scanline of `width` pixels.
    fn decode_line(io: &mut DecodeIo<'_>, row: &mut [u8], width: usize) -> Result<()> {
        let input = io.raw.unread();
        let mut ip = 0;
        let mut w = RowWriter {
            row,
            max: width,
            count: 0,
            last: 0,
        };

        while ip < input.len() && w.count < w.max {
            let n = input[ip];
            ip += 1;
            match n & CODE_MASK {
                RUN => {
                    let last = w.last;
                    for _ in 0..(n & DATA_MASK) {
                        w.put(last);
                    }
                }
                DELTAS_2BIT => {
                    for shift in [4, 2, 0] {
                        let code = (n >> shift) & 3;
                        if code != DELTA2_SKIP {
                            w.set(w.delta(TWO_BIT_DELTAS[usize::from(code)]));
                        }
                    }
                }
                DELTAS_3BIT => {
                    for shift in [3, 0] {
                        let code = (n >> shift) & 7;
                        if code != DELTA3_SKIP {
                            w.set(w.delta(THREE_BIT_DELTAS[usize::from(code)]));
                        }
                    }
                }
                _ => w.set(i16::from(n)),
            }
        }
        io.raw.consume(ip);

        if w.count != width {
            let kind = if w.count < width {
                "Not enough"
            } else {
                "Too much"
            };
            return Err(TiffError::corrupted(
                "ThunderDecode",
                io.unit.to_string(),
                format!("{kind} data ({} != {width})", w.count),
            ));
        }
        Ok(())
    }

    fn decode(io: &mut DecodeIo<'_>, buf: &mut [u8]) -> Result<()> {
        let scanline = io.dir.scanline_size()? as usize;
        let width = io.dir.image_width as usize;
        if scanline == 0 || buf.len() % scanline != 0 {
            return Err(TiffError::invalid_parameter(format!(
                "ThunderDecode: {} bytes is not a whole number of scanlines",
                buf.len()
            )));
        }
        for row in buf.chunks_mut(scanline) {
            Self::decode_line(io, row, width)?;
        }
        Ok(())
    }
}

impl Codec for ThunderScanCodec {
    fn name(&self) -> &str {
        "ThunderScan"
    }

    fn setup_decode(&mut self, dir: &Directory) -> Result<()> {
        if dir.bits_per_sample != 4 {
            return Err(TiffError::invalid_parameter(format!(
                "Wrong bitspersample value ({}), Thunder decoder only supports 4bits per sample.",
                dir.bits_per_sample
            )));
        }
        Ok(())
    }

    fn decode_row(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], _sample: u16) -> Result<()> {
        Self::decode(io, buf)
    }

    fn decode_strip(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], _sample: u16) -> Result<()> {
        Self::decode(io, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::decode_strip;
    use super::*;

    fn dir(width: u32, length: u32) -> Directory {
        Directory::new(width, length).with_bits_per_sample(4)
    }

    #[test]
    fn test_raw_and_run() {
        // raw 5, run of 3 more 5s
        let out = decode_strip(&mut ThunderScanCodec, &dir(4, 1), &[0xc5, 0x03], 2).unwrap();
        assert_eq!(out, [0x55, 0x55]);
    }

    #[test]
    fn test_deltas() {
        // raw 8; 2-bit deltas +1, skip, -1; 3-bit deltas +3, -3
        let codes = [0xc8, 0x40 | (1 << 4) | (2 << 2) | 3, 0x80 | (3 << 3) | 5];
        let out = decode_strip(&mut ThunderScanCodec, &dir(5, 1), &codes, 3).unwrap();
        // 8, 9, 8, 11, 8 packed as nibbles, last nibble padded with zero
        assert_eq!(out, [0x89, 0x8b, 0x80]);
    }

    #[test]
    fn test_rows_restart_at_zero() {
        let codes = [0xcf, 0x01, 0x02];
        let out = decode_strip(&mut ThunderScanCodec, &dir(2, 2), &codes, 2).unwrap();
        assert_eq!(out, [0xff, 0x00]);
    }

    #[test]
    fn test_pixel_count_mismatch() {
        let err = decode_strip(&mut ThunderScanCodec, &dir(4, 1), &[0xc1], 2).unwrap_err();
        assert!(err.to_string().contains("Not enough data"));
        let err = decode_strip(&mut ThunderScanCodec, &dir(2, 1), &[0x05], 1).unwrap_err();
        assert!(err.to_string().contains("Too much data"));
    }

    #[test]
    fn test_wrong_depth_rejected() {
        let err = ThunderScanCodec.setup_decode(&Directory::new(4, 4)).unwrap_err();
        assert!(err.to_string().contains("only supports 4bits"));
    }
}
