//! NeXT 2-bit run-length compression (decode only).
//!
//! Each scanline starts all white and is described by one record:
//!
//! - `0x00`: a literal scanline follows
//! - `0x40`: a literal span follows, as big-endian offset and length
//! - anything else: a sequence of `<grey:2><count:6>` runs until the line
//!   is full

use super::{Codec, DecodeIo};
use crate::directory::Directory;
use oxitiff_core::{Result, TiffError};

const LITERAL_ROW: u8 = 0x00;
const LITERAL_SPAN: u8 = 0x40;
const WHITE: u8 = 0xff;

/// NeXT codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextCodec;

impl NextCodec {
    /// Create the codec.
    pub fn new() -> Self {
        Self
    }

    fn decode(io: &mut DecodeIo<'_>, buf: &mut [u8]) -> Result<()> {
        buf.fill(WHITE);
        let scanline = io.dir.scanline_size()? as usize;
        if scanline == 0 || buf.len() % scanline != 0 {
            return Err(TiffError::invalid_parameter(
                "NeXTDecode: Fractional scanlines cannot be read",
            ));
        }
        let width = match io.dir.tile {
            Some(tile) => tile.width,
            None => io.dir.image_width,
        } as usize;

        let input = io.raw.unread();
        let mut ip = 0;
        let short = |io: &DecodeIo<'_>, rows_left: usize| {
            TiffError::unexpected_eof("NeXTDecode", io.unit.to_string(), rows_left * scanline)
        };

        let rows = buf.len() / scanline;
        for (index, row) in buf.chunks_mut(scanline).enumerate() {
            let Some(&n) = input.get(ip) else {
                return Err(short(io, rows - index));
            };
            ip += 1;

            match n {
                LITERAL_ROW => {
                    let Some(data) = input.get(ip..ip + scanline) else {
                        return Err(short(io, rows - index));
                    };
                    row.copy_from_slice(data);
                    ip += scanline;
                }
                LITERAL_SPAN => {
                    let Some(header) = input.get(ip..ip + 4) else {
                        return Err(short(io, rows - index));
                    };
                    let offset = usize::from(u16::from_be_bytes([header[0], header[1]]));
                    let len = usize::from(u16::from_be_bytes([header[2], header[3]]));
                    if offset + len > scanline {
                        return Err(TiffError::corrupted(
                            "NeXTDecode",
                            io.unit.to_string(),
                            format!("span {offset}+{len} exceeds {scanline}-byte scanline"),
                        ));
                    }
                    let Some(data) = input.get(ip + 4..ip + 4 + len) else {
                        return Err(short(io, rows - index));
                    };
                    row[offset..offset + len].copy_from_slice(data);
                    ip += 4 + len;
                }
                first => {
                    let mut pixels = 0usize;
                    let mut code = first;
                    loop {
                        let grey = (code >> 6) & 0x3;
                        let count = usize::from(code & 0x3f);
                        for _ in 0..count {
                            if pixels >= width || pixels / 4 >= scanline {
                                break;
                            }
                            let shift = 6 - 2 * (pixels & 3);
                            let byte = &mut row[pixels / 4];
                            if pixels & 3 == 0 {
                                *byte = grey << 6;
                            } else {
                                *byte |= grey << shift;
                            }
                            pixels += 1;
                        }
                        if pixels >= width {
                            break;
                        }
                        if pixels / 4 >= scanline {
                            return Err(TiffError::corrupted(
                                "NeXTDecode",
                                io.unit.to_string(),
                                "Invalid data for scanline",
                            ));
                        }
                        let Some(&next) = input.get(ip) else {
                            return Err(short(io, rows - index));
                        };
                        ip += 1;
                        code = next;
                    }
                }
            }
        }

        io.raw.consume(ip);
        Ok(())
    }
}

impl Codec for NextCodec {
    fn name(&self) -> &str {
        "NeXT"
    }

    fn setup_decode(&mut self, dir: &Directory) -> Result<()> {
        if dir.bits_per_sample != 2 {
            return Err(TiffError::invalid_parameter(format!(
                "Unsupported BitsPerSample = {}",
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

    fn decode_tile(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], _sample: u16) -> Result<()> {
        Self::decode(io, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::decode_strip;
    use super::*;

    fn dir(width: u32, length: u32) -> Directory {
        Directory::new(width, length).with_bits_per_sample(2)
    }

    #[test]
    fn test_literal_row_and_span() {
        let codes = [0x00, 0x12, 0x34, 0x40, 0x00, 0x01, 0x00, 0x01, 0xAB];
        let out = decode_strip(&mut NextCodec, &dir(8, 2), &codes, 4).unwrap();
        assert_eq!(out, [0x12, 0x34, 0xff, 0xAB]);
    }

    #[test]
    fn test_runs() {
        // 3 pixels of grey 0, then 3 pixels of grey 2
        let codes = [0x03, 0x83];
        let out = decode_strip(&mut NextCodec, &dir(6, 1), &codes, 2).unwrap();
        assert_eq!(out, [0b00_00_00_10, 0b10_10_0000]);
    }

    #[test]
    fn test_span_out_of_bounds() {
        let codes = [0x40, 0x00, 0x01, 0x00, 0x02, 1, 2];
        let err = decode_strip(&mut NextCodec, &dir(8, 1), &codes, 2).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_short_input() {
        let err = decode_strip(&mut NextCodec, &dir(8, 2), &[0x00, 0x12, 0x34], 4).unwrap_err();
        assert!(matches!(err, TiffError::UnexpectedEof { missing: 2, .. }));
        let err = decode_strip(&mut NextCodec, &dir(8, 1), &[0x02], 2).unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn test_wrong_depth_rejected() {
        assert!(NextCodec.setup_decode(&Directory::new(4, 4)).is_err());
    }
}
