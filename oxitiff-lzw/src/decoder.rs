//! LZW decoder (decompression).
//!
//! Like the encoder, the decoder works on one strip at a time and may be
//! called repeatedly with output buffers of any size (one scanline, one
//! strip). When a decoded string does not fit the remaining output, the
//! unwritten tail is remembered and emitted at the start of the next call.

use crate::bitstream_msb::{BitOrder, CodeReader};
use crate::config::{BITS_MIN, CODE_CLEAR, CODE_EOI, LzwConfig, max_code};
use crate::dictionary::CodeTable;
use crate::error::{LzwError, Result};

/// A string that was only partly written to the previous output buffer.
#[derive(Debug, Clone, Copy)]
struct Restart {
    code: u16,
    written: usize,
}

/// LZW decoder for decompression.
#[derive(Debug)]
pub struct LzwDecoder {
    config: LzwConfig,
    table: CodeTable,
    reader: CodeReader,
    nbits: u8,
    /// Once the next free slot passes this value the code width grows.
    bump_after: u16,
    old_code: Option<u16>,
    restart: Option<Restart>,
    started: bool,
}

impl LzwDecoder {
    /// Create a new LZW decoder with the given configuration.
    pub fn new(config: LzwConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table: CodeTable::new(&config),
            config,
            reader: CodeReader::default(),
            nbits: BITS_MIN,
            bump_after: 0,
            old_code: None,
            restart: None,
            started: false,
        })
    }

    /// Whether `strip` was written with the pre-5.0 LSB-first code packing.
    ///
    /// This is a sniff, not a marker: a standard stream always starts with a
    /// clear code, whose first byte is 0x80, so a leading zero byte with the
    /// low bit of the second byte set points at the old layout.
    pub fn is_legacy(strip: &[u8]) -> bool {
        matches!(strip, [0, second, ..] if second & 1 != 0)
    }

    /// Start decoding a strip.
    ///
    /// `strip` is the complete compressed strip; it is only inspected here
    /// to pick the bit order and to learn how many bits are available.
    pub fn begin(&mut self, strip: &[u8]) {
        let order = if Self::is_legacy(strip) {
            tracing::warn!("Old-style LZW codes, convert file");
            BitOrder::LsbCompat
        } else {
            BitOrder::Msb
        };
        self.reader.begin(order, strip.len());
        self.table.reset();
        self.set_width(BITS_MIN);
        self.old_code = None;
        self.restart = None;
        self.started = true;
    }

    /// Bit order detected for the current strip.
    pub fn bit_order(&self) -> BitOrder {
        self.reader.order()
    }

    /// Fill `out` from `input`.
    ///
    /// `input` is the unread tail of the strip passed to [`Self::begin`].
    /// Returns the number of input bytes consumed. Running out of codes
    /// before `out` is full is an [`LzwError::UnexpectedEof`]; whatever was
    /// decoded stays in `out`.
    pub fn decode(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        if !self.started {
            return Err(LzwError::NotStarted);
        }
        let mut pos = 0;
        let mut op = 0;

        if let Some(restart) = self.restart.take() {
            let residue = self.table.length(restart.code) - restart.written;
            if residue > out.len() {
                self.table.copy_range(restart.code, restart.written, out)?;
                self.restart = Some(Restart {
                    code: restart.code,
                    written: restart.written + out.len(),
                });
                return Ok(0);
            }
            self.table
                .copy_range(restart.code, restart.written, &mut out[..residue])?;
            op = residue;
        }

        while op < out.len() {
            let Some(mut code) = self.next_code(input, &mut pos)? else {
                break;
            };
            if code == CODE_EOI {
                break;
            }
            if code == CODE_CLEAR {
                loop {
                    self.table.reset();
                    self.set_width(BITS_MIN);
                    match self.next_code(input, &mut pos)? {
                        Some(CODE_CLEAR) => continue,
                        Some(next) => {
                            code = next;
                            break;
                        }
                        None => {
                            code = CODE_EOI;
                            break;
                        }
                    }
                }
                if code == CODE_EOI {
                    break;
                }
                if code > CODE_CLEAR {
                    return Err(LzwError::InvalidCode {
                        code,
                        next_free: self.table.next_free(),
                    });
                }
                out[op] = code as u8;
                op += 1;
                self.old_code = Some(code);
                continue;
            }

            let Some(old_code) = self.old_code else {
                return Err(LzwError::InvalidCode {
                    code,
                    next_free: self.table.next_free(),
                });
            };
            if code > self.table.next_free() {
                return Err(LzwError::InvalidCode {
                    code,
                    next_free: self.table.next_free(),
                });
            }
            let free = self.table.add(old_code, code)?;
            if free > self.bump_after {
                self.set_width((self.nbits + 1).min(self.config.max_bits));
            }
            self.old_code = Some(code);

            if code < CODE_CLEAR {
                out[op] = code as u8;
                op += 1;
                continue;
            }
            let len = self.table.length(code);
            if len == 0 {
                return Err(LzwError::ZeroLength(code));
            }
            let room = out.len() - op;
            if len > room {
                self.table.copy_range(code, 0, &mut out[op..])?;
                self.restart = Some(Restart { code, written: room });
                op = out.len();
                break;
            }
            self.table.copy_range(code, 0, &mut out[op..op + len])?;
            op += len;
        }

        if op < out.len() {
            return Err(LzwError::UnexpectedEof {
                missing: out.len() - op,
            });
        }
        Ok(pos)
    }

    /// Read one code, or `None` when the strip has no complete code left.
    fn next_code(&mut self, input: &[u8], pos: &mut usize) -> Result<Option<u16>> {
        if !self.reader.has_code(self.nbits) {
            tracing::warn!("LZWDecode: Strip not terminated with EOI code");
            return Ok(None);
        }
        self.reader.next_code(input, pos, self.nbits).map(Some)
    }

    fn set_width(&mut self, nbits: u8) {
        self.nbits = nbits;
        let mask = max_code(nbits);
        // Standard streams widen one code early; the old layout did not.
        self.bump_after = match self.reader.order() {
            BitOrder::Msb => mask - 1,
            BitOrder::LsbCompat => mask,
        };
    }
}
