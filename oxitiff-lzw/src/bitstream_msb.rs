//! Code-level bit packing for TIFF LZW.
//!
//! TIFF LZW packs codes MSB-first. Very old writers packed them LSB-first
//! instead; the reader supports both so that the decoder can switch per
//! strip. Both sides keep their state in plain integers so that a strip can
//! be produced or consumed across many calls.

use crate::error::{LzwError, Result};

/// Bit order of packed codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// Standard TIFF order, most significant bit first.
    #[default]
    Msb,
    /// Legacy order written by pre-5.0 libraries, least significant bit first.
    LsbCompat,
}

/// Streaming code reader.
///
/// The reader does not own its input; each call to [`CodeReader::next_code`]
/// gets the unread tail of the strip and a cursor into it. `bits_left`
/// tracks how many bits of the strip have not been consumed yet, which is
/// what decides whether another code is available.
#[derive(Debug, Clone, Default)]
pub struct CodeReader {
    order: BitOrder,
    /// Bit accumulator.
    data: u32,
    /// Number of valid bits in the accumulator.
    bits: u32,
    /// Bits of the strip not yet consumed.
    bits_left: u64,
}

impl CodeReader {
    /// Start reading a strip of `len` bytes.
    pub fn begin(&mut self, order: BitOrder, len: usize) {
        self.order = order;
        self.data = 0;
        self.bits = 0;
        self.bits_left = (len as u64) << 3;
    }

    /// Bit order in use for the current strip.
    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Whether a code of `nbits` bits can still be read.
    #[inline]
    pub fn has_code(&self, nbits: u8) -> bool {
        self.bits_left >= u64::from(nbits)
    }

    /// Read the next `nbits`-bit code, advancing `pos` over consumed bytes.
    #[inline]
    pub fn next_code(&mut self, input: &[u8], pos: &mut usize, nbits: u8) -> Result<u16> {
        let nbits = u32::from(nbits);
        let mask = (1u32 << nbits) - 1;
        let code = match self.order {
            BitOrder::Msb => {
                self.push_msb(input, pos)?;
                if self.bits < nbits {
                    self.push_msb(input, pos)?;
                }
                let code = (self.data >> (self.bits - nbits)) & mask;
                self.bits -= nbits;
                code
            }
            BitOrder::LsbCompat => {
                self.push_lsb(input, pos)?;
                if self.bits < nbits {
                    self.push_lsb(input, pos)?;
                }
                let code = self.data & mask;
                self.data >>= nbits;
                self.bits -= nbits;
                code
            }
        };
        self.bits_left -= u64::from(nbits);
        Ok(code as u16)
    }

    #[inline]
    fn push_msb(&mut self, input: &[u8], pos: &mut usize) -> Result<()> {
        let byte = *input.get(*pos).ok_or(LzwError::UnexpectedEof { missing: 0 })?;
        *pos += 1;
        self.data = (self.data << 8) | u32::from(byte);
        self.bits += 8;
        Ok(())
    }

    #[inline]
    fn push_lsb(&mut self, input: &[u8], pos: &mut usize) -> Result<()> {
        let byte = *input.get(*pos).ok_or(LzwError::UnexpectedEof { missing: 0 })?;
        *pos += 1;
        self.data |= u32::from(byte) << self.bits;
        self.bits += 8;
        Ok(())
    }
}

/// Streaming MSB-first code writer.
#[derive(Debug, Clone, Default)]
pub struct CodeWriter {
    /// Bit accumulator.
    data: u32,
    /// Number of pending bits in the accumulator.
    bits: u32,
    /// Total bits written since the last reset.
    bits_out: u64,
}

impl CodeWriter {
    /// Create a new code writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the writer for a new strip.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Append a code of `nbits` bits; complete bytes go to `out`.
    #[inline]
    pub fn put(&mut self, out: &mut Vec<u8>, code: u16, nbits: u8) {
        let nbits = u32::from(nbits);
        self.data = (self.data << nbits) | u32::from(code);
        self.bits += nbits;
        out.push((self.data >> (self.bits - 8)) as u8);
        self.bits -= 8;
        if self.bits >= 8 {
            out.push((self.data >> (self.bits - 8)) as u8);
            self.bits -= 8;
        }
        self.bits_out += u64::from(nbits);
    }

    /// Write any pending bits, padding the last byte with zeros.
    pub fn flush(&mut self, out: &mut Vec<u8>) {
        if self.bits > 0 {
            out.push((self.data << (8 - self.bits)) as u8);
            self.bits = 0;
        }
    }

    /// Total number of code bits written since the last reset.
    pub fn bits_written(&self) -> u64 {
        self.bits_out
    }

    /// Forget the bit count used for ratio tracking.
    pub fn reset_count(&mut self) {
        self.bits_out = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msb_roundtrip() {
        let mut writer = CodeWriter::new();
        let mut data = Vec::new();
        writer.put(&mut data, 256, 9);
        writer.put(&mut data, 65, 9);
        writer.put(&mut data, 0x3FF, 10);
        writer.put(&mut data, 257, 12);
        writer.flush(&mut data);
        assert_eq!(writer.bits_written(), 40);
        assert_eq!(data.len(), 5);

        let mut reader = CodeReader::default();
        reader.begin(BitOrder::Msb, data.len());
        let mut pos = 0;
        assert_eq!(reader.next_code(&data, &mut pos, 9).unwrap(), 256);
        assert_eq!(reader.next_code(&data, &mut pos, 9).unwrap(), 65);
        assert_eq!(reader.next_code(&data, &mut pos, 10).unwrap(), 0x3FF);
        assert_eq!(reader.next_code(&data, &mut pos, 12).unwrap(), 257);
        assert!(!reader.has_code(9));
        assert_eq!(pos, 5);
    }

    #[test]
    fn test_clear_code_starts_with_zero_byte() {
        // A strip always opens with the clear code; MSB-first that is 0x80 0x..
        let mut writer = CodeWriter::new();
        let mut data = Vec::new();
        writer.put(&mut data, 256, 9);
        writer.flush(&mut data);
        assert_eq!(data, vec![0x80, 0x00]);
    }

    #[test]
    fn test_lsb_reader() {
        // Codes 256 and 1 packed LSB-first at 9 bits: 0x00 0x03 0x00
        let data = [0x00, 0x03, 0x00];
        let mut reader = CodeReader::default();
        reader.begin(BitOrder::LsbCompat, data.len());
        let mut pos = 0;
        assert_eq!(reader.next_code(&data, &mut pos, 9).unwrap(), 256);
        assert_eq!(reader.next_code(&data, &mut pos, 9).unwrap(), 1);
    }
}
