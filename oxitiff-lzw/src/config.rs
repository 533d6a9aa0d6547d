//! LZW configuration.

use crate::error::{LzwError, Result};

/// Smallest code width in bits.
pub const BITS_MIN: u8 = 9;

/// Largest code width supported by TIFF readers.
pub const BITS_MAX: u8 = 12;

/// Code that resets the dictionary.
pub const CODE_CLEAR: u16 = 256;

/// End-of-information code.
pub const CODE_EOI: u16 = 257;

/// First code assigned to a multi-byte string.
pub const CODE_FIRST: u16 = 258;

/// Largest code representable in `bits` bits.
#[inline]
pub(crate) const fn max_code(bits: u8) -> u16 {
    ((1u32 << bits) - 1) as u16
}

/// LZW configuration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzwConfig {
    /// Maximum code size in bits (9..=12).
    pub max_bits: u8,
    /// Number of input bytes between compression-ratio checkpoints.
    ///
    /// When the ratio measured at a checkpoint is no better than at the
    /// previous one, the encoder clears the table and starts over.
    pub ratio_check_interval: u32,
}

impl LzwConfig {
    /// Standard TIFF LZW configuration.
    ///
    /// - MSB-first codes
    /// - 9-12 bit codes with early change
    /// - Clear code at the start of every strip and whenever the table fills
    /// - Ratio checkpoint every 10000 input bytes
    pub const TIFF: Self = Self {
        max_bits: BITS_MAX,
        ratio_check_interval: 10_000,
    };

    /// Create a configuration with a custom maximum code width.
    pub fn new(max_bits: u8) -> Self {
        Self {
            max_bits,
            ..Self::TIFF
        }
    }

    /// Check that the configuration can be used.
    pub fn validate(&self) -> Result<()> {
        if !(BITS_MIN..=BITS_MAX).contains(&self.max_bits) {
            return Err(LzwError::InvalidBitWidth(self.max_bits));
        }
        Ok(())
    }

    /// Get the clear code value.
    pub fn clear_code(&self) -> u16 {
        CODE_CLEAR
    }

    /// Get the end-of-information code value.
    pub fn eoi_code(&self) -> u16 {
        CODE_EOI
    }

    /// Get the first available code for dictionary entries.
    pub fn first_code(&self) -> u16 {
        CODE_FIRST
    }

    /// Get the largest code for the maximum bit width.
    pub fn max_code(&self) -> u16 {
        max_code(self.max_bits)
    }

    /// Number of slots in the decoder's code table.
    ///
    /// The table carries 1024 spare entries past the last legal code so that
    /// a stream that keeps adding entries without a clear code is caught by
    /// a bounds check rather than by indexing past the end.
    pub(crate) fn table_size(&self) -> usize {
        self.max_code() as usize + 1024
    }
}

impl Default for LzwConfig {
    fn default() -> Self {
        Self::TIFF
    }
}
