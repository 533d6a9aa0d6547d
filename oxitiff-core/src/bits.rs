//! Bit and byte size arithmetic.
//!
//! Every strip, tile and scanline size is derived from directory values that
//! come straight out of a file, so products such as
//! `width * bits_per_sample * samples_per_pixel` can overflow 32 bits on
//! hostile input. All helpers here are checked: an overflow is reported as
//! [`TiffError::IntegerOverflow`] instead of silently wrapping.

use crate::error::{Result, TiffError};

/// Multiply two 32-bit sizes, failing on overflow.
///
/// `what` names the computation for the error message.
#[inline]
pub fn checked_mul(a: u32, b: u32, what: &'static str) -> Result<u32> {
    a.checked_mul(b).ok_or(TiffError::overflow(what))
}

/// Add two 32-bit sizes, failing on overflow.
#[inline]
pub fn checked_add(a: u32, b: u32, what: &'static str) -> Result<u32> {
    a.checked_add(b).ok_or(TiffError::overflow(what))
}

/// Number of `y`-sized chunks needed to hold `x` items (`ceil(x / y)`).
///
/// Fails on overflow and on a zero chunk size.
#[inline]
pub fn howmany(x: u32, y: u32, what: &'static str) -> Result<u32> {
    if y == 0 {
        return Err(TiffError::invalid_parameter(format!(
            "zero divisor in {what}"
        )));
    }
    Ok(x.div_ceil(y))
}

/// Number of bytes needed to hold `bits` bits.
#[inline]
pub fn howmany8(bits: u32) -> u32 {
    bits.div_ceil(8)
}

/// Round `x` up to the next multiple of `y`.
#[inline]
pub fn round_up(x: u32, y: u32, what: &'static str) -> Result<u32> {
    checked_mul(howmany(x, y, what)?, y, what)
}

/// Round a buffer size up to a multiple of `granularity`.
///
/// Used when growing the raw I/O buffer; works in `usize` because buffer
/// capacities are host quantities.
#[inline]
pub fn round_up_usize(x: usize, granularity: usize) -> Result<usize> {
    x.div_ceil(granularity)
        .checked_mul(granularity)
        .ok_or(TiffError::overflow("buffer size"))
}

/// Reverse the bit order of every byte in place.
///
/// This converts between LSB-to-MSB and MSB-to-LSB fill orders.
pub fn reverse_bits(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        *b = b.reverse_bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_mul_overflow() {
        assert_eq!(checked_mul(1 << 16, 1 << 15, "x").unwrap(), 1 << 31);
        let err = checked_mul(1 << 16, 1 << 16, "scanline size").unwrap_err();
        assert!(matches!(
            err,
            TiffError::IntegerOverflow {
                what: "scanline size"
            }
        ));
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(checked_add(u32::MAX - 1, 1, "x").unwrap(), u32::MAX);
        assert!(checked_add(u32::MAX, 1, "x").is_err());
    }

    #[test]
    fn test_howmany() {
        assert_eq!(howmany(100, 32, "strips").unwrap(), 4);
        assert_eq!(howmany(96, 32, "strips").unwrap(), 3);
        assert_eq!(howmany(0, 32, "strips").unwrap(), 0);
        assert_eq!(howmany(u32::MAX, 2, "strips").unwrap(), 1 << 31);
        assert!(howmany(5, 0, "strips").is_err());
        assert_eq!(howmany8(1), 1);
        assert_eq!(howmany8(17), 3);
    }

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(17, 16, "tile").unwrap(), 32);
        assert_eq!(round_up(32, 16, "tile").unwrap(), 32);
        assert!(round_up(u32::MAX, 16, "tile").is_err());
        assert_eq!(round_up_usize(1025, 1024).unwrap(), 2048);
    }

    #[test]
    fn test_reverse_bits() {
        let mut buf = [0b0000_0001, 0b1100_0000, 0xFF];
        reverse_bits(&mut buf);
        assert_eq!(buf, [0b1000_0000, 0b0000_0011, 0xFF]);
    }
}
