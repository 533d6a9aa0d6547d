//! Byte order handling for multi-byte samples.

/// Byte order of the sample data in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II").
    LittleEndian,
    /// Big-endian ("MM").
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }

    /// Whether data in this order must be swapped to be used on the host.
    pub fn needs_swap(self) -> bool {
        self != Self::native()
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

/// Swap every 16-bit word in place. A trailing odd byte is left alone.
pub fn swab_u16(buf: &mut [u8]) {
    for word in buf.chunks_exact_mut(2) {
        word.swap(0, 1);
    }
}

/// Swap every 24-bit triple in place.
pub fn swab_u24(buf: &mut [u8]) {
    for triple in buf.chunks_exact_mut(3) {
        triple.swap(0, 2);
    }
}

/// Swap every 32-bit word in place.
pub fn swab_u32(buf: &mut [u8]) {
    for word in buf.chunks_exact_mut(4) {
        word.reverse();
    }
}

/// Swap every 64-bit word in place.
pub fn swab_u64(buf: &mut [u8]) {
    for word in buf.chunks_exact_mut(8) {
        word.reverse();
    }
}

/// Swap samples of the given bit width in place.
///
/// Returns `false` when the width has no swap (8 bits or less, or an
/// unusual width), leaving the buffer untouched.
pub fn swab_samples(buf: &mut [u8], bits_per_sample: u16) -> bool {
    match bits_per_sample {
        16 => swab_u16(buf),
        24 => swab_u24(buf),
        32 => swab_u32(buf),
        64 => swab_u64(buf),
        _ => return false,
    }
    true
}
