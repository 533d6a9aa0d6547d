//! # OxiTIFF-LZW: Streaming TIFF LZW
//!
//! This crate implements the LZW variant used for TIFF strips and tiles as
//! a pair of streaming state machines that the strip/tile engine can drive
//! one scanline (or one flush-sized chunk) at a time.
//!
//! ## TIFF LZW
//!
//! - **MSB-first bit order**: codes are packed from the most significant bit
//! - **9-12 bit codes**: the width grows one code early ("early change")
//! - **Clear codes**: every strip opens with code 256; the encoder clears
//!   again when the table fills or the compression ratio stops improving
//! - **EOI termination**: strips end with code 257
//! - **Legacy strips**: pre-5.0 writers packed codes LSB-first with late
//!   change; the decoder recognises them from the first two bytes
//!
//! ## Example
//!
//! ```rust
//! use oxitiff_lzw::{compress_tiff, decompress_tiff};
//!
//! let original = b"TOBEORNOTTOBEORTOBEORNOT";
//! let compressed = compress_tiff(original).unwrap();
//! let decompressed = decompress_tiff(&compressed, original.len()).unwrap();
//! assert_eq!(decompressed, original);
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use oxitiff_lzw::{LzwConfig, LzwDecoder, LzwEncoder};
//!
//! let rows: Vec<Vec<u8>> = (0..4u8).map(|r| vec![r; 64]).collect();
//!
//! let mut encoder = LzwEncoder::new(LzwConfig::TIFF).unwrap();
//! let mut strip = Vec::new();
//! for row in &rows {
//!     encoder.encode(row, &mut strip, usize::MAX);
//! }
//! encoder.finish(&mut strip);
//!
//! let mut decoder = LzwDecoder::new(LzwConfig::TIFF).unwrap();
//! decoder.begin(&strip);
//! let mut cursor = 0;
//! for row in &rows {
//!     let mut out = vec![0u8; row.len()];
//!     cursor += decoder.decode(&strip[cursor..], &mut out).unwrap();
//!     assert_eq!(&out, row);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod bitstream_msb;
mod config;
mod decoder;
mod dictionary;
mod encoder;
mod error;

pub use bitstream_msb::BitOrder;
pub use config::{BITS_MAX, BITS_MIN, CODE_CLEAR, CODE_EOI, CODE_FIRST, LzwConfig};
pub use decoder::LzwDecoder;
pub use encoder::LzwEncoder;
pub use error::{LzwError, Result};

/// Decompress one LZW strip with the given configuration.
///
/// Exactly `expected_size` bytes are produced; a strip that ends early is an
/// [`LzwError::UnexpectedEof`].
///
/// # Example
///
/// ```rust
/// use oxitiff_lzw::{compress, decompress, LzwConfig};
///
/// let original = b"Hello, World!";
/// let compressed = compress(original, LzwConfig::TIFF).unwrap();
/// let decompressed = decompress(&compressed, original.len(), LzwConfig::TIFF).unwrap();
/// assert_eq!(decompressed, original);
/// ```
pub fn decompress(data: &[u8], expected_size: usize, config: LzwConfig) -> Result<Vec<u8>> {
    let mut decoder = LzwDecoder::new(config)?;
    decoder.begin(data);
    let mut out = vec![0u8; expected_size];
    decoder.decode(data, &mut out)?;
    Ok(out)
}

/// Compress data into one LZW strip with the given configuration.
///
/// # Example
///
/// ```rust
/// use oxitiff_lzw::{compress, LzwConfig};
///
/// let data = b"TOBEORNOTTOBEORTOBEORNOT".repeat(4);
/// let compressed = compress(&data, LzwConfig::TIFF).unwrap();
/// assert!(compressed.len() < data.len());
/// ```
pub fn compress(data: &[u8], config: LzwConfig) -> Result<Vec<u8>> {
    let mut encoder = LzwEncoder::new(config)?;
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    encoder.encode(data, &mut out, usize::MAX);
    encoder.finish(&mut out);
    Ok(out)
}

/// Decompress a TIFF LZW strip.
///
/// Equivalent to `decompress(data, expected_size, LzwConfig::TIFF)`.
pub fn decompress_tiff(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    decompress(data, expected_size, LzwConfig::TIFF)
}

/// Compress data as a TIFF LZW strip.
///
/// Equivalent to `compress(data, LzwConfig::TIFF)`.
pub fn compress_tiff(data: &[u8]) -> Result<Vec<u8>> {
    compress(data, LzwConfig::TIFF)
}
