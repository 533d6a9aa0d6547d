//! # OxiTIFF: Strip/Tile Codec Engine
//!
//! This crate moves pixel data between an application and the compressed
//! strips or tiles of a TIFF image. It sits between the (external)
//! directory layer, which supplies the image parameters and chunk
//! locations, and a seekable backing store.
//!
//! ## Components
//!
//! - [`registry`]: compression scheme id to codec lookup, with
//!   application-registered overrides
//! - [`codec`]: the [`Codec`] trait and the built-in codecs
//! - [`predictor`]: horizontal and floating-point differencing around any
//!   codec
//! - [`geometry`]: overflow-checked strip and tile sizes and indices
//! - [`Tiff`]: the image handle driving reads and writes
//!
//! ## Built-in codecs
//!
//! | Scheme      | Decode | Encode | Feature       |
//! |-------------|--------|--------|---------------|
//! | None        | yes    | yes    | always        |
//! | LZW         | yes    | yes    | `lzw`         |
//! | PackBits    | yes    | yes    | `packbits`    |
//! | Deflate     | yes    | yes    | `deflate`     |
//! | ThunderScan | yes    | no     | `thunderscan` |
//! | NeXT        | yes    | no     | `next`        |
//!
//! JPEG, CCITT, JBIG, PixarLog and SGILog are known to the registry but not
//! configured; selecting them fails at codec setup.
//!
//! ## Example
//!
//! ```rust
//! use oxitiff::{CodecRegistry, Directory, Predictor, Scheme, Tiff};
//! use std::io::Cursor;
//!
//! let registry = CodecRegistry::new();
//! let dir = Directory::new(64, 16)
//!     .with_rows_per_strip(8)
//!     .with_compression(Scheme::Lzw)
//!     .with_predictor(Predictor::Horizontal);
//!
//! let pixels: Vec<u8> = (0..64 * 16).map(|i| (i % 251) as u8).collect();
//! let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
//! for (strip, data) in pixels.chunks(64 * 8).enumerate() {
//!     tiff.write_encoded_strip(strip as u32, data).unwrap();
//! }
//! let (store, dir, chunks) = tiff.finish().unwrap();
//!
//! let mut tiff = Tiff::open(store, dir, chunks, &registry).unwrap();
//! let mut row = vec![0u8; 64];
//! for y in 8..10 {
//!     tiff.read_scanline(&mut row, y, 0).unwrap();
//!     assert_eq!(row, &pixels[y as usize * 64..(y as usize + 1) * 64]);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod directory;
pub mod geometry;
pub mod predictor;
pub mod raw;
pub mod registry;

mod read;
mod tiff;
mod write;

pub use codec::{
    ChunkSink, Codec, CodecOption, DecodeIo, EncodeIo, NotConfiguredCodec, OptionTag,
    UnsupportedCodec, Unit,
};
pub use directory::{ChunkTable, Directory, TileGeometry};
pub use predictor::{Predicted, PredictorState};
pub use raw::RawBuffer;
pub use registry::{CodecEntry, CodecHandle, CodecInit, CodecRegistry, InitFn};
pub use tiff::Tiff;

pub use oxitiff_core::{
    ByteOrder, FillOrder, Photometric, PlanarConfig, Predictor, Result, SampleFormat, Scheme,
    TiffError,
};
