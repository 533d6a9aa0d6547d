//! The codec interface and the per-scheme codecs.
//!
//! A codec turns the compressed bytes of one strip or tile into pixel data
//! and back. The image handle drives it through [`Codec`]:
//!
//! ```text
//! decode: setup_decode (once) -> pre_decode (per unit) -> decode_row/strip/tile ...
//! encode: setup_encode (once) -> pre_encode (per unit) -> encode_row/strip/tile ...
//!         -> post_encode (per unit)
//! ```
//!
//! Every method has a default: transfer functions report that the codec
//! does not implement them, hooks succeed without doing anything. A codec
//! overrides only what it supports.

use crate::directory::Directory;
use crate::raw::RawBuffer;
use oxitiff_core::{Result, TiffError};
use std::fmt;

pub mod dump;

#[cfg(feature = "deflate")]
pub mod deflate;
#[cfg(feature = "lzw")]
pub mod lzw;
#[cfg(feature = "next")]
pub mod next;
#[cfg(feature = "packbits")]
pub mod packbits;
#[cfg(feature = "thunderscan")]
pub mod thunder;

/// The unit of data a transfer function works on, for error locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// One row of a strip.
    Scanline(u32),
    /// A whole strip.
    Strip(u32),
    /// A whole tile.
    Tile(u32),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scanline(row) => write!(f, "scanline {row}"),
            Self::Strip(strip) => write!(f, "strip {strip}"),
            Self::Tile(tile) => write!(f, "tile {tile}"),
        }
    }
}

/// Destination of encoded bytes.
///
/// The slice is mutable so the sink can apply the fill order in place.
pub trait ChunkSink {
    /// Append `data` to the current strip or tile.
    fn append(&mut self, data: &mut [u8]) -> Result<()>;
}

/// What a codec sees while decoding.
pub struct DecodeIo<'a> {
    /// Image parameters.
    pub dir: &'a Directory,
    /// Compressed bytes of the current strip or tile.
    pub raw: &'a mut RawBuffer,
    /// Unit being decoded.
    pub unit: Unit,
}

/// What a codec sees while encoding.
pub struct EncodeIo<'a> {
    /// Image parameters.
    pub dir: &'a Directory,
    /// Pending encoded output.
    pub raw: &'a mut RawBuffer,
    /// Where full buffers go.
    pub sink: &'a mut dyn ChunkSink,
    /// Unit being encoded.
    pub unit: Unit,
}

impl EncodeIo<'_> {
    /// Append pending output to the store and empty the buffer.
    pub fn flush(&mut self) -> Result<()> {
        if !self.raw.is_empty() {
            self.sink.append(self.raw.output())?;
        }
        self.raw.clear();
        Ok(())
    }

    /// Copy `bytes` into the output buffer, flushing whenever it fills.
    pub fn write_all(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            let room = self.raw.limit().saturating_sub(self.raw.len());
            if room == 0 {
                self.flush()?;
                continue;
            }
            let n = room.min(bytes.len());
            self.raw.output().extend_from_slice(&bytes[..n]);
            bytes = &bytes[n..];
        }
        Ok(())
    }
}

/// Codec-specific settings passed through the image handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecOption {
    /// Deflate compression level, 1-9, or -1 for the library default.
    ZipQuality(i32),
}

impl CodecOption {
    /// Tag naming this option.
    pub fn tag(&self) -> OptionTag {
        match self {
            Self::ZipQuality(_) => OptionTag::ZipQuality,
        }
    }
}

/// Names a [`CodecOption`] for lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OptionTag {
    /// Deflate compression level.
    ZipQuality,
}

/// A compression scheme implementation.
pub trait Codec: Send {
    /// Human-readable scheme name used in messages.
    fn name(&self) -> &str;

    /// One-time preparation before the first decode.
    fn setup_decode(&mut self, _dir: &Directory) -> Result<()> {
        Ok(())
    }

    /// Prepare to decode a freshly loaded strip or tile.
    fn pre_decode(&mut self, _io: &mut DecodeIo<'_>, _sample: u16) -> Result<()> {
        Ok(())
    }

    /// Decode whole scanlines into `buf`.
    fn decode_row(&mut self, _io: &mut DecodeIo<'_>, _buf: &mut [u8], _sample: u16) -> Result<()> {
        Err(TiffError::not_implemented(self.name(), "scanline decoding"))
    }

    /// Decode a whole strip into `buf`.
    fn decode_strip(
        &mut self,
        _io: &mut DecodeIo<'_>,
        _buf: &mut [u8],
        _sample: u16,
    ) -> Result<()> {
        Err(TiffError::not_implemented(self.name(), "strip decoding"))
    }

    /// Decode a whole tile into `buf`.
    fn decode_tile(&mut self, _io: &mut DecodeIo<'_>, _buf: &mut [u8], _sample: u16) -> Result<()> {
        Err(TiffError::not_implemented(self.name(), "tile decoding"))
    }

    /// One-time preparation before the first encode.
    fn setup_encode(&mut self, _dir: &Directory) -> Result<()> {
        Ok(())
    }

    /// Prepare to encode a new strip or tile.
    fn pre_encode(&mut self, _io: &mut EncodeIo<'_>, _sample: u16) -> Result<()> {
        Ok(())
    }

    /// Finish the current strip or tile, leaving its tail in the buffer.
    fn post_encode(&mut self, _io: &mut EncodeIo<'_>) -> Result<()> {
        Ok(())
    }

    /// Encode whole scanlines.
    fn encode_row(&mut self, _io: &mut EncodeIo<'_>, _buf: &[u8], _sample: u16) -> Result<()> {
        Err(TiffError::not_implemented(self.name(), "scanline encoding"))
    }

    /// Encode a whole strip.
    fn encode_strip(&mut self, _io: &mut EncodeIo<'_>, _buf: &[u8], _sample: u16) -> Result<()> {
        Err(TiffError::not_implemented(self.name(), "strip encoding"))
    }

    /// Encode a whole tile.
    fn encode_tile(&mut self, _io: &mut EncodeIo<'_>, _buf: &[u8], _sample: u16) -> Result<()> {
        Err(TiffError::not_implemented(self.name(), "tile encoding"))
    }

    /// Release per-image state. The codec may be set up again afterwards.
    fn cleanup(&mut self) {}

    /// Skip `rows` scanlines of the current strip.
    fn seek(&mut self, _io: &mut DecodeIo<'_>, _rows: u32) -> Result<()> {
        Err(TiffError::not_implemented(self.name(), "random access"))
    }

    /// Rows per strip to suggest when the caller has no preference.
    fn default_strip_size(&self, dir: &Directory, request: u32) -> Result<u32> {
        dir.default_strip_size(request)
    }

    /// Tile size to suggest when the caller has no preference.
    fn default_tile_size(&self, width: u32, length: u32) -> (u32, u32) {
        Directory::default_tile_size(width, length)
    }

    /// Whether decoded and encoded samples are already in the right byte
    /// order, so the handle must not swap them again.
    fn handles_byte_swap(&self) -> bool {
        false
    }

    /// Change a codec setting.
    fn set_option(&mut self, option: CodecOption) -> Result<()> {
        Err(TiffError::invalid_parameter(format!(
            "{}: unknown option {:?}",
            self.name(),
            option.tag()
        )))
    }

    /// Current value of a codec setting.
    fn option(&self, _tag: OptionTag) -> Option<CodecOption> {
        None
    }
}

/// Placeholder installed for schemes without a working codec.
///
/// Every transfer function fails with "not implemented", naming the scheme.
#[derive(Debug, Clone)]
pub struct UnsupportedCodec {
    name: String,
}

impl UnsupportedCodec {
    /// A placeholder reporting errors under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Codec for UnsupportedCodec {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Codec for a known scheme that was not compiled in.
#[derive(Debug, Clone)]
pub struct NotConfiguredCodec {
    name: String,
}

impl NotConfiguredCodec {
    /// A codec that refuses to start for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Codec for NotConfiguredCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup_decode(&mut self, _dir: &Directory) -> Result<()> {
        Err(TiffError::not_configured(self.name.as_str()))
    }

    fn setup_encode(&mut self, _dir: &Directory) -> Result<()> {
        Err(TiffError::not_configured(self.name.as_str()))
    }
}
