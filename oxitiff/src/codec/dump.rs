//! Uncompressed ("dump mode") data.

use super::{Codec, DecodeIo, EncodeIo};
use oxitiff_core::{Result, TiffError};

/// Copies bytes verbatim between the raw buffer and the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpCodec;

impl DumpCodec {
    /// Create the codec.
    pub fn new() -> Self {
        Self
    }

    fn decode(io: &mut DecodeIo<'_>, buf: &mut [u8]) -> Result<()> {
        let available = io.raw.remaining();
        if available < buf.len() {
            return Err(TiffError::unexpected_eof(
                "DumpModeDecode",
                io.unit.to_string(),
                buf.len() - available,
            ));
        }
        buf.copy_from_slice(&io.raw.unread()[..buf.len()]);
        io.raw.consume(buf.len());
        Ok(())
    }
}

impl Codec for DumpCodec {
    fn name(&self) -> &str {
        "None"
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

    fn encode_row(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], _sample: u16) -> Result<()> {
        io.write_all(buf)
    }

    fn encode_strip(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], _sample: u16) -> Result<()> {
        io.write_all(buf)
    }

    fn encode_tile(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], _sample: u16) -> Result<()> {
        io.write_all(buf)
    }

    fn seek(&mut self, io: &mut DecodeIo<'_>, rows: u32) -> Result<()> {
        let skip = usize::try_from(u64::from(rows) * u64::from(io.dir.scanline_size()?))
            .map_err(|_| TiffError::overflow("seek distance"))?;
        let available = io.raw.remaining();
        if available < skip {
            return Err(TiffError::unexpected_eof(
                "DumpModeSeek",
                io.unit.to_string(),
                skip - available,
            ));
        }
        io.raw.consume(skip);
        Ok(())
    }
}
