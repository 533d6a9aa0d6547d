//! LZW codec adapter over `oxitiff-lzw`.
//!
//! The streaming encoder and decoder keep their state between calls, so a
//! strip can be produced or consumed one scanline at a time.

use super::{Codec, DecodeIo, EncodeIo};
use crate::directory::Directory;
use oxitiff_core::{Result, TiffError};
use oxitiff_lzw::{LzwConfig, LzwDecoder, LzwEncoder};

/// Headroom the encoder may overshoot the flush threshold by.
const ENCODE_SLACK: usize = 5;

/// LZW codec.
#[derive(Debug)]
pub struct LzwCodec {
    config: LzwConfig,
    encoder: Option<LzwEncoder>,
    decoder: Option<LzwDecoder>,
}

impl Default for LzwCodec {
    fn default() -> Self {
        Self::new(LzwConfig::TIFF)
    }
}

impl LzwCodec {
    /// Create a codec using `config`.
    pub fn new(config: LzwConfig) -> Self {
        Self {
            config,
            encoder: None,
            decoder: None,
        }
    }

    fn decoder(&mut self) -> Result<&mut LzwDecoder> {
        self.decoder
            .as_mut()
            .ok_or_else(|| TiffError::invalid_parameter("LZW decoder used before setup"))
    }

    fn encoder(&mut self) -> Result<&mut LzwEncoder> {
        self.encoder
            .as_mut()
            .ok_or_else(|| TiffError::invalid_parameter("LZW encoder used before setup"))
    }

    fn decode(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8]) -> Result<()> {
        let decoder = self.decoder()?;
        let consumed = decoder
            .decode(io.raw.unread(), buf)
            .map_err(|e| e.into_tiff(io.unit.to_string()))?;
        io.raw.consume(consumed);
        Ok(())
    }

    fn encode(&mut self, io: &mut EncodeIo<'_>, buf: &[u8]) -> Result<()> {
        let encoder = self.encoder()?;
        let mut input = buf;
        while !input.is_empty() {
            let limit = io.raw.limit().saturating_sub(ENCODE_SLACK);
            let consumed = encoder.encode(input, io.raw.output(), limit);
            input = &input[consumed..];
            if !input.is_empty() {
                io.flush()?;
            }
        }
        Ok(())
    }
}

impl Codec for LzwCodec {
    fn name(&self) -> &str {
        "LZW"
    }

    fn setup_decode(&mut self, _dir: &Directory) -> Result<()> {
        if self.decoder.is_none() {
            self.decoder = Some(LzwDecoder::new(self.config)?);
        }
        Ok(())
    }

    fn pre_decode(&mut self, io: &mut DecodeIo<'_>, _sample: u16) -> Result<()> {
        self.decoder()?.begin(io.raw.unread());
        Ok(())
    }

    fn decode_row(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], _sample: u16) -> Result<()> {
        self.decode(io, buf)
    }

    fn decode_strip(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], _sample: u16) -> Result<()> {
        self.decode(io, buf)
    }

    fn decode_tile(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], _sample: u16) -> Result<()> {
        self.decode(io, buf)
    }

    fn setup_encode(&mut self, _dir: &Directory) -> Result<()> {
        if self.encoder.is_none() {
            self.encoder = Some(LzwEncoder::new(self.config)?);
        }
        Ok(())
    }

    fn pre_encode(&mut self, _io: &mut EncodeIo<'_>, _sample: u16) -> Result<()> {
        self.encoder()?.begin();
        Ok(())
    }

    fn post_encode(&mut self, io: &mut EncodeIo<'_>) -> Result<()> {
        if io.raw.len() + ENCODE_SLACK > io.raw.limit() {
            io.flush()?;
        }
        let encoder = self.encoder()?;
        encoder.finish(io.raw.output());
        Ok(())
    }

    fn encode_row(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], _sample: u16) -> Result<()> {
        self.encode(io, buf)
    }

    fn encode_strip(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], _sample: u16) -> Result<()> {
        self.encode(io, buf)
    }

    fn encode_tile(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], _sample: u16) -> Result<()> {
        self.encode(io, buf)
    }

    fn cleanup(&mut self) {
        self.encoder = None;
        self.decoder = None;
    }
}
