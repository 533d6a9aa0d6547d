//! Deflate (zlib stream) codec over `flate2`.
//!
//! Each strip or tile is one complete zlib stream; the stream state is
//! reset at every unit boundary.

use super::{Codec, CodecOption, DecodeIo, EncodeIo, OptionTag};
use crate::directory::Directory;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use oxitiff_core::{Result, TiffError};

/// Library default compression level marker.
pub const DEFAULT_QUALITY: i32 = -1;

/// Deflate codec.
#[derive(Debug)]
pub struct DeflateCodec {
    quality: i32,
    deflate: Option<Compress>,
    inflate: Option<Decompress>,
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl DeflateCodec {
    /// Create a codec using the default compression level.
    pub fn new() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            deflate: None,
            inflate: None,
        }
    }

    fn level(&self) -> Compression {
        match u32::try_from(self.quality) {
            Ok(level) => Compression::new(level),
            Err(_) => Compression::default(),
        }
    }

    fn inflate(&mut self) -> Result<&mut Decompress> {
        self.inflate
            .as_mut()
            .ok_or_else(|| TiffError::invalid_parameter("ZIPDecode: decoder used before setup"))
    }

    fn deflate(&mut self) -> Result<&mut Compress> {
        self.deflate
            .as_mut()
            .ok_or_else(|| TiffError::invalid_parameter("ZIPEncode: encoder used before setup"))
    }

    fn decode(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8]) -> Result<()> {
        let stream = self.inflate()?;
        let mut filled = 0;

        while filled < buf.len() {
            let (in_before, out_before) = (stream.total_in(), stream.total_out());
            let status = stream
                .decompress(io.raw.unread(), &mut buf[filled..], FlushDecompress::None)
                .map_err(|e| TiffError::corrupted("ZIPDecode", io.unit.to_string(), e.to_string()))?;
            let used = (stream.total_in() - in_before) as usize;
            let produced = (stream.total_out() - out_before) as usize;
            io.raw.consume(used);
            filled += produced;

            if status == Status::StreamEnd {
                if filled < buf.len() {
                    tracing::warn!("ZIPDecode: stream ended early at {}", io.unit);
                }
                break;
            }
            if used == 0 && produced == 0 {
                break;
            }
        }

        if filled < buf.len() {
            return Err(TiffError::unexpected_eof(
                "ZIPDecode",
                io.unit.to_string(),
                buf.len() - filled,
            ));
        }
        Ok(())
    }

    fn encode(&mut self, io: &mut EncodeIo<'_>, buf: &[u8]) -> Result<()> {
        let stream = self.deflate()?;
        let mut input = buf;

        while !input.is_empty() {
            if io.raw.is_full() {
                io.flush()?;
            }
            let before = stream.total_in();
            stream
                .compress_vec(input, io.raw.output(), FlushCompress::None)
                .map_err(|e| TiffError::compression("ZIPEncode", e.to_string()))?;
            let used = (stream.total_in() - before) as usize;
            input = &input[used..];
            if used == 0 {
                io.flush()?;
            }
        }
        Ok(())
    }
}

impl Codec for DeflateCodec {
    fn name(&self) -> &str {
        "Deflate"
    }

    fn setup_decode(&mut self, _dir: &Directory) -> Result<()> {
        if self.inflate.is_none() {
            self.inflate = Some(Decompress::new(true));
        }
        Ok(())
    }

    fn pre_decode(&mut self, _io: &mut DecodeIo<'_>, _sample: u16) -> Result<()> {
        self.inflate()?.reset(true);
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
        if self.deflate.is_none() {
            self.deflate = Some(Compress::new(self.level(), true));
        }
        Ok(())
    }

    fn pre_encode(&mut self, _io: &mut EncodeIo<'_>, _sample: u16) -> Result<()> {
        match self.deflate.as_mut() {
            Some(stream) => stream.reset(),
            None => self.deflate = Some(Compress::new(self.level(), true)),
        }
        Ok(())
    }

    fn post_encode(&mut self, io: &mut EncodeIo<'_>) -> Result<()> {
        let stream = self.deflate()?;
        loop {
            if io.raw.is_full() {
                io.flush()?;
            }
            let status = stream
                .compress_vec(&[], io.raw.output(), FlushCompress::Finish)
                .map_err(|e| TiffError::compression("ZIPEncode", e.to_string()))?;
            if status == Status::StreamEnd {
                return Ok(());
            }
            io.flush()?;
        }
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
        self.deflate = None;
        self.inflate = None;
    }

    fn set_option(&mut self, option: CodecOption) -> Result<()> {
        match option {
            CodecOption::ZipQuality(quality) => {
                if !(-1..=9).contains(&quality) {
                    return Err(TiffError::invalid_parameter(format!(
                        "ZIP quality {quality} outside -1..9"
                    )));
                }
                self.quality = quality;
                // Recreated with the new level at the next strip
                self.deflate = None;
                Ok(())
            }
        }
    }

    fn option(&self, tag: OptionTag) -> Option<CodecOption> {
        match tag {
            OptionTag::ZipQuality => Some(CodecOption::ZipQuality(self.quality)),
        }
    }
}
