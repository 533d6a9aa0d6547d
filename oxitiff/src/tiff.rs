//! The image handle.
//!
//! A [`Tiff`] binds one image's [`Directory`] and [`ChunkTable`] to a
//! backing store and an installed codec, and owns every piece of mutable
//! state the read and write paths share: the raw buffer, the current
//! strip/tile cursor and the codec lifecycle flags.
//!
//! Reading is available when the store is `Read + Seek` (see
//! [`Tiff::open`]); writing when it is `Write + Seek` (see [`Tiff::create`]).

use crate::codec::{Codec, CodecOption, OptionTag, UnsupportedCodec};
use crate::directory::{ChunkTable, Directory};
use crate::raw::RawBuffer;
use crate::registry::CodecRegistry;
use oxitiff_core::swab::swab_samples;
use oxitiff_core::{Result, Scheme, TiffError};

/// Codec lifecycle and buffer state.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Flags {
    /// The codec's one-time setup has run.
    pub coder_setup: bool,
    /// Data has been written through this handle.
    pub been_writing: bool,
    /// A scanline strip is open and still needs `post_encode`.
    pub post_encode: bool,
    /// The write buffer has been sized.
    pub buffer_setup: bool,
}

/// One image open over a backing store.
pub struct Tiff<S> {
    pub(crate) store: S,
    pub(crate) dir: Directory,
    pub(crate) chunks: ChunkTable,
    pub(crate) codec: Box<dyn Codec>,
    pub(crate) raw: RawBuffer,
    /// Next row the codec will produce or accept in the current strip.
    pub(crate) row: u32,
    /// First column of the current tile.
    pub(crate) col: u32,
    pub(crate) cur_strip: Option<u32>,
    pub(crate) cur_tile: Option<u32>,
    /// Store position where the next append of the current unit goes.
    /// `None` forces the append path to choose a location again.
    pub(crate) curoff: Option<u64>,
    pub(crate) flags: Flags,
    /// Byte-swapped copy of caller data on write.
    pub(crate) scratch: Vec<u8>,
}

impl<S> std::fmt::Debug for Tiff<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tiff")
            .field("dir", &self.dir)
            .field("codec", &self.codec.name())
            .field("row", &self.row)
            .field("cur_strip", &self.cur_strip)
            .field("cur_tile", &self.cur_tile)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl<S> Tiff<S> {
    pub(crate) fn with_parts(
        store: S,
        dir: Directory,
        chunks: ChunkTable,
        registry: &CodecRegistry,
    ) -> Result<Self> {
        dir.validate()?;
        let scheme = dir.compression;
        let mut tiff = Self {
            store,
            dir,
            chunks,
            codec: Box::new(UnsupportedCodec::new(scheme.to_string())),
            raw: RawBuffer::new(),
            row: 0,
            col: 0,
            cur_strip: None,
            cur_tile: None,
            curoff: None,
            flags: Flags::default(),
            scratch: Vec::new(),
        };
        tiff.install(registry, scheme)?;
        Ok(tiff)
    }

    /// Image parameters.
    pub fn directory(&self) -> &Directory {
        &self.dir
    }

    /// Strip or tile locations, as updated by writes so far.
    pub fn chunks(&self) -> &ChunkTable {
        &self.chunks
    }

    /// Name of the installed codec.
    pub fn codec_name(&self) -> &str {
        self.codec.name()
    }

    /// Strip currently loaded or being written.
    pub fn current_strip(&self) -> Option<u32> {
        self.cur_strip
    }

    /// Tile currently loaded or being written.
    pub fn current_tile(&self) -> Option<u32> {
        self.cur_tile
    }

    /// Next row the handle expects to read or write.
    pub fn current_row(&self) -> u32 {
        self.row
    }

    /// First column of the current tile.
    pub fn current_column(&self) -> u32 {
        self.col
    }

    /// Switch the image to another compression scheme.
    ///
    /// The previous codec is cleaned up and replaced by stubs that report
    /// every operation as unimplemented; the registry's codec for `scheme`,
    /// if any, is then installed. An unknown scheme keeps the stubs and is
    /// not an error. Changing the scheme once data has been written is.
    pub fn set_compression(&mut self, registry: &CodecRegistry, scheme: Scheme) -> Result<()> {
        if self.flags.been_writing {
            return Err(TiffError::write_protocol(
                "Cannot modify tag \"Compression\" while writing",
            ));
        }
        if scheme.to_u16() == self.dir.compression.to_u16() {
            return Ok(());
        }
        self.install(registry, scheme)
    }

    fn install(&mut self, registry: &CodecRegistry, scheme: Scheme) -> Result<()> {
        self.codec.cleanup();
        self.flags.coder_setup = false;
        self.cur_strip = None;
        self.cur_tile = None;

        let entry = registry.find(scheme);
        let name = entry.map_or_else(|| scheme.to_string(), |e| e.name.clone());
        self.codec = Box::new(UnsupportedCodec::new(name));
        match entry {
            Some(entry) => {
                self.codec = entry.instantiate()?;
                tracing::debug!(codec = %entry.name, scheme = scheme.to_u16(), "installed codec");
            }
            None => {
                tracing::debug!(scheme = scheme.to_u16(), "no codec registered, using stubs");
            }
        }
        self.dir.compression = scheme;
        Ok(())
    }

    /// Change a setting of the installed codec.
    pub fn set_codec_option(&mut self, option: CodecOption) -> Result<()> {
        self.codec.set_option(option)
    }

    /// Current value of a setting of the installed codec.
    pub fn codec_option(&self, tag: OptionTag) -> Option<CodecOption> {
        self.codec.option(tag)
    }

    /// Rows per strip the installed codec suggests.
    pub fn default_strip_size(&self, request: u32) -> Result<u32> {
        self.codec.default_strip_size(&self.dir, request)
    }

    /// Tile size the installed codec suggests.
    pub fn default_tile_size(&self, width: u32, length: u32) -> (u32, u32) {
        self.codec.default_tile_size(width, length)
    }

    /// Give back the store and the image description without flushing.
    pub fn into_parts(mut self) -> (S, Directory, ChunkTable) {
        self.codec.cleanup();
        (self.store, self.dir, self.chunks)
    }

    /// Swap samples read from the file into host order.
    pub(crate) fn post_decode(&self, buf: &mut [u8]) {
        if self.dir.byte_order.needs_swap() && !self.codec.handles_byte_swap() {
            swab_samples(buf, self.dir.bits_per_sample);
        }
    }

    /// Run the codec's decode setup once.
    pub(crate) fn setup_decode_once(&mut self) -> Result<()> {
        if !self.flags.coder_setup {
            self.codec.setup_decode(&self.dir)?;
            self.flags.coder_setup = true;
        }
        Ok(())
    }

    /// Run the codec's encode setup once.
    pub(crate) fn setup_encode_once(&mut self) -> Result<()> {
        if !self.flags.coder_setup {
            self.codec.setup_encode(&self.dir)?;
            self.flags.coder_setup = true;
        }
        Ok(())
    }

    /// Row and column where `tile` starts.
    pub(crate) fn tile_origin(&self, tile: u32) -> Result<(u32, u32)> {
        let (tw, tl, _) = self.dir.tile_dims();
        let across = self.dir.tiles_across()?.max(1);
        let down = self.dir.tiles_down()?.max(1);
        let index = tile % self.dir.tiles_per_plane()?.max(1);
        let row = ((index / across) % down).saturating_mul(tl);
        let col = (index % across).saturating_mul(tw);
        Ok((row, col))
    }

    /// First row of `strip` within its plane.
    pub(crate) fn strip_origin(&self, strip: u32) -> Result<u32> {
        let per_plane = self.dir.strips_per_image()?;
        if per_plane == 0 {
            return Err(TiffError::write_protocol("Zero strips per image"));
        }
        Ok((strip % per_plane).saturating_mul(self.dir.rows_per_strip))
    }

    /// Sample plane holding chunk `index`.
    pub(crate) fn chunk_sample(&self, index: u32) -> Result<u16> {
        let per_plane = self.dir.chunks_per_plane()?.max(1);
        u16::try_from(index / per_plane).map_err(|_| TiffError::overflow("sample index"))
    }
}
