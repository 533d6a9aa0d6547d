//! Reading strips, tiles and scanlines.

use crate::codec::{DecodeIo, Unit};
use crate::directory::{ChunkTable, Directory};
use crate::registry::CodecRegistry;
use crate::tiff::Tiff;
use oxitiff_core::bits::reverse_bits;
use oxitiff_core::{FillOrder, Result, TiffError};
use std::io::{self, Read, Seek, SeekFrom};

/// Read until `buf` is full or the store ends; returns the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<S: Read + Seek> Tiff<S> {
    /// Open an existing image whose strips or tiles are located by `chunks`.
    pub fn open(
        store: S,
        dir: Directory,
        chunks: ChunkTable,
        registry: &CodecRegistry,
    ) -> Result<Self> {
        let expected = dir.number_of_chunks()?;
        if chunks.len() < expected as usize {
            return Err(TiffError::invalid_parameter(format!(
                "{} strip/tile entries for an image of {expected}",
                chunks.len()
            )));
        }
        Self::with_parts(store, dir, chunks, registry)
    }

    /// Stored byte count of chunk `index`, rejecting empty entries.
    fn stored_len(&self, index: u32, unit: Unit) -> Result<(u64, usize)> {
        let i = index as usize;
        let count = self.chunks.byte_counts.get(i).copied().unwrap_or(0);
        if count == 0 {
            let kind = match unit {
                Unit::Tile(_) => "tile",
                _ => "strip",
            };
            return Err(TiffError::corrupted(
                "TIFFFillStrip",
                unit.to_string(),
                format!("Invalid {kind} byte count {count}"),
            ));
        }
        let len = usize::try_from(count).map_err(|_| TiffError::overflow("strip byte count"))?;
        Ok((self.chunks.offsets[i], len))
    }

    /// Read `buf.len()` bytes at `offset`.
    fn read_at(&mut self, offset: u64, unit: Unit, buf: &mut [u8]) -> Result<()> {
        self.store.seek(SeekFrom::Start(offset))?;
        let got = read_full(&mut self.store, buf)?;
        if got < buf.len() {
            return Err(TiffError::unexpected_eof(
                "TIFFFillStrip",
                unit.to_string(),
                buf.len() - got,
            ));
        }
        Ok(())
    }

    /// Load the compressed bytes of chunk `index` into the raw buffer.
    fn load_chunk(&mut self, index: u32, unit: Unit) -> Result<()> {
        let (offset, len) = self.stored_len(index, unit)?;
        self.store.seek(SeekFrom::Start(offset))?;
        let buf = self.raw.load(len)?;
        let got = read_full(&mut self.store, buf)?;
        if got < len {
            return Err(TiffError::unexpected_eof(
                "TIFFFillStrip",
                unit.to_string(),
                len - got,
            ));
        }
        if self.dir.fill_order == FillOrder::Lsb2Msb {
            reverse_bits(buf);
        }
        Ok(())
    }

    /// Load `strip` and prepare the codec to decode it.
    pub fn fill_strip(&mut self, strip: u32) -> Result<()> {
        // Forget the old unit first so a failed load is never mistaken for it
        self.cur_strip = None;
        self.load_chunk(strip, Unit::Strip(strip))?;
        self.start_strip(strip)
    }

    /// Load `tile` and prepare the codec to decode it.
    pub fn fill_tile(&mut self, tile: u32) -> Result<()> {
        self.cur_tile = None;
        self.load_chunk(tile, Unit::Tile(tile))?;
        self.start_tile(tile)
    }

    fn start_strip(&mut self, strip: u32) -> Result<()> {
        self.setup_decode_once()?;
        let per_plane = self.dir.strips_per_image()?.max(1);
        self.row = (strip % per_plane).saturating_mul(self.dir.rows_per_strip);
        self.raw.rewind();
        let sample = self.chunk_sample(strip)?;
        let mut io = DecodeIo {
            dir: &self.dir,
            raw: &mut self.raw,
            unit: Unit::Strip(strip),
        };
        self.codec.pre_decode(&mut io, sample)?;
        self.cur_strip = Some(strip);
        Ok(())
    }

    fn start_tile(&mut self, tile: u32) -> Result<()> {
        self.setup_decode_once()?;
        let (row, col) = self.tile_origin(tile)?;
        self.row = row;
        self.col = col;
        self.raw.rewind();
        let sample = self.chunk_sample(tile)?;
        let mut io = DecodeIo {
            dir: &self.dir,
            raw: &mut self.raw,
            unit: Unit::Tile(tile),
        };
        self.codec.pre_decode(&mut io, sample)?;
        self.cur_tile = Some(tile);
        Ok(())
    }

    /// Position the decoder at `row` of `sample`.
    fn seek_row(&mut self, row: u32, sample: u16) -> Result<()> {
        if row >= self.dir.image_length {
            return Err(TiffError::out_of_range(
                "row",
                row,
                self.dir.image_length.saturating_sub(1),
            ));
        }
        let strip = self.dir.compute_strip(row, sample)?;
        if self.cur_strip != Some(strip) {
            self.fill_strip(strip)?;
        } else if row < self.row {
            // Backwards within the strip: start over and decode forward
            self.start_strip(strip)?;
        }
        if row != self.row {
            let mut io = DecodeIo {
                dir: &self.dir,
                raw: &mut self.raw,
                unit: Unit::Scanline(self.row),
            };
            self.codec.seek(&mut io, row - self.row)?;
            self.row = row;
        }
        Ok(())
    }

    /// Decode scanline `row` of `sample` into `buf`.
    ///
    /// Rows are cheapest read in order; moving backwards restarts the strip.
    pub fn read_scanline(&mut self, buf: &mut [u8], row: u32, sample: u16) -> Result<()> {
        if self.dir.is_tiled() {
            return Err(TiffError::invalid_parameter(
                "Can not read scanlines from a tiled image",
            ));
        }
        let scanline = self.dir.scanline_size()? as usize;
        if buf.len() < scanline {
            return Err(TiffError::invalid_parameter(format!(
                "Scanline buffer of {} bytes is smaller than the {scanline}-byte scanline",
                buf.len()
            )));
        }
        self.seek_row(row, sample)?;

        let buf = &mut buf[..scanline];
        let mut io = DecodeIo {
            dir: &self.dir,
            raw: &mut self.raw,
            unit: Unit::Scanline(row),
        };
        let decoded = self.codec.decode_row(&mut io, buf, sample);
        self.row = row + 1;
        decoded?;
        self.post_decode(buf);
        Ok(())
    }

    /// Decode `strip` into `buf` and return the number of bytes produced.
    ///
    /// At most `buf.len()` bytes are decoded, never more than the strip
    /// holds; the last strip of a plane may be short.
    pub fn read_encoded_strip(&mut self, strip: u32, buf: &mut [u8]) -> Result<usize> {
        if self.dir.is_tiled() {
            return Err(TiffError::invalid_parameter(
                "Can not read strips from a tiled image",
            ));
        }
        let size = (self.dir.strip_byte_size(strip)? as usize).min(buf.len());
        self.fill_strip(strip)?;

        let sample = self.chunk_sample(strip)?;
        let buf = &mut buf[..size];
        let mut io = DecodeIo {
            dir: &self.dir,
            raw: &mut self.raw,
            unit: Unit::Strip(strip),
        };
        self.codec.decode_strip(&mut io, buf, sample)?;
        self.post_decode(buf);
        Ok(size)
    }

    /// Decode `tile` into `buf` and return the number of bytes produced.
    ///
    /// Edge tiles decode at the nominal tile size; the padding is whatever
    /// the encoder stored.
    pub fn read_encoded_tile(&mut self, tile: u32, buf: &mut [u8]) -> Result<usize> {
        if !self.dir.is_tiled() {
            return Err(TiffError::invalid_parameter(
                "Can not read tiles from a stripped image",
            ));
        }
        let ntiles = self.dir.number_of_tiles()?;
        if tile >= ntiles {
            return Err(TiffError::out_of_range("tile", tile, ntiles.saturating_sub(1)));
        }
        let size = (self.dir.tile_size()? as usize).min(buf.len());
        self.fill_tile(tile)?;

        let sample = self.chunk_sample(tile)?;
        let buf = &mut buf[..size];
        let mut io = DecodeIo {
            dir: &self.dir,
            raw: &mut self.raw,
            unit: Unit::Tile(tile),
        };
        self.codec.decode_tile(&mut io, buf, sample)?;
        self.post_decode(buf);
        Ok(size)
    }

    /// Decode the tile holding pixel (`x`, `y`, `z`) of `sample`.
    pub fn read_tile(&mut self, buf: &mut [u8], x: u32, y: u32, z: u32, sample: u16) -> Result<usize> {
        self.dir.check_tile(x, y, z, sample)?;
        let tile = self.dir.compute_tile(x, y, z, sample)?;
        self.read_encoded_tile(tile, buf)
    }

    /// Copy the stored bytes of `strip` into `buf` without decoding.
    ///
    /// Returns the number of bytes copied: the stored size, or less if
    /// `buf` is smaller.
    pub fn read_raw_strip(&mut self, strip: u32, buf: &mut [u8]) -> Result<usize> {
        if self.dir.is_tiled() {
            return Err(TiffError::invalid_parameter(
                "Can not read strips from a tiled image",
            ));
        }
        let nstrips = self.chunks.len();
        if strip as usize >= nstrips {
            return Err(TiffError::out_of_range(
                "strip",
                strip,
                nstrips.saturating_sub(1) as u64,
            ));
        }
        self.read_raw_chunk(strip, Unit::Strip(strip), buf)
    }

    /// Copy the stored bytes of `tile` into `buf` without decoding.
    pub fn read_raw_tile(&mut self, tile: u32, buf: &mut [u8]) -> Result<usize> {
        if !self.dir.is_tiled() {
            return Err(TiffError::invalid_parameter(
                "Can not read tiles from a stripped image",
            ));
        }
        let ntiles = self.chunks.len();
        if tile as usize >= ntiles {
            return Err(TiffError::out_of_range(
                "tile",
                tile,
                ntiles.saturating_sub(1) as u64,
            ));
        }
        self.read_raw_chunk(tile, Unit::Tile(tile), buf)
    }

    fn read_raw_chunk(&mut self, index: u32, unit: Unit, buf: &mut [u8]) -> Result<usize> {
        let (offset, len) = self.stored_len(index, unit)?;
        let size = len.min(buf.len());
        self.read_at(offset, unit, &mut buf[..size])?;
        Ok(size)
    }
}
