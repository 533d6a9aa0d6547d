//! Writing strips, tiles and scanlines.
//!
//! Encoded bytes reach the store through [`Appender`], which places each
//! strip or tile: a rewritten unit goes back to its old location when the
//! new data is no larger than what is stored there, otherwise it goes to
//! the end of the store.

use crate::codec::{ChunkSink, Codec, EncodeIo, Unit};
use crate::directory::{ChunkTable, Directory};
use crate::registry::CodecRegistry;
use crate::tiff::Tiff;
use oxitiff_core::bits::{reverse_bits, round_up_usize};
use oxitiff_core::swab::swab_samples;
use oxitiff_core::{FillOrder, Result, TiffError};
use std::io::{Seek, SeekFrom, Write};

/// Append `data` to chunk `index`, choosing its location on the first
/// append of a unit.
fn append_to_chunk<S: Write + Seek>(
    store: &mut S,
    chunks: &mut ChunkTable,
    curoff: &mut Option<u64>,
    index: usize,
    data: &[u8],
) -> Result<()> {
    let start = match *curoff {
        Some(off) if chunks.is_placed(index) => off,
        _ => {
            let old_count = chunks.byte_counts[index];
            let offset = if old_count != 0 && old_count >= data.len() as u64 {
                let offset = chunks.offsets[index];
                tracing::debug!(index, offset, old_count, "rewriting chunk in place");
                offset
            } else {
                let offset = store.seek(SeekFrom::End(0))?;
                tracing::debug!(index, offset, "placing chunk at end of store");
                chunks.offsets[index] = offset;
                offset
            };
            chunks.byte_counts[index] = 0;
            offset
        }
    };

    let end = start
        .checked_add(data.len() as u64)
        .ok_or(TiffError::overflow("file offset"))?;
    store.seek(SeekFrom::Start(start))?;
    store.write_all(data)?;
    *curoff = Some(end);
    chunks.byte_counts[index] += data.len() as u64;
    Ok(())
}

/// Sink writing encoded output into one strip or tile of the store.
struct Appender<'a, S> {
    store: &'a mut S,
    chunks: &'a mut ChunkTable,
    curoff: &'a mut Option<u64>,
    index: usize,
    fill_order: FillOrder,
}

impl<S: Write + Seek> ChunkSink for Appender<'_, S> {
    fn append(&mut self, data: &mut [u8]) -> Result<()> {
        if self.fill_order == FillOrder::Lsb2Msb {
            reverse_bits(data);
        }
        append_to_chunk(self.store, self.chunks, self.curoff, self.index, data)
    }
}

impl<S: Write + Seek> Tiff<S> {
    /// Start a new image with every strip or tile unwritten.
    pub fn create(store: S, dir: Directory, registry: &CodecRegistry) -> Result<Self> {
        let chunks = ChunkTable::new(dir.number_of_chunks()? as usize);
        Self::with_parts(store, dir, chunks, registry)
    }

    fn check_write(&mut self, tiles: bool) -> Result<()> {
        if tiles != self.dir.is_tiled() {
            return Err(TiffError::write_protocol(if tiles {
                "Can not write tiles to a stripped image"
            } else {
                "Can not write scanlines to a tiled image"
            }));
        }
        self.flags.been_writing = true;
        Ok(())
    }

    /// Size the write buffer for one strip or tile on first use.
    fn buffer_check(&mut self) -> Result<()> {
        if !self.flags.buffer_setup {
            let size = if self.dir.is_tiled() {
                self.dir.tile_size()?
            } else {
                self.dir.strip_size()?
            };
            self.raw.setup_write(size as usize)?;
            self.flags.buffer_setup = true;
        }
        Ok(())
    }

    /// Grow the chunk table so that `index` exists.
    fn grow_strips(&mut self, index: usize) -> Result<()> {
        if index >= self.chunks.len() {
            if self.dir.is_separate() {
                return Err(TiffError::write_protocol(
                    "Can not grow image by strips when using separate planes",
                ));
            }
            tracing::debug!(from = self.chunks.len(), to = index + 1, "growing strip arrays");
            self.chunks.grow(index + 1 - self.chunks.len());
        }
        Ok(())
    }

    /// Prepare to overwrite a unit that already has data on disk.
    ///
    /// The buffer is made larger than the stored size so an encoding that
    /// outgrows it is caught on its first append and placed at the end.
    fn prepare_rewrite(&mut self, index: usize) -> Result<()> {
        let old = self.chunks.byte_counts[index];
        if old > 0 {
            let old = usize::try_from(old).map_err(|_| TiffError::overflow("strip byte count"))?;
            if self.raw.limit() <= old {
                let size = round_up_usize(old.saturating_add(1), 1024)?;
                self.raw.setup_write(size)?;
            }
            self.curoff = None;
        }
        Ok(())
    }

    /// Run `f` with the codec and an encode context appending to chunk
    /// `index`.
    fn with_encoder<R>(
        &mut self,
        index: usize,
        unit: Unit,
        f: impl FnOnce(&mut dyn Codec, &mut EncodeIo<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut sink = Appender {
            store: &mut self.store,
            chunks: &mut self.chunks,
            curoff: &mut self.curoff,
            index,
            fill_order: self.dir.fill_order,
        };
        let mut io = EncodeIo {
            dir: &self.dir,
            raw: &mut self.raw,
            sink: &mut sink,
            unit,
        };
        f(self.codec.as_mut(), &mut io)
    }

    /// Caller data in file byte order, copied into `scratch` if it has to
    /// be swapped.
    fn swab_for_write<'a>(&self, scratch: &'a mut Vec<u8>, data: &'a [u8]) -> &'a [u8] {
        let bits = self.dir.bits_per_sample;
        if self.dir.byte_order.needs_swap()
            && !self.codec.handles_byte_swap()
            && matches!(bits, 16 | 24 | 32 | 64)
        {
            scratch.clear();
            scratch.extend_from_slice(data);
            swab_samples(scratch, bits);
            scratch
        } else {
            data
        }
    }

    /// Encode one whole strip or tile and append it.
    fn encode_chunk(&mut self, index: u32, unit: Unit, data: &[u8], sample: u16) -> Result<()> {
        self.raw.clear();
        let mut scratch = std::mem::take(&mut self.scratch);
        let data = self.swab_for_write(&mut scratch, data);
        let result = self.with_encoder(index as usize, unit, |codec, io| {
            codec.pre_encode(io, sample)?;
            match unit {
                Unit::Tile(_) => codec.encode_tile(io, data, sample)?,
                _ => codec.encode_strip(io, data, sample)?,
            }
            codec.post_encode(io)?;
            io.flush()
        });
        self.scratch = scratch;
        result
    }

    /// Encode scanline `row` of `sample` from `buf`.
    ///
    /// Rows of a strip must be written in order. Writing past the end of a
    /// contiguous image grows it.
    pub fn write_scanline(&mut self, buf: &[u8], row: u32, sample: u16) -> Result<()> {
        self.check_write(false)?;
        self.buffer_check()?;
        let scanline = self.dir.scanline_size()? as usize;
        if buf.len() < scanline {
            return Err(TiffError::invalid_parameter(format!(
                "Scanline buffer of {} bytes is smaller than the {scanline}-byte scanline",
                buf.len()
            )));
        }

        if row >= self.dir.image_length {
            if self.dir.is_separate() {
                return Err(TiffError::write_protocol(
                    "Can not change \"ImageLength\" when using separate planes",
                ));
            }
            self.dir.image_length = row
                .checked_add(1)
                .ok_or(TiffError::overflow("image length"))?;
        }
        let strip = self.dir.compute_strip(row, sample)?;
        self.grow_strips(strip as usize)?;

        if self.cur_strip != Some(strip) {
            self.flush_data()?;
            self.cur_strip = Some(strip);
            self.row = self.strip_origin(strip)?;
            self.setup_encode_once()?;
            self.raw.clear();
            let index = strip as usize;
            if self.chunks.byte_counts[index] > 0 {
                self.chunks.byte_counts[index] = 0;
                self.curoff = None;
            }
            self.with_encoder(index, Unit::Strip(strip), |codec, io| {
                codec.pre_encode(io, sample)
            })?;
            self.flags.post_encode = true;
        }

        if row != self.row {
            return Err(TiffError::write_protocol(format!(
                "Scanline {row} written out of order, expected row {}",
                self.row
            )));
        }

        let mut scratch = std::mem::take(&mut self.scratch);
        let data = self.swab_for_write(&mut scratch, &buf[..scanline]);
        let result = self.with_encoder(strip as usize, Unit::Scanline(row), |codec, io| {
            codec.encode_row(io, data, sample)
        });
        self.scratch = scratch;
        result?;
        self.row = row + 1;
        Ok(())
    }

    /// Encode `data` as the whole of `strip` and return the bytes consumed.
    ///
    /// Writing one past the last strip of a contiguous image grows the
    /// strip arrays.
    pub fn write_encoded_strip(&mut self, strip: u32, data: &[u8]) -> Result<usize> {
        self.check_write(false)?;
        self.flush_data()?;
        let index = strip as usize;
        self.grow_strips(index)?;
        self.buffer_check()?;

        self.cur_strip = Some(strip);
        self.prepare_rewrite(index)?;
        self.row = self.strip_origin(strip)?;
        self.setup_encode_once()?;
        self.flags.post_encode = false;

        let sample = self.chunk_sample(strip)?;
        self.encode_chunk(strip, Unit::Strip(strip), data, sample)?;
        Ok(data.len())
    }

    /// Encode `data` as the whole of `tile` and return the bytes consumed.
    ///
    /// Data beyond one tile is ignored.
    pub fn write_encoded_tile(&mut self, tile: u32, data: &[u8]) -> Result<usize> {
        self.check_write(true)?;
        self.flush_data()?;
        let ntiles = self.chunks.len();
        if tile as usize >= ntiles {
            return Err(TiffError::out_of_range(
                "tile",
                tile,
                ntiles.saturating_sub(1) as u64,
            ));
        }
        self.buffer_check()?;

        self.cur_tile = Some(tile);
        self.prepare_rewrite(tile as usize)?;
        let (row, col) = self.tile_origin(tile)?;
        self.row = row;
        self.col = col;
        self.setup_encode_once()?;
        self.flags.post_encode = false;

        let size = (self.dir.tile_size()? as usize).min(data.len());
        let sample = self.chunk_sample(tile)?;
        self.encode_chunk(tile, Unit::Tile(tile), &data[..size], sample)?;
        Ok(size)
    }

    /// Encode the tile holding pixel (`x`, `y`, `z`) of `sample`.
    pub fn write_tile(&mut self, data: &[u8], x: u32, y: u32, z: u32, sample: u16) -> Result<usize> {
        self.dir.check_tile(x, y, z, sample)?;
        let tile = self.dir.compute_tile(x, y, z, sample)?;
        self.write_encoded_tile(tile, data)
    }

    /// Append already-encoded bytes to `strip`.
    pub fn write_raw_strip(&mut self, strip: u32, data: &[u8]) -> Result<usize> {
        self.check_write(false)?;
        self.flush_data()?;
        let index = strip as usize;
        self.grow_strips(index)?;
        if self.cur_strip != Some(strip) {
            self.curoff = None;
        }
        self.cur_strip = Some(strip);
        self.row = self.strip_origin(strip)?;
        append_to_chunk(
            &mut self.store,
            &mut self.chunks,
            &mut self.curoff,
            index,
            data,
        )?;
        Ok(data.len())
    }

    /// Append already-encoded bytes to `tile`.
    pub fn write_raw_tile(&mut self, tile: u32, data: &[u8]) -> Result<usize> {
        self.check_write(true)?;
        self.flush_data()?;
        let ntiles = self.chunks.len();
        if tile as usize >= ntiles {
            return Err(TiffError::out_of_range(
                "tile",
                tile,
                ntiles.saturating_sub(1) as u64,
            ));
        }
        if self.cur_tile != Some(tile) {
            self.curoff = None;
        }
        self.cur_tile = Some(tile);
        append_to_chunk(
            &mut self.store,
            &mut self.chunks,
            &mut self.curoff,
            tile as usize,
            data,
        )?;
        Ok(data.len())
    }

    /// Finish an open scanline strip and append any buffered output.
    pub fn flush_data(&mut self) -> Result<()> {
        if !self.flags.been_writing {
            return Ok(());
        }
        let current = if self.dir.is_tiled() {
            self.cur_tile.map(Unit::Tile)
        } else {
            self.cur_strip.map(Unit::Strip)
        };
        let Some(unit) = current else {
            return Ok(());
        };
        let index = match unit {
            Unit::Strip(i) | Unit::Tile(i) | Unit::Scanline(i) => i as usize,
        };
        let post_encode = std::mem::take(&mut self.flags.post_encode);
        self.with_encoder(index, unit, |codec, io| {
            if post_encode {
                codec.post_encode(io)?;
            }
            io.flush()
        })
    }

    /// Flush pending data and hand back the store with the final image
    /// description and strip/tile locations.
    pub fn finish(mut self) -> Result<(S, Directory, ChunkTable)> {
        self.flush_data()?;
        self.store.flush()?;
        tracing::debug!(chunks = self.chunks.len(), "finished writing image");
        Ok(self.into_parts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_append_places_then_continues() {
        let mut store = Cursor::new(vec![9u8; 4]);
        let mut chunks = ChunkTable::new(2);
        let mut curoff = None;
        append_to_chunk(&mut store, &mut chunks, &mut curoff, 0, &[1, 2]).unwrap();
        append_to_chunk(&mut store, &mut chunks, &mut curoff, 0, &[3]).unwrap();
        assert_eq!(chunks.offsets[0], 4);
        assert_eq!(chunks.byte_counts[0], 3);
        assert_eq!(store.get_ref(), &[9, 9, 9, 9, 1, 2, 3]);

        // A fresh unit is placed at the end even while an offset is current
        append_to_chunk(&mut store, &mut chunks, &mut curoff, 1, &[4]).unwrap();
        assert_eq!(chunks.offsets[1], 7);
    }

    #[test]
    fn test_append_reuses_only_when_not_larger() {
        let mut store = Cursor::new(vec![0u8; 10]);
        let mut chunks = ChunkTable::from_parts(vec![2], vec![4]).unwrap();

        let mut curoff = None;
        append_to_chunk(&mut store, &mut chunks, &mut curoff, 0, &[7, 7, 7]).unwrap();
        assert_eq!(chunks.offsets[0], 2);
        assert_eq!(chunks.byte_counts[0], 3);
        assert_eq!(store.get_ref().len(), 10);

        let mut curoff = None;
        append_to_chunk(&mut store, &mut chunks, &mut curoff, 0, &[8; 5]).unwrap();
        assert_eq!(chunks.offsets[0], 10);
        assert_eq!(chunks.byte_counts[0], 5);
    }

    #[test]
    fn test_scanlines_grow_image() {
        let registry = CodecRegistry::new();
        let dir = Directory::new(2, 0).with_rows_per_strip(2);
        let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
        for row in 0..3u8 {
            tiff.write_scanline(&[row, row], u32::from(row), 0).unwrap();
        }
        let (store, dir, chunks) = tiff.finish().unwrap();
        assert_eq!(dir.image_length, 3);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.byte_counts, [4, 2]);
        assert_eq!(store.into_inner(), [0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_out_of_order_scanline_rejected() {
        let registry = CodecRegistry::new();
        let dir = Directory::new(2, 4);
        let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
        tiff.write_scanline(&[0, 0], 0, 0).unwrap();
        let err = tiff.write_scanline(&[0, 0], 2, 0).unwrap_err();
        assert!(matches!(err, TiffError::WriteProtocol { .. }));
    }

    #[test]
    fn test_separate_planes_cannot_grow() {
        let registry = CodecRegistry::new();
        let dir = Directory::new(2, 1)
            .with_samples_per_pixel(2)
            .with_planar_config(oxitiff_core::PlanarConfig::Separate);
        let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
        let err = tiff.write_scanline(&[0, 0], 1, 0).unwrap_err();
        assert!(err.to_string().contains("ImageLength"));
        assert!(tiff.write_encoded_strip(5, &[0, 0]).is_err());
    }

    #[test]
    fn test_wrong_layout_rejected() {
        let registry = CodecRegistry::new();
        let mut tiff =
            Tiff::create(Cursor::new(Vec::new()), Directory::new(4, 4), &registry).unwrap();
        assert!(tiff.write_encoded_tile(0, &[0; 16]).is_err());
        assert!(tiff.write_raw_tile(0, &[0; 16]).is_err());
    }

    #[test]
    fn test_encoded_write_flushes_open_strip() {
        let registry = CodecRegistry::new();
        let dir = Directory::new(2, 4).with_rows_per_strip(2);
        let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
        tiff.write_scanline(&[1, 1], 0, 0).unwrap();
        tiff.write_encoded_strip(1, &[2, 2, 2, 2]).unwrap();
        let (_, _, chunks) = tiff.finish().unwrap();
        assert_eq!(chunks.byte_counts, [2, 4]);
        assert_eq!(chunks.offsets, [0, 2]);
    }
}
