//! Strip and tile geometry.
//!
//! Pure size and index arithmetic over [`Directory`] parameters. Every
//! product goes through the checked helpers of [`oxitiff_core::bits`], so a
//! directory whose dimensions overflow 32 bits yields
//! [`TiffError::IntegerOverflow`] instead of a wrapped size.
//!
//! Chroma-subsampled YCbCr data (contiguous, not upsampled) is stored as
//! sampling blocks: for an `h x v` block there are `h * v` luma samples
//! followed by one Cb and one Cr sample. Row counts and widths are rounded
//! up to whole blocks and the chroma bytes are added to the luma bytes.

use crate::directory::Directory;
use oxitiff_core::bits::{checked_add, checked_mul, howmany, howmany8, round_up};
use oxitiff_core::{Result, TiffError};

/// Target size of a default strip in bytes.
pub const STRIP_SIZE_DEFAULT: u32 = 8192;

/// Default tile edge in pixels.
pub const TILE_SIZE_DEFAULT: u32 = 256;

impl Directory {
    /// Horizontal and vertical chroma subsampling as a checked pair.
    fn chroma_block(&self) -> Result<(u32, u32)> {
        let [h, v] = self.ycbcr_subsampling;
        let valid = |s: u16| matches!(s, 1 | 2 | 4);
        if !valid(h) || !valid(v) {
            return Err(TiffError::invalid_parameter(format!(
                "Invalid YCbCr subsampling ({h}x{v})"
            )));
        }
        Ok((u32::from(h), u32::from(v)))
    }

    /// Bytes for `nrows` rows of `width` pixels in sampling-block layout.
    fn subsampled_size(&self, width: u32, nrows: u32, what: &'static str) -> Result<u32> {
        let (h, v) = self.chroma_block()?;
        let w = round_up(width, h, what)?;
        let row_bytes = howmany8(checked_mul(w, u32::from(self.bits_per_sample), what)?);
        let nrows = round_up(nrows, v, what)?;
        let luma = checked_mul(nrows, row_bytes, what)?;
        checked_add(luma, checked_mul(2, luma / (h * v), what)?, what)
    }

    /// Strips in one sample plane.
    pub fn strips_per_image(&self) -> Result<u32> {
        if self.rows_per_strip == u32::MAX {
            return Ok(u32::from(self.image_length != 0));
        }
        howmany(self.image_length, self.rows_per_strip, "strips per image")
    }

    /// Strips in the whole image, counting every plane.
    pub fn number_of_strips(&self) -> Result<u32> {
        let per_plane = self.strips_per_image()?;
        if self.is_separate() {
            checked_mul(per_plane, u32::from(self.samples_per_pixel), "number of strips")
        } else {
            Ok(per_plane)
        }
    }

    /// Strip holding `row` of `sample`.
    pub fn compute_strip(&self, row: u32, sample: u16) -> Result<u32> {
        let strip = if self.rows_per_strip == 0 {
            return Err(TiffError::invalid_parameter("RowsPerStrip must be non-zero"));
        } else {
            row / self.rows_per_strip
        };
        if self.is_separate() {
            if sample >= self.samples_per_pixel {
                return Err(TiffError::out_of_range(
                    "sample",
                    sample,
                    self.samples_per_pixel.saturating_sub(1),
                ));
            }
            let offset = checked_mul(u32::from(sample), self.strips_per_image()?, "strip index")?;
            return checked_add(offset, strip, "strip index");
        }
        Ok(strip)
    }

    /// Bytes in one decoded scanline (one sample plane when separate).
    pub fn scanline_size(&self) -> Result<u32> {
        const WHAT: &str = "scanline size";
        let bits = u32::from(self.bits_per_sample);
        if self.is_subsampled_ycbcr() {
            // One sampling row spans `v` scanlines
            let (h, v) = self.chroma_block()?;
            let width = round_up(self.image_width, h, WHAT)?;
            let luma = checked_mul(howmany8(checked_mul(width, bits, WHAT)?), v, WHAT)?;
            let sampling_row = checked_add(luma, checked_mul(2, luma / (h * v), WHAT)?, WHAT)?;
            return Ok(sampling_row / v);
        }
        let samples = if self.is_separate() {
            self.image_width
        } else {
            checked_mul(self.image_width, u32::from(self.samples_per_pixel), WHAT)?
        };
        Ok(howmany8(checked_mul(samples, bits, WHAT)?))
    }

    /// Bytes in one scanline of the image as an application sees it,
    /// ignoring chroma subsampling.
    pub fn raster_scanline_size(&self) -> Result<u32> {
        const WHAT: &str = "raster scanline size";
        let bits = checked_mul(u32::from(self.bits_per_sample), self.image_width, WHAT)?;
        let spp = u32::from(self.samples_per_pixel);
        if self.is_separate() {
            checked_mul(howmany8(bits), spp, WHAT)
        } else {
            Ok(howmany8(checked_mul(bits, spp, WHAT)?))
        }
    }

    /// Bytes in a strip of `nrows` rows; `u32::MAX` means the whole image.
    pub fn vstrip_size(&self, nrows: u32) -> Result<u32> {
        let nrows = if nrows == u32::MAX {
            self.image_length
        } else {
            nrows
        };
        if self.is_subsampled_ycbcr() {
            return self.subsampled_size(self.image_width, nrows, "strip size");
        }
        checked_mul(nrows, self.scanline_size()?, "strip size")
    }

    /// Nominal bytes in a full strip.
    pub fn strip_size(&self) -> Result<u32> {
        self.vstrip_size(self.rows_per_strip.min(self.image_length))
    }

    /// Rows actually present in `strip`; the last strip of a plane may be
    /// short.
    pub fn strip_rows(&self, strip: u32) -> Result<u32> {
        let nstrips = self.number_of_strips()?;
        if strip >= nstrips {
            return Err(TiffError::out_of_range("strip", strip, nstrips.saturating_sub(1)));
        }
        let rps = self.rows_per_strip.min(self.image_length);
        let per_plane = self.strips_per_image()?.max(1);
        let first_row = checked_mul(strip % per_plane, rps, "strip rows")?;
        Ok((self.image_length - first_row).min(rps))
    }

    /// Bytes in `strip`, truncated for a short final strip.
    pub fn strip_byte_size(&self, strip: u32) -> Result<u32> {
        self.vstrip_size(self.strip_rows(strip)?)
    }

    /// Tile width, length and depth; an untiled image is one tile.
    pub(crate) fn tile_dims(&self) -> (u32, u32, u32) {
        match self.tile {
            Some(tile) => (tile.width, tile.length, tile.depth),
            None => (self.image_width, self.image_length, self.image_depth),
        }
    }

    /// Bytes in one row of a tile (one sample plane when separate).
    pub fn tile_row_size(&self) -> Result<u32> {
        const WHAT: &str = "tile row size";
        let (width, length, _) = self.tile_dims();
        if width == 0 || length == 0 {
            return Ok(0);
        }
        let mut bits = checked_mul(u32::from(self.bits_per_sample), width, WHAT)?;
        if !self.is_separate() {
            bits = checked_mul(bits, u32::from(self.samples_per_pixel), WHAT)?;
        }
        Ok(howmany8(bits))
    }

    /// Bytes in a tile of `nrows` rows.
    pub fn vtile_size(&self, nrows: u32) -> Result<u32> {
        const WHAT: &str = "tile size";
        let (width, length, depth) = self.tile_dims();
        if width == 0 || length == 0 || depth == 0 {
            return Ok(0);
        }
        let size = if self.is_subsampled_ycbcr() {
            self.subsampled_size(width, nrows, WHAT)?
        } else {
            checked_mul(nrows, self.tile_row_size()?, WHAT)?
        };
        checked_mul(size, depth, WHAT)
    }

    /// Bytes in a full tile. Edge tiles are stored padded to this size.
    pub fn tile_size(&self) -> Result<u32> {
        self.vtile_size(self.tile_dims().1)
    }

    /// Tiles needed to span the image width.
    pub fn tiles_across(&self) -> Result<u32> {
        howmany(self.image_width, self.tile_dims().0, "tiles across")
    }

    /// Tiles needed to span the image length.
    pub fn tiles_down(&self) -> Result<u32> {
        howmany(self.image_length, self.tile_dims().1, "tiles down")
    }

    /// Tiles in one sample plane.
    pub fn tiles_per_plane(&self) -> Result<u32> {
        const WHAT: &str = "number of tiles";
        let (width, length, depth) = self.tile_dims();
        if width == 0 || length == 0 || depth == 0 {
            return Ok(0);
        }
        let slices = howmany(self.image_depth, depth, WHAT)?;
        checked_mul(
            checked_mul(self.tiles_across()?, self.tiles_down()?, WHAT)?,
            slices,
            WHAT,
        )
    }

    /// Tiles in the whole image, counting every plane.
    pub fn number_of_tiles(&self) -> Result<u32> {
        let per_plane = self.tiles_per_plane()?;
        if self.is_separate() {
            checked_mul(per_plane, u32::from(self.samples_per_pixel), "number of tiles")
        } else {
            Ok(per_plane)
        }
    }

    /// Tile holding pixel `(x, y, z)` of `sample`.
    pub fn compute_tile(&self, x: u32, y: u32, z: u32, sample: u16) -> Result<u32> {
        const WHAT: &str = "tile index";
        let (dx, dy, dz) = self.tile_dims();
        if dx == 0 || dy == 0 || dz == 0 {
            return Ok(0);
        }
        let z = if self.image_depth == 1 { 0 } else { z };
        let across = self.tiles_across()?;
        let plane = checked_mul(across, self.tiles_down()?, WHAT)?;

        let mut tile = checked_add(
            checked_mul(plane, z / dz, WHAT)?,
            checked_mul(across, y / dy, WHAT)?,
            WHAT,
        )?;
        tile = checked_add(tile, x / dx, WHAT)?;
        if self.is_separate() {
            let volume = checked_mul(plane, howmany(self.image_depth, dz, WHAT)?, WHAT)?;
            tile = checked_add(tile, checked_mul(volume, u32::from(sample), WHAT)?, WHAT)?;
        }
        Ok(tile)
    }

    /// Check that `(x, y, z, sample)` lies inside the image.
    pub fn check_tile(&self, x: u32, y: u32, z: u32, sample: u16) -> Result<()> {
        if x >= self.image_width {
            return Err(TiffError::out_of_range(
                "column",
                x,
                self.image_width.saturating_sub(1),
            ));
        }
        if y >= self.image_length {
            return Err(TiffError::out_of_range(
                "row",
                y,
                self.image_length.saturating_sub(1),
            ));
        }
        if z >= self.image_depth {
            return Err(TiffError::out_of_range(
                "depth",
                z,
                self.image_depth.saturating_sub(1),
            ));
        }
        if self.is_separate() && sample >= self.samples_per_pixel {
            return Err(TiffError::out_of_range(
                "sample",
                sample,
                self.samples_per_pixel.saturating_sub(1),
            ));
        }
        Ok(())
    }

    /// Strips or tiles in one sample plane.
    pub fn chunks_per_plane(&self) -> Result<u32> {
        if self.is_tiled() {
            self.tiles_per_plane()
        } else {
            self.strips_per_image()
        }
    }

    /// Strips or tiles in the whole image.
    pub fn number_of_chunks(&self) -> Result<u32> {
        if self.is_tiled() {
            self.number_of_tiles()
        } else {
            self.number_of_strips()
        }
    }

    /// Rows per strip to use when the caller has no preference.
    ///
    /// A positive `request` (up to `i32::MAX`) is returned unchanged;
    /// otherwise enough rows for about [`STRIP_SIZE_DEFAULT`] bytes, at
    /// least one.
    pub fn default_strip_size(&self, request: u32) -> Result<u32> {
        if request >= 1 && request <= i32::MAX as u32 {
            return Ok(request);
        }
        let scanline = self.scanline_size()?.max(1);
        Ok((STRIP_SIZE_DEFAULT / scanline).max(1))
    }

    /// Tile width and length to use when the caller has no preference.
    ///
    /// Unset (zero or negative as a signed value) edges become
    /// [`TILE_SIZE_DEFAULT`]; every edge is rounded up to a multiple of 16.
    pub fn default_tile_size(width: u32, length: u32) -> (u32, u32) {
        let pick = |edge: u32| {
            let edge = if edge == 0 || edge > i32::MAX as u32 {
                TILE_SIZE_DEFAULT
            } else {
                edge
            };
            (edge + 15) & !15
        };
        (pick(width), pick(length))
    }
}
