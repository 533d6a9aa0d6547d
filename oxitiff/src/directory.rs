//! Image parameters consumed by the codec engine.
//!
//! A [`Directory`] is the subset of an image file directory that decides how
//! pixel data is laid out and compressed. It is produced and persisted by
//! the tag layer; the engine only reads it, except that writing scanlines
//! past the end of an image grows its length.
//!
//! The strip/tile location arrays are kept apart in a [`ChunkTable`]: they
//! are the one part of the directory the write path mutates while a codec
//! is still looking at the parameters.

use oxitiff_core::{
    ByteOrder, FillOrder, Photometric, PlanarConfig, Predictor, Result, SampleFormat, Scheme,
    TiffError,
};

/// Dimensions of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    /// Tile width in pixels.
    pub width: u32,
    /// Tile length in rows.
    pub length: u32,
    /// Tile depth in slices.
    pub depth: u32,
}

impl TileGeometry {
    /// A two-dimensional tile.
    pub fn new(width: u32, length: u32) -> Self {
        Self {
            width,
            length,
            depth: 1,
        }
    }
}

/// Parameters of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image length in rows.
    pub image_length: u32,
    /// Image depth in slices; 1 for ordinary images.
    pub image_depth: u32,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Samples per pixel.
    pub samples_per_pixel: u16,
    /// Sample layout.
    pub planar_config: PlanarConfig,
    /// Rows per strip; `u32::MAX` means the whole image is one strip.
    pub rows_per_strip: u32,
    /// Tile dimensions for tiled images.
    pub tile: Option<TileGeometry>,
    /// Differencing predictor.
    pub predictor: Predictor,
    /// Compression scheme.
    pub compression: Scheme,
    /// Sample interpretation.
    pub sample_format: SampleFormat,
    /// Photometric interpretation.
    pub photometric: Photometric,
    /// Horizontal and vertical chroma subsampling for YCbCr data.
    pub ycbcr_subsampling: [u16; 2],
    /// YCbCr data is handed to the caller already upsampled to full
    /// resolution, so no subsampled layout applies.
    pub upsampled: bool,
    /// Bit order of packed data in the file.
    pub fill_order: FillOrder,
    /// Byte order of multi-byte samples in the file.
    pub byte_order: ByteOrder,
}

impl Directory {
    /// An 8-bit, single-sample, uncompressed image stored as one strip.
    pub fn new(image_width: u32, image_length: u32) -> Self {
        Self {
            image_width,
            image_length,
            image_depth: 1,
            bits_per_sample: 8,
            samples_per_pixel: 1,
            planar_config: PlanarConfig::Contig,
            rows_per_strip: u32::MAX,
            tile: None,
            predictor: Predictor::None,
            compression: Scheme::None,
            sample_format: SampleFormat::Uint,
            photometric: Photometric::MinIsBlack,
            ycbcr_subsampling: [2, 2],
            upsampled: false,
            fill_order: FillOrder::Msb2Lsb,
            byte_order: ByteOrder::native(),
        }
    }

    /// Set bits per sample.
    pub fn with_bits_per_sample(mut self, bits: u16) -> Self {
        self.bits_per_sample = bits;
        self
    }

    /// Set samples per pixel.
    pub fn with_samples_per_pixel(mut self, samples: u16) -> Self {
        self.samples_per_pixel = samples;
        self
    }

    /// Set the planar configuration.
    pub fn with_planar_config(mut self, config: PlanarConfig) -> Self {
        self.planar_config = config;
        self
    }

    /// Set rows per strip.
    pub fn with_rows_per_strip(mut self, rows: u32) -> Self {
        self.rows_per_strip = rows;
        self
    }

    /// Lay the image out in `width` x `length` tiles.
    pub fn with_tiles(mut self, width: u32, length: u32) -> Self {
        self.tile = Some(TileGeometry::new(width, length));
        self
    }

    /// Set the image depth and tile depth for volumetric images.
    pub fn with_depth(mut self, image_depth: u32, tile_depth: u32) -> Self {
        self.image_depth = image_depth;
        if let Some(tile) = self.tile.as_mut() {
            tile.depth = tile_depth;
        }
        self
    }

    /// Set the predictor.
    pub fn with_predictor(mut self, predictor: Predictor) -> Self {
        self.predictor = predictor;
        self
    }

    /// Set the compression scheme.
    pub fn with_compression(mut self, scheme: Scheme) -> Self {
        self.compression = scheme;
        self
    }

    /// Set the sample format.
    pub fn with_sample_format(mut self, format: SampleFormat) -> Self {
        self.sample_format = format;
        self
    }

    /// Set the photometric interpretation.
    pub fn with_photometric(mut self, photometric: Photometric) -> Self {
        self.photometric = photometric;
        self
    }

    /// Set YCbCr chroma subsampling.
    pub fn with_ycbcr_subsampling(mut self, horizontal: u16, vertical: u16) -> Self {
        self.ycbcr_subsampling = [horizontal, vertical];
        self
    }

    /// Set the fill order.
    pub fn with_fill_order(mut self, fill_order: FillOrder) -> Self {
        self.fill_order = fill_order;
        self
    }

    /// Set the byte order.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Whether the image is tiled.
    #[inline]
    pub fn is_tiled(&self) -> bool {
        self.tile.is_some()
    }

    /// Whether samples are stored in separate planes.
    #[inline]
    pub fn is_separate(&self) -> bool {
        self.planar_config == PlanarConfig::Separate
    }

    /// Whether the subsampled YCbCr layout applies to this image.
    #[inline]
    pub(crate) fn is_subsampled_ycbcr(&self) -> bool {
        self.planar_config == PlanarConfig::Contig
            && self.photometric == Photometric::YCbCr
            && !self.upsampled
    }

    /// Reject parameter combinations no size computation can work with.
    pub fn validate(&self) -> Result<()> {
        if self.bits_per_sample == 0 {
            return Err(TiffError::invalid_parameter("BitsPerSample must be non-zero"));
        }
        if self.samples_per_pixel == 0 {
            return Err(TiffError::invalid_parameter("SamplesPerPixel must be non-zero"));
        }
        if self.rows_per_strip == 0 {
            return Err(TiffError::invalid_parameter("RowsPerStrip must be non-zero"));
        }
        if self.image_depth == 0 {
            return Err(TiffError::invalid_parameter("ImageDepth must be non-zero"));
        }
        match self.tile {
            Some(tile) if tile.width == 0 || tile.length == 0 || tile.depth == 0 => {
                Err(TiffError::invalid_parameter(format!(
                    "Zero tile dimension {}x{}x{}",
                    tile.width, tile.length, tile.depth
                )))
            }
            _ => Ok(()),
        }
    }
}

/// On-disk location of every strip or tile.
///
/// An entry with both offset and byte count zero has not been written yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTable {
    /// Byte offset of each strip or tile.
    pub offsets: Vec<u64>,
    /// Stored byte count of each strip or tile.
    pub byte_counts: Vec<u64>,
}

impl ChunkTable {
    /// A table of `count` unwritten entries.
    pub fn new(count: usize) -> Self {
        Self {
            offsets: vec![0; count],
            byte_counts: vec![0; count],
        }
    }

    /// Build a table from existing arrays.
    pub fn from_parts(offsets: Vec<u64>, byte_counts: Vec<u64>) -> Result<Self> {
        if offsets.len() != byte_counts.len() {
            return Err(TiffError::invalid_parameter(format!(
                "{} strip offsets but {} byte counts",
                offsets.len(),
                byte_counts.len()
            )));
        }
        Ok(Self {
            offsets,
            byte_counts,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Whether entry `index` already has data on disk.
    pub fn is_placed(&self, index: usize) -> bool {
        self.offsets.get(index).is_some_and(|&o| o != 0)
            || self.byte_counts.get(index).is_some_and(|&c| c != 0)
    }

    /// Append `delta` unwritten entries.
    pub(crate) fn grow(&mut self, delta: usize) {
        let len = self.len() + delta;
        self.offsets.resize(len, 0);
        self.byte_counts.resize(len, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let dir = Directory::new(640, 480)
            .with_samples_per_pixel(3)
            .with_rows_per_strip(16);
        assert_eq!(dir.bits_per_sample, 8);
        assert_eq!(dir.samples_per_pixel, 3);
        assert_eq!(dir.rows_per_strip, 16);
        assert!(!dir.is_tiled());
        assert!(dir.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        assert!(Directory::new(8, 8).with_rows_per_strip(0).validate().is_err());
        assert!(Directory::new(8, 8).with_bits_per_sample(0).validate().is_err());
        assert!(Directory::new(8, 8).with_tiles(0, 16).validate().is_err());
    }

    #[test]
    fn test_chunk_table_grow() {
        let mut table = ChunkTable::new(2);
        table.offsets[1] = 100;
        table.grow(3);
        assert_eq!(table.len(), 5);
        assert!(table.is_placed(1));
        assert!(!table.is_placed(4));
        assert!(ChunkTable::from_parts(vec![1], vec![]).is_err());
    }
}
