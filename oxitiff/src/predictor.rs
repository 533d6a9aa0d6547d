//! Differencing predictors.
//!
//! [`Predicted`] wraps a codec and applies the directory's predictor around
//! its transfer functions: samples are differenced before encoding and
//! accumulated after decoding. Horizontal differencing works on whole
//! samples of 8, 16 or 32 bits. The floating-point predictor first splits
//! each row into byte planes (most significant byte first) and then
//! differences bytes.
//!
//! Multi-byte samples in a foreign byte order are swapped inside the
//! predictor (before accumulating, after differencing), so the image handle
//! must not swap them again; see [`Codec::handles_byte_swap`].

use crate::codec::{Codec, CodecOption, DecodeIo, EncodeIo, OptionTag};
use crate::directory::Directory;
use oxitiff_core::swab::{swab_u16, swab_u32};
use oxitiff_core::{Predictor, Result, SampleFormat, TiffError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transform {
    None,
    Horizontal8,
    Horizontal16,
    Horizontal32,
    FloatingPoint,
}

/// Predictor parameters derived from the directory at setup.
#[derive(Debug, Clone)]
pub struct PredictorState {
    predictor: Predictor,
    transform: Transform,
    /// Samples between a value and the one it is predicted from.
    stride: usize,
    /// Bytes in one row of a strip or tile.
    row_size: usize,
    bytes_per_sample: usize,
    swap: bool,
    scratch: Vec<u8>,
}

impl Default for PredictorState {
    fn default() -> Self {
        Self {
            predictor: Predictor::None,
            transform: Transform::None,
            stride: 1,
            row_size: 0,
            bytes_per_sample: 1,
            swap: false,
            scratch: Vec::new(),
        }
    }
}

impl PredictorState {
    /// Configure for `dir`, rejecting unsupported combinations.
    pub fn setup(&mut self, dir: &Directory) -> Result<()> {
        let bits = dir.bits_per_sample;
        let transform = match dir.predictor {
            Predictor::None => Transform::None,
            Predictor::Horizontal => match bits {
                8 => Transform::Horizontal8,
                16 => Transform::Horizontal16,
                32 => Transform::Horizontal32,
                _ => {
                    return Err(TiffError::invalid_parameter(format!(
                        "Horizontal differencing \"Predictor\" not supported with {bits}-bit samples"
                    )));
                }
            },
            Predictor::FloatingPoint => {
                if dir.sample_format != SampleFormat::IeeeFp {
                    return Err(TiffError::invalid_parameter(format!(
                        "Floating point \"Predictor\" not supported with {:?} data format",
                        dir.sample_format
                    )));
                }
                if !matches!(bits, 16 | 24 | 32 | 64) {
                    return Err(TiffError::invalid_parameter(format!(
                        "Floating point \"Predictor\" not supported with {bits}-bit samples"
                    )));
                }
                Transform::FloatingPoint
            }
            Predictor::Unknown(value) => {
                return Err(TiffError::invalid_parameter(format!(
                    "\"Predictor\" value {value} not supported"
                )));
            }
        };

        let row_size = if dir.is_tiled() {
            dir.tile_row_size()?
        } else {
            dir.scanline_size()?
        } as usize;
        if transform != Transform::None && row_size == 0 {
            return Err(TiffError::invalid_parameter("Predictor: zero row size"));
        }

        self.predictor = dir.predictor;
        self.transform = transform;
        self.stride = if dir.is_separate() {
            1
        } else {
            usize::from(dir.samples_per_pixel)
        };
        self.row_size = row_size;
        self.bytes_per_sample = usize::from(bits / 8).max(1);
        self.swap = dir.byte_order.needs_swap();
        Ok(())
    }

    /// Predictor this state was set up for.
    pub fn predictor(&self) -> Predictor {
        self.predictor
    }

    /// Whether the predictor does anything.
    pub fn is_active(&self) -> bool {
        self.transform != Transform::None
    }

    /// Samples between a value and its prediction source.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes per row used to split strips and tiles.
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    fn handles_byte_swap(&self) -> bool {
        matches!(
            self.transform,
            Transform::Horizontal16 | Transform::Horizontal32 | Transform::FloatingPoint
        )
    }

    fn check_row(&self, row: &[u8]) -> Result<()> {
        let unit = self.stride * self.bytes_per_sample;
        if row.len() % unit != 0 {
            return Err(TiffError::invalid_parameter(format!(
                "Predictor: {} bytes is not a whole number of {}-byte pixels",
                row.len(),
                unit
            )));
        }
        Ok(())
    }

    /// Undo the predictor on one row in place.
    pub fn accumulate(&self, row: &mut [u8]) -> Result<()> {
        if self.transform == Transform::None {
            return Ok(());
        }
        self.check_row(row)?;
        match self.transform {
            Transform::None => {}
            Transform::Horizontal8 => hor_acc8(row, self.stride),
            Transform::Horizontal16 => {
                if self.swap {
                    swab_u16(row);
                }
                hor_acc16(row, self.stride);
            }
            Transform::Horizontal32 => {
                if self.swap {
                    swab_u32(row);
                }
                hor_acc32(row, self.stride);
            }
            Transform::FloatingPoint => fp_acc(row, self.stride, self.bytes_per_sample),
        }
        Ok(())
    }

    /// Apply the predictor to one row in place.
    pub fn difference(&self, row: &mut [u8]) -> Result<()> {
        if self.transform == Transform::None {
            return Ok(());
        }
        self.check_row(row)?;
        match self.transform {
            Transform::None => {}
            Transform::Horizontal8 => hor_diff8(row, self.stride),
            Transform::Horizontal16 => {
                hor_diff16(row, self.stride);
                if self.swap {
                    swab_u16(row);
                }
            }
            Transform::Horizontal32 => {
                hor_diff32(row, self.stride);
                if self.swap {
                    swab_u32(row);
                }
            }
            Transform::FloatingPoint => fp_diff(row, self.stride, self.bytes_per_sample),
        }
        Ok(())
    }

    /// Split a strip or tile into rows.
    fn rows<'a>(&self, buf: &'a mut [u8]) -> Result<std::slice::ChunksMut<'a, u8>> {
        if self.row_size == 0 || buf.len() % self.row_size != 0 {
            return Err(TiffError::invalid_parameter(format!(
                "Predictor: {} bytes is not a whole number of {}-byte rows",
                buf.len(),
                self.row_size
            )));
        }
        Ok(buf.chunks_mut(self.row_size))
    }

    fn accumulate_rows(&self, buf: &mut [u8]) -> Result<()> {
        if self.transform == Transform::None {
            return Ok(());
        }
        for row in self.rows(buf)? {
            self.accumulate(row)?;
        }
        Ok(())
    }

    fn difference_rows(&self, buf: &mut [u8]) -> Result<()> {
        for row in self.rows(buf)? {
            self.difference(row)?;
        }
        Ok(())
    }
}

fn hor_acc8(row: &mut [u8], stride: usize) {
    for i in stride..row.len() {
        row[i] = row[i].wrapping_add(row[i - stride]);
    }
}

fn hor_diff8(row: &mut [u8], stride: usize) {
    for i in (stride..row.len()).rev() {
        row[i] = row[i].wrapping_sub(row[i - stride]);
    }
}

#[inline]
fn get16(row: &[u8], i: usize) -> u16 {
    u16::from_ne_bytes([row[2 * i], row[2 * i + 1]])
}

#[inline]
fn put16(row: &mut [u8], i: usize, v: u16) {
    row[2 * i..2 * i + 2].copy_from_slice(&v.to_ne_bytes());
}

#[inline]
fn get32(row: &[u8], i: usize) -> u32 {
    u32::from_ne_bytes([row[4 * i], row[4 * i + 1], row[4 * i + 2], row[4 * i + 3]])
}

#[inline]
fn put32(row: &mut [u8], i: usize, v: u32) {
    row[4 * i..4 * i + 4].copy_from_slice(&v.to_ne_bytes());
}

fn hor_acc16(row: &mut [u8], stride: usize) {
    for i in stride..row.len() / 2 {
        let v = get16(row, i).wrapping_add(get16(row, i - stride));
        put16(row, i, v);
    }
}

fn hor_diff16(row: &mut [u8], stride: usize) {
    for i in (stride..row.len() / 2).rev() {
        let v = get16(row, i).wrapping_sub(get16(row, i - stride));
        put16(row, i, v);
    }
}

fn hor_acc32(row: &mut [u8], stride: usize) {
    for i in stride..row.len() / 4 {
        let v = get32(row, i).wrapping_add(get32(row, i - stride));
        put32(row, i, v);
    }
}

fn hor_diff32(row: &mut [u8], stride: usize) {
    for i in (stride..row.len() / 4).rev() {
        let v = get32(row, i).wrapping_sub(get32(row, i - stride));
        put32(row, i, v);
    }
}

/// Position of byte `byte` (in host memory order) of a sample within the
/// plane layout, where plane 0 holds the most significant bytes.
#[inline]
fn plane_of(byte: usize, bps: usize) -> usize {
    if cfg!(target_endian = "big") {
        byte
    } else {
        bps - byte - 1
    }
}

fn fp_acc(row: &mut [u8], stride: usize, bps: usize) {
    hor_acc8(row, stride);
    let words = row.len() / bps;
    let planes = row.to_vec();
    for count in 0..words {
        for byte in 0..bps {
            row[bps * count + byte] = planes[plane_of(byte, bps) * words + count];
        }
    }
}

fn fp_diff(row: &mut [u8], stride: usize, bps: usize) {
    let words = row.len() / bps;
    let samples = row.to_vec();
    for count in 0..words {
        for byte in 0..bps {
            row[plane_of(byte, bps) * words + count] = samples[bps * count + byte];
        }
    }
    hor_diff8(row, stride);
}

/// A codec with a predictor applied around its transfer functions.
#[derive(Debug)]
pub struct Predicted<C> {
    state: PredictorState,
    inner: C,
}

impl<C: Codec> Predicted<C> {
    /// Wrap `inner`.
    pub fn new(inner: C) -> Self {
        Self {
            state: PredictorState::default(),
            inner,
        }
    }

    /// The predictor parameters.
    pub fn state(&self) -> &PredictorState {
        &self.state
    }

    /// The wrapped codec.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Difference a copy of `buf` and hand it to `encode`.
    fn encode_with(
        &mut self,
        io: &mut EncodeIo<'_>,
        buf: &[u8],
        per_row: bool,
        encode: impl FnOnce(&mut C, &mut EncodeIo<'_>, &[u8]) -> Result<()>,
    ) -> Result<()> {
        if !self.state.is_active() {
            return encode(&mut self.inner, io, buf);
        }
        let mut scratch = std::mem::take(&mut self.state.scratch);
        scratch.clear();
        scratch.extend_from_slice(buf);
        let diffed = if per_row {
            self.state.difference_rows(&mut scratch)
        } else {
            self.state.difference(&mut scratch)
        };
        let result = diffed.and_then(|()| encode(&mut self.inner, io, &scratch));
        self.state.scratch = scratch;
        result
    }
}

impl<C: Codec> Codec for Predicted<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn setup_decode(&mut self, dir: &Directory) -> Result<()> {
        self.inner.setup_decode(dir)?;
        self.state.setup(dir)
    }

    fn pre_decode(&mut self, io: &mut DecodeIo<'_>, sample: u16) -> Result<()> {
        self.inner.pre_decode(io, sample)
    }

    fn decode_row(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], sample: u16) -> Result<()> {
        self.inner.decode_row(io, buf, sample)?;
        self.state.accumulate(buf)
    }

    fn decode_strip(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], sample: u16) -> Result<()> {
        self.inner.decode_strip(io, buf, sample)?;
        self.state.accumulate_rows(buf)
    }

    fn decode_tile(&mut self, io: &mut DecodeIo<'_>, buf: &mut [u8], sample: u16) -> Result<()> {
        self.inner.decode_tile(io, buf, sample)?;
        self.state.accumulate_rows(buf)
    }

    fn setup_encode(&mut self, dir: &Directory) -> Result<()> {
        self.inner.setup_encode(dir)?;
        self.state.setup(dir)
    }

    fn pre_encode(&mut self, io: &mut EncodeIo<'_>, sample: u16) -> Result<()> {
        self.inner.pre_encode(io, sample)
    }

    fn post_encode(&mut self, io: &mut EncodeIo<'_>) -> Result<()> {
        self.inner.post_encode(io)
    }

    fn encode_row(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], sample: u16) -> Result<()> {
        self.encode_with(io, buf, false, |c, io, b| c.encode_row(io, b, sample))
    }

    fn encode_strip(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], sample: u16) -> Result<()> {
        self.encode_with(io, buf, true, |c, io, b| c.encode_strip(io, b, sample))
    }

    fn encode_tile(&mut self, io: &mut EncodeIo<'_>, buf: &[u8], sample: u16) -> Result<()> {
        self.encode_with(io, buf, true, |c, io, b| c.encode_tile(io, b, sample))
    }

    fn cleanup(&mut self) {
        self.inner.cleanup();
        self.state = PredictorState::default();
    }

    fn seek(&mut self, io: &mut DecodeIo<'_>, rows: u32) -> Result<()> {
        self.inner.seek(io, rows)
    }

    fn default_strip_size(&self, dir: &Directory, request: u32) -> Result<u32> {
        self.inner.default_strip_size(dir, request)
    }

    fn default_tile_size(&self, width: u32, length: u32) -> (u32, u32) {
        self.inner.default_tile_size(width, length)
    }

    fn handles_byte_swap(&self) -> bool {
        self.state.handles_byte_swap() || self.inner.handles_byte_swap()
    }

    fn set_option(&mut self, option: CodecOption) -> Result<()> {
        self.inner.set_option(option)
    }

    fn option(&self, tag: OptionTag) -> Option<CodecOption> {
        self.inner.option(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::dump::DumpCodec;
    use crate::codec::testing::{decode_strip, encode_strip};
    use oxitiff_core::{ByteOrder, PlanarConfig};

    fn setup(dir: &Directory) -> PredictorState {
        let mut state = PredictorState::default();
        state.setup(dir).unwrap();
        state
    }

    #[test]
    fn test_rgb_uses_stride_three() {
        let dir = Directory::new(3, 1)
            .with_samples_per_pixel(3)
            .with_predictor(Predictor::Horizontal);
        let state = setup(&dir);
        assert_eq!(state.stride(), 3);

        let original = [10u8, 20, 30, 11, 22, 33, 9, 18, 27];
        let mut row = original;
        state.difference(&mut row).unwrap();
        assert_eq!(row, [10, 20, 30, 1, 2, 3, 254, 252, 250]);
        state.accumulate(&mut row).unwrap();
        assert_eq!(row, original);
    }

    #[test]
    fn test_separate_planes_use_stride_one() {
        let dir = Directory::new(4, 1)
            .with_samples_per_pixel(3)
            .with_planar_config(PlanarConfig::Separate)
            .with_predictor(Predictor::Horizontal);
        assert_eq!(setup(&dir).stride(), 1);
    }

    #[test]
    fn test_horizontal16_with_swap() {
        let foreign = match ByteOrder::native() {
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
        };
        let dir = Directory::new(3, 1)
            .with_bits_per_sample(16)
            .with_predictor(Predictor::Horizontal)
            .with_byte_order(foreign);
        let state = setup(&dir);
        assert!(state.handles_byte_swap());

        let samples = [1000u16, 1010, 990];
        let original: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
        let mut row = original.clone();
        state.difference(&mut row).unwrap();
        // Differences are stored in the file's byte order
        let stored: Vec<u16> = row
            .chunks(2)
            .map(|c| match foreign {
                ByteOrder::BigEndian => u16::from_be_bytes([c[0], c[1]]),
                ByteOrder::LittleEndian => u16::from_le_bytes([c[0], c[1]]),
            })
            .collect();
        assert_eq!(stored, [1000, 10, (-20i16) as u16]);
        state.accumulate(&mut row).unwrap();
        assert_eq!(row, original);
    }

    #[test]
    fn test_horizontal32_roundtrip() {
        let dir = Directory::new(4, 1)
            .with_bits_per_sample(32)
            .with_predictor(Predictor::Horizontal);
        let state = setup(&dir);
        let original: Vec<u8> = [7u32, 0xFFFF_FFFF, 3, 100_000]
            .iter()
            .flat_map(|s| s.to_ne_bytes())
            .collect();
        let mut row = original.clone();
        state.difference(&mut row).unwrap();
        state.accumulate(&mut row).unwrap();
        assert_eq!(row, original);
    }

    #[test]
    fn test_floating_point_byte_planes() {
        let dir = Directory::new(2, 1)
            .with_bits_per_sample(32)
            .with_sample_format(SampleFormat::IeeeFp)
            .with_predictor(Predictor::FloatingPoint);
        let state = setup(&dir);
        let values = [1.5f32, -2.25];
        let original: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let mut row = original.clone();
        state.difference(&mut row).unwrap();

        // Undifferenced planes hold the big-endian bytes, plane by plane
        let mut planes = row.clone();
        hor_acc8(&mut planes, 1);
        let a = 1.5f32.to_be_bytes();
        let b = (-2.25f32).to_be_bytes();
        assert_eq!(planes, [a[0], b[0], a[1], b[1], a[2], b[2], a[3], b[3]]);

        state.accumulate(&mut row).unwrap();
        assert_eq!(row, original);
    }

    #[test]
    fn test_setup_rejects_unsupported() {
        let mut state = PredictorState::default();
        let dir = Directory::new(4, 1)
            .with_bits_per_sample(4)
            .with_predictor(Predictor::Horizontal);
        let err = state.setup(&dir).unwrap_err();
        assert!(err.to_string().contains("not supported with 4-bit samples"));

        let dir = Directory::new(4, 1)
            .with_bits_per_sample(32)
            .with_predictor(Predictor::FloatingPoint);
        assert!(state.setup(&dir).is_err());

        let dir = Directory::new(4, 1).with_predictor(Predictor::Unknown(9));
        let err = state.setup(&dir).unwrap_err();
        assert!(err.to_string().contains("value 9 not supported"));
    }

    #[test]
    fn test_partial_pixel_rejected() {
        let dir = Directory::new(3, 1)
            .with_samples_per_pixel(3)
            .with_predictor(Predictor::Horizontal);
        let state = setup(&dir);
        assert!(state.accumulate(&mut [0u8; 8]).is_err());
    }

    #[test]
    fn test_wrapped_strip_roundtrip_and_repeated_setup() {
        let dir = Directory::new(4, 3)
            .with_samples_per_pixel(2)
            .with_predictor(Predictor::Horizontal);
        let data: Vec<u8> = (0..24u8).map(|i| i.wrapping_mul(37)).collect();

        let mut codec = Predicted::new(DumpCodec);
        codec.setup_encode(&dir).unwrap();
        let encoded = encode_strip(&mut codec, &dir, &data).unwrap();
        assert_ne!(encoded, data);
        // First pixel of every row is stored as is
        assert_eq!(&encoded[..2], &data[..2]);
        assert_eq!(&encoded[8..10], &data[8..10]);

        let mut codec = Predicted::new(DumpCodec);
        codec.setup_decode(&dir).unwrap();
        let decoded = decode_strip(&mut codec, &dir, &encoded, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_inactive_predictor_is_transparent() {
        let dir = Directory::new(4, 1);
        let mut codec = Predicted::new(DumpCodec);
        let encoded = encode_strip(&mut codec, &dir, &[1, 2, 3, 4]).unwrap();
        assert_eq!(encoded, [1, 2, 3, 4]);
        assert!(!codec.handles_byte_swap());
        assert_eq!(codec.name(), "None");
    }
}
