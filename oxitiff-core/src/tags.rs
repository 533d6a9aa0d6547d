//! Externally visible field values.
//!
//! These integers are persisted in image directories and must round-trip
//! exactly, so every enum here converts losslessly to and from its `u16`
//! representation. Unknown values are preserved rather than rejected.

use std::fmt;

/// Compression scheme identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// No compression (dump mode).
    #[default]
    None,
    /// CCITT modified Huffman RLE.
    CcittRle,
    /// CCITT Group 3 fax.
    CcittFax3,
    /// CCITT Group 4 fax.
    CcittFax4,
    /// Lempel-Ziv-Welch.
    Lzw,
    /// Old-style JPEG (TIFF 6.0).
    OJpeg,
    /// JPEG (TIFF technical note 2).
    Jpeg,
    /// Deflate, Adobe registered id.
    AdobeDeflate,
    /// NeXT 2-bit RLE.
    Next,
    /// CCITT RLE with word alignment.
    CcittRleW,
    /// Macintosh RLE (PackBits).
    PackBits,
    /// ThunderScan 4-bit RLE.
    ThunderScan,
    /// Pixar companded 11-bit log.
    PixarLog,
    /// Deflate, experimental id.
    Deflate,
    /// ISO JBIG.
    Jbig,
    /// SGI 32-bit log luminance.
    SgiLog,
    /// SGI 24-bit packed log luminance.
    SgiLog24,
    /// Any other (custom or private) scheme.
    Other(u16),
}

impl Scheme {
    /// Decode a scheme from its field value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::None,
            2 => Self::CcittRle,
            3 => Self::CcittFax3,
            4 => Self::CcittFax4,
            5 => Self::Lzw,
            6 => Self::OJpeg,
            7 => Self::Jpeg,
            8 => Self::AdobeDeflate,
            32766 => Self::Next,
            32771 => Self::CcittRleW,
            32773 => Self::PackBits,
            32809 => Self::ThunderScan,
            32909 => Self::PixarLog,
            32946 => Self::Deflate,
            34661 => Self::Jbig,
            34676 => Self::SgiLog,
            34677 => Self::SgiLog24,
            other => Self::Other(other),
        }
    }

    /// The field value of this scheme.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::None => 1,
            Self::CcittRle => 2,
            Self::CcittFax3 => 3,
            Self::CcittFax4 => 4,
            Self::Lzw => 5,
            Self::OJpeg => 6,
            Self::Jpeg => 7,
            Self::AdobeDeflate => 8,
            Self::Next => 32766,
            Self::CcittRleW => 32771,
            Self::PackBits => 32773,
            Self::ThunderScan => 32809,
            Self::PixarLog => 32909,
            Self::Deflate => 32946,
            Self::Jbig => 34661,
            Self::SgiLog => 34676,
            Self::SgiLog24 => 34677,
            Self::Other(value) => value,
        }
    }

    /// Whether the identifier is one of the reserved, well-known schemes.
    ///
    /// `Other(v)` built from a reserved value is normalised through
    /// [`Scheme::from_u16`] first, so `Other(5)` counts as reserved.
    pub fn is_reserved(self) -> bool {
        !matches!(Self::from_u16(self.to_u16()), Self::Other(_))
    }
}

impl From<u16> for Scheme {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<Scheme> for u16 {
    fn from(scheme: Scheme) -> Self {
        scheme.to_u16()
    }
}

impl PartialEq<u16> for Scheme {
    fn eq(&self, other: &u16) -> bool {
        self.to_u16() == *other
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(id) => write!(f, "Compression scheme {}", id),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// Differencing applied to samples before compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Predictor {
    /// No prediction.
    #[default]
    None,
    /// Horizontal differencing.
    Horizontal,
    /// Floating point byte-plane differencing.
    FloatingPoint,
    /// Unrecognised value (rejected at codec setup).
    Unknown(u16),
}

impl Predictor {
    /// Decode a predictor from its field value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::None,
            2 => Self::Horizontal,
            3 => Self::FloatingPoint,
            other => Self::Unknown(other),
        }
    }

    /// The field value of this predictor.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::None => 1,
            Self::Horizontal => 2,
            Self::FloatingPoint => 3,
            Self::Unknown(value) => value,
        }
    }
}

/// How the samples of a pixel are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanarConfig {
    /// Samples interleaved per pixel.
    #[default]
    Contig,
    /// Each sample stored in its own plane.
    Separate,
}

impl PlanarConfig {
    /// Decode from the field value. Anything other than 2 is contiguous.
    pub fn from_u16(value: u16) -> Self {
        if value == 2 { Self::Separate } else { Self::Contig }
    }

    /// The field value.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::Contig => 1,
            Self::Separate => 2,
        }
    }
}

/// Interpretation of sample values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// Unsigned integer.
    #[default]
    Uint,
    /// Signed two's complement integer.
    Int,
    /// IEEE floating point.
    IeeeFp,
    /// Untyped data.
    Void,
    /// Complex signed integer.
    ComplexInt,
    /// Complex IEEE floating point.
    ComplexIeeeFp,
}

impl SampleFormat {
    /// Decode from the field value; unknown values read as unsigned.
    pub fn from_u16(value: u16) -> Self {
        match value {
            2 => Self::Int,
            3 => Self::IeeeFp,
            4 => Self::Void,
            5 => Self::ComplexInt,
            6 => Self::ComplexIeeeFp,
            _ => Self::Uint,
        }
    }

    /// The field value.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::Uint => 1,
            Self::Int => 2,
            Self::IeeeFp => 3,
            Self::Void => 4,
            Self::ComplexInt => 5,
            Self::ComplexIeeeFp => 6,
        }
    }
}

/// Bit order within a byte for packed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillOrder {
    /// Most significant bit first (the processing convention).
    #[default]
    Msb2Lsb,
    /// Least significant bit first.
    Lsb2Msb,
}

impl FillOrder {
    /// Decode from the field value.
    pub fn from_u16(value: u16) -> Self {
        if value == 2 { Self::Lsb2Msb } else { Self::Msb2Lsb }
    }

    /// The field value.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::Msb2Lsb => 1,
            Self::Lsb2Msb => 2,
        }
    }
}

/// Colour space of the image data, as far as the size math cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Photometric {
    /// 0 is white.
    MinIsWhite,
    /// 0 is black.
    #[default]
    MinIsBlack,
    /// RGB colour.
    Rgb,
    /// Colour-mapped.
    Palette,
    /// Separated (usually CMYK).
    Separated,
    /// Luminance plus sub-sampled chroma.
    YCbCr,
    /// Any other value.
    Other(u16),
}

impl Photometric {
    /// Decode from the field value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::MinIsWhite,
            1 => Self::MinIsBlack,
            2 => Self::Rgb,
            3 => Self::Palette,
            5 => Self::Separated,
            6 => Self::YCbCr,
            other => Self::Other(other),
        }
    }

    /// The field value.
    pub fn to_u16(self) -> u16 {
        match self {
            Self::MinIsWhite => 0,
            Self::MinIsBlack => 1,
            Self::Rgb => 2,
            Self::Palette => 3,
            Self::Separated => 5,
            Self::YCbCr => 6,
            Self::Other(value) => value,
        }
    }
}
