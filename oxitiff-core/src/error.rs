//! Error types for OxiTIFF operations.
//!
//! This module provides a single error type shared by the geometry engine,
//! the codecs and the strip/tile orchestration layer. The variants follow the
//! failure classes a caller has to tell apart: configuration problems,
//! backing-store I/O, corrupted compressed data, data that ends too early,
//! and size arithmetic that would overflow.

use std::io;
use thiserror::Error;

/// The main error type for OxiTIFF operations.
#[derive(Debug, Error)]
pub enum TiffError {
    /// I/O error from the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The codec for a scheme exists but was not compiled in.
    #[error("{name} compression support is not configured")]
    NotConfigured {
        /// Human-readable codec name.
        name: String,
    },

    /// The installed codec does not implement the requested operation.
    #[error("{codec} {operation} is not implemented")]
    NotImplemented {
        /// Codec name (or the numeric scheme for unknown codecs).
        codec: String,
        /// Operation that was attempted, e.g. "strip decoding".
        operation: &'static str,
    },

    /// Compressed data is malformed.
    #[error("{codec}: corrupted data at {location}: {message}")]
    CorruptedData {
        /// Codec or module that detected the corruption.
        codec: &'static str,
        /// Scanline, strip or bit position where it was detected.
        location: String,
        /// Description of the corruption.
        message: String,
    },

    /// Input ran out before the requested number of bytes was produced.
    #[error("{codec}: not enough data at {location} (short {missing} bytes)")]
    UnexpectedEof {
        /// Codec or module that ran out of input.
        codec: &'static str,
        /// Scanline or strip being decoded.
        location: String,
        /// Number of output bytes that could not be produced.
        missing: usize,
    },

    /// Size arithmetic overflowed.
    #[error("Integer overflow in {what}")]
    IntegerOverflow {
        /// The computation that overflowed.
        what: &'static str,
    },

    /// A row, strip, tile or sample index is out of range.
    #[error("{value}: {what} out of range, max {max}")]
    OutOfRange {
        /// What kind of index was rejected.
        what: &'static str,
        /// The rejected value.
        value: u64,
        /// The largest accepted value.
        max: u64,
    },

    /// A directory parameter combination is not supported.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the problem.
        message: String,
    },

    /// The general-purpose compression stream reported a failure.
    #[error("{codec} stream error: {message}")]
    Compression {
        /// Codec that owns the stream.
        codec: &'static str,
        /// Message reported by the stream implementation.
        message: String,
    },

    /// The write cannot be performed with the current layout or state.
    #[error("Write error: {message}")]
    WriteProtocol {
        /// Description of the problem.
        message: String,
    },
}

/// Result type alias for OxiTIFF operations.
pub type Result<T> = std::result::Result<T, TiffError>;

impl TiffError {
    /// Create a not-configured error.
    pub fn not_configured(name: impl Into<String>) -> Self {
        Self::NotConfigured { name: name.into() }
    }

    /// Create a not-implemented error.
    pub fn not_implemented(codec: impl Into<String>, operation: &'static str) -> Self {
        Self::NotImplemented {
            codec: codec.into(),
            operation,
        }
    }

    /// Create a corrupted data error.
    pub fn corrupted(
        codec: &'static str,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::CorruptedData {
            codec,
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create an unexpected end-of-data error.
    pub fn unexpected_eof(codec: &'static str, location: impl Into<String>, missing: usize) -> Self {
        Self::UnexpectedEof {
            codec,
            location: location.into(),
            missing,
        }
    }

    /// Create an integer overflow error.
    pub fn overflow(what: &'static str) -> Self {
        Self::IntegerOverflow { what }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(what: &'static str, value: impl Into<u64>, max: impl Into<u64>) -> Self {
        Self::OutOfRange {
            what,
            value: value.into(),
            max: max.into(),
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a compression stream error.
    pub fn compression(codec: &'static str, message: impl Into<String>) -> Self {
        Self::Compression {
            codec,
            message: message.into(),
        }
    }

    /// Create a write protocol error.
    pub fn write_protocol(message: impl Into<String>) -> Self {
        Self::WriteProtocol {
            message: message.into(),
        }
    }

    /// Whether this error means the input simply ran out.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }

    /// Whether this error reports malformed compressed data.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptedData { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TiffError::not_configured("JPEG");
        assert_eq!(err.to_string(), "JPEG compression support is not configured");

        let err = TiffError::not_implemented("ThunderScan", "strip encoding");
        assert!(err.to_string().contains("strip encoding is not implemented"));

        let err = TiffError::out_of_range("Row", 120u32, 99u32);
        assert_eq!(err.to_string(), "120: Row out of range, max 99");

        let err = TiffError::unexpected_eof("LZWDecode", "scanline 3", 17);
        assert!(err.to_string().contains("short 17 bytes"));
    }

    #[test]
    fn test_error_classes() {
        assert!(TiffError::unexpected_eof("PackBitsDecode", "scanline 0", 1).is_eof());
        assert!(TiffError::corrupted("LZWDecode", "scanline 0", "bad code").is_corruption());
        assert!(!TiffError::overflow("strip size").is_eof());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        let err: TiffError = io_err.into();
        assert!(matches!(err, TiffError::Io(_)));
    }
}
