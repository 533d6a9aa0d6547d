//! LZW-specific error types.

use oxitiff_core::TiffError;
use thiserror::Error;

/// LZW compression/decompression errors.
#[derive(Debug, Error)]
pub enum LzwError {
    /// A code referred to a dictionary entry that does not exist yet.
    #[error("Corrupted LZW table: code {code} with next free entry {next_free}")]
    InvalidCode {
        /// The offending code.
        code: u16,
        /// The next entry the decoder would have assigned.
        next_free: u16,
    },

    /// A string chain in the table is shorter than its recorded length.
    #[error("Bogus encoding, loop in the code table at code {0}")]
    CodeLoop(u16),

    /// A decoded string has zero length.
    #[error("Wrong length of decoded string for code {0}: data probably corrupted")]
    ZeroLength(u16),

    /// The decoder ran out of table slots without seeing a clear code.
    #[error("Corrupted LZW table: table overflow at entry {0}")]
    TableOverflow(usize),

    /// Invalid bit width specified.
    #[error("Invalid bit width: {0} (must be 9-12)")]
    InvalidBitWidth(u8),

    /// Input ended before the requested output was produced.
    #[error("Not enough data (short {missing} bytes)")]
    UnexpectedEof {
        /// Number of output bytes that could not be produced.
        missing: usize,
    },

    /// Decoding was attempted before `begin` was called.
    #[error("LZW decoder used before a strip was started")]
    NotStarted,
}

/// Result type for LZW operations.
pub type Result<T> = std::result::Result<T, LzwError>;

impl LzwError {
    /// Convert into the shared error type, tagging it with the location.
    pub fn into_tiff(self, location: impl Into<String>) -> TiffError {
        let location = location.into();
        match self {
            Self::UnexpectedEof { missing } => TiffError::unexpected_eof("LZWDecode", location, missing),
            Self::InvalidBitWidth(bits) => {
                TiffError::invalid_parameter(format!("LZW code width {bits} outside 9-12"))
            }
            other => TiffError::corrupted("LZWDecode", location, other.to_string()),
        }
    }
}

impl From<LzwError> for TiffError {
    fn from(err: LzwError) -> Self {
        err.into_tiff("unknown position")
    }
}
