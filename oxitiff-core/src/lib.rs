//! # OxiTIFF Core
//!
//! Core components for the OxiTIFF strip/tile codec engine.
//!
//! This crate provides the building blocks shared by the codecs and the
//! strip/tile orchestration layer:
//!
//! - [`bits`]: Overflow-checked size arithmetic and bit reversal
//! - [`swab`]: Byte order detection and sample byte swapping
//! - [`tags`]: Compression scheme ids and other persisted field values
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! OxiTIFF is built in three layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Orchestration                                       │
//! │     Image handle, strip/tile read and write             │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Registry, predictor, LZW, PackBits, Deflate, ...    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     Checked size math, byte order, tag values, errors   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxitiff_core::bits::{checked_mul, howmany};
//! use oxitiff_core::tags::Scheme;
//!
//! // 100 rows in strips of 32 rows need 4 strips
//! assert_eq!(howmany(100, 32, "strips").unwrap(), 4);
//!
//! // Hostile sizes are reported, never wrapped
//! assert!(checked_mul(1 << 20, 1 << 20, "scanline size").is_err());
//!
//! assert_eq!(Scheme::from_u16(32773), Scheme::PackBits);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bits;
pub mod error;
pub mod swab;
pub mod tags;

// Re-exports for convenience
pub use error::{Result, TiffError};
pub use swab::ByteOrder;
pub use tags::{FillOrder, Photometric, PlanarConfig, Predictor, SampleFormat, Scheme};
