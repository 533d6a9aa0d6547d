//! Codec registry.
//!
//! Maps compression scheme ids to codec constructors. Built-in codecs are
//! listed in a fixed table; applications can register their own codecs,
//! which are searched first (in registration order) and so override a
//! built-in with the same id.
//! A registry is an ordinary value: construct one per application (or per
//! test) and pass it to the image handle.

use crate::codec::dump::DumpCodec;
use crate::codec::{Codec, NotConfiguredCodec};
use oxitiff_core::{Result, Scheme};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "deflate")]
use crate::codec::deflate::DeflateCodec;
#[cfg(feature = "lzw")]
use crate::codec::lzw::LzwCodec;
#[cfg(feature = "next")]
use crate::codec::next::NextCodec;
#[cfg(feature = "packbits")]
use crate::codec::packbits::PackBitsCodec;
#[cfg(feature = "thunderscan")]
use crate::codec::thunder::ThunderScanCodec;
#[cfg(any(feature = "lzw", feature = "deflate"))]
use crate::predictor::Predicted;

/// Constructor for a codec instance.
pub type InitFn = dyn Fn(Scheme) -> Result<Box<dyn Codec>> + Send + Sync;

/// How a scheme's codec is created.
#[derive(Clone)]
pub enum CodecInit {
    /// Build the codec with this function.
    Available(Arc<InitFn>),
    /// The scheme is known but its codec was not compiled in.
    NotConfigured,
}

impl CodecInit {
    /// Wrap a constructor.
    pub fn new<F>(init: F) -> Self
    where
        F: Fn(Scheme) -> Result<Box<dyn Codec>> + Send + Sync + 'static,
    {
        Self::Available(Arc::new(init))
    }
}

impl fmt::Debug for CodecInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(_) => f.write_str("Available"),
            Self::NotConfigured => f.write_str("NotConfigured"),
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone)]
pub struct CodecEntry {
    /// Human-readable name.
    pub name: String,
    /// Scheme id the entry answers to.
    pub scheme: Scheme,
    /// Constructor.
    pub init: CodecInit,
}

impl CodecEntry {
    /// Create an entry.
    pub fn new(name: impl Into<String>, scheme: Scheme, init: CodecInit) -> Self {
        Self {
            name: name.into(),
            scheme,
            init,
        }
    }

    /// Build a codec instance.
    ///
    /// A not-configured entry yields a codec whose setup reports the
    /// missing support, so selecting the scheme itself does not fail.
    pub fn instantiate(&self) -> Result<Box<dyn Codec>> {
        match &self.init {
            CodecInit::Available(init) => init(self.scheme),
            CodecInit::NotConfigured => Ok(Box::new(NotConfiguredCodec::new(self.name.as_str()))),
        }
    }

    /// Whether a working codec can be built.
    pub fn is_configured(&self) -> bool {
        matches!(self.init, CodecInit::Available(_))
    }
}

/// Token returned by [`CodecRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecHandle(u64);

/// Registered and built-in codecs.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    registered: Vec<(CodecHandle, CodecEntry)>,
    builtins: Vec<CodecEntry>,
    next_id: u64,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn not_configured(name: &str, scheme: Scheme) -> CodecEntry {
    CodecEntry::new(name, scheme, CodecInit::NotConfigured)
}

fn builtin<F>(name: &str, scheme: Scheme, init: F) -> CodecEntry
where
    F: Fn(Scheme) -> Result<Box<dyn Codec>> + Send + Sync + 'static,
{
    CodecEntry::new(name, scheme, CodecInit::new(init))
}

fn lzw_entry() -> CodecEntry {
    #[cfg(feature = "lzw")]
    {
        builtin("LZW", Scheme::Lzw, |_| {
            Ok(Box::new(Predicted::new(LzwCodec::default())))
        })
    }
    #[cfg(not(feature = "lzw"))]
    {
        not_configured("LZW", Scheme::Lzw)
    }
}

fn packbits_entry() -> CodecEntry {
    #[cfg(feature = "packbits")]
    {
        builtin("PackBits", Scheme::PackBits, |_| Ok(Box::new(PackBitsCodec::new())))
    }
    #[cfg(not(feature = "packbits"))]
    {
        not_configured("PackBits", Scheme::PackBits)
    }
}

fn thunderscan_entry() -> CodecEntry {
    #[cfg(feature = "thunderscan")]
    {
        builtin("ThunderScan", Scheme::ThunderScan, |_| {
            Ok(Box::new(ThunderScanCodec::new()))
        })
    }
    #[cfg(not(feature = "thunderscan"))]
    {
        not_configured("ThunderScan", Scheme::ThunderScan)
    }
}

fn next_entry() -> CodecEntry {
    #[cfg(feature = "next")]
    {
        builtin("NeXT", Scheme::Next, |_| Ok(Box::new(NextCodec::new())))
    }
    #[cfg(not(feature = "next"))]
    {
        not_configured("NeXT", Scheme::Next)
    }
}

fn deflate_entry(name: &str, scheme: Scheme) -> CodecEntry {
    #[cfg(feature = "deflate")]
    {
        builtin(name, scheme, |_| {
            Ok(Box::new(Predicted::new(DeflateCodec::new())))
        })
    }
    #[cfg(not(feature = "deflate"))]
    {
        not_configured(name, scheme)
    }
}

/// The built-in table, in lookup order.
fn builtin_codecs() -> Vec<CodecEntry> {
    vec![
        builtin("None", Scheme::None, |_| Ok(Box::new(DumpCodec::new()))),
        lzw_entry(),
        packbits_entry(),
        thunderscan_entry(),
        next_entry(),
        not_configured("JPEG", Scheme::Jpeg),
        not_configured("Old-style JPEG", Scheme::OJpeg),
        not_configured("CCITT RLE", Scheme::CcittRle),
        not_configured("CCITT RLE/W", Scheme::CcittRleW),
        not_configured("CCITT Group 3", Scheme::CcittFax3),
        not_configured("CCITT Group 4", Scheme::CcittFax4),
        not_configured("ISO JBIG", Scheme::Jbig),
        deflate_entry("Deflate", Scheme::Deflate),
        deflate_entry("AdobeDeflate", Scheme::AdobeDeflate),
        not_configured("PixarLog", Scheme::PixarLog),
        not_configured("SGILog", Scheme::SgiLog),
        not_configured("SGILog24", Scheme::SgiLog24),
    ]
}

impl CodecRegistry {
    /// A registry holding only the built-in codecs.
    pub fn new() -> Self {
        Self {
            registered: Vec::new(),
            builtins: builtin_codecs(),
            next_id: 0,
        }
    }

    /// Find the entry for `scheme`, registered entries first.
    pub fn find(&self, scheme: Scheme) -> Option<&CodecEntry> {
        let id = scheme.to_u16();
        self.registered
            .iter()
            .map(|(_, entry)| entry)
            .chain(self.builtins.iter())
            .find(|entry| entry.scheme.to_u16() == id)
    }

    /// Add a codec. It takes precedence over built-ins for the same
    /// scheme; among registered codecs the earliest match wins.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        scheme: Scheme,
        init: CodecInit,
    ) -> CodecHandle {
        let entry = CodecEntry::new(name, scheme, init);
        tracing::debug!(name = %entry.name, scheme = scheme.to_u16(), "registering codec");
        let handle = CodecHandle(self.next_id);
        self.next_id += 1;
        self.registered.push((handle, entry));
        handle
    }

    /// Remove a registered codec. Returns whether it was present.
    pub fn unregister(&mut self, handle: CodecHandle) -> bool {
        match self.registered.iter().position(|(h, _)| *h == handle) {
            Some(index) => {
                let (_, entry) = self.registered.remove(index);
                tracing::debug!(name = %entry.name, "unregistered codec");
                true
            }
            None => {
                tracing::warn!("Cannot remove compression scheme: codec not registered");
                false
            }
        }
    }

    /// Whether a working codec is available for `scheme`.
    pub fn is_configured(&self, scheme: Scheme) -> bool {
        self.find(scheme).is_some_and(CodecEntry::is_configured)
    }

    /// Every usable codec: registered ones, then configured built-ins.
    pub fn list_configured(&self) -> Vec<&CodecEntry> {
        self.registered
            .iter()
            .map(|(_, entry)| entry)
            .chain(self.builtins.iter().filter(|entry| entry.is_configured()))
            .collect()
    }

    /// Every built-in entry, configured or not.
    pub fn builtins(&self) -> &[CodecEntry] {
        &self.builtins
    }
}
