//! Compression engines.
//!
//! An [`Engine`] identifies how a path is opened: either as a plain file, or through
//! a [`Codec`] that wraps the file with a decompressor/compressor. Engines are cheap
//! to clone.

pub mod codec;
mod plain;
pub(crate) mod stream;

pub use codec::{Bzip2Codec, Codec, FinishWrite, GzipCodec};
#[cfg(feature = "lzma")]
pub use codec::LzmaCodec;
#[cfg(feature = "zstd")]
pub use codec::ZstdCodec;

use crate::config::EngineOptions;
use crate::mode::OpenMode;
use plain::PlainStream;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use stream::{CodecStream, EngineStream};

/// Whether the LZMA/XZ engine was compiled in
pub const HAS_LZMA: bool = cfg!(feature = "lzma");

/// Whether the Zstandard engine was compiled in
pub const HAS_ZSTD: bool = cfg!(feature = "zstd");

/// A compression backend able to open a path.
///
/// Two engines are equal when both are plain, or when their codecs have the same
/// type and the same name. A custom codec calling itself `"gzip"` is therefore not
/// equal to [`Engine::gzip`].
#[derive(Clone)]
pub enum Engine {
    /// Uncompressed passthrough
    Plain,
    /// Compressed file handled by a codec
    Codec(Arc<dyn Codec>),
}

impl Engine {
    pub fn plain() -> Self {
        Self::Plain
    }

    pub fn gzip() -> Self {
        Self::Codec(Arc::new(GzipCodec))
    }

    pub fn bzip2() -> Self {
        Self::Codec(Arc::new(Bzip2Codec))
    }

    #[cfg(feature = "lzma")]
    pub fn lzma() -> Self {
        Self::Codec(Arc::new(LzmaCodec))
    }

    #[cfg(feature = "zstd")]
    pub fn zstd() -> Self {
        Self::Codec(Arc::new(ZstdCodec))
    }

    /// Wrap a user-provided codec
    pub fn custom(codec: impl Codec + 'static) -> Self {
        Self::Codec(Arc::new(codec))
    }

    /// Look up a built-in engine by name ("plain", "gzip", "bzip2", "lzma", "zstd")
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "plain" | "none" => Some(Self::plain()),
            "gzip" | "gz" => Some(Self::gzip()),
            "bzip2" | "bz2" => Some(Self::bzip2()),
            #[cfg(feature = "lzma")]
            "lzma" | "xz" => Some(Self::lzma()),
            #[cfg(feature = "zstd")]
            "zstd" | "zst" => Some(Self::zstd()),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Plain => "plain",
            Self::Codec(codec) => codec.name(),
        }
    }

    /// Check if this engine decompresses its input
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Codec(_))
    }

    /// Open `path` with this engine under an already normalized mode
    pub(crate) fn open(
        &self,
        path: &Path,
        mode: OpenMode,
        options: &EngineOptions,
    ) -> io::Result<Box<dyn EngineStream>> {
        match self {
            Self::Plain => Ok(Box::new(PlainStream::open(
                path,
                mode.access(),
                options.buffer_size,
            )?)),
            Self::Codec(codec) => Ok(Box::new(CodecStream::open(
                Arc::clone(codec),
                path,
                mode.access(),
                options,
            )?)),
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Engine").field(&self.name()).finish()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Engine {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain, Self::Plain) => true,
            (Self::Codec(a), Self::Codec(b)) => {
                a.codec_type() == b.codec_type() && a.name() == b.name()
            }
            _ => false,
        }
    }
}

impl Eq for Engine {}
