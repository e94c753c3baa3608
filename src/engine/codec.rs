//! Compression codecs: the extension point behind every compressed engine.
//!
//! A [`Codec`] only wraps an open file with a decoder or an encoder; seeking,
//! buffering and mode handling live in the stream layer so that custom codecs get
//! them for free.

use crate::config::EngineOptions;
use std::any::TypeId;
use std::fs::File;
use std::io::{self, Read, Write};
use tokio::io::AsyncRead;

/// A writer that must be finalized to produce a valid compressed stream
pub trait FinishWrite: Write + Send {
    /// Write the trailer and release the encoder
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Pluggable compression codec.
///
/// Implement this trait to open files of a format the built-in engines do not
/// cover, then hand it to the registry with [`Engine::custom`](crate::Engine::custom).
///
/// Decoders must accept concatenated members/streams: files opened in append mode
/// gain one member per open.
pub trait Codec: Send + Sync + 'static {
    /// Short identifier of the engine ("gzip", "bzip2", ...)
    fn name(&self) -> &str;

    /// Identity of the implementing type, used for engine equality
    #[doc(hidden)]
    fn codec_type(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Wrap a file opened for reading with a decompressor
    fn wrap_reader(&self, file: File) -> io::Result<Box<dyn Read + Send>>;

    /// Wrap a file opened for writing with a compressor
    fn wrap_writer(&self, file: File, options: &EngineOptions) -> io::Result<Box<dyn FinishWrite>>;

    /// Async decompressor for [`open_async`](crate::open_async), if the codec has one
    fn wrap_async_reader(
        &self,
        _file: tokio::fs::File,
    ) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        None
    }
}

impl FinishWrite for flate2::write::GzEncoder<File> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        (*self).finish().map(drop)
    }
}

impl FinishWrite for bzip2::write::BzEncoder<File> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        (*self).finish().map(drop)
    }
}

#[cfg(feature = "lzma")]
impl FinishWrite for liblzma::write::XzEncoder<File> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        (*self).finish().map(drop)
    }
}

#[cfg(feature = "zstd")]
impl FinishWrite for zstd::stream::write::Encoder<'static, File> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        (*self).finish().map(drop)
    }
}

/// gzip engine (`.gz`) backed by `flate2`
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCodec;

impl Codec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn wrap_reader(&self, file: File) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(flate2::read::MultiGzDecoder::new(file)))
    }

    fn wrap_writer(&self, file: File, options: &EngineOptions) -> io::Result<Box<dyn FinishWrite>> {
        let level = flate2::Compression::new(options.gzip_level);
        Ok(Box::new(flate2::write::GzEncoder::new(file, level)))
    }

    fn wrap_async_reader(&self, file: tokio::fs::File) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        let mut decoder =
            async_compression::tokio::bufread::GzipDecoder::new(tokio::io::BufReader::new(file));
        decoder.multiple_members(true);
        Some(Box::new(decoder))
    }
}

/// bzip2 engine (`.bz2`) backed by `bzip2`
#[derive(Debug, Clone, Copy, Default)]
pub struct Bzip2Codec;

impl Codec for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn wrap_reader(&self, file: File) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(bzip2::read::MultiBzDecoder::new(file)))
    }

    fn wrap_writer(&self, file: File, options: &EngineOptions) -> io::Result<Box<dyn FinishWrite>> {
        let level = bzip2::Compression::new(options.bzip2_level);
        Ok(Box::new(bzip2::write::BzEncoder::new(file, level)))
    }

    fn wrap_async_reader(&self, file: tokio::fs::File) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        let mut decoder =
            async_compression::tokio::bufread::BzDecoder::new(tokio::io::BufReader::new(file));
        decoder.multiple_members(true);
        Some(Box::new(decoder))
    }
}

/// LZMA engine (`.xz`, `.lzma`) backed by `liblzma`.
///
/// Reading auto-detects the `.xz` container and the legacy `.lzma` format; writing
/// always produces `.xz` containers.
#[cfg(feature = "lzma")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaCodec;

#[cfg(feature = "lzma")]
impl Codec for LzmaCodec {
    fn name(&self) -> &str {
        "lzma"
    }

    fn wrap_reader(&self, file: File) -> io::Result<Box<dyn Read + Send>> {
        let stream =
            liblzma::stream::Stream::new_auto_decoder(u64::MAX, liblzma::stream::CONCATENATED)
                .map_err(io::Error::other)?;
        Ok(Box::new(liblzma::read::XzDecoder::new_stream(file, stream)))
    }

    fn wrap_writer(&self, file: File, options: &EngineOptions) -> io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(liblzma::write::XzEncoder::new(file, options.xz_preset)))
    }

    fn wrap_async_reader(&self, file: tokio::fs::File) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        let mut decoder =
            async_compression::tokio::bufread::XzDecoder::new(tokio::io::BufReader::new(file));
        decoder.multiple_members(true);
        Some(Box::new(decoder))
    }
}

/// Zstandard engine (`.zst`, `.zstd`) backed by `zstd`
#[cfg(feature = "zstd")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdCodec;

#[cfg(feature = "zstd")]
impl Codec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn wrap_reader(&self, file: File) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(zstd::stream::read::Decoder::new(file)?))
    }

    fn wrap_writer(&self, file: File, options: &EngineOptions) -> io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(zstd::stream::write::Encoder::new(
            file,
            options.zstd_level,
        )?))
    }

    fn wrap_async_reader(&self, file: tokio::fs::File) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        let mut decoder =
            async_compression::tokio::bufread::ZstdDecoder::new(tokio::io::BufReader::new(file));
        decoder.multiple_members(true);
        Some(Box::new(decoder))
    }
}
