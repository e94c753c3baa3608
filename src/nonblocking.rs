//! Async, read-only access to possibly compressed files.
//!
//! Engines are resolved exactly like the blocking API; decompression runs on
//! `async-compression` decoders over `tokio` files. Unmatched paths are read raw.

use crate::engine::Engine;
use crate::error::Result;
use crate::registry::{default_registry, Registry};
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader, ReadBuf};
use tokio_stream::wrappers::LinesStream;

/// Async reader over the decompressed content of a file
pub struct AsyncCompReader {
    engine: Engine,
    inner: BufReader<Box<dyn AsyncRead + Send + Unpin>>,
}

impl AsyncCompReader {
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Read the whole decompressed content
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.inner.read_to_end(&mut data).await?;
        Ok(data)
    }

    /// Read the whole decompressed content as UTF-8 text
    pub async fn read_to_string(&mut self) -> Result<String> {
        let data = self.read_to_end().await?;
        Ok(String::from_utf8(data)?)
    }

    /// Stream of lines without their terminators
    pub fn lines(self) -> LinesStream<BufReader<Box<dyn AsyncRead + Send + Unpin>>> {
        LinesStream::new(self.inner.lines())
    }
}

impl AsyncRead for AsyncCompReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncBufRead for AsyncCompReader {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        Pin::new(&mut self.get_mut().inner).poll_fill_buf(cx)
    }

    fn consume(mut self: Pin<&mut Self>, amt: usize) {
        Pin::new(&mut self.inner).consume(amt)
    }
}

/// Open a file for async reading, resolving the engine with the default registry
pub async fn open_async(path: impl AsRef<Path>) -> Result<AsyncCompReader> {
    open_async_with(path, default_registry(), None).await
}

/// Open a file for async reading with an explicit registry and/or engine.
///
/// Custom codecs without an async decoder fail with [`io::ErrorKind::Unsupported`].
pub async fn open_async_with(
    path: impl AsRef<Path>,
    registry: &Registry,
    engine: Option<Engine>,
) -> Result<AsyncCompReader> {
    let path = path.as_ref();
    let engine = engine
        .or_else(|| registry.resolve(path))
        .unwrap_or_else(Engine::plain);
    let file = tokio::fs::File::open(path).await?;

    let reader: Box<dyn AsyncRead + Send + Unpin> = match &engine {
        Engine::Plain => Box::new(file),
        Engine::Codec(codec) => codec.wrap_async_reader(file).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Unsupported,
                format!("engine {} has no async reader", codec.name()),
            )
        })?,
    };
    log::debug!("opened {} for async reading with engine {}", path.display(), engine);

    Ok(AsyncCompReader {
        engine,
        inner: BufReader::new(reader),
    })
}
