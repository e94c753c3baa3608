//! Unified file handle over every engine.
//!
//! [`CompFile`] owns one engine stream for its whole life and exposes the same
//! operations whatever the engine: reads, line reads, writes, seeking and
//! capability queries. Text-mode handles exchange [`Content::Text`], binary-mode
//! handles [`Content::Binary`].
//!
//! A handle is either open or closed. Closing is idempotent, and every operation
//! other than [`close`](CompFile::close) / [`closed`](CompFile::closed) fails with
//! [`CompFileError::Closed`] afterwards. Dropping an open handle closes it.

mod content;
mod opener;

pub use content::Content;
pub use opener::{open, with_open, Opener};

use crate::config::EngineOptions;
use crate::engine::stream::EngineStream;
use crate::engine::Engine;
use crate::error::{CompFileError, Result};
use crate::mode::OpenMode;
use std::fmt;
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file opened through a compression engine
pub struct CompFile {
    path: PathBuf,
    engine: Engine,
    mode: OpenMode,
    /// `None` once the handle is closed
    stream: Option<Box<dyn EngineStream>>,
}

impl CompFile {
    pub(crate) fn new(
        path: &Path,
        engine: Engine,
        mode: OpenMode,
        options: &EngineOptions,
    ) -> Result<Self> {
        let stream = engine.open(path, mode, options)?;
        log::debug!("opened {} with engine {} ({})", path.display(), engine, mode);
        Ok(Self {
            path: path.to_path_buf(),
            engine,
            mode,
            stream: Some(stream),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The engine chosen when the handle was opened
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The normalized mode the handle was opened with
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn stream(&mut self) -> Result<&mut Box<dyn EngineStream>> {
        self.stream.as_mut().ok_or(CompFileError::Closed)
    }

    fn stream_ref(&self) -> Result<&dyn EngineStream> {
        self.stream.as_deref().ok_or(CompFileError::Closed)
    }

    /// Turn raw bytes into the content kind of this handle's mode
    fn to_content(&self, bytes: Vec<u8>) -> Result<Content> {
        if self.mode.is_binary() {
            Ok(Content::Binary(bytes))
        } else {
            Ok(Content::Text(String::from_utf8(bytes)?))
        }
    }

    /// Read up to `size` units, or everything up to EOF with `None`.
    ///
    /// Units are bytes in binary mode and characters in text mode. Text mode
    /// translates `\r\n` and lone `\r` to `\n`.
    pub fn read(&mut self, size: Option<usize>) -> Result<Content> {
        let text = self.mode.is_text();
        let stream = self.stream()?;
        let bytes = match (size, text) {
            (None, false) => {
                let mut bytes = Vec::new();
                stream.read_to_end(&mut bytes)?;
                bytes
            }
            (None, true) => {
                let mut bytes = Vec::new();
                stream.read_to_end(&mut bytes)?;
                translate_newlines(bytes)
            }
            (Some(limit), false) => {
                let mut bytes = Vec::new();
                Read::take(&mut **stream, limit as u64).read_to_end(&mut bytes)?;
                bytes
            }
            (Some(limit), true) => read_text(&mut **stream, Some(limit), false)?,
        };
        self.to_content(bytes)
    }

    /// Return what is already buffered (at most `size` units), refilling once if empty
    pub fn read1(&mut self, size: Option<usize>) -> Result<Content> {
        let text = self.mode.is_text();
        let stream = self.stream()?;
        let bytes = if text {
            // Every character takes at least one buffered byte
            let buffered = stream.fill_buf()?.len();
            let limit = size.map_or(buffered, |s| s.min(buffered));
            read_text(&mut **stream, Some(limit), false)?
        } else {
            let available = stream.fill_buf()?;
            let count = size.map_or(available.len(), |limit| limit.min(available.len()));
            let chunk = available[..count].to_vec();
            stream.consume(count);
            chunk
        };
        self.to_content(bytes)
    }

    /// Fill `buf` from the stream, stopping early only at EOF (binary mode only)
    pub fn readinto(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.mode.is_text() {
            return Err(CompFileError::ContentMismatch {
                expected: "binary mode for readinto",
            });
        }
        let stream = self.stream()?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = stream.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Read one line including its `\n`; empty content means EOF.
    ///
    /// `limit` caps the bytes (binary mode) or characters (text mode) read.
    pub fn readline(&mut self, limit: Option<usize>) -> Result<Content> {
        let text = self.mode.is_text();
        let bytes = {
            let stream = self.stream()?;
            if text {
                read_text(&mut **stream, limit, true)?
            } else {
                read_line_bytes(&mut **stream, limit)?
            }
        };
        self.to_content(bytes)
    }

    /// Read the remaining lines.
    ///
    /// With a non-zero `hint`, stops once the lines read total at least `hint` bytes.
    pub fn readlines(&mut self, hint: Option<usize>) -> Result<Vec<Content>> {
        let hint = hint.filter(|&h| h > 0);
        let mut lines = Vec::new();
        let mut total = 0;
        loop {
            let line = self.readline(None)?;
            if line.is_empty() {
                break;
            }
            total += line.len();
            lines.push(line);
            if hint.is_some_and(|h| total >= h) {
                break;
            }
        }
        Ok(lines)
    }

    /// Iterate over the remaining lines
    pub fn iter_lines(&mut self) -> Lines<'_> {
        Lines {
            file: self,
            done: false,
        }
    }

    /// Write text (text mode) or bytes (binary mode).
    ///
    /// Returns the number of characters written in text mode, bytes in binary mode.
    pub fn write(&mut self, data: impl Into<Content>) -> Result<usize> {
        let data = data.into();
        let binary = self.mode.is_binary();
        let stream = self.stream()?;
        match data {
            Content::Text(text) if !binary => {
                stream.write_all(text.as_bytes())?;
                Ok(text.chars().count())
            }
            Content::Binary(bytes) if binary => {
                stream.write_all(&bytes)?;
                Ok(bytes.len())
            }
            Content::Text(_) => Err(CompFileError::ContentMismatch {
                expected: "bytes in binary mode",
            }),
            Content::Binary(_) => Err(CompFileError::ContentMismatch {
                expected: "text in text mode",
            }),
        }
    }

    /// Write every item in order; no separators are added
    pub fn writelines<I, T>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Content>,
    {
        for line in lines {
            self.write(line)?;
        }
        Ok(())
    }

    /// Move to a byte position in the decompressed stream
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.stream()?.seek_to(pos)?)
    }

    /// Current byte position in the decompressed stream
    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.stream()?.tell()?)
    }

    /// Look at buffered bytes without consuming them.
    ///
    /// Returns at most `size` bytes (everything buffered when `size` is 0) and
    /// refills the buffer once if it is empty. An empty result means EOF.
    pub fn peek(&mut self, size: usize) -> Result<Vec<u8>> {
        let stream = self.stream()?;
        let available = stream.fill_buf()?;
        let count = if size == 0 {
            available.len()
        } else {
            size.min(available.len())
        };
        Ok(available[..count].to_vec())
    }

    /// Descriptor of the underlying OS file
    pub fn fileno(&self) -> Result<i32> {
        self.stream_ref()?.raw_fd().ok_or_else(|| {
            CompFileError::Io(io::Error::new(
                io::ErrorKind::Unsupported,
                "fileno is not available on this platform",
            ))
        })
    }

    pub fn seekable(&self) -> Result<bool> {
        Ok(self.stream_ref()?.is_seekable())
    }

    pub fn readable(&self) -> Result<bool> {
        self.stream_ref()?;
        Ok(self.mode.is_readable())
    }

    pub fn writable(&self) -> Result<bool> {
        self.stream_ref()?;
        Ok(self.mode.is_writable())
    }

    /// Push buffered output down to the engine
    pub fn flush(&mut self) -> Result<()> {
        Ok(self.stream()?.flush()?)
    }

    /// Close the handle, finishing compressed output. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            log::debug!("closing {} ({})", self.path.display(), self.engine);
            stream.close()?;
        }
        Ok(())
    }

    pub fn closed(&self) -> bool {
        self.stream.is_none()
    }

    fn io_stream(&mut self) -> io::Result<&mut Box<dyn EngineStream>> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::other(CompFileError::Closed))
    }
}

impl Drop for CompFile {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("failed to close {}: {}", self.path.display(), err);
        }
    }
}

impl fmt::Debug for CompFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompFile")
            .field("path", &self.path)
            .field("engine", &self.engine)
            .field("mode", &self.mode.to_string())
            .field("closed", &self.closed())
            .finish()
    }
}

/// Raw decompressed bytes, whatever the handle's mode
impl Read for CompFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.io_stream()?.read(buf)
    }
}

impl BufRead for CompFile {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.io_stream()?.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if let Some(stream) = self.stream.as_mut() {
            stream.consume(amt);
        }
    }
}

impl Write for CompFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.io_stream()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.io_stream()?.flush()
    }
}

impl Seek for CompFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.io_stream()?.seek_to(pos)
    }
}

/// Iterator over the lines of a handle, see [`CompFile::iter_lines`]
pub struct Lines<'a> {
    file: &'a mut CompFile,
    done: bool,
}

impl Iterator for Lines<'_> {
    type Item = Result<Content>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.file.readline(None) {
            Ok(line) if line.is_empty() => {
                self.done = true;
                None
            }
            Ok(line) => Some(Ok(line)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Read through the next `\n` (inclusive), at most `limit` bytes
fn read_line_bytes(stream: &mut dyn EngineStream, limit: Option<usize>) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    loop {
        let remaining = limit.map(|l| l.saturating_sub(line.len()));
        if remaining == Some(0) {
            break;
        }
        let available = stream.fill_buf()?;
        if available.is_empty() {
            break;
        }
        let window = match remaining {
            Some(r) => &available[..available.len().min(r)],
            None => available,
        };
        let (count, found) = match memchr::memchr(b'\n', window) {
            Some(i) => (i + 1, true),
            None => (window.len(), false),
        };
        line.extend_from_slice(&window[..count]);
        stream.consume(count);
        if found {
            break;
        }
    }
    Ok(line)
}

/// Length of the UTF-8 sequence starting with `lead`; invalid leads count as one
/// byte and fail decoding later
fn utf8_width(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// Read up to `limit` characters of text, translating `\r\n` and `\r` to `\n`.
///
/// With `stop_at_newline` the read also ends after the first (translated) `\n`.
/// The bytes returned are not validated; callers decode them.
fn read_text(
    stream: &mut dyn EngineStream,
    limit: Option<usize>,
    stop_at_newline: bool,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut chars = 0;
    loop {
        let budget = match limit {
            Some(l) if chars >= l => break,
            Some(l) => l - chars,
            None => usize::MAX,
        };
        let available = stream.fill_buf()?;
        let Some(&lead) = available.first() else {
            break;
        };

        // ASCII run without line terminators
        let run = available
            .iter()
            .take(budget)
            .take_while(|&&b| b.is_ascii() && b != b'\r' && b != b'\n')
            .count();
        if run > 0 {
            out.extend_from_slice(&available[..run]);
            stream.consume(run);
            chars += run;
            continue;
        }

        match lead {
            b'\r' => {
                stream.consume(1);
                // The matching \n may only arrive with the next refill
                if stream.fill_buf()?.first() == Some(&b'\n') {
                    stream.consume(1);
                }
                out.push(b'\n');
            }
            b'\n' => {
                stream.consume(1);
                out.push(b'\n');
            }
            _ => {
                let width = utf8_width(lead);
                if available.len() >= width {
                    out.extend_from_slice(&available[..width]);
                    stream.consume(width);
                } else {
                    Read::take(&mut *stream, width as u64).read_to_end(&mut out)?;
                }
            }
        }
        chars += 1;
        if stop_at_newline && out.last() == Some(&b'\n') {
            break;
        }
    }
    Ok(out)
}

/// Translate `\r\n` and lone `\r` to `\n`
fn translate_newlines(bytes: Vec<u8>) -> Vec<u8> {
    if memchr::memchr(b'\r', &bytes).is_none() {
        return bytes;
    }
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().peekable();
    while let Some(b) = iter.next() {
        if b == b'\r' {
            iter.next_if_eq(&b'\n');
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    out
}
