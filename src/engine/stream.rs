//! Engine-specific streams behind a [`CompFile`](crate::CompFile).
//!
//! Every engine hands the façade an [`EngineStream`]: a buffered byte stream that
//! knows how to seek, report its position and close itself. The façade only ever
//! talks to this trait.

use crate::config::EngineOptions;
use crate::engine::codec::{Codec, FinishWrite};
use crate::mode::Access;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

/// Byte stream produced by an engine for one open handle
pub(crate) trait EngineStream: BufRead + Write + Send {
    /// Move to a new position in the (decompressed) stream
    fn seek_to(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Current position in the (decompressed) stream
    fn tell(&mut self) -> io::Result<u64>;

    /// Whether [`seek_to`](Self::seek_to) is supported
    fn is_seekable(&self) -> bool;

    /// Descriptor of the underlying OS file
    fn raw_fd(&self) -> Option<i32>;

    /// Flush pending output and release the engine; called exactly once
    fn close(&mut self) -> io::Result<()>;
}

/// Which half of the stream is active for the handle's mode
pub(crate) enum Direction<R, W> {
    Reading(R),
    Writing(W),
    Closed,
}

pub(crate) fn not_readable() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "File not open for reading")
}

pub(crate) fn not_writable() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "File not open for writing")
}

pub(crate) fn stream_closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "Stream already closed")
}

/// Open the OS file with the options matching an access mode
pub(crate) fn open_file(path: &Path, access: Access) -> io::Result<File> {
    let mut options = OpenOptions::new();
    match access {
        Access::Read => options.read(true),
        Access::Write => options.write(true).create(true).truncate(true),
        Access::Append => options.append(true).create(true),
        Access::Exclusive => options.write(true).create_new(true),
    };
    options.open(path)
}

#[cfg(unix)]
pub(crate) fn fd_of(file: &File) -> Option<i32> {
    use std::os::fd::AsRawFd;
    Some(file.as_raw_fd())
}

#[cfg(not(unix))]
pub(crate) fn fd_of(_file: &File) -> Option<i32> {
    None
}

/// Stream over a compressed file.
///
/// Reading decompresses on the fly. Seeking is emulated: forward seeks decompress
/// and discard, backward seeks restart decompression from the beginning of the
/// file. Writing compresses on the fly and cannot seek.
pub(crate) struct CodecStream {
    codec: Arc<dyn Codec>,
    /// Duplicate of the file descriptor, used to restart decompression
    file: File,
    inner: Direction<BufReader<Box<dyn Read + Send>>, Box<dyn FinishWrite>>,
    buffer_size: usize,
    /// Position in the decompressed stream
    pos: u64,
    /// Decompressed size, once EOF has been observed
    size: Option<u64>,
}

impl CodecStream {
    pub(crate) fn open(
        codec: Arc<dyn Codec>,
        path: &Path,
        access: Access,
        options: &EngineOptions,
    ) -> io::Result<Self> {
        let file = open_file(path, access)?;
        let handle = file.try_clone()?;
        let buffer_size = options.buffer_size.max(1);

        let inner = if access.is_write() {
            Direction::Writing(codec.wrap_writer(handle, options)?)
        } else {
            let decoder = codec.wrap_reader(handle)?;
            Direction::Reading(BufReader::with_capacity(buffer_size, decoder))
        };

        Ok(Self {
            codec,
            file,
            inner,
            buffer_size,
            pos: 0,
            size: None,
        })
    }

    fn reader(&mut self) -> io::Result<&mut BufReader<Box<dyn Read + Send>>> {
        match &mut self.inner {
            Direction::Reading(reader) => Ok(reader),
            Direction::Writing(_) => Err(not_readable()),
            Direction::Closed => Err(stream_closed()),
        }
    }

    fn writer(&mut self) -> io::Result<&mut Box<dyn FinishWrite>> {
        match &mut self.inner {
            Direction::Writing(writer) => Ok(writer),
            Direction::Reading(_) => Err(not_writable()),
            Direction::Closed => Err(stream_closed()),
        }
    }

    /// Restart decompression from the first byte of the file
    fn rewind(&mut self) -> io::Result<()> {
        let mut handle = self.file.try_clone()?;
        handle.seek(SeekFrom::Start(0))?;
        let decoder = self.codec.wrap_reader(handle)?;
        self.inner = Direction::Reading(BufReader::with_capacity(self.buffer_size, decoder));
        self.pos = 0;
        Ok(())
    }

    /// Decompress and discard up to `count` bytes, stopping at EOF
    fn skip(&mut self, count: u64) -> io::Result<()> {
        let copied = {
            let reader = self.reader()?;
            io::copy(&mut reader.by_ref().take(count), &mut io::sink())?
        };
        self.pos += copied;
        if copied < count {
            self.size = Some(self.pos);
        }
        Ok(())
    }

    fn decompressed_size(&mut self) -> io::Result<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        self.skip(u64::MAX)?;
        Ok(self.pos)
    }
}

impl Read for CodecStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader()?.read(buf)?;
        self.pos += n as u64;
        if n == 0 && !buf.is_empty() {
            self.size = Some(self.pos);
        }
        Ok(n)
    }
}

impl BufRead for CodecStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader()?.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if let Direction::Reading(reader) = &mut self.inner {
            reader.consume(amt);
            self.pos += amt as u64;
        }
    }
}

impl Write for CodecStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer()?.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Direction::Writing(writer) => writer.flush(),
            _ => Ok(()),
        }
    }
}

impl EngineStream for CodecStream {
    fn seek_to(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self.inner {
            Direction::Reading(_) => {}
            Direction::Writing(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "Seek is not supported on compressed files opened for writing",
                ))
            }
            Direction::Closed => return Err(stream_closed()),
        }

        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.decompressed_size()?) + i128::from(delta),
        };
        let target = u64::try_from(target).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "Negative seek position")
        })?;

        if target < self.pos {
            self.rewind()?;
        }
        self.skip(target - self.pos)?;
        Ok(self.pos)
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.pos)
    }

    fn is_seekable(&self) -> bool {
        matches!(self.inner, Direction::Reading(_))
    }

    fn raw_fd(&self) -> Option<i32> {
        fd_of(&self.file)
    }

    fn close(&mut self) -> io::Result<()> {
        match std::mem::replace(&mut self.inner, Direction::Closed) {
            Direction::Writing(writer) => writer.finish(),
            Direction::Reading(_) | Direction::Closed => Ok(()),
        }
    }
}
