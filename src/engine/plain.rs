//! Uncompressed file stream, used when no compression engine matches a path.

use crate::engine::stream::{
    fd_of, not_readable, not_writable, open_file, stream_closed, Direction, EngineStream,
};
use crate::mode::Access;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Buffered stream over a regular file; seeks natively
pub(crate) struct PlainStream {
    inner: Direction<BufReader<File>, BufWriter<File>>,
    fd: Option<i32>,
}

impl PlainStream {
    pub(crate) fn open(path: &Path, access: Access, buffer_size: usize) -> io::Result<Self> {
        let file = open_file(path, access)?;
        let fd = fd_of(&file);
        let capacity = buffer_size.max(1);

        let inner = if access.is_write() {
            Direction::Writing(BufWriter::with_capacity(capacity, file))
        } else {
            Direction::Reading(BufReader::with_capacity(capacity, file))
        };

        Ok(Self { inner, fd })
    }
}

impl Read for PlainStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Direction::Reading(reader) => reader.read(buf),
            Direction::Writing(_) => Err(not_readable()),
            Direction::Closed => Err(stream_closed()),
        }
    }
}

impl BufRead for PlainStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match &mut self.inner {
            Direction::Reading(reader) => reader.fill_buf(),
            Direction::Writing(_) => Err(not_readable()),
            Direction::Closed => Err(stream_closed()),
        }
    }

    fn consume(&mut self, amt: usize) {
        if let Direction::Reading(reader) = &mut self.inner {
            reader.consume(amt);
        }
    }
}

impl Write for PlainStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            Direction::Writing(writer) => writer.write(buf),
            Direction::Reading(_) => Err(not_writable()),
            Direction::Closed => Err(stream_closed()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Direction::Writing(writer) => writer.flush(),
            _ => Ok(()),
        }
    }
}

impl EngineStream for PlainStream {
    fn seek_to(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.inner {
            Direction::Reading(reader) => reader.seek(pos),
            Direction::Writing(writer) => writer.seek(pos),
            Direction::Closed => Err(stream_closed()),
        }
    }

    fn tell(&mut self) -> io::Result<u64> {
        match &mut self.inner {
            Direction::Reading(reader) => reader.stream_position(),
            Direction::Writing(writer) => writer.stream_position(),
            Direction::Closed => Err(stream_closed()),
        }
    }

    fn is_seekable(&self) -> bool {
        !matches!(self.inner, Direction::Closed)
    }

    fn raw_fd(&self) -> Option<i32> {
        self.fd
    }

    fn close(&mut self) -> io::Result<()> {
        match std::mem::replace(&mut self.inner, Direction::Closed) {
            Direction::Writing(mut writer) => writer.flush(),
            Direction::Reading(_) | Direction::Closed => Ok(()),
        }
    }
}
