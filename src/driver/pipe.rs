//! Opaque stream handles given out by the driver.
//!
//! A handle is a shared reference to a stream owned by an algorithm instance
//! or a file channel. Cloning a handle does not duplicate the stream: closing
//! any clone closes the stream for all of them, and further I/O fails with
//! `BrokenPipe`. The stream is also released when the last reference to it,
//! including the driver's own, goes away.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, Weak};

use super::table::lock;

type Shared<S> = Arc<Mutex<Option<S>>>;

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pipe is closed")
}

/// Readable end of a pipe: an algorithm's output or a file opened for reading.
#[derive(Clone)]
pub struct ReadPipe {
    stream: Shared<Box<dyn Read + Send>>,
}

impl ReadPipe {
    pub(crate) fn new(reader: impl Read + Send + 'static) -> Self {
        ReadPipe {
            stream: Arc::new(Mutex::new(Some(Box::new(reader)))),
        }
    }

    pub fn is_open(self: &Self) -> bool {
        lock(&self.stream).is_some()
    }

    /// Releases the underlying stream.
    pub fn close(self: &Self) {
        lock(&self.stream).take();
    }
}

impl Read for ReadPipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match lock(&self.stream).as_mut() {
            Some(stream) => stream.read(buf),
            None => Err(closed()),
        }
    }
}

impl fmt::Debug for ReadPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadPipe")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Writable end of a pipe: an algorithm's input or a file opened for writing.
///
/// Close it to signal end of input to an algorithm.
#[derive(Clone)]
pub struct WritePipe {
    stream: Shared<Box<dyn Write + Send>>,
}

impl WritePipe {
    pub(crate) fn new(writer: impl Write + Send + 'static) -> Self {
        WritePipe {
            stream: Arc::new(Mutex::new(Some(Box::new(writer)))),
        }
    }

    pub fn is_open(self: &Self) -> bool {
        lock(&self.stream).is_some()
    }

    /// Flushes and releases the underlying stream. Closing twice is a no-op.
    pub fn close(self: &Self) -> io::Result<()> {
        match lock(&self.stream).take() {
            Some(mut stream) => stream.flush(),
            None => Ok(()),
        }
    }

    pub(crate) fn downgrade(self: &Self) -> WeakWritePipe {
        WeakWritePipe {
            stream: Arc::downgrade(&self.stream),
        }
    }
}

/// A `WritePipe` that does not keep the stream alive. The stream is
/// released when the last `WritePipe` is dropped.
pub(crate) struct WeakWritePipe {
    stream: Weak<Mutex<Option<Box<dyn Write + Send>>>>,
}

impl WeakWritePipe {
    pub fn upgrade(self: &Self) -> Option<WritePipe> {
        self.stream.upgrade().map(|stream| WritePipe { stream })
    }
}

impl fmt::Debug for WeakWritePipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakWritePipe")
            .field("alive", &(self.stream.strong_count() > 0))
            .finish()
    }
}

impl Write for WritePipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match lock(&self.stream).as_mut() {
            Some(stream) => stream.write(buf),
            None => Err(closed()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match lock(&self.stream).as_mut() {
            Some(stream) => stream.flush(),
            None => Err(closed()),
        }
    }
}

impl fmt::Debug for WritePipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WritePipe")
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn closing_a_clone_closes_all() {
        let pipe = ReadPipe::new(Cursor::new(b"hello".to_vec()));
        let mut clone = pipe.clone();

        let mut buf = [0; 2];
        clone.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"he");

        pipe.close();
        assert!(!clone.is_open());
        assert_eq!(
            clone.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn write_after_close_fails() {
        let mut pipe = WritePipe::new(io::sink());
        pipe.write_all(b"data").unwrap();
        pipe.close().unwrap();
        pipe.close().unwrap();
        assert!(pipe.write_all(b"more").is_err());
    }

    #[test]
    fn dropping_the_last_handle_releases_the_stream() {
        let pipe = WritePipe::new(io::sink());
        let weak = pipe.downgrade();
        let clone = weak.upgrade().unwrap();

        drop(pipe);
        assert!(weak.upgrade().is_some());
        drop(clone);
        assert!(weak.upgrade().is_none());
    }
}
