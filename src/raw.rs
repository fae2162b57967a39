//! Raw read primitives the line reader pulls bytes from.

use std::collections::HashMap;
use std::io::{self, Read};

/// Descriptor identity. Matches the width of a unix file descriptor.
pub type Fd = i32;

/// A byte-level read primitive addressed by descriptor.
///
/// `Ok(0)` signals end of stream. Any error other than
/// `ErrorKind::Interrupted` is treated as unrecoverable for that descriptor.
pub trait RawRead {
    fn read(&mut self, fd: Fd, buf: &mut [u8]) -> io::Result<usize>;
}

/// Reads straight from open unix file descriptors without taking ownership
/// of them.
#[cfg(unix)]
#[derive(Debug)]
pub struct FdReader {
    _priv: (),
}

#[cfg(unix)]
impl FdReader {
    /// # Safety
    ///
    /// Every descriptor later passed to `read` must be open and must stay
    /// open for the duration of that call. The reader never closes them.
    pub unsafe fn new() -> Self {
        FdReader { _priv: () }
    }
}

#[cfg(unix)]
impl RawRead for FdReader {
    fn read(&mut self, fd: Fd, buf: &mut [u8]) -> io::Result<usize> {
        use std::fs::File;
        use std::mem::ManuallyDrop;
        use std::os::unix::io::FromRawFd;

        if fd < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("negative descriptor {}", fd),
            ));
        }
        // the File must not close a descriptor it does not own
        let file = ManuallyDrop::new(unsafe { File::from_raw_fd(fd) });
        (&*file).read(buf)
    }
}

/// In-memory descriptor table mapping descriptor numbers to readers.
///
/// Reading a descriptor that was never inserted fails with `NotFound`.
#[derive(Debug)]
pub struct StreamTable<R> {
    streams: HashMap<Fd, R>,
}

impl<R> Default for StreamTable<R> {
    fn default() -> Self {
        StreamTable {
            streams: HashMap::new(),
        }
    }
}

impl<R: Read> StreamTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fd: Fd, stream: R) -> Option<R> {
        self.streams.insert(fd, stream)
    }

    pub fn remove(&mut self, fd: Fd) -> Option<R> {
        self.streams.remove(&fd)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl<R: Read> RawRead for StreamTable<R> {
    fn read(&mut self, fd: Fd, buf: &mut [u8]) -> io::Result<usize> {
        match self.streams.get_mut(&fd) {
            Some(stream) => stream.read(buf),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no stream registered for descriptor {}", fd),
            )),
        }
    }
}

/// Adapts a single `Read` into a primitive that ignores the descriptor.
#[derive(Debug)]
pub struct Single<R>(pub R);

impl<R: Read> RawRead for Single<R> {
    fn read(&mut self, _fd: Fd, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}
