use std::io::Read;

use crate::config::Config;
use crate::error::Result;
use crate::raw::{Fd, Single};
use crate::registry::LineReader;

pub mod console;

const FD: Fd = 0;

/// Line source over a single reader; the one-descriptor form of
/// [`LineReader`].
pub struct ReaderSource<T> {
    inner: LineReader<Single<T>>,
}

impl<T: Read> ReaderSource<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner: LineReader::new(Single(inner)),
        }
    }

    pub fn with_buffer_size(inner: T, buffer_size: usize) -> Result<Self> {
        let config = Config::default().buffer_size(buffer_size).single_slot();
        Ok(Self {
            inner: LineReader::with_config(Single(inner), config)?,
        })
    }

    /// Next line with its trailing `\n`, if the stream had one there.
    pub fn pull(&mut self) -> Result<Option<Vec<u8>>> {
        self.inner.next_line(FD)
    }

    pub fn stats(&self) -> crate::Stats {
        self.inner.stats()
    }
}

impl<T: Read> Iterator for ReaderSource<T> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pull().transpose()
    }
}
