use std::io::{self, Read, Stdin, Write};
use std::thread;

use super::ReaderSource;
use crate::error::{Error, Result};

/// Copies every line of an input stream to a writer.
pub struct Source<R, W> {
    input: ReaderSource<R>,
    out: W,
}

impl<W: Write> Source<Stdin, W> {
    pub fn stdin_with_buffer_size(out: W, buffer_size: usize) -> Result<Self> {
        Source::with_buffer_size(io::stdin(), out, buffer_size)
    }
}

impl<R: Read, W: Write> Source<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Source {
            input: ReaderSource::new(input),
            out,
        }
    }

    pub fn with_buffer_size(input: R, out: W, buffer_size: usize) -> Result<Self> {
        Ok(Source {
            input: ReaderSource::with_buffer_size(input, buffer_size)?,
            out,
        })
    }

    /// Returns the number of lines written.
    pub fn copy(&mut self) -> Result<u64> {
        let mut offset = 0;
        while let Some(line) = self.input.pull()? {
            self.out.write_all(&line).map_err(Error::Output)?;
            offset += 1;
        }
        self.out.flush().map_err(Error::Output)?;
        Ok(offset)
    }
}

impl<R, W> Source<R, W>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    pub fn run(mut self) -> thread::JoinHandle<Result<u64>> {
        thread::spawn(move || self.copy())
    }
}
