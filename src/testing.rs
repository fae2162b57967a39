use std::cell::Cell;
use std::io::{self, Read};
use std::rc::Rc;

/// Hands out at most `step` bytes per read.
pub struct Trickle {
    data: Vec<u8>,
    step: usize,
    pos: usize,
}

impl Trickle {
    pub fn new<D: Into<Vec<u8>>>(data: D, step: usize) -> Self {
        Trickle {
            data: data.into(),
            step,
            pos: 0,
        }
    }
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let end = (self.pos + self.step).min(self.data.len());
        let n = (end - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Serves `data`, then fails every read after it.
pub struct Failing {
    data: Trickle,
    kind: io::ErrorKind,
}

impl Failing {
    pub fn new<D: Into<Vec<u8>>>(data: D, step: usize, kind: io::ErrorKind) -> Self {
        Failing {
            data: Trickle::new(data, step),
            kind,
        }
    }
}

impl Read for Failing {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(self.kind, "injected failure")),
            n => Ok(n),
        }
    }
}

/// Counts calls made to the wrapped reader.
pub struct Counting<R> {
    inner: R,
    calls: Rc<Cell<usize>>,
}

impl<R> Counting<R> {
    pub fn new(inner: R) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Counting {
                inner,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl<R: Read> Read for Counting<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.calls.set(self.calls.get() + 1);
        self.inner.read(buf)
    }
}

/// Fails once with `Interrupted` before every successful read.
pub struct Interrupting<R> {
    inner: R,
    interrupt: bool,
}

impl<R> Interrupting<R> {
    pub fn new(inner: R) -> Self {
        Interrupting {
            inner,
            interrupt: true,
        }
    }
}

impl<R: Read> Read for Interrupting<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt {
            self.interrupt = false;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        self.interrupt = true;
        self.inner.read(buf)
    }
}
