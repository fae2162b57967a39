//! Per-descriptor line state and the public entry point.

use std::io;

use crate::chunk::{Chunk, ChunkChain, Position};
use crate::config::{Config, SlotMode};
use crate::error::{Error, Result};
use crate::raw::{Fd, RawRead};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Further reads are allowed. The chain may or may not hold data.
    Active,
    /// End of stream seen; buffered bytes are still being handed out.
    Draining,
    /// Nothing more will be read or returned.
    Terminal,
}

/// Running totals across every descriptor a reader has served.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Successful calls to the raw read primitive, EOF included.
    pub reads: u64,
    pub bytes_read: u64,
    /// Bytes copied from chunks into returned lines.
    pub bytes_copied: u64,
    pub lines: u64,
}

#[derive(Debug)]
struct Entry {
    chain: ChunkChain,
    state: StreamState,
}

impl Entry {
    fn new() -> Self {
        Entry {
            chain: ChunkChain::new(),
            state: StreamState::Active,
        }
    }

    fn next_line<S: RawRead>(
        &mut self,
        source: &mut S,
        fd: Fd,
        buffer_size: usize,
        stats: &mut Stats,
    ) -> Result<Option<Vec<u8>>> {
        if self.state == StreamState::Terminal {
            return Ok(None);
        }

        let found = match self.chain.find_delimiter() {
            Some(pos) => Some(pos),
            None if self.state == StreamState::Active => {
                self.fill(source, fd, buffer_size, stats)?
            }
            None => None,
        };

        let line = match found {
            Some(pos) => self.chain.extract_up_to(pos)?,
            None if self.chain.has_data() => self.chain.drain()?,
            None => {
                self.finish(fd);
                return Ok(None);
            }
        };
        if self.state == StreamState::Draining && !self.chain.has_data() {
            self.finish(fd);
        }

        stats.bytes_copied += line.len() as u64;
        stats.lines += 1;
        Ok(Some(line))
    }

    /// Reads until a delimiter shows up or the stream ends.
    fn fill<S: RawRead>(
        &mut self,
        source: &mut S,
        fd: Fd,
        buffer_size: usize,
        stats: &mut Stats,
    ) -> Result<Option<Position>> {
        loop {
            let mut buf = Chunk::buffer(buffer_size)?;
            let n = match source.read(fd, &mut buf) {
                Ok(n) if n > buf.len() => {
                    return Err(self.fail(
                        fd,
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("read reported {} bytes into a {} byte buffer", n, buf.len()),
                        ),
                    ));
                }
                Ok(n) => n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.fail(fd, e)),
            };
            stats.reads += 1;

            if n == 0 {
                debug!(
                    "descriptor {} reached end of stream with {} bytes buffered",
                    fd,
                    self.chain.buffered()
                );
                self.state = StreamState::Draining;
                return Ok(None);
            }

            trace!("read {} bytes from descriptor {}", n, fd);
            stats.bytes_read += n as u64;
            self.chain.append(Chunk::filled(buf, n));
            if let Some(pos) = self.chain.find_delimiter() {
                return Ok(Some(pos));
            }
        }
    }

    fn fail(&mut self, fd: Fd, source: io::Error) -> Error {
        warn!(
            "read from descriptor {} failed, discarding {} buffered bytes: {}",
            fd,
            self.chain.buffered(),
            source
        );
        self.teardown();
        Error::ReadFailure { fd, source }
    }

    fn finish(&mut self, fd: Fd) {
        debug!("descriptor {} exhausted", fd);
        self.teardown();
    }

    fn teardown(&mut self) {
        self.chain = ChunkChain::new();
        self.state = StreamState::Terminal;
    }
}

#[derive(Debug)]
enum Slots {
    // grown on demand, never past `capacity`
    Keyed {
        table: Vec<Option<Entry>>,
        capacity: usize,
    },
    Single {
        owner: Option<Fd>,
        entry: Option<Entry>,
    },
}

impl Slots {
    fn new(config: &Config) -> Self {
        match config.mode {
            SlotMode::Keyed => Slots::Keyed {
                table: Vec::new(),
                capacity: config.max_descriptors,
            },
            SlotMode::Single => Slots::Single {
                owner: None,
                entry: None,
            },
        }
    }

    fn index(capacity: usize, fd: Fd) -> Result<usize> {
        if fd < 0 || fd as usize >= capacity {
            return Err(Error::InvalidDescriptor { fd, capacity });
        }
        Ok(fd as usize)
    }

    fn get(&self, fd: Fd) -> Result<Option<&Entry>> {
        match self {
            Slots::Keyed { table, capacity } => {
                let idx = Self::index(*capacity, fd)?;
                Ok(table.get(idx).and_then(Option::as_ref))
            }
            Slots::Single { owner, entry } => Ok(match *owner {
                Some(current) if current == fd => entry.as_ref(),
                _ => None,
            }),
        }
    }

    fn slot(&mut self, fd: Fd) -> Result<&mut Option<Entry>> {
        match self {
            Slots::Keyed { table, capacity } => {
                let idx = Self::index(*capacity, fd)?;
                if idx >= table.len() {
                    table.resize_with(idx + 1, || None);
                }
                Ok(&mut table[idx])
            }
            Slots::Single { owner, entry } => {
                if *owner != Some(fd) {
                    if let Some(prev) = entry.as_ref() {
                        if prev.state == StreamState::Terminal {
                            *entry = None;
                        } else if prev.chain.has_data() {
                            warn!(
                                "single slot switched from descriptor {:?} to {} with {} bytes still buffered",
                                owner,
                                fd,
                                prev.chain.buffered()
                            );
                        }
                    }
                    *owner = Some(fd);
                }
                Ok(entry)
            }
        }
    }

    fn release(&mut self, fd: Fd) -> Result<bool> {
        match self {
            Slots::Keyed { table, capacity } => {
                let idx = Self::index(*capacity, fd)?;
                Ok(table.get_mut(idx).and_then(Option::take).is_some())
            }
            Slots::Single { owner, entry } => {
                if *owner != Some(fd) {
                    return Ok(false);
                }
                *owner = None;
                Ok(entry.take().is_some())
            }
        }
    }
}

/// Hands out one line per call for any number of descriptors, keeping
/// over-read bytes between calls.
///
/// ```
/// use std::io::Cursor;
/// use chunkline::{LineReader, StreamTable};
///
/// let mut table = StreamTable::new();
/// table.insert(0, Cursor::new(b"ab\ncde".to_vec()));
/// let mut reader = LineReader::new(table);
///
/// assert_eq!(reader.next_line(0).unwrap(), Some(b"ab\n".to_vec()));
/// assert_eq!(reader.next_line(0).unwrap(), Some(b"cde".to_vec()));
/// assert_eq!(reader.next_line(0).unwrap(), None);
/// ```
#[derive(Debug)]
pub struct LineReader<S> {
    source: S,
    config: Config,
    slots: Slots,
    stats: Stats,
}

impl<S: RawRead> LineReader<S> {
    pub fn new(source: S) -> Self {
        let config = Config::default();
        let slots = Slots::new(&config);
        LineReader {
            source,
            config,
            slots,
            stats: Stats::default(),
        }
    }

    pub fn with_config(source: S, config: Config) -> Result<Self> {
        config.validate()?;
        let slots = Slots::new(&config);
        Ok(LineReader {
            source,
            config,
            slots,
            stats: Stats::default(),
        })
    }

    /// Returns the next line of `fd`, delimiter included when the stream has
    /// one, or `Ok(None)` once the stream is exhausted.
    ///
    /// A read failure discards everything buffered for `fd`; later calls
    /// return `Ok(None)` without touching the source again.
    pub fn next_line(&mut self, fd: Fd) -> Result<Option<Vec<u8>>> {
        let buffer_size = self.config.buffer_size;
        let entry = self.slots.slot(fd)?.get_or_insert_with(|| {
            debug!("tracking descriptor {}", fd);
            Entry::new()
        });
        entry.next_line(&mut self.source, fd, buffer_size, &mut self.stats)
    }

    /// Iterates the remaining lines of `fd`.
    pub fn lines(&mut self, fd: Fd) -> Lines<S> {
        Lines { reader: self, fd }
    }

    /// `None` if `fd` has not been read yet (or was released).
    pub fn state(&self, fd: Fd) -> Result<Option<StreamState>> {
        Ok(self.slots.get(fd)?.map(|entry| entry.state))
    }

    pub fn buffered(&self, fd: Fd) -> Result<usize> {
        Ok(self
            .slots
            .get(fd)?
            .map_or(0, |entry| entry.chain.buffered()))
    }

    /// Forgets everything tracked for `fd` so the descriptor number can be
    /// read from scratch. Returns whether anything was tracked.
    pub fn release(&mut self, fd: Fd) -> Result<bool> {
        let released = self.slots.release(fd)?;
        if released {
            debug!("released descriptor {}", fd);
        }
        Ok(released)
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

pub struct Lines<'a, S> {
    reader: &'a mut LineReader<S>,
    fd: Fd,
}

impl<'a, S: RawRead> Iterator for Lines<'a, S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_line(self.fd).transpose()
    }
}
