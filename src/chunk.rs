//! Look-ahead storage for one descriptor.
//!
//! Every underlying read lands in its own [`Chunk`]. Chunks are never grown
//! or re-copied: a line is assembled by copying the relevant slices of the
//! chain into one exactly-sized buffer, so each byte is copied out once no
//! matter how small the reads were.

use std::collections::VecDeque;

use bytes::Bytes;
use memchr::memchr;

use crate::error::{Error, Result};

pub const DELIMITER: u8 = b'\n';

/// Bytes produced by a single read plus a cursor over what is still unread.
#[derive(Debug)]
pub struct Chunk {
    data: Bytes,
    consumed: usize,
}

impl Chunk {
    pub fn new(data: Bytes) -> Self {
        Chunk { data, consumed: 0 }
    }

    /// Allocates a zeroed read buffer of `capacity` bytes, failing instead
    /// of aborting when the memory is not available.
    pub fn buffer(capacity: usize) -> Result<Vec<u8>> {
        let mut buf = alloc(capacity)?;
        buf.resize(capacity, 0);
        Ok(buf)
    }

    /// Wraps the first `n` bytes of a buffer a read just filled.
    pub fn filled(mut buf: Vec<u8>, n: usize) -> Self {
        buf.truncate(n);
        Chunk::new(Bytes::from(buf))
    }

    pub fn filled_len(&self) -> usize {
        self.data.len()
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn unconsumed(&self) -> &[u8] {
        &self.data[self.consumed..]
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.consumed
    }

    fn is_spent(&self) -> bool {
        self.consumed == self.data.len()
    }
}

/// Location of a delimiter: chunk index in the chain and byte index within
/// that chunk's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub chunk: usize,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct ChunkChain {
    chunks: VecDeque<Chunk>,
    // leading chunks already known to hold no delimiter
    scanned: usize,
    buffered: usize,
}

impl ChunkChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, chunk: Chunk) {
        if chunk.remaining() == 0 {
            return;
        }
        self.buffered += chunk.remaining();
        self.chunks.push_back(chunk);
    }

    pub fn has_data(&self) -> bool {
        !self.chunks.is_empty()
    }

    /// Unconsumed bytes held across all chunks.
    pub fn buffered(&self) -> usize {
        self.buffered
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn find_delimiter(&mut self) -> Option<Position> {
        while self.scanned < self.chunks.len() {
            let chunk = &self.chunks[self.scanned];
            if let Some(at) = memchr(DELIMITER, chunk.unconsumed()) {
                return Some(Position {
                    chunk: self.scanned,
                    index: chunk.consumed + at,
                });
            }
            self.scanned += 1;
        }
        None
    }

    /// Copies everything from the head through `pos` inclusive into a new
    /// line and drops the bytes from the chain.
    ///
    /// On allocation failure the chain is left exactly as it was.
    pub fn extract_up_to(&mut self, pos: Position) -> Result<Vec<u8>> {
        let boundary = &self.chunks[pos.chunk];
        debug_assert!(pos.index >= boundary.consumed && pos.index < boundary.filled_len());

        let head: usize = self
            .chunks
            .iter()
            .take(pos.chunk)
            .map(Chunk::remaining)
            .sum();
        let len = head + (pos.index + 1 - boundary.consumed);
        let mut line = alloc(len)?;

        for chunk in self.chunks.drain(..pos.chunk) {
            line.extend_from_slice(chunk.unconsumed());
        }
        let boundary = &mut self.chunks[0];
        line.extend_from_slice(&boundary.data[boundary.consumed..=pos.index]);
        boundary.consumed = pos.index + 1;
        if boundary.is_spent() {
            self.chunks.pop_front();
        }

        self.buffered -= len;
        self.scanned = 0;
        Ok(line)
    }

    /// Copies out and drops everything still buffered.
    pub fn drain(&mut self) -> Result<Vec<u8>> {
        let mut line = alloc(self.buffered)?;
        for chunk in self.chunks.drain(..) {
            line.extend_from_slice(chunk.unconsumed());
        }
        self.buffered = 0;
        self.scanned = 0;
        Ok(line)
    }
}

fn alloc(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { requested: len })?;
    Ok(buf)
}
