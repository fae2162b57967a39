//! Line-at-a-time reading from raw descriptors.
//!
//! [`LineReader`] keeps whatever a read returned past the end of a line and
//! hands it out on the next call for the same descriptor. Bytes are stored
//! in per-read chunks and copied exactly once, into the line that contains
//! them, so small reads never cause quadratic copying.

#[macro_use]
extern crate log;

pub mod chunk;
pub mod config;
pub mod error;
pub mod raw;
pub mod registry;
pub mod sources;

#[cfg(test)]
mod testing;

pub use crate::config::{Config, SlotMode, BUFFER_SIZE, MAX_DESCRIPTORS};
pub use crate::error::{Error, Result};
#[cfg(unix)]
pub use crate::raw::FdReader;
pub use crate::raw::{Fd, RawRead, Single, StreamTable};
pub use crate::registry::{LineReader, Lines, Stats, StreamState};
pub use crate::sources::console::Source as ConsoleSource;
pub use crate::sources::ReaderSource;
