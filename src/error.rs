use std::io;

use thiserror::Error;

use crate::raw::Fd;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("descriptor {fd} is outside the supported range 0..{capacity}")]
    InvalidDescriptor { fd: Fd, capacity: usize },
    #[error("read from descriptor {fd} failed: {source}")]
    ReadFailure {
        fd: Fd,
        #[source]
        source: io::Error,
    },
    #[error("failed to allocate {requested} bytes")]
    Allocation { requested: usize },
    #[error("failed to write line: {0}")]
    Output(#[source] io::Error),
}

impl Error {
    pub fn is_read_failure(&self) -> bool {
        match self {
            Error::ReadFailure { .. } => true,
            _ => false,
        }
    }
}
