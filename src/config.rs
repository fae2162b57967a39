use std::env;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Bytes requested from the raw read primitive per call.
pub const BUFFER_SIZE: usize = 4096;

/// Number of descriptors the keyed registry tracks at once.
pub const MAX_DESCRIPTORS: usize = 1024;

pub const BUFFER_SIZE_VAR: &str = "CHUNKLINE_BUFFER_SIZE";
pub const MAX_DESCRIPTORS_VAR: &str = "CHUNKLINE_MAX_DESCRIPTORS";
pub const SINGLE_SLOT_VAR: &str = "CHUNKLINE_SINGLE_SLOT";

/// How buffered state is associated with descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    /// One independent entry per descriptor in `0..max_descriptors`.
    Keyed,
    /// A single entry shared by every descriptor. Switching descriptors
    /// before the previous one is drained mixes their buffered bytes.
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub buffer_size: usize,
    pub max_descriptors: usize,
    pub mode: SlotMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            buffer_size: BUFFER_SIZE,
            max_descriptors: MAX_DESCRIPTORS,
            mode: SlotMode::Keyed,
        }
    }
}

impl Config {
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn max_descriptors(mut self, max_descriptors: usize) -> Self {
        self.max_descriptors = max_descriptors;
        self
    }

    pub fn single_slot(mut self) -> Self {
        self.mode = SlotMode::Single;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfiguration(
                "buffer size must be greater than zero".into(),
            ));
        }
        if self.mode == SlotMode::Keyed && self.max_descriptors == 0 {
            return Err(Error::InvalidConfiguration(
                "descriptor capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Starts from the defaults and applies any `CHUNKLINE_*` overrides
    /// present in the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(raw) = lookup(BUFFER_SIZE_VAR) {
            config.buffer_size = parse_var(BUFFER_SIZE_VAR, &raw)?;
        }
        if let Some(raw) = lookup(MAX_DESCRIPTORS_VAR) {
            config.max_descriptors = parse_var(MAX_DESCRIPTORS_VAR, &raw)?;
        }
        if let Some(raw) = lookup(SINGLE_SLOT_VAR) {
            if parse_var::<bool>(SINGLE_SLOT_VAR, &raw)? {
                config.mode = SlotMode::Single;
            }
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidConfiguration(format!("{}={:?} is not valid", key, raw)))
}
