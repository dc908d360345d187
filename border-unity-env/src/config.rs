//! Configuration of [`BatchDecoder`](crate::BatchDecoder).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`BatchDecoder`](crate::BatchDecoder).
///
/// Numeric-safety checks are always applied and cannot be configured.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct BatchDecoderConfig {
    /// Assembles observation slots in parallel.
    ///
    /// Takes effect only when the crate is built with the `rayon` feature.
    pub parallel: bool,

    /// Decodes every compressed visual observation into a single channel.
    ///
    /// If `false`, single-channel decoding is used only for slots declaring one channel.
    pub grayscale_visual: bool,
}

impl Default for BatchDecoderConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            grayscale_visual: false,
        }
    }
}

impl BatchDecoderConfig {
    /// Sets parallel assembly of observation slots.
    pub fn parallel(mut self, v: bool) -> Self {
        self.parallel = v;
        self
    }

    /// Sets single-channel decoding of compressed visual observations.
    pub fn grayscale_visual(mut self, v: bool) -> Self {
        self.grayscale_visual = v;
        self
    }

    /// Constructs [`BatchDecoderConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`BatchDecoderConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
