//! Configuration for the memory target and program loading.
//!
//! This module defines the configuration structures used to build a
//! [`MemoryTarget`](crate::soc::memory::MemoryTarget). It provides:
//! 1. **Defaults:** Baseline constants (memory size, access latency, bus width).
//! 2. **Structures:** `Config` with a `memory` section and an optional `image` section.
//!
//! Configuration is read from JSON with [`Config::from_json`]; every field has a
//! default, so `{}` is a valid configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::sim::loader::ImageFormat;

/// Default configuration constants.
mod defaults {
    /// Memory capacity in 32-bit words.
    pub const SIZE_WORDS: usize = 1024;

    /// Latency reported for every timed transaction, in simulation time units.
    pub const LATENCY: u64 = 10;

    /// Widest single timed transfer, in bytes.
    pub const BUS_WIDTH: usize = 4;

    /// Whether initiators may bypass transactions with direct-access grants.
    pub const DIRECT_ACCESS: bool = true;
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use rvtlm_core::config::Config;
/// use rvtlm_core::sim::loader::ImageFormat;
///
/// let json = r#"{
///     "memory": { "size_words": 2048, "latency": 20 },
///     "image": { "path": "program.hex", "format": "intel_hex" }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.memory.size_words, 2048);
/// assert_eq!(config.memory.bus_width, 4);
/// assert_eq!(config.image.unwrap().format, ImageFormat::IntelHex);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Memory target configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Program image preloaded into memory, if any
    #[serde(default)]
    pub image: Option<ImageConfig>,
}

impl Config {
    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON or mistyped fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Memory target parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemoryConfig {
    /// Capacity in 32-bit words
    #[serde(default = "MemoryConfig::default_size_words")]
    pub size_words: usize,

    /// Fixed latency of a timed transaction
    #[serde(default = "MemoryConfig::default_latency")]
    pub latency: u64,

    /// Largest timed transfer in bytes
    #[serde(default = "MemoryConfig::default_bus_width")]
    pub bus_width: usize,

    /// Grant direct access on request
    #[serde(default = "MemoryConfig::default_direct_access")]
    pub direct_access: bool,
}

impl MemoryConfig {
    /// Capacity in bytes, `None` if it does not fit in `usize`.
    pub const fn size_bytes(&self) -> Option<usize> {
        self.size_words.checked_mul(4)
    }

    const fn default_size_words() -> usize {
        defaults::SIZE_WORDS
    }

    const fn default_latency() -> u64 {
        defaults::LATENCY
    }

    const fn default_bus_width() -> usize {
        defaults::BUS_WIDTH
    }

    const fn default_direct_access() -> bool {
        defaults::DIRECT_ACCESS
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_words: defaults::SIZE_WORDS,
            latency: defaults::LATENCY,
            bus_width: defaults::BUS_WIDTH,
            direct_access: defaults::DIRECT_ACCESS,
        }
    }
}

/// Program image to preload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageConfig {
    /// Path of the image file
    pub path: PathBuf,

    /// Record format of the file
    #[serde(default)]
    pub format: ImageFormat,
}
