//! Codec configuration from defaults or environment

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Arrow IPC layout written by the binary codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrowFormat {
    /// IPC file layout, framed by the `ARROW1` magic
    #[default]
    File,
    /// IPC stream layout
    Stream,
}

impl ArrowFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrowFormat::File => "file",
            ArrowFormat::Stream => "stream",
        }
    }
}

impl fmt::Display for ArrowFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrowFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(ArrowFormat::File),
            "stream" => Ok(ArrowFormat::Stream),
            other => Err(Error::Config(format!(
                "unknown arrow format '{}'. Use 'file' or 'stream'",
                other
            ))),
        }
    }
}

/// Settings shared by the binary and JSON codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub arrow_format: ArrowFormat,
    /// Maximum number of idle JSON encode buffers kept by a pool
    pub json_pool_size: usize,
    /// Initial capacity of a freshly allocated JSON encode buffer
    pub json_buffer_capacity: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            arrow_format: ArrowFormat::File,
            json_pool_size: 16,
            json_buffer_capacity: 8 * 1024,
        }
    }
}

impl CodecConfig {
    /// Create codec config from environment
    ///
    /// Environment variables:
    /// - TSFRAME_ARROW_FORMAT: "file" (default) or "stream"
    /// - TSFRAME_JSON_POOL_SIZE: idle JSON buffers kept per pool (default: 16)
    /// - TSFRAME_JSON_BUFFER_CAPACITY: initial JSON buffer bytes (default: 8192)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let arrow_format = match std::env::var("TSFRAME_ARROW_FORMAT") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.arrow_format,
        };
        let json_pool_size = parse_usize("TSFRAME_JSON_POOL_SIZE", defaults.json_pool_size)?;
        let json_buffer_capacity =
            parse_usize("TSFRAME_JSON_BUFFER_CAPACITY", defaults.json_buffer_capacity)?;

        info!(
            "Codec config: arrow_format={}, json_pool_size={}, json_buffer_capacity={}",
            arrow_format, json_pool_size, json_buffer_capacity
        );

        Ok(Self {
            arrow_format,
            json_pool_size,
            json_buffer_capacity,
        })
    }

    pub fn with_arrow_format(mut self, format: ArrowFormat) -> Self {
        self.arrow_format = format;
        self
    }
}

fn parse_usize(name: &str, default: usize) -> Result<usize> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    raw.trim().parse::<usize>().map_err(|e| {
        Error::Config(format!(
            "{name} must be a non-negative integer, got '{raw}': {e}"
        ))
    })
}
