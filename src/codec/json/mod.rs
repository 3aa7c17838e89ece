//! Frame ⇄ JSON codec
//!
//! A frame document has two independently optional sections:
//!
//! ```json
//! {
//!   "schema": {"name": "cpu", "refId": "A", "meta": {...},
//!              "fields": [{"name": "v", "type": "number",
//!                          "typeInfo": {"frame": "float64", "nullable": true},
//!                          "labels": {...}, "config": {...}}]},
//!   "data": {"fields": [[1.5, null, null]],
//!            "entities": [{"NaN": [1], "Inf": [2]}]}
//! }
//! ```
//!
//! JSON has no NaN or infinity, so those float values are written as `null`
//! and their row indexes recorded in the field's `entities` entry. Times are
//! epoch milliseconds; sub-millisecond precision does not survive.

mod cache;
mod decode;
mod encode;
mod pool;

pub use cache::FrameJsonCache;
pub use pool::{BufferPool, PooledBuffer};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

use super::telemetry;
use crate::frame::{Frame, Frames};
use crate::{Error, Result};

const FORMAT: &str = "json";

/// Which sections of a frame document to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameInclude {
    #[default]
    All,
    SchemaOnly,
    DataOnly,
}

impl FrameInclude {
    pub fn includes_schema(&self) -> bool {
        matches!(self, FrameInclude::All | FrameInclude::SchemaOnly)
    }

    pub fn includes_data(&self) -> bool {
        matches!(self, FrameInclude::All | FrameInclude::DataOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameInclude::All => "all",
            FrameInclude::SchemaOnly => "schema",
            FrameInclude::DataOnly => "data",
        }
    }
}

impl fmt::Display for FrameInclude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameInclude {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "both" => Ok(FrameInclude::All),
            "schema" => Ok(FrameInclude::SchemaOnly),
            "data" => Ok(FrameInclude::DataOnly),
            other => Err(Error::Config(format!(
                "unknown frame include '{}'. Use 'all', 'schema' or 'data'",
                other
            ))),
        }
    }
}

/// Row indexes of the non-finite values of one float field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct FieldEntities {
    #[serde(rename = "NaN", default, skip_serializing_if = "Vec::is_empty")]
    nan: Vec<usize>,
    #[serde(rename = "Inf", default, skip_serializing_if = "Vec::is_empty")]
    inf: Vec<usize>,
    #[serde(rename = "NegInf", default, skip_serializing_if = "Vec::is_empty")]
    neg_inf: Vec<usize>,
}

impl FieldEntities {
    fn is_empty(&self) -> bool {
        self.nan.is_empty() && self.inf.is_empty() && self.neg_inf.is_empty()
    }
}

/// Encode a frame using the process-wide buffer pool.
pub fn encode(frame: &Frame, include: FrameInclude) -> Result<Bytes> {
    encode_with_pool(frame, include, BufferPool::global())
}

pub fn encode_with_pool(frame: &Frame, include: FrameInclude, pool: &BufferPool) -> Result<Bytes> {
    let start = Instant::now();
    let mut buf = pool.lease();
    let result = encode::write_frame(&mut buf, frame, include).map(|()| Bytes::copy_from_slice(&buf));
    record_encode(&result, start);
    if let Ok(bytes) = &result {
        debug!(
            frame = %frame.name,
            include = include.as_str(),
            bytes = bytes.len(),
            "Encoded frame to json"
        );
    }
    result
}

/// Encode frames as a JSON array of frame documents.
pub fn encode_frames(frames: &[Frame], include: FrameInclude) -> Result<Bytes> {
    let start = Instant::now();
    let mut buf = BufferPool::global().lease();
    let result = encode::write_frames(&mut buf, frames, include)
        .map(|()| Bytes::copy_from_slice(&buf));
    record_encode(&result, start);
    result
}

fn record_encode(result: &Result<Bytes>, start: Instant) {
    match result {
        Ok(bytes) => {
            telemetry::record_encode(FORMAT, bytes.len() as u64, start.elapsed().as_secs_f64())
        }
        Err(_) => telemetry::record_failure(FORMAT, "encode"),
    }
}

/// Decode a frame document. Either section may be absent.
pub fn decode(bytes: &[u8]) -> Result<Frame> {
    let start = Instant::now();
    let result = decode::decode_frame(bytes);
    match &result {
        Ok(frame) => {
            debug!(
                frame = %frame.name,
                fields = frame.fields.len(),
                bytes = bytes.len(),
                "Decoded frame from json"
            );
            telemetry::record_decode(FORMAT, bytes.len() as u64, start.elapsed().as_secs_f64());
        }
        Err(_) => telemetry::record_failure(FORMAT, "decode"),
    }
    result
}

/// Decode a JSON array of frame documents.
pub fn decode_frames(bytes: &[u8]) -> Result<Frames> {
    let start = Instant::now();
    let result = decode::decode_frames(bytes);
    match &result {
        Ok(_) => {
            telemetry::record_decode(FORMAT, bytes.len() as u64, start.elapsed().as_secs_f64())
        }
        Err(_) => telemetry::record_failure(FORMAT, "decode"),
    }
    result
}

/// Replace the values of `frame` with the `data` section of `bytes`.
///
/// The frame supplies the field types. On error the frame is unchanged.
pub fn decode_data_into(frame: &mut Frame, bytes: &[u8]) -> Result<()> {
    let result = decode::decode_data_into(frame, bytes);
    if result.is_err() {
        telemetry::record_failure(FORMAT, "decode");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Field, Labels};

    #[test]
    fn test_frame_include_parse() {
        assert_eq!("schema".parse::<FrameInclude>().unwrap(), FrameInclude::SchemaOnly);
        assert_eq!("DATA".parse::<FrameInclude>().unwrap(), FrameInclude::DataOnly);
        assert_eq!("all".parse::<FrameInclude>().unwrap(), FrameInclude::All);
        assert!("rows".parse::<FrameInclude>().is_err());
        assert!(FrameInclude::All.includes_schema() && FrameInclude::All.includes_data());
        assert!(!FrameInclude::SchemaOnly.includes_data());
    }

    #[test]
    fn test_modes_select_sections() {
        let frame = Frame::new("f", vec![Field::new("v", Labels::new(), vec![1i32])]);
        let pool = BufferPool::new(1, 64);

        let schema: serde_json::Value =
            serde_json::from_slice(&encode_with_pool(&frame, FrameInclude::SchemaOnly, &pool).unwrap())
                .unwrap();
        assert!(schema.get("schema").is_some());
        assert!(schema.get("data").is_none());

        let data: serde_json::Value =
            serde_json::from_slice(&encode_with_pool(&frame, FrameInclude::DataOnly, &pool).unwrap())
                .unwrap();
        assert!(data.get("schema").is_none());
        assert_eq!(data["data"]["fields"][0][0], 1);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_frames_array() {
        let frames = vec![
            Frame::new("a", vec![Field::new("v", Labels::new(), vec![1.0f64])]),
            Frame::new("b", vec![Field::new("v", Labels::new(), vec![true])]),
        ];
        let bytes = encode_frames(&frames, FrameInclude::All).unwrap();
        let decoded = decode_frames(&bytes).unwrap();
        assert_eq!(decoded, frames);
    }
}
