//! Wire codecs for frames
//!
//! - [`arrow`]: Arrow IPC, exact round trip of every field type
//! - [`json`]: JSON with a side table for NaN and infinities

pub mod arrow;
pub mod json;
pub(crate) mod telemetry;
