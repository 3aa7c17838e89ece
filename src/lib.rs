//! # tsframe
//!
//! Columnar data frames for time-series query results.
//!
//! A [`Frame`] is an ordered list of equal-length, typed [`Field`]s plus
//! frame-level metadata. Frames are the unit that query backends hand to
//! transport and presentation layers, so the crate focuses on moving them
//! around faithfully.
//!
//! ## Key Features
//!
//! - **Typed vectors**: 15 element types, each nullable or not, behind one
//!   closed [`AnyVector`] enum
//! - **Arrow IPC codec**: exact round trip of every field type and all
//!   frame/field metadata
//! - **JSON codec**: schema/data sections, NaN and infinities carried in a
//!   side table, reusable encode buffers and a warm per-frame cache
//! - **Pivots**: long ↔ wide time-series reshaping with fill policies
//!
//! ## Layout
//!
//! - [`vector`]: element storage and the dynamic [`Value`]
//! - [`frame`]: fields, frames, labels, display config, CSV export
//! - [`codec`]: Arrow IPC and JSON wire formats
//! - [`transform`]: long/wide pivots
//! - [`convert`]: per-field converters for loosely typed input

pub mod codec;
pub mod config;
pub mod convert;
pub mod frame;
pub mod schema;
pub mod telemetry;
pub mod transform;
pub mod vector;

mod error;

pub use error::{Error, Result};
pub use frame::{Field, FieldConfig, Frame, FrameMeta, Frames, Labels};
pub use schema::FieldType;
pub use vector::{AnyVector, Value, Vector};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::codec::json::{FrameInclude, FrameJsonCache};
    pub use crate::config::{ArrowFormat, CodecConfig};
    pub use crate::convert::{FieldConverter, FrameInputConverter};
    pub use crate::frame::{
        Field, FieldConfig, Frame, FrameMeta, FrameType, Frames, Labels, TimeSeriesKind,
    };
    pub use crate::schema::{CoarseType, FieldType};
    pub use crate::transform::{long_to_wide, wide_to_long, FillMissing};
    pub use crate::vector::{AnyVector, Element, RawJson, Value, Vector};
    pub use crate::{Error, Result};
}
