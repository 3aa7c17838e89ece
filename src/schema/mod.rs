//! Field type registry and type mapping
//!
//! Every element a frame can carry is described by a [`FieldType`]: the
//! element kind plus whether the vector is nullable. Both wire codecs, the
//! row validation in [`Frame`](crate::Frame) and the SQL adapter mapping go
//! through this table.

mod field_type;
mod sql;

pub use field_type::{CoarseType, FieldType};
pub use sql::{sql_field_type, ScanType};
