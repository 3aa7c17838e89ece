//! Frame reshaping transforms

pub mod pivot;

pub use pivot::{long_to_wide, wide_to_long, FillMissing};
