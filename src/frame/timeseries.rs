//! Time series shape detection

use super::Frame;

/// Shape of a frame as a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSeriesKind {
    /// Not a time series frame
    Not,
    /// Time field, value fields and string factor fields; several rows per timestamp
    Long,
    /// Time field and value fields only; series identity lives in labels
    Wide,
}

/// Field roles of a frame viewed as a time series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesSchema {
    pub kind: TimeSeriesKind,
    pub time_index: Option<usize>,
    pub time_is_nullable: bool,
    pub factor_indices: Vec<usize>,
    pub value_indices: Vec<usize>,
}

impl TimeSeriesSchema {
    /// Classify the fields of `frame`.
    ///
    /// The first time field is the time index. String fields are factors,
    /// numeric and bool fields are values. Any other field (a second time
    /// field, JSON, enum) makes the frame `Not` a time series.
    pub fn of(frame: &Frame) -> Self {
        let mut schema = TimeSeriesSchema {
            kind: TimeSeriesKind::Not,
            time_index: None,
            time_is_nullable: false,
            factor_indices: Vec::new(),
            value_indices: Vec::new(),
        };

        for (i, field) in frame.fields.iter().enumerate() {
            let ft = field.field_type();
            if ft.is_time() && schema.time_index.is_none() {
                schema.time_index = Some(i);
                schema.time_is_nullable = ft.is_nullable();
            } else if ft.is_string() {
                schema.factor_indices.push(i);
            } else if ft.is_numeric() || ft.is_bool() {
                schema.value_indices.push(i);
            } else {
                return schema;
            }
        }

        if schema.time_index.is_none() || schema.value_indices.is_empty() {
            return schema;
        }
        schema.kind = if schema.factor_indices.is_empty() {
            TimeSeriesKind::Wide
        } else {
            TimeSeriesKind::Long
        };
        schema
    }
}
