//! Frames: ordered sets of equal-length fields
//!
//! A [`Frame`] owns its [`Field`]s. Fields are built standalone and moved
//! in; all mutation happens in place on the field vectors. Every row-wise
//! operation first checks [`Frame::row_len`], the invariant that all fields
//! have the same length.

mod config;
mod csv;
mod field;
mod labels;
mod meta;
mod timeseries;

pub use config::{DataLink, EnumFieldConfig, FieldConfig, FieldTypeConfig};
pub use csv::CsvOptions;
pub use field::Field;
pub use labels::Labels;
pub use meta::{FrameMeta, FrameType, Notice, NoticeSeverity, QueryStat, Warning};
pub use timeseries::{TimeSeriesKind, TimeSeriesSchema};

use crate::schema::FieldType;
use crate::vector::Value;
use crate::{Error, Result};

/// A list of frames, as returned by one query.
pub type Frames = Vec<Frame>;

/// Ordered list of equal-length fields plus frame-level metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
    /// Identifier of the query that produced this frame
    pub ref_id: String,
    pub meta: Option<FrameMeta>,
    pub warnings: Vec<Warning>,
}

impl Frame {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            ..Default::default()
        }
    }

    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = ref_id.into();
        self
    }

    pub fn with_meta(mut self, meta: FrameMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn set_meta(&mut self, meta: FrameMeta) {
        self.meta = Some(meta);
    }

    /// Append notices to the frame's metadata, creating it if needed.
    pub fn append_notices(&mut self, notices: impl IntoIterator<Item = Notice>) {
        self.meta
            .get_or_insert_with(FrameMeta::default)
            .notices
            .extend(notices);
    }

    pub fn append_warning(&mut self, message: impl Into<String>, details: Option<String>) {
        self.warnings.push(Warning {
            message: message.into(),
            details,
        });
    }

    /// Number of rows.
    ///
    /// Fails when the frame has no fields or when any field's length differs
    /// from the first field's; the error names the offending field index.
    pub fn row_len(&self) -> Result<usize> {
        let first = self.fields.first().ok_or(Error::NoFields)?;
        let expected = first.len();
        for (field_index, field) in self.fields.iter().enumerate().skip(1) {
            if field.len() != expected {
                return Err(Error::FieldLengthMismatch {
                    field_index,
                    expected,
                    actual: field.len(),
                });
            }
        }
        Ok(expected)
    }

    pub fn field(&self, field_idx: usize) -> Result<&Field> {
        self.fields.get(field_idx).ok_or(Error::IndexOutOfRange {
            index: field_idx,
            len: self.fields.len(),
        })
    }

    pub fn field_mut(&mut self, field_idx: usize) -> Result<&mut Field> {
        let len = self.fields.len();
        self.fields.get_mut(field_idx).ok_or(Error::IndexOutOfRange {
            index: field_idx,
            len,
        })
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_index_by_name(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Indices of fields whose type is one of `types`.
    pub fn type_indices(&self, types: &[FieldType]) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| types.contains(&f.field_type()))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn type_info(&self) -> Vec<FieldType> {
        self.fields.iter().map(Field::field_type).collect()
    }

    pub fn time_series_schema(&self) -> TimeSeriesSchema {
        TimeSeriesSchema::of(self)
    }

    pub fn at(&self, field_idx: usize, row_idx: usize) -> Result<Value> {
        self.field(field_idx)?.at(row_idx)
    }

    pub fn copy_at(&self, field_idx: usize, row_idx: usize) -> Result<Value> {
        self.field(field_idx)?.copy_at(row_idx)
    }

    pub fn concrete_at(&self, field_idx: usize, row_idx: usize) -> Result<Option<Value>> {
        self.field(field_idx)?.concrete_at(row_idx)
    }

    pub fn set(&mut self, field_idx: usize, row_idx: usize, value: Value) -> Result<()> {
        self.field_mut(field_idx)?
            .set(row_idx, value)
            .map_err(|e| e.at_field(field_idx))
    }

    /// Validate a full row against the field types without mutating.
    fn check_row(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.fields.len() {
            return Err(Error::FieldCountMismatch {
                expected: self.fields.len(),
                actual: values.len(),
            });
        }
        for (i, (field, value)) in self.fields.iter().zip(values).enumerate() {
            field.vector().check(value).map_err(|e| e.at_field(i))?;
        }
        Ok(())
    }

    /// Append one value per field.
    ///
    /// Every value is checked for count, nullability and type before any
    /// field is touched, so a rejected row leaves the frame unchanged.
    pub fn append_row(&mut self, values: Vec<Value>) -> Result<()> {
        self.check_row(&values)?;
        for (i, (field, value)) in self.fields.iter_mut().zip(values).enumerate() {
            field.append(value).map_err(|e| e.at_field(i))?;
        }
        Ok(())
    }

    /// Caller-guaranteed-valid `append_row`. Panics on a count or type
    /// violation, possibly after some fields were appended to.
    pub fn append_row_unchecked(&mut self, values: Vec<Value>) {
        assert_eq!(
            values.len(),
            self.fields.len(),
            "append_row_unchecked: value count must match field count"
        );
        for (field, value) in self.fields.iter_mut().zip(values) {
            field.vector_mut().append_unchecked(value);
        }
    }

    /// Insert a row before `row_idx`; `row_idx == row_len` appends.
    pub fn insert_row(&mut self, row_idx: usize, values: Vec<Value>) -> Result<()> {
        let len = self.row_len()?;
        if row_idx > len {
            return Err(Error::IndexOutOfRange {
                index: row_idx,
                len,
            });
        }
        self.check_row(&values)?;
        for (i, (field, value)) in self.fields.iter_mut().zip(values).enumerate() {
            field.insert(row_idx, value).map_err(|e| e.at_field(i))?;
        }
        Ok(())
    }

    /// Overwrite every field at `row_idx`.
    pub fn set_row(&mut self, row_idx: usize, values: Vec<Value>) -> Result<()> {
        let len = self.row_len()?;
        if row_idx >= len {
            return Err(Error::IndexOutOfRange {
                index: row_idx,
                len,
            });
        }
        self.check_row(&values)?;
        for (i, (field, value)) in self.fields.iter_mut().zip(values).enumerate() {
            field.set(row_idx, value).map_err(|e| e.at_field(i))?;
        }
        Ok(())
    }

    pub fn delete_row(&mut self, row_idx: usize) -> Result<()> {
        let len = self.row_len()?;
        if row_idx >= len {
            return Err(Error::IndexOutOfRange {
                index: row_idx,
                len,
            });
        }
        for field in &mut self.fields {
            field.delete(row_idx)?;
        }
        Ok(())
    }

    /// Deep copy of one row, one value per field.
    pub fn row_copy(&self, row_idx: usize) -> Result<Vec<Value>> {
        self.fields.iter().map(|f| f.copy_at(row_idx)).collect()
    }

    /// Grow every field by `n` zero values.
    pub fn extend(&mut self, n: usize) {
        for field in &mut self.fields {
            field.extend(n);
        }
    }

    /// Same name, ref id and fields (name, labels, type) with zero rows.
    /// Config, meta and warnings are not copied.
    pub fn empty_copy(&self) -> Frame {
        Frame {
            name: self.name.clone(),
            fields: self.fields.iter().map(Field::empty_copy).collect(),
            ref_id: self.ref_id.clone(),
            meta: None,
            warnings: Vec::new(),
        }
    }

    /// New frame with the rows for which `predicate` holds on field `field_idx`.
    ///
    /// The predicate sees the decoded value ([`Value::Null`] for empty
    /// nullable slots). An error from the predicate aborts the filter.
    pub fn filter_rows_by_field<F>(&self, field_idx: usize, mut predicate: F) -> Result<Frame>
    where
        F: FnMut(&Value) -> Result<bool>,
    {
        let row_len = self.row_len()?;
        let source = self.field(field_idx)?;
        let mut filtered = self.empty_copy();

        for row in 0..row_len {
            if !predicate(&source.at(row)?)? {
                continue;
            }
            for (dst, src) in filtered.fields.iter_mut().zip(&self.fields) {
                dst.vector_mut().append_from(src.vector(), row)?;
            }
        }
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new(
            "sample",
            vec![
                Field::new("id", Labels::new(), vec![1i64, 2, 3]),
                Field::new("name", Labels::new(), vec![Some("a".to_string()), None, Some("c".to_string())]),
                Field::new("value", Labels::from([("unit", "ms")]), vec![0.5f64, 1.5, 2.5]),
            ],
        )
        .with_ref_id("A")
    }

    #[test]
    fn test_row_len() {
        assert_eq!(sample().row_len().unwrap(), 3);
        assert!(matches!(Frame::default().row_len(), Err(Error::NoFields)));
    }

    #[test]
    fn test_row_len_mismatch_names_field() {
        let mut frame = sample();
        frame.fields[2].append(Value::Float64(9.0)).unwrap();
        match frame.row_len() {
            Err(Error::FieldLengthMismatch {
                field_index,
                expected,
                actual,
            }) => {
                assert_eq!(field_index, 2);
                assert_eq!(expected, 3);
                assert_eq!(actual, 4);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_append_row_is_all_or_nothing() {
        let mut frame = sample();
        let before = frame.clone();

        let err = frame
            .append_row(vec![Value::Int64(4), Value::Null, Value::from("oops")])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                field_index: Some(2),
                ..
            }
        ));
        assert_eq!(frame, before);

        let err = frame
            .append_row(vec![Value::Null, Value::Null, Value::Float64(1.0)])
            .unwrap_err();
        assert!(matches!(err, Error::NullNotAllowed { field_index: Some(0), .. }));
        assert_eq!(frame, before);

        assert!(matches!(
            frame.append_row(vec![Value::Int64(4)]),
            Err(Error::FieldCountMismatch { expected: 3, actual: 1 })
        ));
        assert_eq!(frame, before);

        frame
            .append_row(vec![Value::Int64(4), Value::Null, Value::Float64(3.5)])
            .unwrap();
        assert_eq!(frame.row_len().unwrap(), 4);
        assert_eq!(frame.at(1, 3).unwrap(), Value::Null);
    }

    #[test]
    #[should_panic(expected = "append_unchecked")]
    fn test_append_row_unchecked_panics() {
        let mut frame = sample();
        frame.append_row_unchecked(vec![Value::from("x"), Value::Null, Value::Float64(0.0)]);
    }

    #[test]
    fn test_cell_access() {
        let mut frame = sample();
        assert_eq!(frame.concrete_at(1, 1).unwrap(), None);
        assert_eq!(frame.copy_at(1, 2).unwrap(), Value::from("c"));
        frame.set(0, 0, Value::Int64(10)).unwrap();
        assert_eq!(frame.at(0, 0).unwrap(), Value::Int64(10));
        assert!(matches!(frame.at(5, 0), Err(Error::IndexOutOfRange { index: 5, len: 3 })));
        assert!(matches!(frame.at(0, 5), Err(Error::IndexOutOfRange { index: 5, len: 3 })));
        assert!(matches!(
            frame.set(0, 0, Value::Int32(1)),
            Err(Error::TypeMismatch { field_index: Some(0), .. })
        ));
    }

    #[test]
    fn test_row_mutations() {
        let mut frame = sample();
        frame
            .insert_row(0, vec![Value::Int64(0), Value::from("z"), Value::Float64(0.0)])
            .unwrap();
        assert_eq!(frame.row_copy(0).unwrap()[1], Value::from("z"));
        frame.delete_row(1).unwrap();
        assert_eq!(frame.at(0, 1).unwrap(), Value::Int64(2));
        frame
            .set_row(0, vec![Value::Int64(7), Value::Null, Value::Float64(7.0)])
            .unwrap();
        assert_eq!(frame.at(2, 0).unwrap(), Value::Float64(7.0));
        assert!(frame.delete_row(10).is_err());
        frame.extend(2);
        assert_eq!(frame.row_len().unwrap(), 5);
    }

    #[test]
    fn test_empty_copy() {
        let mut frame = sample();
        frame.append_warning("partial", None);
        frame.set_meta(FrameMeta::default());
        frame.fields[2].set_config(FieldConfig::new().with_unit("ms"));

        let copy = frame.empty_copy();
        assert_eq!(copy.row_len().unwrap(), 0);
        assert_eq!(copy.ref_id, "A");
        assert_eq!(copy.fields[2].labels, frame.fields[2].labels);
        assert!(copy.fields[2].config.is_none());
        assert!(copy.meta.is_none());
        assert!(copy.warnings.is_empty());
        assert_eq!(copy.type_info(), frame.type_info());
    }

    #[test]
    fn test_filter_rows_by_field() {
        let frame = sample();
        let filtered = frame
            .filter_rows_by_field(1, |v| Ok(!v.is_null()))
            .unwrap();
        assert_eq!(filtered.row_len().unwrap(), 2);
        assert_eq!(filtered.at(0, 1).unwrap(), Value::Int64(3));

        let err = frame.filter_rows_by_field(0, |v| match v {
            Value::Int64(2) => Err(Error::Conversion("boom".to_string())),
            _ => Ok(true),
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_lookup_helpers() {
        let mut frame = sample();
        assert_eq!(frame.field_index_by_name("value"), Some(2));
        assert!(frame.field_by_name("missing").is_none());
        assert_eq!(frame.type_indices(&[FieldType::Float64, FieldType::Int64]), vec![0, 2]);
        frame.append_notices([Notice::new(NoticeSeverity::Info, "hello")]);
        assert_eq!(frame.meta.unwrap().notices.len(), 1);
    }
}
