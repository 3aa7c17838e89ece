//! Input conversion for loosely typed sources
//!
//! Row-oriented sources (SQL drivers, CSV readers, plugin payloads) hand over
//! cells as [`Value`]s whose types rarely match the frame we want. A
//! [`FieldConverter`] pairs a target [`FieldType`] with a conversion
//! function; a [`FrameInputConverter`] owns one converter per field and
//! fills a pre-sized [`Frame`] cell by cell.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::frame::{Field, Frame, Labels};
use crate::schema::FieldType;
use crate::vector::Value;
use crate::{Error, Result};

/// Conversion function applied to every incoming cell of one field.
pub type ConverterFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Target type of a field plus the function producing values of that type.
#[derive(Clone)]
pub struct FieldConverter {
    pub output_type: FieldType,
    pub converter: ConverterFn,
}

impl fmt::Debug for FieldConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConverter")
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

impl FieldConverter {
    pub fn new<F>(output_type: FieldType, converter: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            output_type,
            converter: Arc::new(converter),
        }
    }

    /// Passes values through unchanged.
    pub fn identity(output_type: FieldType) -> Self {
        Self::new(output_type, Ok)
    }

    pub fn convert(&self, value: Value) -> Result<Value> {
        (self.converter)(value)
    }

    /// Parses strings as `f64`; empty strings become null.
    pub fn string_to_float64() -> Self {
        Self::new(FieldType::NullableFloat64, |value| {
            string_input(value, "float64", |s| {
                s.parse::<f64>()
                    .map(Value::Float64)
                    .map_err(|e| Error::Conversion(format!("'{}' is not a float64: {}", s, e)))
            })
        })
    }

    /// Parses strings as `i64`; empty strings become null.
    pub fn string_to_int64() -> Self {
        Self::new(FieldType::NullableInt64, |value| {
            string_input(value, "int64", |s| {
                s.parse::<i64>()
                    .map(Value::Int64)
                    .map_err(|e| Error::Conversion(format!("'{}' is not an int64: {}", s, e)))
            })
        })
    }

    /// Accepts `true`/`false`, `1`/`0`, `yes`/`no` in any case.
    pub fn string_to_bool() -> Self {
        Self::new(FieldType::NullableBool, |value| {
            string_input(value, "bool", |s| match s.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(Error::Conversion(format!("'{}' is not a bool", s))),
            })
        })
    }

    /// Parses RFC 3339 timestamps into UTC.
    pub fn string_to_time() -> Self {
        Self::new(FieldType::NullableTime, |value| {
            string_input(value, "time", |s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|t| Value::Time(t.with_timezone(&Utc)))
                    .map_err(|e| Error::Conversion(format!("'{}' is not an RFC 3339 time: {}", s, e)))
            })
        })
    }

    /// Widens any integer or float to `f64`.
    pub fn numeric_to_float64() -> Self {
        Self::new(FieldType::NullableFloat64, |value| match value {
            Value::Null => Ok(Value::Null),
            other => other.as_f64().map(Value::Float64).ok_or_else(|| {
                Error::Conversion(format!("expected a number, got {}", other.type_name()))
            }),
        })
    }

    /// Renders any value with its display form.
    pub fn any_to_string() -> Self {
        Self::new(FieldType::NullableString, |value| match value {
            Value::Null => Ok(Value::Null),
            Value::String(s) => Ok(Value::String(s)),
            other => Ok(Value::String(other.to_string())),
        })
    }
}

fn string_input<F>(value: Value, target: &str, parse: F) -> Result<Value>
where
    F: FnOnce(&str) -> Result<Value>,
{
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(Value::Null)
            } else {
                parse(trimmed)
            }
        }
        other => Err(Error::Conversion(format!(
            "cannot convert {} to {}, expected a string",
            other.type_name(),
            target
        ))),
    }
}

/// Builds a frame of a fixed row count from per-field converters.
#[derive(Debug)]
pub struct FrameInputConverter {
    converters: Vec<FieldConverter>,
    frame: Frame,
}

impl FrameInputConverter {
    /// One field per converter, each pre-sized to `row_len` zero values.
    pub fn new(converters: Vec<FieldConverter>, row_len: usize) -> Self {
        let fields = converters
            .iter()
            .map(|c| Field::with_type("", c.output_type, row_len))
            .collect();
        debug!(fields = converters.len(), rows = row_len, "Created input converter");
        Self {
            converters,
            frame: Frame::new("", fields),
        }
    }

    /// Converts `value` with the field's converter and stores it.
    pub fn set(&mut self, field_idx: usize, row_idx: usize, value: Value) -> Result<()> {
        let converter = self.converters.get(field_idx).ok_or(Error::IndexOutOfRange {
            index: field_idx,
            len: self.converters.len(),
        })?;
        let converted = converter.convert(value).map_err(|err| match err {
            Error::Conversion(msg) => {
                Error::Conversion(format!("field {} row {}: {}", field_idx, row_idx, msg))
            }
            other => other.at_field(field_idx),
        })?;
        self.frame.set(field_idx, row_idx, converted)
    }

    /// Stores `value` as-is, bypassing the field's converter.
    pub fn set_raw(&mut self, field_idx: usize, row_idx: usize, value: Value) -> Result<()> {
        self.frame.set(field_idx, row_idx, value)
    }

    /// Names the fields in order; the count must match.
    pub fn set_field_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if names.len() != self.frame.fields.len() {
            return Err(Error::FieldCountMismatch {
                expected: self.frame.fields.len(),
                actual: names.len(),
            });
        }
        for (field, name) in self.frame.fields.iter_mut().zip(names) {
            field.name = name.as_ref().to_string();
        }
        Ok(())
    }

    pub fn set_field_labels(&mut self, field_idx: usize, labels: Labels) -> Result<()> {
        self.frame.field_mut(field_idx)?.labels = labels;
        Ok(())
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_string_converters() {
        let f = FieldConverter::string_to_float64();
        assert_eq!(f.convert(Value::from(" 2.5 ")).unwrap(), Value::Float64(2.5));
        assert_eq!(f.convert(Value::from("")).unwrap(), Value::Null);
        assert!(matches!(f.convert(Value::from("abc")), Err(Error::Conversion(_))));
        assert!(matches!(f.convert(Value::Int64(1)), Err(Error::Conversion(_))));

        let i = FieldConverter::string_to_int64();
        assert_eq!(i.convert(Value::from("-42")).unwrap(), Value::Int64(-42));
        assert!(i.convert(Value::from("4.2")).is_err());

        let b = FieldConverter::string_to_bool();
        assert_eq!(b.convert(Value::from("YES")).unwrap(), Value::Bool(true));
        assert_eq!(b.convert(Value::from("0")).unwrap(), Value::Bool(false));
        assert!(b.convert(Value::from("maybe")).is_err());

        let t = FieldConverter::string_to_time();
        assert_eq!(
            t.convert(Value::from("2024-01-02T03:04:05+01:00")).unwrap(),
            Value::Time(Utc.with_ymd_and_hms(2024, 1, 2, 2, 4, 5).unwrap())
        );
    }

    #[test]
    fn test_numeric_and_string_converters() {
        let n = FieldConverter::numeric_to_float64();
        assert_eq!(n.convert(Value::UInt8(7)).unwrap(), Value::Float64(7.0));
        assert_eq!(n.convert(Value::Null).unwrap(), Value::Null);
        assert!(n.convert(Value::Bool(true)).is_err());

        let s = FieldConverter::any_to_string();
        assert_eq!(s.convert(Value::Int32(12)).unwrap(), Value::from("12"));
        assert_eq!(s.convert(Value::Bool(false)).unwrap(), Value::from("false"));
    }

    #[test]
    fn test_frame_input_converter() {
        let mut input = FrameInputConverter::new(
            vec![
                FieldConverter::string_to_time(),
                FieldConverter::string_to_float64(),
                FieldConverter::identity(FieldType::String),
            ],
            2,
        );
        input.set_field_names(&["time", "value", "host"]).unwrap();
        input.set(0, 0, Value::from("2024-01-01T00:00:00Z")).unwrap();
        input.set(0, 1, Value::from("2024-01-01T00:01:00Z")).unwrap();
        input.set(1, 0, Value::from("1.5")).unwrap();
        input.set(1, 1, Value::from("")).unwrap();
        input.set(2, 0, Value::from("a")).unwrap();
        input.set(2, 1, Value::from("b")).unwrap();

        let frame = input.into_frame();
        assert_eq!(frame.row_len().unwrap(), 2);
        assert_eq!(
            frame.type_info(),
            vec![FieldType::NullableTime, FieldType::NullableFloat64, FieldType::String]
        );
        assert_eq!(frame.at(1, 0).unwrap(), Value::Float64(1.5));
        assert_eq!(frame.at(1, 1).unwrap(), Value::Null);
        assert_eq!(frame.fields[2].name, "host");
    }

    #[test]
    fn test_frame_input_converter_errors() {
        let mut input = FrameInputConverter::new(vec![FieldConverter::string_to_int64()], 1);
        let err = input.set(0, 0, Value::from("x")).unwrap_err();
        assert!(err.to_string().contains("field 0 row 0"));
        assert!(matches!(
            input.set(3, 0, Value::from("1")),
            Err(Error::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(input.set(0, 5, Value::from("1")).is_err());
        assert!(matches!(
            input.set_field_names(&["a", "b"]),
            Err(Error::FieldCountMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_identity_keeps_type_checks() {
        let mut input = FrameInputConverter::new(vec![FieldConverter::identity(FieldType::Int64)], 1);
        assert!(matches!(
            input.set(0, 0, Value::from("nope")),
            Err(Error::TypeMismatch { field_index: Some(0), .. })
        ));
    }
}
