//! Streaming JSON encoder
//!
//! Writes straight into a byte buffer, one column at a time, using
//! `serde_json` for individual tokens.

use serde::Serialize;

use super::{FieldEntities, FrameInclude};
use crate::frame::Frame;
use crate::vector::{AnyVector, RawJson};
use crate::Result;

/// Comma bookkeeping for one JSON object.
struct ObjectWriter<'a> {
    buf: &'a mut Vec<u8>,
    empty: bool,
}

impl<'a> ObjectWriter<'a> {
    fn begin(buf: &'a mut Vec<u8>) -> Self {
        buf.push(b'{');
        Self { buf, empty: true }
    }

    /// Write `"key":` and return the buffer for the value.
    fn key(&mut self, key: &str) -> Result<&mut Vec<u8>> {
        if !self.empty {
            self.buf.push(b',');
        }
        self.empty = false;
        serde_json::to_writer(&mut *self.buf, key)?;
        self.buf.push(b':');
        Ok(&mut *self.buf)
    }

    fn entry<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let buf = self.key(key)?;
        serde_json::to_writer(buf, value)?;
        Ok(())
    }

    fn end(self) {
        self.buf.push(b'}');
    }
}

pub(super) fn write_frame(buf: &mut Vec<u8>, frame: &Frame, include: FrameInclude) -> Result<()> {
    let mut doc = ObjectWriter::begin(buf);
    if include.includes_schema() {
        write_schema(doc.key("schema")?, frame)?;
    }
    if include.includes_data() {
        write_data(doc.key("data")?, frame)?;
    }
    doc.end();
    Ok(())
}

pub(super) fn write_frames(buf: &mut Vec<u8>, frames: &[Frame], include: FrameInclude) -> Result<()> {
    buf.push(b'[');
    for (i, frame) in frames.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        write_frame(buf, frame, include)?;
    }
    buf.push(b']');
    Ok(())
}

/// The `schema` section object.
pub(super) fn write_schema(buf: &mut Vec<u8>, frame: &Frame) -> Result<()> {
    let mut schema = ObjectWriter::begin(buf);
    if !frame.name.is_empty() {
        schema.entry("name", &frame.name)?;
    }
    if !frame.ref_id.is_empty() {
        schema.entry("refId", &frame.ref_id)?;
    }
    if let Some(meta) = &frame.meta {
        schema.entry("meta", meta)?;
    }

    let buf = schema.key("fields")?;
    buf.push(b'[');
    for (i, field) in frame.fields.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        let field_type = field.field_type();
        let mut out = ObjectWriter::begin(buf);
        if !field.name.is_empty() {
            out.entry("name", &field.name)?;
        }
        out.entry("type", field_type.coarse_type().as_str())?;

        let mut type_info = ObjectWriter::begin(out.key("typeInfo")?);
        type_info.entry("frame", field_type.non_nullable_type().as_str())?;
        if field_type.is_nullable() {
            type_info.entry("nullable", &true)?;
        }
        type_info.end();

        if !field.labels.is_empty() {
            out.entry("labels", &field.labels)?;
        }
        if let Some(config) = &field.config {
            out.entry("config", config)?;
        }
        out.end();
    }
    buf.push(b']');
    schema.end();
    Ok(())
}

/// The `data` section object.
pub(super) fn write_data(buf: &mut Vec<u8>, frame: &Frame) -> Result<()> {
    if !frame.fields.is_empty() {
        frame.row_len()?;
    }

    let mut entities = Vec::with_capacity(frame.fields.len());
    let mut data = ObjectWriter::begin(buf);

    let buf = data.key("fields")?;
    buf.push(b'[');
    for (i, field) in frame.fields.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        let mut field_entities = FieldEntities::default();
        write_column(buf, field.vector(), &mut field_entities)?;
        entities.push(field_entities);
    }
    buf.push(b']');

    if entities.iter().any(|e| !e.is_empty()) {
        let entities: Vec<Option<&FieldEntities>> = entities
            .iter()
            .map(|e| if e.is_empty() { None } else { Some(e) })
            .collect();
        data.entry("entities", &entities)?;
    }
    data.end();
    Ok(())
}

fn write_column(buf: &mut Vec<u8>, vector: &AnyVector, entities: &mut FieldEntities) -> Result<()> {
    match vector {
        AnyVector::Int8(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableInt8(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::Int16(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableInt16(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::Int32(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableInt32(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::Int64(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableInt64(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::UInt8(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableUInt8(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::UInt16(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableUInt16(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::UInt32(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableUInt32(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::UInt64(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableUInt64(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::String(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableString(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::Bool(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::NullableBool(v) => serde_json::to_writer(&mut *buf, v.as_slice())?,
        AnyVector::Float32(v) => write_floats(buf, v.iter().copied().map(Some), entities)?,
        AnyVector::NullableFloat32(v) => write_floats(buf, v.iter().copied(), entities)?,
        AnyVector::Float64(v) => write_floats(buf, v.iter().copied().map(Some), entities)?,
        AnyVector::NullableFloat64(v) => write_floats(buf, v.iter().copied(), entities)?,
        AnyVector::Time(v) => write_mapped(buf, v.iter().map(|t| t.timestamp_millis()))?,
        AnyVector::NullableTime(v) => {
            write_mapped(buf, v.iter().map(|t| t.map(|t| t.timestamp_millis())))?
        }
        AnyVector::Enum(v) => write_mapped(buf, v.iter().map(|e| e.0))?,
        AnyVector::NullableEnum(v) => write_mapped(buf, v.iter().map(|e| e.map(|e| e.0)))?,
        AnyVector::Json(v) => write_raw(buf, v.iter().map(Some)),
        AnyVector::NullableJson(v) => write_raw(buf, v.iter().map(Option::as_ref)),
    }
    Ok(())
}

fn write_mapped<I>(buf: &mut Vec<u8>, values: I) -> Result<()>
where
    I: Iterator,
    I::Item: Serialize,
{
    buf.push(b'[');
    for (row, value) in values.enumerate() {
        if row > 0 {
            buf.push(b',');
        }
        serde_json::to_writer(&mut *buf, &value)?;
    }
    buf.push(b']');
    Ok(())
}

/// Embed raw JSON documents verbatim.
fn write_raw<'a, I>(buf: &mut Vec<u8>, values: I)
where
    I: Iterator<Item = Option<&'a RawJson>>,
{
    buf.push(b'[');
    for (row, value) in values.enumerate() {
        if row > 0 {
            buf.push(b',');
        }
        match value {
            Some(json) => buf.extend_from_slice(json.as_bytes()),
            None => buf.extend_from_slice(b"null"),
        }
    }
    buf.push(b']');
}

/// Finite floats are written as numbers; NaN and infinities as `null` with
/// the row recorded in `entities`.
fn write_floats<F, I>(buf: &mut Vec<u8>, values: I, entities: &mut FieldEntities) -> Result<()>
where
    F: Copy + Into<f64> + Serialize,
    I: Iterator<Item = Option<F>>,
{
    buf.push(b'[');
    for (row, value) in values.enumerate() {
        if row > 0 {
            buf.push(b',');
        }
        let Some(value) = value else {
            buf.extend_from_slice(b"null");
            continue;
        };
        let wide: f64 = value.into();
        if wide.is_finite() {
            serde_json::to_writer(&mut *buf, &value)?;
            continue;
        }
        if wide.is_nan() {
            entities.nan.push(row);
        } else if wide.is_sign_positive() {
            entities.inf.push(row);
        } else {
            entities.neg_inf.push(row);
        }
        buf.extend_from_slice(b"null");
    }
    buf.push(b']');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Field, Labels};
    use crate::vector::EnumItemIndex;
    use chrono::DateTime;

    fn encode_str(frame: &Frame, include: FrameInclude) -> String {
        let mut buf = Vec::new();
        write_frame(&mut buf, frame, include).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_non_finite_floats_use_entities() {
        let frame = Frame::new(
            "",
            vec![Field::new(
                "v",
                Labels::new(),
                vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1.5],
            )],
        );
        assert_eq!(
            encode_str(&frame, FrameInclude::DataOnly),
            r#"{"data":{"fields":[[null,null,null,1.5]],"entities":[{"NaN":[0],"Inf":[1],"NegInf":[2]}]}}"#
        );
    }

    #[test]
    fn test_schema_section() {
        let frame = Frame::new(
            "cpu",
            vec![
                Field::new("time", Labels::new(), vec![DateTime::from_timestamp_millis(5).unwrap()]),
                Field::new("v", Labels::from([("host", "a")]), vec![Some(1u8)]),
            ],
        )
        .with_ref_id("A");
        assert_eq!(
            encode_str(&frame, FrameInclude::SchemaOnly),
            concat!(
                r#"{"schema":{"name":"cpu","refId":"A","fields":["#,
                r#"{"name":"time","type":"time","typeInfo":{"frame":"time"}},"#,
                r#"{"name":"v","type":"number","typeInfo":{"frame":"uint8","nullable":true},"labels":{"host":"a"}}"#,
                r#"]}}"#
            )
        );
    }

    #[test]
    fn test_column_encodings() {
        let frame = Frame::new(
            "",
            vec![
                Field::new("t", Labels::new(), vec![Some(DateTime::from_timestamp_nanos(1_500_999_999)), None]),
                Field::new("e", Labels::new(), vec![EnumItemIndex(3), EnumItemIndex(0)]),
                Field::new(
                    "j",
                    Labels::new(),
                    vec![Some(RawJson::parse(&b"{\"a\":[1,2]}"[..]).unwrap()), None],
                ),
                Field::new("s", Labels::new(), vec!["a\"b".to_string(), "日本".to_string()]),
                Field::new("f", Labels::new(), vec![Some(0.25f32), None]),
            ],
        );
        assert_eq!(
            encode_str(&frame, FrameInclude::DataOnly),
            r#"{"data":{"fields":[[1500,null],[3,0],[{"a":[1,2]},null],["a\"b","日本"],[0.25,null]]}}"#
        );
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let mut frame = Frame::new(
            "",
            vec![
                Field::new("a", Labels::new(), vec![1i64]),
                Field::new("b", Labels::new(), vec![1i64]),
            ],
        );
        frame.fields[1].extend(1);
        let mut buf = Vec::new();
        assert!(write_frame(&mut buf, &frame, FrameInclude::All).is_err());
        // schema alone does not need equal lengths
        buf.clear();
        assert!(write_frame(&mut buf, &frame, FrameInclude::SchemaOnly).is_ok());
    }
}
