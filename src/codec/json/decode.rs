//! JSON decoder
//!
//! The document is parsed whole, then each column is converted against its
//! field type. Nothing is written to the output frame until every column
//! converted and the column lengths agree.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::FieldEntities;
use crate::frame::{Field, FieldConfig, Frame, FrameMeta, Frames, Labels};
use crate::schema::{CoarseType, FieldType};
use crate::vector::{AnyVector, EnumItemIndex, RawJson, Value};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct FrameDoc {
    #[serde(default)]
    schema: Option<SchemaDoc>,
    #[serde(default)]
    data: Option<DataDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaDoc {
    #[serde(default)]
    name: String,
    #[serde(default)]
    ref_id: String,
    #[serde(default)]
    meta: Option<FrameMeta>,
    #[serde(default)]
    fields: Vec<FieldDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldDoc {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    coarse_type: Option<String>,
    #[serde(default)]
    type_info: Option<TypeInfoDoc>,
    #[serde(default)]
    labels: Option<Labels>,
    #[serde(default)]
    config: Option<FieldConfig>,
}

#[derive(Debug, Deserialize)]
struct TypeInfoDoc {
    frame: String,
    #[serde(default)]
    nullable: bool,
}

#[derive(Debug, Deserialize)]
struct DataDoc {
    #[serde(default, alias = "values")]
    fields: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    entities: Vec<Option<FieldEntities>>,
}

pub(super) fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    build_frame(frame_doc(serde_json::from_slice(bytes)?)?)
}

pub(super) fn decode_frames(bytes: &[u8]) -> Result<Frames> {
    let docs: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    docs.into_iter()
        .map(|doc| frame_doc(doc).and_then(build_frame))
        .collect()
}

pub(super) fn decode_data_into(frame: &mut Frame, bytes: &[u8]) -> Result<()> {
    let doc = frame_doc(serde_json::from_slice(bytes)?)?;
    let data = doc
        .data
        .ok_or_else(|| Error::Json("payload has no data section".to_string()))?;
    let vectors = read_data(&frame.type_info(), data)?;
    for (field, vector) in frame.fields.iter_mut().zip(vectors) {
        *field.vector_mut() = vector;
    }
    Ok(())
}

/// A frame document and its sections must be JSON objects. Derived
/// `Deserialize` would also take arrays, filling fields by position.
fn frame_doc(value: serde_json::Value) -> Result<FrameDoc> {
    let serde_json::Value::Object(doc) = &value else {
        return Err(Error::Json(format!(
            "frame document must be a JSON object, got {}",
            json_kind(&value)
        )));
    };
    for section in ["schema", "data"] {
        match doc.get(section) {
            None | Some(serde_json::Value::Null) | Some(serde_json::Value::Object(_)) => {}
            Some(other) => {
                return Err(Error::Json(format!(
                    "'{}' section must be a JSON object, got {}",
                    section,
                    json_kind(other)
                )))
            }
        }
    }
    Ok(serde_json::from_value(value)?)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a bool",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn build_frame(doc: FrameDoc) -> Result<Frame> {
    let mut frame = Frame::default();
    if let Some(schema) = doc.schema {
        frame.name = schema.name;
        frame.ref_id = schema.ref_id;
        frame.meta = schema.meta;
        for (i, field) in schema.fields.into_iter().enumerate() {
            let field_type = resolve_type(i, &field)?;
            let mut out = Field::with_type(field.name, field_type, 0)
                .with_labels(field.labels.unwrap_or_default());
            if let Some(config) = field.config {
                out.set_config(config);
            }
            frame.fields.push(out);
        }
    }

    if let Some(data) = doc.data {
        if frame.fields.is_empty() {
            frame.fields = data
                .fields
                .iter()
                .map(|column| Field::with_type("", infer_type(column), 0))
                .collect();
        }
        let vectors = read_data(&frame.type_info(), data)?;
        for (field, vector) in frame.fields.iter_mut().zip(vectors) {
            *field.vector_mut() = vector;
        }
    }
    Ok(frame)
}

/// Exact type from `typeInfo`, else the nullable default of the coarse type.
fn resolve_type(field_index: usize, field: &FieldDoc) -> Result<FieldType> {
    if let Some(info) = &field.type_info {
        let field_type: FieldType = info.frame.parse()?;
        return Ok(if info.nullable || field_type.is_nullable() {
            field_type.nullable_type()
        } else {
            field_type
        });
    }
    let coarse: CoarseType = field
        .coarse_type
        .as_deref()
        .unwrap_or("other")
        .parse()
        .map_err(|e| Error::Json(format!("field {}: {}", field_index, e)))?;
    Ok(coarse.default_field_type())
}

/// Type for a data-only column: from the first non-null value.
fn infer_type(column: &[serde_json::Value]) -> FieldType {
    let first = column.iter().find(|v| !v.is_null());
    match first {
        Some(serde_json::Value::Bool(_)) => FieldType::NullableBool,
        Some(serde_json::Value::String(_)) => FieldType::NullableString,
        Some(serde_json::Value::Array(_)) | Some(serde_json::Value::Object(_)) => {
            FieldType::NullableJson
        }
        _ => FieldType::NullableFloat64,
    }
}

fn read_data(types: &[FieldType], data: DataDoc) -> Result<Vec<AnyVector>> {
    if data.fields.len() != types.len() {
        return Err(Error::FieldCountMismatch {
            expected: types.len(),
            actual: data.fields.len(),
        });
    }
    if data.entities.len() > types.len() {
        return Err(Error::Json(format!(
            "{} entity entries for {} fields",
            data.entities.len(),
            types.len()
        )));
    }

    let mut entities = data.entities.into_iter();
    let mut vectors = Vec::with_capacity(types.len());
    for (i, (field_type, column)) in types.iter().zip(data.fields).enumerate() {
        let field_entities = entities.next().flatten();
        vectors.push(read_column(i, *field_type, column, field_entities)?);
    }

    if let Some(first) = vectors.first() {
        let expected = first.len();
        for (field_index, vector) in vectors.iter().enumerate().skip(1) {
            if vector.len() != expected {
                return Err(Error::FieldLengthMismatch {
                    field_index,
                    expected,
                    actual: vector.len(),
                });
            }
        }
    }
    Ok(vectors)
}

fn read_column(
    field_index: usize,
    field_type: FieldType,
    column: Vec<serde_json::Value>,
    entities: Option<FieldEntities>,
) -> Result<AnyVector> {
    let mut values = column
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            json_to_value(field_type, v).map_err(|v| {
                Error::Json(format!(
                    "field {} row {}: expected {} value, got {}",
                    field_index, row, field_type, v
                ))
            })
        })
        .collect::<Result<Vec<Value>>>()?;

    if let Some(entities) = entities {
        if !entities.is_empty() && !field_type.is_float() {
            return Err(Error::Json(format!(
                "field {}: entities on non-float field of type {}",
                field_index, field_type
            )));
        }
        apply_entities(field_index, field_type, &mut values, &entities.nan, f64::NAN)?;
        apply_entities(field_index, field_type, &mut values, &entities.inf, f64::INFINITY)?;
        apply_entities(
            field_index,
            field_type,
            &mut values,
            &entities.neg_inf,
            f64::NEG_INFINITY,
        )?;
    }

    let mut vector = AnyVector::new(field_type, 0);
    vector.reserve(values.len());
    for value in values {
        vector.append(value).map_err(|e| e.at_field(field_index))?;
    }
    Ok(vector)
}

fn apply_entities(
    field_index: usize,
    field_type: FieldType,
    values: &mut [Value],
    rows: &[usize],
    replacement: f64,
) -> Result<()> {
    let len = values.len();
    for &row in rows {
        let slot = values.get_mut(row).ok_or_else(|| {
            Error::Json(format!(
                "field {}: entity row {} out of range for {} rows",
                field_index, row, len
            ))
        })?;
        *slot = if field_type.non_nullable_type() == FieldType::Float32 {
            Value::Float32(replacement as f32)
        } else {
            Value::Float64(replacement)
        };
    }
    Ok(())
}

/// Convert one JSON cell, handing it back when it does not fit the type.
fn json_to_value(
    field_type: FieldType,
    v: serde_json::Value,
) -> std::result::Result<Value, serde_json::Value> {
    let base = field_type.non_nullable_type();
    if v.is_null() {
        return Ok(if base == FieldType::Json && !field_type.is_nullable() {
            Value::Json(RawJson::null())
        } else {
            Value::Null
        });
    }

    let converted = match base {
        FieldType::Int8 => signed(&v).map(Value::Int8),
        FieldType::Int16 => signed(&v).map(Value::Int16),
        FieldType::Int32 => signed(&v).map(Value::Int32),
        FieldType::Int64 => v.as_i64().map(Value::Int64),
        FieldType::UInt8 => unsigned(&v).map(Value::UInt8),
        FieldType::UInt16 => unsigned(&v).map(Value::UInt16),
        FieldType::UInt32 => unsigned(&v).map(Value::UInt32),
        FieldType::UInt64 => v.as_u64().map(Value::UInt64),
        FieldType::Float32 => v.as_f64().map(|f| Value::Float32(f as f32)),
        FieldType::Float64 => v.as_f64().map(Value::Float64),
        FieldType::Bool => v.as_bool().map(Value::Bool),
        FieldType::Time => time(&v).map(Value::Time),
        FieldType::Json => Some(Value::Json(RawJson::from_value(&v))),
        FieldType::Enum => unsigned(&v).map(|i| Value::Enum(EnumItemIndex(i))),
        FieldType::String => match v {
            serde_json::Value::String(s) => return Ok(Value::String(s)),
            other => return Err(other),
        },
        _ => None,
    };
    converted.ok_or(v)
}

fn signed<T: TryFrom<i64>>(v: &serde_json::Value) -> Option<T> {
    v.as_i64().and_then(|n| T::try_from(n).ok())
}

fn unsigned<T: TryFrom<u64>>(v: &serde_json::Value) -> Option<T> {
    v.as_u64().and_then(|n| T::try_from(n).ok())
}

/// Epoch milliseconds, or an RFC 3339 string.
fn time(v: &serde_json::Value) -> Option<DateTime<Utc>> {
    match v {
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(ms) => DateTime::from_timestamp_millis(ms),
            None => n
                .as_f64()
                .filter(|ms| ms.is_finite())
                .map(|ms| DateTime::from_timestamp_nanos((ms * 1e6) as i64)),
        },
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities_restore_non_finite_values() {
        let frame = decode_frame(
            br#"{"schema":{"fields":[{"name":"v","type":"number","typeInfo":{"frame":"float64"}}]},
                 "data":{"fields":[[null,null,null,1.5]],"entities":[{"NaN":[0],"Inf":[1],"NegInf":[2]}]}}"#,
        )
        .unwrap();
        let v = frame.fields[0].typed::<f64>().unwrap();
        assert!(v.at(0).is_nan());
        assert_eq!(*v.at(1), f64::INFINITY);
        assert_eq!(*v.at(2), f64::NEG_INFINITY);
        assert_eq!(*v.at(3), 1.5);
    }

    #[test]
    fn test_values_alias_and_coarse_fallback() {
        let frame = decode_frame(
            br#"{"schema":{"fields":[{"name":"t","type":"time"},{"name":"v","type":"number"},{"name":"s"}]},
                 "data":{"values":[[1000,2000],[1,null],["a",null]]}}"#,
        )
        .unwrap();
        assert_eq!(
            frame.type_info(),
            vec![
                FieldType::NullableTime,
                FieldType::NullableFloat64,
                FieldType::NullableString
            ]
        );
        assert_eq!(frame.at(1, 1).unwrap(), Value::Null);
        assert_eq!(
            frame.at(0, 1).unwrap().as_time().unwrap().timestamp_millis(),
            2000
        );
    }

    #[test]
    fn test_data_only_infers_types() {
        let frame = decode_frame(br#"{"data":{"fields":[[true],["x"],[2.5],[{"k":1}]]}}"#).unwrap();
        assert_eq!(
            frame.type_info(),
            vec![
                FieldType::NullableBool,
                FieldType::NullableString,
                FieldType::NullableFloat64,
                FieldType::NullableJson
            ]
        );
    }

    #[test]
    fn test_integer_range_is_checked() {
        let err = decode_frame(
            br#"{"schema":{"fields":[{"name":"v","typeInfo":{"frame":"int8"}}]},"data":{"fields":[[300]]}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("field 0 row 0"));
    }

    #[test]
    fn test_null_in_non_nullable_field() {
        let err = decode_frame(
            br#"{"schema":{"fields":[{"name":"v","typeInfo":{"frame":"int64"}}]},"data":{"fields":[[1,null]]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NullNotAllowed { field_index: Some(0), .. }));
    }

    #[test]
    fn test_entity_out_of_range() {
        let result = decode_frame(
            br#"{"schema":{"fields":[{"name":"v","typeInfo":{"frame":"float32"}}]},
                 "data":{"fields":[[null]],"entities":[{"NaN":[3]}]}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_data_into_is_all_or_nothing() {
        let mut frame = decode_frame(
            br#"{"schema":{"fields":[{"name":"a","typeInfo":{"frame":"int64"}},{"name":"b","typeInfo":{"frame":"string"}}]}}"#,
        )
        .unwrap();
        assert_eq!(frame.row_len().unwrap(), 0);

        decode_data_into(&mut frame, br#"{"data":{"fields":[[1,2],["x","y"]]}}"#).unwrap();
        assert_eq!(frame.row_len().unwrap(), 2);

        let before = frame.clone();
        assert!(decode_data_into(&mut frame, br#"{"data":{"fields":[[3],[4]]}}"#).is_err());
        assert!(decode_data_into(&mut frame, br#"{"data":{"fields":[[3,4],["z"]]}}"#).is_err());
        assert!(decode_data_into(&mut frame, br#"{"schema":{}}"#).is_err());
        assert_eq!(frame, before);
    }

    #[test]
    fn test_non_object_documents_are_rejected() {
        let frames = br#"[{"schema":{"name":"a","fields":[{"name":"v","typeInfo":{"frame":"int64"}}]},"data":{"fields":[[1]]}},
                          {"schema":{"name":"b"}}]"#;
        let rejected: [&[u8]; 5] = [b"[]", frames, br#"{"schema":[]}"#, br#"{"data":[[1]]}"#, b"3"];
        for doc in rejected {
            assert!(matches!(decode_frame(doc), Err(Error::Json(_))), "{}", String::from_utf8_lossy(doc));
        }

        let mut frame = decode_frame(br#"{"schema":{"fields":[{"name":"v","typeInfo":{"frame":"int64"}}]}}"#).unwrap();
        let before = frame.clone();
        assert!(matches!(decode_data_into(&mut frame, b"[]"), Err(Error::Json(_))));
        assert!(matches!(decode_data_into(&mut frame, frames), Err(Error::Json(_))));
        assert_eq!(frame, before);

        assert!(matches!(decode_frames(br#"[[], {}]"#), Err(Error::Json(_))));
        assert_eq!(decode_frames(frames).unwrap().len(), 2);
    }
}
