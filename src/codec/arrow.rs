//! Frame ⇄ Arrow IPC codec
//!
//! Each field becomes one Arrow column. Field identity travels in the Arrow
//! field metadata (`name`, `labels`, `config`, `tstype`) and frame identity in
//! the schema metadata (`name`, `refId`, `meta`). `tstype` always carries the
//! canonical field type string; decode needs it to tell enum columns apart
//! from plain `uint16` ones.
//!
//! Decode accepts both the IPC file layout (leading `ARROW1` magic) and the
//! IPC stream layout, and either returns a complete frame or an error.

use arrow::compute::concat_batches;
use arrow_array::cast::AsArray;
use arrow_array::types::{
    ArrowPrimitiveType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow_array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, Int8Array, RecordBatch, RecordBatchOptions, StringArray,
    TimestampNanosecondArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow_ipc::reader::{FileReader, StreamReader};
use arrow_ipc::writer::{FileWriter, StreamWriter};
use arrow_schema::{DataType, Field as ArrowField, Schema, SchemaRef, TimeUnit};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::telemetry;
use crate::config::ArrowFormat;
use crate::frame::{Field, FieldConfig, Frame, FrameMeta, Frames, Labels};
use crate::schema::FieldType;
use crate::vector::{AnyVector, Element, EnumItemIndex, RawJson};
use crate::{Error, Result};

/// Field metadata key: field name
pub const META_NAME: &str = "name";
/// Field metadata key: JSON label map
pub const META_LABELS: &str = "labels";
/// Field metadata key: JSON field config
pub const META_CONFIG: &str = "config";
/// Field metadata key: canonical field type string
pub const META_TSTYPE: &str = "tstype";
/// Schema metadata key: frame ref id
pub const META_REF_ID: &str = "refId";
/// Schema metadata key: JSON frame meta
pub const META_FRAME_META: &str = "meta";

const ARROW_FILE_MAGIC: &[u8] = b"ARROW1";
const FORMAT: &str = "arrow";

/// Arrow data type a field type is stored as.
pub fn arrow_data_type(field_type: FieldType) -> DataType {
    use FieldType::*;
    match field_type {
        Int8 | NullableInt8 => DataType::Int8,
        Int16 | NullableInt16 => DataType::Int16,
        Int32 | NullableInt32 => DataType::Int32,
        Int64 | NullableInt64 => DataType::Int64,
        UInt8 | NullableUInt8 => DataType::UInt8,
        UInt16 | NullableUInt16 | Enum | NullableEnum => DataType::UInt16,
        UInt32 | NullableUInt32 => DataType::UInt32,
        UInt64 | NullableUInt64 => DataType::UInt64,
        Float32 | NullableFloat32 => DataType::Float32,
        Float64 | NullableFloat64 => DataType::Float64,
        String | NullableString => DataType::Utf8,
        Bool | NullableBool => DataType::Boolean,
        Time | NullableTime => DataType::Timestamp(TimeUnit::Nanosecond, None),
        Json | NullableJson => DataType::Binary,
    }
}

/// Encode a frame as an Arrow IPC file.
pub fn encode(frame: &Frame) -> Result<Vec<u8>> {
    encode_with_format(frame, ArrowFormat::File)
}

pub fn encode_with_format(frame: &Frame, format: ArrowFormat) -> Result<Vec<u8>> {
    let start = Instant::now();
    let result = frame_to_record_batch(frame).and_then(|batch| write_ipc(&batch, format));
    match &result {
        Ok(bytes) => {
            debug!(
                frame = %frame.name,
                fields = frame.fields.len(),
                bytes = bytes.len(),
                format = format.as_str(),
                "Encoded frame to arrow"
            );
            telemetry::record_encode(FORMAT, bytes.len() as u64, start.elapsed().as_secs_f64());
        }
        Err(_) => telemetry::record_failure(FORMAT, "encode"),
    }
    result
}

/// Decode an Arrow IPC file or stream into a frame.
pub fn decode(bytes: &[u8]) -> Result<Frame> {
    let start = Instant::now();
    let result = read_ipc(bytes).and_then(|batch| record_batch_to_frame(&batch));
    match &result {
        Ok(frame) => {
            debug!(
                frame = %frame.name,
                fields = frame.fields.len(),
                bytes = bytes.len(),
                "Decoded frame from arrow"
            );
            telemetry::record_decode(FORMAT, bytes.len() as u64, start.elapsed().as_secs_f64());
        }
        Err(_) => telemetry::record_failure(FORMAT, "decode"),
    }
    result
}

/// Encode each frame to its own buffer.
pub fn encode_frames(frames: &[Frame], format: ArrowFormat) -> Result<Vec<Vec<u8>>> {
    frames
        .iter()
        .map(|frame| encode_with_format(frame, format))
        .collect()
}

pub fn decode_frames<B: AsRef<[u8]>>(buffers: &[B]) -> Result<Frames> {
    buffers.iter().map(|b| decode(b.as_ref())).collect()
}

/// Arrow schema for a frame, including field and schema metadata.
pub fn frame_schema(frame: &Frame) -> Result<Schema> {
    let mut fields = Vec::with_capacity(frame.fields.len());
    for field in &frame.fields {
        let field_type = field.field_type();
        let mut metadata = HashMap::new();
        metadata.insert(META_NAME.to_string(), field.name.clone());
        metadata.insert(META_TSTYPE.to_string(), field_type.as_str().to_string());
        if !field.labels.is_empty() {
            metadata.insert(
                META_LABELS.to_string(),
                serde_json::to_string(&field.labels)?,
            );
        }
        if let Some(config) = &field.config {
            metadata.insert(META_CONFIG.to_string(), serde_json::to_string(config)?);
        }
        fields.push(
            ArrowField::new(
                field.name.as_str(),
                arrow_data_type(field_type),
                field_type.is_nullable(),
            )
            .with_metadata(metadata),
        );
    }

    let mut metadata = HashMap::new();
    metadata.insert(META_NAME.to_string(), frame.name.clone());
    metadata.insert(META_REF_ID.to_string(), frame.ref_id.clone());
    if let Some(meta) = &frame.meta {
        metadata.insert(META_FRAME_META.to_string(), serde_json::to_string(meta)?);
    }
    Ok(Schema::new_with_metadata(fields, metadata))
}

/// Convert a frame to a single record batch.
pub fn frame_to_record_batch(frame: &Frame) -> Result<RecordBatch> {
    let rows = if frame.fields.is_empty() {
        0
    } else {
        frame.row_len()?
    };
    let schema = Arc::new(frame_schema(frame)?);
    let columns = frame
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| build_column(i, field.vector()))
        .collect::<Result<Vec<_>>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    Ok(RecordBatch::try_new_with_options(schema, columns, &options)?)
}

fn build_column(field_index: usize, vector: &AnyVector) -> Result<ArrayRef> {
    let array: ArrayRef = match vector {
        AnyVector::Int8(v) => Arc::new(Int8Array::from(v.as_slice().to_vec())),
        AnyVector::NullableInt8(v) => Arc::new(Int8Array::from(v.as_slice().to_vec())),
        AnyVector::Int16(v) => Arc::new(Int16Array::from(v.as_slice().to_vec())),
        AnyVector::NullableInt16(v) => Arc::new(Int16Array::from(v.as_slice().to_vec())),
        AnyVector::Int32(v) => Arc::new(Int32Array::from(v.as_slice().to_vec())),
        AnyVector::NullableInt32(v) => Arc::new(Int32Array::from(v.as_slice().to_vec())),
        AnyVector::Int64(v) => Arc::new(Int64Array::from(v.as_slice().to_vec())),
        AnyVector::NullableInt64(v) => Arc::new(Int64Array::from(v.as_slice().to_vec())),
        AnyVector::UInt8(v) => Arc::new(UInt8Array::from(v.as_slice().to_vec())),
        AnyVector::NullableUInt8(v) => Arc::new(UInt8Array::from(v.as_slice().to_vec())),
        AnyVector::UInt16(v) => Arc::new(UInt16Array::from(v.as_slice().to_vec())),
        AnyVector::NullableUInt16(v) => Arc::new(UInt16Array::from(v.as_slice().to_vec())),
        AnyVector::UInt32(v) => Arc::new(UInt32Array::from(v.as_slice().to_vec())),
        AnyVector::NullableUInt32(v) => Arc::new(UInt32Array::from(v.as_slice().to_vec())),
        AnyVector::UInt64(v) => Arc::new(UInt64Array::from(v.as_slice().to_vec())),
        AnyVector::NullableUInt64(v) => Arc::new(UInt64Array::from(v.as_slice().to_vec())),
        AnyVector::Float32(v) => Arc::new(Float32Array::from(v.as_slice().to_vec())),
        AnyVector::NullableFloat32(v) => Arc::new(Float32Array::from(v.as_slice().to_vec())),
        AnyVector::Float64(v) => Arc::new(Float64Array::from(v.as_slice().to_vec())),
        AnyVector::NullableFloat64(v) => Arc::new(Float64Array::from(v.as_slice().to_vec())),
        AnyVector::String(v) => Arc::new(StringArray::from_iter_values(v.iter())),
        AnyVector::NullableString(v) => {
            Arc::new(v.iter().map(|s| s.as_deref()).collect::<StringArray>())
        }
        AnyVector::Bool(v) => Arc::new(BooleanArray::from(v.as_slice().to_vec())),
        AnyVector::NullableBool(v) => Arc::new(BooleanArray::from(v.as_slice().to_vec())),
        AnyVector::Time(v) => {
            let nanos = v
                .iter()
                .enumerate()
                .map(|(row, t)| time_to_nanos(field_index, row, t))
                .collect::<Result<Vec<i64>>>()?;
            Arc::new(TimestampNanosecondArray::from(nanos))
        }
        AnyVector::NullableTime(v) => {
            let nanos = v
                .iter()
                .enumerate()
                .map(|(row, t)| t.as_ref().map(|t| time_to_nanos(field_index, row, t)).transpose())
                .collect::<Result<Vec<Option<i64>>>>()?;
            Arc::new(TimestampNanosecondArray::from(nanos))
        }
        AnyVector::Json(v) => Arc::new(BinaryArray::from_iter_values(
            v.iter().map(RawJson::as_bytes),
        )),
        AnyVector::NullableJson(v) => Arc::new(
            v.iter()
                .map(|j| j.as_ref().map(RawJson::as_bytes))
                .collect::<BinaryArray>(),
        ),
        AnyVector::Enum(v) => Arc::new(UInt16Array::from(
            v.iter().map(|e| e.0).collect::<Vec<u16>>(),
        )),
        AnyVector::NullableEnum(v) => Arc::new(UInt16Array::from(
            v.iter().map(|e| e.map(|e| e.0)).collect::<Vec<Option<u16>>>(),
        )),
    };
    Ok(array)
}

fn time_to_nanos(field_index: usize, row: usize, t: &DateTime<Utc>) -> Result<i64> {
    t.timestamp_nanos_opt().ok_or_else(|| {
        Error::Serialization(format!(
            "field {} row {}: time {} is outside the nanosecond timestamp range",
            field_index, row, t
        ))
    })
}

fn write_ipc(batch: &RecordBatch, format: ArrowFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        ArrowFormat::File => {
            let mut writer = FileWriter::try_new(&mut buffer, batch.schema_ref())
                .map_err(|err| Error::Serialization(err.to_string()))?;
            writer
                .write(batch)
                .map_err(|err| Error::Serialization(err.to_string()))?;
            writer
                .finish()
                .map_err(|err| Error::Serialization(err.to_string()))?;
        }
        ArrowFormat::Stream => {
            let mut writer = StreamWriter::try_new(&mut buffer, batch.schema_ref())
                .map_err(|err| Error::Serialization(err.to_string()))?;
            writer
                .write(batch)
                .map_err(|err| Error::Serialization(err.to_string()))?;
            writer
                .finish()
                .map_err(|err| Error::Serialization(err.to_string()))?;
        }
    }
    Ok(buffer)
}

/// Read every batch of an IPC payload and concatenate them.
fn read_ipc(bytes: &[u8]) -> Result<RecordBatch> {
    let (schema, batches) = if bytes.starts_with(ARROW_FILE_MAGIC) {
        let reader = FileReader::try_new(Cursor::new(bytes), None)
            .map_err(|err| Error::Serialization(err.to_string()))?;
        let schema = reader.schema();
        (schema, collect_batches(reader)?)
    } else {
        let reader = StreamReader::try_new(Cursor::new(bytes), None)
            .map_err(|err| Error::Serialization(err.to_string()))?;
        let schema = reader.schema();
        (schema, collect_batches(reader)?)
    };

    let mut batches = batches;
    if batches.len() == 1 {
        return Ok(batches.remove(0));
    }
    Ok(concat_batches(&schema, &batches)?)
}

fn collect_batches<I>(reader: I) -> Result<Vec<RecordBatch>>
where
    I: Iterator<Item = std::result::Result<RecordBatch, arrow_schema::ArrowError>>,
{
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.map_err(|err| Error::Serialization(err.to_string()))?);
    }
    Ok(batches)
}

/// Convert a record batch carrying frame metadata back into a frame.
///
/// Batches without the metadata keys decode too: field names fall back to
/// the Arrow field names and types follow the Arrow data types.
pub fn record_batch_to_frame(batch: &RecordBatch) -> Result<Frame> {
    let schema: SchemaRef = batch.schema();
    let metadata = schema.metadata();

    let mut frame = Frame::new(
        metadata.get(META_NAME).cloned().unwrap_or_default(),
        Vec::with_capacity(batch.num_columns()),
    );
    frame.ref_id = metadata.get(META_REF_ID).cloned().unwrap_or_default();
    if let Some(raw) = metadata.get(META_FRAME_META) {
        let meta: FrameMeta = serde_json::from_str(raw)
            .map_err(|e| Error::Serialization(format!("invalid frame meta: {}", e)))?;
        frame.meta = Some(meta);
    }

    for (i, (arrow_field, column)) in schema.fields().iter().zip(batch.columns()).enumerate() {
        frame.fields.push(read_field(i, arrow_field, column)?);
    }
    Ok(frame)
}

fn read_field(field_index: usize, arrow_field: &ArrowField, column: &ArrayRef) -> Result<Field> {
    let metadata = arrow_field.metadata();
    let field_type = field_type_of(arrow_field)?;
    let vector = read_column(field_index, field_type, column)?;

    let name = metadata
        .get(META_NAME)
        .cloned()
        .unwrap_or_else(|| arrow_field.name().clone());
    let labels = match metadata.get(META_LABELS) {
        Some(raw) => serde_json::from_str::<Labels>(raw).map_err(|e| {
            Error::Serialization(format!("field {}: invalid labels: {}", field_index, e))
        })?,
        None => Labels::new(),
    };
    let mut field = Field::from_vector(name, labels, vector);
    if let Some(raw) = metadata.get(META_CONFIG) {
        let config: FieldConfig = serde_json::from_str(raw).map_err(|e| {
            Error::Serialization(format!("field {}: invalid config: {}", field_index, e))
        })?;
        field.set_config(config);
    }
    Ok(field)
}

/// Field type for an Arrow field: data type plus `tstype`, nullability from
/// the Arrow nullable flag.
fn field_type_of(arrow_field: &ArrowField) -> Result<FieldType> {
    let tstype = arrow_field.metadata().get(META_TSTYPE).and_then(|raw| {
        match raw.parse::<FieldType>() {
            Ok(ft) => Some(ft),
            Err(_) => {
                warn!(field = %arrow_field.name(), tstype = %raw, "Ignoring unknown tstype");
                None
            }
        }
    });

    let base = match arrow_field.data_type() {
        DataType::Int8 => FieldType::Int8,
        DataType::Int16 => FieldType::Int16,
        DataType::Int32 => FieldType::Int32,
        DataType::Int64 => FieldType::Int64,
        DataType::UInt8 => FieldType::UInt8,
        DataType::UInt16 if tstype.is_some_and(|t| t.is_enum()) => FieldType::Enum,
        DataType::UInt16 => FieldType::UInt16,
        DataType::UInt32 => FieldType::UInt32,
        DataType::UInt64 => FieldType::UInt64,
        DataType::Float32 => FieldType::Float32,
        DataType::Float64 => FieldType::Float64,
        DataType::Utf8 | DataType::LargeUtf8 => FieldType::String,
        DataType::Boolean => FieldType::Bool,
        DataType::Timestamp(_, _) => FieldType::Time,
        DataType::Binary | DataType::LargeBinary => FieldType::Json,
        other => return Err(Error::UnsupportedArrowType(other.to_string())),
    };

    if let Some(ft) = tstype {
        if ft.non_nullable_type() != base {
            warn!(
                field = %arrow_field.name(),
                tstype = %ft,
                data_type = %arrow_field.data_type(),
                "tstype disagrees with arrow data type, using data type"
            );
        }
    }

    Ok(if arrow_field.is_nullable() {
        base.nullable_type()
    } else {
        base
    })
}

fn read_column(field_index: usize, field_type: FieldType, column: &ArrayRef) -> Result<AnyVector> {
    let nullable = field_type.is_nullable();
    match field_type.non_nullable_type() {
        FieldType::Int8 => into_vector(primitive::<Int8Type>(column)?, nullable, field_index),
        FieldType::Int16 => into_vector(primitive::<Int16Type>(column)?, nullable, field_index),
        FieldType::Int32 => into_vector(primitive::<Int32Type>(column)?, nullable, field_index),
        FieldType::Int64 => into_vector(primitive::<Int64Type>(column)?, nullable, field_index),
        FieldType::UInt8 => into_vector(primitive::<UInt8Type>(column)?, nullable, field_index),
        FieldType::UInt16 => into_vector(primitive::<UInt16Type>(column)?, nullable, field_index),
        FieldType::UInt32 => into_vector(primitive::<UInt32Type>(column)?, nullable, field_index),
        FieldType::UInt64 => into_vector(primitive::<UInt64Type>(column)?, nullable, field_index),
        FieldType::Float32 => into_vector(primitive::<Float32Type>(column)?, nullable, field_index),
        FieldType::Float64 => into_vector(primitive::<Float64Type>(column)?, nullable, field_index),
        FieldType::Enum => {
            let values = primitive::<UInt16Type>(column)?
                .into_iter()
                .map(|v| v.map(EnumItemIndex))
                .collect();
            into_vector(values, nullable, field_index)
        }
        FieldType::String => into_vector(strings(column)?, nullable, field_index),
        FieldType::Bool => {
            let array = column
                .as_boolean_opt()
                .ok_or_else(|| unexpected_array(field_index, column))?;
            into_vector(array.iter().collect(), nullable, field_index)
        }
        FieldType::Time => into_vector(times(field_index, column)?, nullable, field_index),
        FieldType::Json => into_vector(json_values(field_index, column)?, nullable, field_index),
        other => Err(Error::UnsupportedArrowType(other.to_string())),
    }
}

/// Build a nullable or non-nullable vector from optional values.
fn into_vector<T>(values: Vec<Option<T>>, nullable: bool, field_index: usize) -> Result<AnyVector>
where
    T: Element,
    Option<T>: Element,
{
    if nullable {
        return Ok(AnyVector::from(values));
    }
    let values = values
        .into_iter()
        .collect::<Option<Vec<T>>>()
        .ok_or(Error::NullNotAllowed {
            field_index: Some(field_index),
            field_type: T::FIELD_TYPE,
        })?;
    Ok(AnyVector::from(values))
}

fn unexpected_array(field_index: usize, column: &ArrayRef) -> Error {
    Error::Serialization(format!(
        "field {}: unexpected array of type {}",
        field_index,
        column.data_type()
    ))
}

fn primitive<T: ArrowPrimitiveType>(column: &ArrayRef) -> Result<Vec<Option<T::Native>>> {
    column
        .as_primitive_opt::<T>()
        .map(|array| array.iter().collect())
        .ok_or_else(|| Error::UnsupportedArrowType(column.data_type().to_string()))
}

fn strings(column: &ArrayRef) -> Result<Vec<Option<String>>> {
    if let Some(array) = column.as_string_opt::<i32>() {
        return Ok(array.iter().map(|s| s.map(str::to_string)).collect());
    }
    if let Some(array) = column.as_string_opt::<i64>() {
        return Ok(array.iter().map(|s| s.map(str::to_string)).collect());
    }
    Err(Error::UnsupportedArrowType(column.data_type().to_string()))
}

fn times(field_index: usize, column: &ArrayRef) -> Result<Vec<Option<DateTime<Utc>>>> {
    let (raw, nanos_per_unit): (Vec<Option<i64>>, i64) = match column.data_type() {
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            (primitive::<TimestampNanosecondType>(column)?, 1)
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            (primitive::<TimestampMicrosecondType>(column)?, 1_000)
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            (primitive::<TimestampMillisecondType>(column)?, 1_000_000)
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            (primitive::<TimestampSecondType>(column)?, 1_000_000_000)
        }
        other => return Err(Error::UnsupportedArrowType(other.to_string())),
    };

    raw.into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(|v| {
                v.checked_mul(nanos_per_unit)
                    .map(DateTime::from_timestamp_nanos)
                    .ok_or_else(|| {
                        Error::Serialization(format!(
                            "field {} row {}: timestamp overflows nanosecond range",
                            field_index, row
                        ))
                    })
            })
            .transpose()
        })
        .collect()
}

fn json_values(field_index: usize, column: &ArrayRef) -> Result<Vec<Option<RawJson>>> {
    let raw: Vec<Option<&[u8]>> = if let Some(array) = column.as_binary_opt::<i32>() {
        array.iter().collect()
    } else if let Some(array) = column.as_binary_opt::<i64>() {
        array.iter().collect()
    } else {
        return Err(Error::UnsupportedArrowType(column.data_type().to_string()));
    };

    raw.into_iter()
        .enumerate()
        .map(|(row, bytes)| {
            bytes
                .map(|b| {
                    RawJson::parse(Bytes::copy_from_slice(b)).map_err(|e| {
                        Error::Serialization(format!("field {} row {}: {}", field_index, row, e))
                    })
                })
                .transpose()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new(
            "cpu",
            vec![
                Field::new(
                    "time",
                    Labels::new(),
                    vec![DateTime::from_timestamp_nanos(1_000_000_001)],
                ),
                Field::new("state", Labels::from([("host", "a")]), vec![Some(EnumItemIndex(2))]),
                Field::new("count", Labels::new(), vec![7u16]),
            ],
        )
        .with_ref_id("A")
    }

    #[test]
    fn test_tstype_disambiguates_enum() {
        let frame = sample();
        let schema = frame_schema(&frame).unwrap();
        assert_eq!(schema.field(1).data_type(), &DataType::UInt16);
        assert_eq!(schema.field(2).data_type(), &DataType::UInt16);
        assert_eq!(schema.field(1).metadata()[META_TSTYPE], "*enum");
        assert_eq!(schema.field(2).metadata()[META_TSTYPE], "uint16");
        assert_eq!(schema.metadata()[META_REF_ID], "A");

        let decoded = decode(&encode(&frame).unwrap()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_stream_and_file_layouts_decode() {
        let frame = sample();
        let file = encode_with_format(&frame, ArrowFormat::File).unwrap();
        let stream = encode_with_format(&frame, ArrowFormat::Stream).unwrap();
        assert!(file.starts_with(ARROW_FILE_MAGIC));
        assert!(!stream.starts_with(ARROW_FILE_MAGIC));
        assert_eq!(decode(&file).unwrap(), decode(&stream).unwrap());
    }

    #[test]
    fn test_zero_field_frame() {
        let frame = Frame::new("empty", vec![]).with_ref_id("B");
        let decoded = decode(&encode(&frame).unwrap()).unwrap();
        assert_eq!(decoded.name, "empty");
        assert_eq!(decoded.ref_id, "B");
        assert!(decoded.fields.is_empty());
    }

    #[test]
    fn test_mismatched_lengths_fail_encode() {
        let mut frame = sample();
        frame.fields[2].extend(1);
        assert!(matches!(
            encode(&frame),
            Err(Error::FieldLengthMismatch { field_index: 2, .. })
        ));
    }

    #[test]
    fn test_garbage_fails_decode() {
        assert!(decode(b"not arrow at all").is_err());
        assert!(decode(b"ARROW1 but truncated").is_err());
    }

    #[test]
    fn test_millisecond_timestamps_widen() {
        use arrow_array::TimestampMillisecondArray;
        let schema = Arc::new(Schema::new(vec![ArrowField::new(
            "ts",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(TimestampMillisecondArray::from(vec![1_500i64]))],
        )
        .unwrap();
        let frame = record_batch_to_frame(&batch).unwrap();
        assert_eq!(frame.fields[0].name, "ts");
        assert_eq!(
            frame.fields[0].typed::<DateTime<Utc>>().unwrap().at(0).timestamp_millis(),
            1_500
        );
    }

    #[test]
    fn test_invalid_json_column_is_rejected() {
        let schema = Arc::new(Schema::new(vec![ArrowField::new(
            "doc",
            DataType::Binary,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(BinaryArray::from_iter_values([b"{not json".as_slice()]))],
        )
        .unwrap();
        assert!(record_batch_to_frame(&batch).is_err());
    }
}
