//! Long ⇄ wide reshaping of time series frames
//!
//! A long frame has one time field, string factor fields and value fields;
//! several rows may share a timestamp, told apart by their factor values.
//! A wide frame has one row per distinct timestamp and one value field per
//! (factor combination, value field), the factor values stored as labels.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::frame::{Field, FieldConfig, Frame, FrameMeta, FrameType, Labels, TimeSeriesKind};
use crate::schema::FieldType;
use crate::vector::{AnyVector, Value};
use crate::{Error, Result};

/// How `long_to_wide` fills cells whose factor combination has no row at a
/// timestamp. Without a fill, cells keep the zero value of the field type,
/// or null for nullable fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillMissing {
    /// Null; value fields become nullable
    Null,
    /// A fixed number, converted to the value field's type
    Value(f64),
    /// The previous present value of the same series, else the default
    Previous,
}

/// Pivot a long frame to wide.
///
/// Output fields are the time field (non-nullable, distinct timestamps in
/// ascending order) followed by one field per factor combination and value
/// field: combinations in first-seen row order, value fields in frame order
/// within each combination. Two rows with the same timestamp and factor
/// values are an error, as are a null timestamp and an empty frame.
pub fn long_to_wide(frame: &Frame, fill: Option<FillMissing>) -> Result<Frame> {
    let schema = frame.time_series_schema();
    if schema.kind != TimeSeriesKind::Long {
        return Err(Error::Pivot(format!(
            "long_to_wide needs a long time series frame (time, string factors, values), got {:?}",
            schema.kind
        )));
    }
    let time_index = schema
        .time_index
        .ok_or_else(|| Error::Pivot("frame has no time field".to_string()))?;
    let rows = frame.row_len()?;
    if rows == 0 {
        return Err(Error::Pivot(format!(
            "long frame '{}' has no rows to pivot",
            frame.name
        )));
    }
    let times = time_values(&frame.fields[time_index], rows)?;

    let mut distinct: Vec<DateTime<Utc>> = times.clone();
    distinct.sort_unstable();
    distinct.dedup();

    // factor combinations, first-seen order
    let mut combinations: Vec<Vec<String>> = Vec::new();
    let mut combination_index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut row_cells = Vec::with_capacity(rows);
    for (row, time) in times.iter().enumerate() {
        let key = schema
            .factor_indices
            .iter()
            .map(|&i| frame.fields[i].at(row).map(|v| v.to_string()))
            .collect::<Result<Vec<String>>>()?;
        let combination = match combination_index.get(&key) {
            Some(&c) => c,
            None => {
                combinations.push(key.clone());
                combination_index.insert(key, combinations.len() - 1);
                combinations.len() - 1
            }
        };
        let time_slot = distinct.binary_search(time).map_err(|_| {
            Error::Pivot(format!("row {}: timestamp missing from distinct set", row))
        })?;
        row_cells.push((time_slot, combination));
    }

    let values = &schema.value_indices;
    let mut fields = Vec::with_capacity(1 + combinations.len() * values.len());
    let source_time = &frame.fields[time_index];
    fields.push(with_config(
        Field::new(source_time.name.clone(), source_time.labels.clone(), distinct.clone()),
        source_time.config.clone(),
    ));

    for combination in &combinations {
        for &value_index in values {
            let source = &frame.fields[value_index];
            let mut labels = source.labels.clone();
            for (&factor_index, factor_value) in schema.factor_indices.iter().zip(combination) {
                labels.insert(frame.fields[factor_index].name.clone(), factor_value.clone());
            }
            let field_type = match fill {
                Some(FillMissing::Null) => source.field_type().nullable_type(),
                _ => source.field_type(),
            };
            fields.push(with_config(
                Field::from_vector(
                    source.name.clone(),
                    labels,
                    AnyVector::new(field_type, distinct.len()),
                ),
                source.config.clone(),
            ));
        }
    }

    let mut present = vec![vec![false; distinct.len()]; combinations.len()];
    for (row, &(time_slot, combination)) in row_cells.iter().enumerate() {
        if present[combination][time_slot] {
            return Err(Error::Pivot(format!(
                "duplicate row {} for time {} and factors {:?}",
                row, distinct[time_slot], combinations[combination]
            )));
        }
        present[combination][time_slot] = true;
        for (k, &value_index) in values.iter().enumerate() {
            let out = 1 + combination * values.len() + k;
            let value = frame.fields[value_index].at(row)?;
            fields[out].set(time_slot, value)?;
        }
    }

    if let Some(fill) = fill {
        apply_fill(&mut fields, &present, values.len(), fill)?;
    }

    debug!(
        frame = %frame.name,
        rows,
        timestamps = distinct.len(),
        series = combinations.len(),
        "Pivoted long frame to wide"
    );

    let mut wide = Frame::new(frame.name.clone(), fields);
    wide.ref_id = frame.ref_id.clone();
    wide.meta = Some(with_frame_type(frame.meta.clone(), FrameType::TimeSeriesWide));
    Ok(wide)
}

fn apply_fill(
    fields: &mut [Field],
    present: &[Vec<bool>],
    values_per_combination: usize,
    fill: FillMissing,
) -> Result<()> {
    for (combination, present) in present.iter().enumerate() {
        for k in 0..values_per_combination {
            let field = &mut fields[1 + combination * values_per_combination + k];
            let fixed = match fill {
                FillMissing::Value(v) => Some(fill_value(field.field_type(), v)?),
                FillMissing::Null | FillMissing::Previous => None,
            };
            for (slot, &seen) in present.iter().enumerate() {
                if seen {
                    continue;
                }
                match fill {
                    FillMissing::Null => {}
                    FillMissing::Value(_) => {
                        if let Some(value) = &fixed {
                            field.set(slot, value.clone())?;
                        }
                    }
                    FillMissing::Previous => {
                        if slot > 0 {
                            let previous = field.at(slot - 1)?;
                            field.set(slot, previous)?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// `v` as a value of `field_type`.
fn fill_value(field_type: FieldType, v: f64) -> Result<Value> {
    let value = match field_type.non_nullable_type() {
        FieldType::Int8 => Value::Int8(v as i8),
        FieldType::Int16 => Value::Int16(v as i16),
        FieldType::Int32 => Value::Int32(v as i32),
        FieldType::Int64 => Value::Int64(v as i64),
        FieldType::UInt8 => Value::UInt8(v as u8),
        FieldType::UInt16 => Value::UInt16(v as u16),
        FieldType::UInt32 => Value::UInt32(v as u32),
        FieldType::UInt64 => Value::UInt64(v as u64),
        FieldType::Float32 => Value::Float32(v as f32),
        FieldType::Float64 => Value::Float64(v),
        FieldType::Bool => Value::Bool(v != 0.0),
        other => {
            return Err(Error::Pivot(format!(
                "cannot fill a {} field with a number",
                other
            )))
        }
    };
    Ok(value)
}

/// Pivot a wide frame to long.
///
/// Output fields are the time field, one field per distinct value field
/// name (first-seen order) and one string factor field per label key
/// (sorted). Rows are ordered by timestamp, then by the first-seen order of
/// the label sets. A label set without a field of some name yields null in
/// that value column; a missing label key yields an empty factor.
pub fn wide_to_long(frame: &Frame) -> Result<Frame> {
    let schema = frame.time_series_schema();
    if schema.kind != TimeSeriesKind::Wide {
        return Err(Error::Pivot(format!(
            "wide_to_long needs a wide time series frame (time and value fields only), got {:?}",
            schema.kind
        )));
    }
    let time_index = schema
        .time_index
        .ok_or_else(|| Error::Pivot("frame has no time field".to_string()))?;
    let rows = frame.row_len()?;
    let times = time_values(&frame.fields[time_index], rows)?;

    let mut names: Vec<&str> = Vec::new();
    let mut label_sets: Vec<&Labels> = Vec::new();
    let mut factor_keys: BTreeSet<&str> = BTreeSet::new();
    // (label set, name) -> source field index
    let mut series: HashMap<(usize, usize), usize> = HashMap::new();
    for &i in &schema.value_indices {
        let field = &frame.fields[i];
        let name = match names.iter().position(|n| *n == field.name) {
            Some(n) => n,
            None => {
                names.push(&field.name);
                names.len() - 1
            }
        };
        let set = match label_sets.iter().position(|l| l.equals(&field.labels)) {
            Some(s) => s,
            None => {
                label_sets.push(&field.labels);
                label_sets.len() - 1
            }
        };
        factor_keys.extend(field.labels.keys());
        if series.insert((set, name), i).is_some() {
            return Err(Error::DuplicateField(format!(
                "{} {}",
                field.name, field.labels
            )));
        }
    }

    let mut value_types = Vec::with_capacity(names.len());
    for name in 0..names.len() {
        let mut field_type: Option<FieldType> = None;
        let mut nullable = false;
        for set in 0..label_sets.len() {
            let Some(&i) = series.get(&(set, name)) else {
                nullable = true;
                continue;
            };
            let ft = frame.fields[i].field_type();
            nullable |= ft.is_nullable();
            match field_type {
                None => field_type = Some(ft.non_nullable_type()),
                Some(existing) if existing != ft.non_nullable_type() => {
                    return Err(Error::Pivot(format!(
                        "value fields named '{}' have different types: {} and {}",
                        names[name], existing, ft
                    )));
                }
                Some(_) => {}
            }
        }
        let base = field_type.ok_or_else(|| {
            Error::Pivot(format!("no field for value '{}'", names[name]))
        })?;
        value_types.push(if nullable { base.nullable_type() } else { base });
    }

    let mut order: Vec<usize> = (0..rows).collect();
    order.sort_by_key(|&row| times[row]);

    let out_rows = rows * label_sets.len();
    let source_time = &frame.fields[time_index];
    let mut time_out = Vec::with_capacity(out_rows);
    let mut value_out: Vec<AnyVector> = value_types
        .iter()
        .map(|&ft| {
            let mut v = AnyVector::new(ft, 0);
            v.reserve(out_rows);
            v
        })
        .collect();
    let mut factor_out: Vec<Vec<String>> =
        vec![Vec::with_capacity(out_rows); factor_keys.len()];

    for &row in &order {
        for (set, labels) in label_sets.iter().enumerate() {
            time_out.push(times[row]);
            for (name, out) in value_out.iter_mut().enumerate() {
                let value = match series.get(&(set, name)) {
                    Some(&i) => frame.fields[i].at(row)?,
                    None => Value::Null,
                };
                out.append(value)?;
            }
            for (key, out) in factor_keys.iter().zip(factor_out.iter_mut()) {
                out.push(labels.get(key).unwrap_or_default().to_string());
            }
        }
    }

    let mut fields = Vec::with_capacity(1 + names.len() + factor_keys.len());
    fields.push(with_config(
        Field::new(source_time.name.clone(), source_time.labels.clone(), time_out),
        source_time.config.clone(),
    ));
    for (name, vector) in names.iter().zip(value_out) {
        fields.push(Field::from_vector(*name, Labels::new(), vector));
    }
    for (key, values) in factor_keys.iter().zip(factor_out) {
        fields.push(Field::new(*key, Labels::new(), values));
    }

    debug!(
        frame = %frame.name,
        rows,
        series = label_sets.len(),
        "Pivoted wide frame to long"
    );

    let mut long = Frame::new(frame.name.clone(), fields);
    long.ref_id = frame.ref_id.clone();
    long.meta = Some(with_frame_type(frame.meta.clone(), FrameType::TimeSeriesLong));
    Ok(long)
}

fn with_config(mut field: Field, config: Option<FieldConfig>) -> Field {
    field.config = config;
    field
}

/// Timestamps of the time field; a null timestamp is an error naming its row.
fn time_values(field: &Field, rows: usize) -> Result<Vec<DateTime<Utc>>> {
    (0..rows)
        .map(|row| match field.at(row)? {
            Value::Time(t) => Ok(t),
            _ => Err(Error::Pivot(format!(
                "null timestamp in field '{}' at row {}",
                field.name, row
            ))),
        })
        .collect()
}

fn with_frame_type(meta: Option<FrameMeta>, frame_type: FrameType) -> FrameMeta {
    let mut meta = meta.unwrap_or_default();
    meta.frame_type = Some(frame_type);
    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_fill_value_conversion() {
        assert_eq!(fill_value(FieldType::NullableInt32, 3.9).unwrap(), Value::Int32(3));
        assert_eq!(fill_value(FieldType::Bool, 1.0).unwrap(), Value::Bool(true));
        assert!(fill_value(FieldType::String, 1.0).is_err());
    }

    #[test]
    fn test_duplicate_rows_are_rejected() {
        let frame = Frame::new(
            "",
            vec![
                Field::new("time", Labels::new(), vec![t(0), t(0)]),
                Field::new("host", Labels::new(), vec!["a".to_string(), "a".to_string()]),
                Field::new("v", Labels::new(), vec![1.0f64, 2.0]),
            ],
        );
        let err = long_to_wide(&frame, None).unwrap_err();
        assert!(err.to_string().contains("duplicate row 1"));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let wide = Frame::new(
            "",
            vec![
                Field::new("time", Labels::new(), vec![t(0)]),
                Field::new("v", Labels::new(), vec![1.0f64]),
            ],
        );
        assert!(matches!(long_to_wide(&wide, None), Err(Error::Pivot(_))));
        let long = long_to_wide(
            &Frame::new(
                "",
                vec![
                    Field::new("time", Labels::new(), vec![t(0)]),
                    Field::new("host", Labels::new(), vec!["a".to_string()]),
                    Field::new("v", Labels::new(), vec![1.0f64]),
                ],
            ),
            None,
        )
        .unwrap();
        assert!(matches!(long_to_wide(&long, None), Err(Error::Pivot(_))));
        assert!(wide_to_long(&long).is_ok());
    }

    #[test]
    fn test_empty_long_frame_is_rejected() {
        let empty = Frame::new(
            "empty",
            vec![
                Field::new("time", Labels::new(), Vec::<DateTime<Utc>>::new()),
                Field::new("host", Labels::new(), Vec::<String>::new()),
                Field::new("v", Labels::new(), Vec::<f64>::new()),
            ],
        );
        assert_eq!(empty.time_series_schema().kind, TimeSeriesKind::Long);
        let err = long_to_wide(&empty, None).unwrap_err();
        assert!(matches!(err, Error::Pivot(_)));
        assert!(err.to_string().contains("no rows"));
    }

    #[test]
    fn test_wide_to_long_sorts_unsorted_time() {
        let wide = Frame::new(
            "",
            vec![
                Field::new("time", Labels::new(), vec![t(20), t(10)]),
                Field::new("v", Labels::from([("k", "x")]), vec![2i64, 1]),
            ],
        );
        let long = wide_to_long(&wide).unwrap();
        assert_eq!(long.at(0, 0).unwrap(), Value::Time(t(10)));
        assert_eq!(long.at(1, 0).unwrap(), Value::Int64(1));
        assert_eq!(long.at(2, 1).unwrap(), Value::from("x"));
    }
}
