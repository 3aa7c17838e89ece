//! A single named, labeled column

use super::{FieldConfig, Labels};
use crate::schema::FieldType;
use crate::vector::{AnyVector, Element, Value, Vector};
use crate::{Error, Result};

/// One column of a [`Frame`](super::Frame): name, labels, display config
/// and the vector holding its values.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub labels: Labels,
    pub config: Option<FieldConfig>,
    vector: AnyVector,
}

impl Field {
    /// Field holding `values`; the field type follows from `T`.
    pub fn new<T: Element>(name: impl Into<String>, labels: Labels, values: Vec<T>) -> Self {
        Self::from_vector(name, labels, Vector::with_values(values))
    }

    pub fn from_vector(
        name: impl Into<String>,
        labels: Labels,
        vector: impl Into<AnyVector>,
    ) -> Self {
        Self {
            name: name.into(),
            labels,
            config: None,
            vector: vector.into(),
        }
    }

    /// Field of `len` zero values of the given type.
    pub fn with_type(name: impl Into<String>, field_type: FieldType, len: usize) -> Self {
        Self::from_vector(name, Labels::new(), AnyVector::new(field_type, len))
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_config(mut self, config: FieldConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn set_config(&mut self, config: FieldConfig) {
        self.config = Some(config);
    }

    pub fn vector(&self) -> &AnyVector {
        &self.vector
    }

    pub fn vector_mut(&mut self) -> &mut AnyVector {
        &mut self.vector
    }

    pub fn into_vector(self) -> AnyVector {
        self.vector
    }

    pub fn typed<T: Element>(&self) -> Option<&Vector<T>> {
        self.vector.typed()
    }

    pub fn typed_mut<T: Element>(&mut self) -> Option<&mut Vector<T>> {
        self.vector.typed_mut()
    }

    pub fn field_type(&self) -> FieldType {
        self.vector.field_type()
    }

    pub fn nullable(&self) -> bool {
        self.vector.is_nullable()
    }

    pub fn len(&self) -> usize {
        self.vector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    pub fn at(&self, i: usize) -> Result<Value> {
        self.vector.at(i)
    }

    pub fn copy_at(&self, i: usize) -> Result<Value> {
        self.vector.copy_at(i)
    }

    pub fn concrete_at(&self, i: usize) -> Result<Option<Value>> {
        self.vector.concrete_at(i)
    }

    pub fn set(&mut self, i: usize, value: Value) -> Result<()> {
        self.vector.set(i, value)
    }

    pub fn append(&mut self, value: Value) -> Result<()> {
        self.vector.append(value)
    }

    pub fn insert(&mut self, i: usize, value: Value) -> Result<()> {
        self.vector.insert(i, value)
    }

    pub fn delete(&mut self, i: usize) -> Result<Value> {
        self.vector.delete(i)
    }

    pub fn extend(&mut self, n: usize) {
        self.vector.extend(n)
    }

    /// Value `i` coerced to `f64`.
    ///
    /// Integers widen, bools map to 1/0, times to epoch milliseconds,
    /// enum indexes to their index and strings are parsed. An empty nullable
    /// slot yields NaN.
    pub fn float_at(&self, i: usize) -> Result<f64> {
        Ok(self.nullable_float_at(i)?.unwrap_or(f64::NAN))
    }

    /// Like [`float_at`](Self::float_at) but `None` for an empty nullable slot.
    pub fn nullable_float_at(&self, i: usize) -> Result<Option<f64>> {
        let value = match self.vector.concrete_at(i)? {
            Some(value) => value,
            None => return Ok(None),
        };
        let f = match value {
            Value::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Time(t) => t.timestamp_millis() as f64,
            Value::Enum(idx) => idx.0 as f64,
            Value::String(s) => s.trim().parse::<f64>().map_err(|e| {
                Error::Parse(format!(
                    "field '{}' row {}: cannot parse '{}' as float: {}",
                    self.name, i, s, e
                ))
            })?,
            other => other.as_f64().ok_or_else(|| Error::TypeMismatch {
                field_index: None,
                expected: FieldType::Float64,
                actual: other.type_name().to_string(),
            })?,
        };
        Ok(Some(f))
    }

    /// Same series: equal names and equal label sets.
    pub fn same_series(&self, other: &Field) -> bool {
        self.name == other.name && self.labels.equals(&other.labels)
    }

    /// Configured display name, else the name followed by its labels.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.config.as_ref().and_then(|c| c.display_name.as_ref()) {
            return name.clone();
        }
        if self.labels.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.labels)
        }
    }

    /// Same name, labels and type with no values; config is dropped.
    pub fn empty_copy(&self) -> Field {
        Field {
            name: self.name.clone(),
            labels: self.labels.clone(),
            config: None,
            vector: self.vector.empty_copy(),
        }
    }
}
