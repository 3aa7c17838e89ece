//! Dynamically-typed vector surface

use chrono::{DateTime, Utc};

use super::{Element, EnumItemIndex, RawJson, Value, Vector};
use crate::schema::FieldType;
use crate::{Error, Result};

macro_rules! define_any_vector {
    ($( $variant:ident => $ty:ty ),* $(,)?) => {
        /// A vector of any supported element type.
        #[derive(Debug, Clone, PartialEq)]
        pub enum AnyVector {
            $( $variant(Vector<$ty>), )*
        }

        impl AnyVector {
            /// Vector of `len` zero values for the given field type.
            pub fn new(field_type: FieldType, len: usize) -> Self {
                match field_type {
                    $( FieldType::$variant => AnyVector::$variant(Vector::new(len)), )*
                }
            }

            pub fn field_type(&self) -> FieldType {
                match self {
                    $( AnyVector::$variant(_) => FieldType::$variant, )*
                }
            }
        }
    };
}

define_any_vector! {
    Int8 => i8,
    NullableInt8 => Option<i8>,
    Int16 => i16,
    NullableInt16 => Option<i16>,
    Int32 => i32,
    NullableInt32 => Option<i32>,
    Int64 => i64,
    NullableInt64 => Option<i64>,
    UInt8 => u8,
    NullableUInt8 => Option<u8>,
    UInt16 => u16,
    NullableUInt16 => Option<u16>,
    UInt32 => u32,
    NullableUInt32 => Option<u32>,
    UInt64 => u64,
    NullableUInt64 => Option<u64>,
    Float32 => f32,
    NullableFloat32 => Option<f32>,
    Float64 => f64,
    NullableFloat64 => Option<f64>,
    String => String,
    NullableString => Option<String>,
    Bool => bool,
    NullableBool => Option<bool>,
    Time => DateTime<Utc>,
    NullableTime => Option<DateTime<Utc>>,
    Json => RawJson,
    NullableJson => Option<RawJson>,
    Enum => EnumItemIndex,
    NullableEnum => Option<EnumItemIndex>,
}

/// Run `$body` with `$v` bound to the typed vector inside an [`AnyVector`].
macro_rules! dispatch_vector {
    ($any:expr, $v:ident => $body:expr) => {
        match $any {
            $crate::vector::AnyVector::Int8($v) => $body,
            $crate::vector::AnyVector::NullableInt8($v) => $body,
            $crate::vector::AnyVector::Int16($v) => $body,
            $crate::vector::AnyVector::NullableInt16($v) => $body,
            $crate::vector::AnyVector::Int32($v) => $body,
            $crate::vector::AnyVector::NullableInt32($v) => $body,
            $crate::vector::AnyVector::Int64($v) => $body,
            $crate::vector::AnyVector::NullableInt64($v) => $body,
            $crate::vector::AnyVector::UInt8($v) => $body,
            $crate::vector::AnyVector::NullableUInt8($v) => $body,
            $crate::vector::AnyVector::UInt16($v) => $body,
            $crate::vector::AnyVector::NullableUInt16($v) => $body,
            $crate::vector::AnyVector::UInt32($v) => $body,
            $crate::vector::AnyVector::NullableUInt32($v) => $body,
            $crate::vector::AnyVector::UInt64($v) => $body,
            $crate::vector::AnyVector::NullableUInt64($v) => $body,
            $crate::vector::AnyVector::Float32($v) => $body,
            $crate::vector::AnyVector::NullableFloat32($v) => $body,
            $crate::vector::AnyVector::Float64($v) => $body,
            $crate::vector::AnyVector::NullableFloat64($v) => $body,
            $crate::vector::AnyVector::String($v) => $body,
            $crate::vector::AnyVector::NullableString($v) => $body,
            $crate::vector::AnyVector::Bool($v) => $body,
            $crate::vector::AnyVector::NullableBool($v) => $body,
            $crate::vector::AnyVector::Time($v) => $body,
            $crate::vector::AnyVector::NullableTime($v) => $body,
            $crate::vector::AnyVector::Json($v) => $body,
            $crate::vector::AnyVector::NullableJson($v) => $body,
            $crate::vector::AnyVector::Enum($v) => $body,
            $crate::vector::AnyVector::NullableEnum($v) => $body,
        }
    };
}

pub(crate) use dispatch_vector;

fn convert<T: Element>(value: Value) -> Result<T> {
    T::from_value(value).map_err(|rejected| {
        if rejected.is_null() {
            Error::NullNotAllowed {
                field_index: None,
                field_type: T::FIELD_TYPE,
            }
        } else {
            Error::TypeMismatch {
                field_index: None,
                expected: T::FIELD_TYPE,
                actual: rejected.type_name().to_string(),
            }
        }
    })
}

impl AnyVector {
    pub fn len(&self) -> usize {
        dispatch_vector!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_nullable(&self) -> bool {
        self.field_type().is_nullable()
    }

    /// A zero-length vector of the same type.
    pub fn empty_copy(&self) -> Self {
        AnyVector::new(self.field_type(), 0)
    }

    /// Typed view, `None` when `T` is not this vector's element type.
    pub fn typed<T: Element>(&self) -> Option<&Vector<T>> {
        T::downcast(self)
    }

    pub fn typed_mut<T: Element>(&mut self) -> Option<&mut Vector<T>> {
        T::downcast_mut(self)
    }

    pub fn get(&self, i: usize) -> Option<Value> {
        dispatch_vector!(self, v => v.get(i).map(Element::to_value))
    }

    /// Element `i` as a [`Value`]; empty nullable slots are [`Value::Null`].
    pub fn at(&self, i: usize) -> Result<Value> {
        self.get(i).ok_or(Error::IndexOutOfRange {
            index: i,
            len: self.len(),
        })
    }

    /// Owned deep copy of element `i`.
    pub fn copy_at(&self, i: usize) -> Result<Value> {
        self.at(i)
    }

    /// Element `i`, `None` for an empty nullable slot.
    pub fn concrete_at(&self, i: usize) -> Result<Option<Value>> {
        let value = self.at(i)?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    /// Check that `value` could be stored in this vector without storing it.
    pub fn check(&self, value: &Value) -> Result<()> {
        let field_type = self.field_type();
        match value.field_type() {
            None if field_type.is_nullable() => Ok(()),
            None => Err(Error::NullNotAllowed {
                field_index: None,
                field_type,
            }),
            Some(ft) if ft == field_type.non_nullable_type() => Ok(()),
            Some(ft) => Err(Error::TypeMismatch {
                field_index: None,
                expected: field_type,
                actual: ft.to_string(),
            }),
        }
    }

    fn check_index(&self, i: usize, len: usize) -> Result<()> {
        if i >= len {
            return Err(Error::IndexOutOfRange { index: i, len });
        }
        Ok(())
    }

    pub fn set(&mut self, i: usize, value: Value) -> Result<()> {
        self.check_index(i, self.len())?;
        dispatch_vector!(self, v => v.set(i, convert(value)?));
        Ok(())
    }

    pub fn append(&mut self, value: Value) -> Result<()> {
        dispatch_vector!(self, v => v.append(convert(value)?));
        Ok(())
    }

    /// Insert before `i`; `i == len` appends.
    pub fn insert(&mut self, i: usize, value: Value) -> Result<()> {
        self.check_index(i, self.len() + 1)?;
        dispatch_vector!(self, v => v.insert(i, convert(value)?));
        Ok(())
    }

    pub fn delete(&mut self, i: usize) -> Result<Value> {
        self.check_index(i, self.len())?;
        Ok(dispatch_vector!(self, v => Element::to_value(&v.delete(i))))
    }

    /// Grow by `n` zero values.
    pub fn extend(&mut self, n: usize) {
        dispatch_vector!(self, v => v.extend(n))
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        dispatch_vector!(self, v => v.reserve(additional))
    }

    /// Caller-guaranteed-valid `set`. Panics on a type or index violation.
    pub fn set_unchecked(&mut self, i: usize, value: Value) {
        if let Err(e) = self.set(i, value) {
            panic!("set_unchecked: {}", e);
        }
    }

    /// Caller-guaranteed-valid `append`. Panics on a type violation.
    pub fn append_unchecked(&mut self, value: Value) {
        if let Err(e) = self.append(value) {
            panic!("append_unchecked: {}", e);
        }
    }

    /// Append element `row` of `other`, which must have the same type.
    pub(crate) fn append_from(&mut self, other: &AnyVector, row: usize) -> Result<()> {
        self.append(other.at(row)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

impl<T: Element> From<Vector<T>> for AnyVector {
    fn from(vector: Vector<T>) -> Self {
        T::into_any(vector)
    }
}

impl<T: Element> From<Vec<T>> for AnyVector {
    fn from(values: Vec<T>) -> Self {
        T::into_any(Vector::with_values(values))
    }
}
