//! Typed element storage behind a field
//!
//! Two surfaces share the same storage:
//!
//! - [`Vector<T>`] is the statically-typed container, one monomorphized
//!   instance per element type. Index contract violations panic, like slice
//!   indexing. Codecs use this surface on their hot paths.
//! - [`AnyVector`] is a closed enum over every `Vector<T>` instantiation. It
//!   speaks [`Value`] and returns typed errors; the `*_unchecked` methods
//!   panic instead.
//!
//! Nullable vectors are `Vector<Option<T>>`.

mod any;
mod value;

pub use any::AnyVector;
pub(crate) use any::dispatch_vector;
pub use value::{EnumItemIndex, RawJson, Value};

use chrono::{DateTime, Utc};
use std::fmt;

use crate::schema::FieldType;

/// A type that can be stored in a [`Vector`].
///
/// Implemented for every supported element type and for `Option` of each,
/// which is how nullable vectors are expressed.
pub trait Element: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The element type with nullability stripped.
    type Concrete: Clone;

    const FIELD_TYPE: FieldType;

    /// Default fill value for `new` and `extend`: zero, empty or `None`.
    fn zero() -> Self;

    /// The present value, `None` for an empty nullable slot.
    fn concrete(&self) -> Option<Self::Concrete>;

    fn to_value(&self) -> Value;

    /// Convert from a dynamic value, handing the value back on mismatch.
    fn from_value(value: Value) -> std::result::Result<Self, Value>;

    fn into_any(vector: Vector<Self>) -> AnyVector;

    fn downcast(any: &AnyVector) -> Option<&Vector<Self>>;

    fn downcast_mut(any: &mut AnyVector) -> Option<&mut Vector<Self>>;
}

macro_rules! impl_element {
    ($ty:ty, $base:ident, $nullable:ident, $zero:expr) => {
        impl Element for $ty {
            type Concrete = $ty;

            const FIELD_TYPE: FieldType = FieldType::$base;

            fn zero() -> Self {
                $zero
            }

            fn concrete(&self) -> Option<$ty> {
                Some(self.clone())
            }

            fn to_value(&self) -> Value {
                Value::$base(self.clone())
            }

            fn from_value(value: Value) -> std::result::Result<Self, Value> {
                match value {
                    Value::$base(v) => Ok(v),
                    other => Err(other),
                }
            }

            fn into_any(vector: Vector<Self>) -> AnyVector {
                AnyVector::$base(vector)
            }

            fn downcast(any: &AnyVector) -> Option<&Vector<Self>> {
                match any {
                    AnyVector::$base(v) => Some(v),
                    _ => None,
                }
            }

            fn downcast_mut(any: &mut AnyVector) -> Option<&mut Vector<Self>> {
                match any {
                    AnyVector::$base(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl Element for Option<$ty> {
            type Concrete = $ty;

            const FIELD_TYPE: FieldType = FieldType::$nullable;

            fn zero() -> Self {
                None
            }

            fn concrete(&self) -> Option<$ty> {
                self.clone()
            }

            fn to_value(&self) -> Value {
                match self {
                    Some(v) => Value::$base(v.clone()),
                    None => Value::Null,
                }
            }

            fn from_value(value: Value) -> std::result::Result<Self, Value> {
                match value {
                    Value::Null => Ok(None),
                    Value::$base(v) => Ok(Some(v)),
                    other => Err(other),
                }
            }

            fn into_any(vector: Vector<Self>) -> AnyVector {
                AnyVector::$nullable(vector)
            }

            fn downcast(any: &AnyVector) -> Option<&Vector<Self>> {
                match any {
                    AnyVector::$nullable(v) => Some(v),
                    _ => None,
                }
            }

            fn downcast_mut(any: &mut AnyVector) -> Option<&mut Vector<Self>> {
                match any {
                    AnyVector::$nullable(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(i8, Int8, NullableInt8, 0);
impl_element!(i16, Int16, NullableInt16, 0);
impl_element!(i32, Int32, NullableInt32, 0);
impl_element!(i64, Int64, NullableInt64, 0);
impl_element!(u8, UInt8, NullableUInt8, 0);
impl_element!(u16, UInt16, NullableUInt16, 0);
impl_element!(u32, UInt32, NullableUInt32, 0);
impl_element!(u64, UInt64, NullableUInt64, 0);
impl_element!(f32, Float32, NullableFloat32, 0.0);
impl_element!(f64, Float64, NullableFloat64, 0.0);
impl_element!(String, String, NullableString, String::new());
impl_element!(bool, Bool, NullableBool, false);
impl_element!(DateTime<Utc>, Time, NullableTime, DateTime::<Utc>::from_timestamp_nanos(0));
impl_element!(RawJson, Json, NullableJson, RawJson::null());
impl_element!(EnumItemIndex, Enum, NullableEnum, EnumItemIndex(0));

/// Length-tracked container of one element type.
///
/// Length changes only through [`append`](Self::append),
/// [`insert`](Self::insert), [`delete`](Self::delete) and
/// [`extend`](Self::extend).
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T> {
    values: Vec<T>,
}

impl<T: Element> Vector<T> {
    /// Vector of `len` zero values.
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![T::zero(); len],
        }
    }

    pub fn with_values(values: Vec<T>) -> Self {
        Self { values }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn field_type(&self) -> FieldType {
        T::FIELD_TYPE
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Element at `i`. Panics when `i` is out of range.
    pub fn at(&self, i: usize) -> &T {
        &self.values[i]
    }

    pub fn get(&self, i: usize) -> Option<&T> {
        self.values.get(i)
    }

    /// Overwrite element `i`. Panics when `i` is out of range.
    pub fn set(&mut self, i: usize, value: T) {
        self.values[i] = value;
    }

    pub fn append(&mut self, value: T) {
        self.values.push(value);
    }

    /// Insert before `i`; `i == len` appends. Panics when `i > len`.
    pub fn insert(&mut self, i: usize, value: T) {
        assert!(
            i <= self.values.len(),
            "insert index {} out of range for vector of length {}",
            i,
            self.values.len()
        );
        self.values.insert(i, value);
    }

    /// Remove and return element `i`. Panics when `i` is out of range.
    pub fn delete(&mut self, i: usize) -> T {
        self.values.remove(i)
    }

    /// Grow by `n` zero values.
    pub fn extend(&mut self, n: usize) {
        let len = self.values.len();
        self.values.resize(len + n, T::zero());
    }

    /// Owned deep copy of element `i`.
    pub fn copy_at(&self, i: usize) -> T {
        self.values[i].clone()
    }

    /// Element `i` with the nullable wrapper removed, `None` for an empty slot.
    pub fn concrete_at(&self, i: usize) -> Option<T::Concrete> {
        self.values[i].concrete()
    }

    /// Mutable slot for in-place updates.
    pub fn pointer_at(&mut self, i: usize) -> &mut T {
        &mut self.values[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }
}

impl<T: Element> Default for Vector<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T: Element> From<Vec<T>> for Vector<T> {
    fn from(values: Vec<T>) -> Self {
        Self::with_values(values)
    }
}

impl<T: Element> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a, T: Element> IntoIterator for &'a Vector<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zero_filled() {
        let v: Vector<i32> = Vector::new(3);
        assert_eq!(v.as_slice(), &[0, 0, 0]);

        let n: Vector<Option<f64>> = Vector::new(2);
        assert_eq!(n.as_slice(), &[None, None]);
        assert_eq!(n.field_type(), FieldType::NullableFloat64);
    }

    #[test]
    fn test_length_only_changes_through_mutators() {
        let mut v = Vector::with_values(vec![1i64, 2, 3]);
        v.set(1, 20);
        assert_eq!(v.len(), 3);

        v.append(4);
        v.insert(0, 0);
        v.insert(v.len(), 5);
        assert_eq!(v.as_slice(), &[0, 1, 20, 3, 4, 5]);

        assert_eq!(v.delete(2), 20);
        v.extend(2);
        assert_eq!(v.as_slice(), &[0, 1, 3, 4, 5, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_insert_past_end_panics() {
        let mut v = Vector::with_values(vec![1u8]);
        v.insert(2, 9);
    }

    #[test]
    #[should_panic]
    fn test_at_out_of_range_panics() {
        let v: Vector<bool> = Vector::new(1);
        let _ = v.at(1);
    }

    #[test]
    fn test_copy_at_does_not_alias() {
        let mut v = Vector::with_values(vec![Some("a".to_string())]);
        let mut copy = v.copy_at(0);
        if let Some(s) = copy.as_mut() {
            s.push('b');
        }
        assert_eq!(v.at(0).as_deref(), Some("a"));

        *v.pointer_at(0) = None;
        assert_eq!(copy.as_deref(), Some("ab"));
        assert_eq!(v.concrete_at(0), None);
    }

    #[test]
    fn test_concrete_at() {
        let v = Vector::with_values(vec![Some(1.5f32), None]);
        assert_eq!(v.concrete_at(0), Some(1.5));
        assert_eq!(v.concrete_at(1), None);

        let plain = Vector::with_values(vec![7u16]);
        assert_eq!(plain.concrete_at(0), Some(7));
    }

    #[test]
    fn test_element_value_conversion() {
        assert_eq!(<Option<i8>>::from_value(Value::Null), Ok(None));
        assert_eq!(<Option<i8>>::from_value(Value::Int8(3)), Ok(Some(3)));
        assert_eq!(i8::from_value(Value::Null), Err(Value::Null));
        assert_eq!(i8::from_value(Value::Int16(3)), Err(Value::Int16(3)));
    }
}
