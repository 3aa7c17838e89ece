//! Field type registry
//!
//! `FieldType` is the closed set of element kinds a [`Vector`](crate::vector::Vector)
//! can hold, each in a nullable and a non-nullable flavor. The table below is
//! the single source of truth for string names, nullability pairing and the
//! predicates the codecs consult.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::Error;

macro_rules! field_types {
    ($( ($base:ident, $nullable:ident, $name:literal, $nullable_name:literal) ),* $(,)?) => {
        /// Element kind of a vector, including nullability.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FieldType {
            $( $base, $nullable, )*
        }

        impl FieldType {
            /// Every field type, each non-nullable type followed by its nullable pair.
            pub const ALL: &'static [FieldType] = &[ $( FieldType::$base, FieldType::$nullable, )* ];

            /// Canonical name, nullable types carry a `*` prefix.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(
                        FieldType::$base => $name,
                        FieldType::$nullable => $nullable_name,
                    )*
                }
            }

            pub const fn is_nullable(&self) -> bool {
                match self {
                    $(
                        FieldType::$base => false,
                        FieldType::$nullable => true,
                    )*
                }
            }

            /// The nullable counterpart (identity for nullable types).
            pub const fn nullable_type(&self) -> FieldType {
                match self {
                    $( FieldType::$base | FieldType::$nullable => FieldType::$nullable, )*
                }
            }

            /// The non-nullable counterpart (identity for non-nullable types).
            pub const fn non_nullable_type(&self) -> FieldType {
                match self {
                    $( FieldType::$base | FieldType::$nullable => FieldType::$base, )*
                }
            }
        }
    };
}

field_types! {
    (Int8, NullableInt8, "int8", "*int8"),
    (Int16, NullableInt16, "int16", "*int16"),
    (Int32, NullableInt32, "int32", "*int32"),
    (Int64, NullableInt64, "int64", "*int64"),
    (UInt8, NullableUInt8, "uint8", "*uint8"),
    (UInt16, NullableUInt16, "uint16", "*uint16"),
    (UInt32, NullableUInt32, "uint32", "*uint32"),
    (UInt64, NullableUInt64, "uint64", "*uint64"),
    (Float32, NullableFloat32, "float32", "*float32"),
    (Float64, NullableFloat64, "float64", "*float64"),
    (String, NullableString, "string", "*string"),
    (Bool, NullableBool, "bool", "*bool"),
    (Time, NullableTime, "time", "*time"),
    (Json, NullableJson, "json", "*json"),
    (Enum, NullableEnum, "enum", "*enum"),
}

/// Coarse classification used by the JSON schema section and CSV type row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoarseType {
    Time,
    Number,
    Bool,
    String,
    Other,
}

impl CoarseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoarseType::Time => "time",
            CoarseType::Number => "number",
            CoarseType::Bool => "bool",
            CoarseType::String => "string",
            CoarseType::Other => "other",
        }
    }

    /// Field type a decoder falls back to when only the coarse type is known.
    pub fn default_field_type(&self) -> FieldType {
        match self {
            CoarseType::Time => FieldType::NullableTime,
            CoarseType::Number => FieldType::NullableFloat64,
            CoarseType::Bool => FieldType::NullableBool,
            CoarseType::String | CoarseType::Other => FieldType::NullableString,
        }
    }
}

impl FromStr for CoarseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(CoarseType::Time),
            "number" => Ok(CoarseType::Number),
            "bool" | "boolean" => Ok(CoarseType::Bool),
            "string" => Ok(CoarseType::String),
            "other" | "" => Ok(CoarseType::Other),
            other => Err(Error::UnknownFieldType(other.to_string())),
        }
    }
}

impl FieldType {
    /// Integer or floating point. Enum indexes are not numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.non_nullable_type(),
            FieldType::Int8
                | FieldType::Int16
                | FieldType::Int32
                | FieldType::Int64
                | FieldType::UInt8
                | FieldType::UInt16
                | FieldType::UInt32
                | FieldType::UInt64
                | FieldType::Float32
                | FieldType::Float64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self.non_nullable_type(),
            FieldType::Float32 | FieldType::Float64
        )
    }

    pub fn is_time(&self) -> bool {
        self.non_nullable_type() == FieldType::Time
    }

    pub fn is_string(&self) -> bool {
        self.non_nullable_type() == FieldType::String
    }

    pub fn is_bool(&self) -> bool {
        self.non_nullable_type() == FieldType::Bool
    }

    pub fn is_json(&self) -> bool {
        self.non_nullable_type() == FieldType::Json
    }

    pub fn is_enum(&self) -> bool {
        self.non_nullable_type() == FieldType::Enum
    }

    pub fn coarse_type(&self) -> CoarseType {
        if self.is_time() {
            CoarseType::Time
        } else if self.is_numeric() {
            CoarseType::Number
        } else if self.is_bool() {
            CoarseType::Bool
        } else if self.is_string() {
            CoarseType::String
        } else {
            CoarseType::Other
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    /// Accepts canonical names and the legacy aliases `int`, `double`,
    /// `time.Time` and `json.RawMessage` (each optionally `*`-prefixed).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if let Some(ft) = FieldType::ALL.iter().find(|ft| ft.as_str() == raw) {
            return Ok(*ft);
        }

        let (nullable, base) = match raw.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let ft = match base {
            "int" => FieldType::Int64,
            "double" => FieldType::Float64,
            "time.Time" => FieldType::Time,
            "json.RawMessage" => FieldType::Json,
            _ => return Err(Error::UnknownFieldType(raw.to_string())),
        };
        Ok(if nullable { ft.nullable_type() } else { ft })
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_round_trip() {
        for ft in FieldType::ALL {
            let parsed: FieldType = ft.as_str().parse().unwrap();
            assert_eq!(parsed, *ft);
        }
        assert_eq!(FieldType::ALL.len(), 30);
    }

    #[test]
    fn test_legacy_aliases() {
        assert_eq!("int".parse::<FieldType>().unwrap(), FieldType::Int64);
        assert_eq!("*int".parse::<FieldType>().unwrap(), FieldType::NullableInt64);
        assert_eq!("double".parse::<FieldType>().unwrap(), FieldType::Float64);
        assert_eq!("time.Time".parse::<FieldType>().unwrap(), FieldType::Time);
        assert_eq!(
            "*json.RawMessage".parse::<FieldType>().unwrap(),
            FieldType::NullableJson
        );
        assert!("decimal".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_nullable_pairing() {
        for ft in FieldType::ALL {
            assert!(ft.nullable_type().is_nullable());
            assert!(!ft.non_nullable_type().is_nullable());
            assert_eq!(ft.nullable_type().non_nullable_type(), ft.non_nullable_type());
        }
        assert_eq!(FieldType::UInt16.nullable_type(), FieldType::NullableUInt16);
        assert_eq!(FieldType::NullableTime.non_nullable_type(), FieldType::Time);
    }

    #[test]
    fn test_predicates() {
        assert!(FieldType::NullableUInt32.is_numeric());
        assert!(!FieldType::Enum.is_numeric());
        assert!(FieldType::NullableTime.is_time());
        assert!(FieldType::Float32.is_float());
        assert_eq!(FieldType::Int8.coarse_type(), CoarseType::Number);
        assert_eq!(FieldType::NullableBool.coarse_type(), CoarseType::Bool);
        assert_eq!(FieldType::Json.coarse_type(), CoarseType::Other);
        assert_eq!(FieldType::Time.coarse_type().as_str(), "time");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&FieldType::NullableFloat64).unwrap();
        assert_eq!(json, "\"*float64\"");
        let back: FieldType = serde_json::from_str("\"double\"").unwrap();
        assert_eq!(back, FieldType::Float64);
    }
}
