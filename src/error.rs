//! Error types for tsframe

use std::fmt;

use crate::schema::FieldType;

/// Result type alias for tsframe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tsframe
#[derive(Debug)]
pub enum Error {
    /// Arrow-related errors (IPC read/write, array construction)
    Arrow(arrow_schema::ArrowError),
    /// IO errors
    Io(std::io::Error),
    /// Malformed JSON payload
    Json(String),
    /// Serialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// Text could not be parsed into the requested value
    Parse(String),
    /// Frame has no fields
    NoFields,
    /// A field's length disagrees with the first field's length
    FieldLengthMismatch {
        field_index: usize,
        expected: usize,
        actual: usize,
    },
    /// Row value count does not match the number of fields
    FieldCountMismatch { expected: usize, actual: usize },
    /// Field or row index out of range
    IndexOutOfRange { index: usize, len: usize },
    /// Two fields share an identity where uniqueness is required
    DuplicateField(String),
    /// Value does not match the field's element type
    TypeMismatch {
        field_index: Option<usize>,
        expected: FieldType,
        actual: String,
    },
    /// Null value given to a non-nullable field
    NullNotAllowed {
        field_index: Option<usize>,
        field_type: FieldType,
    },
    /// Unknown field type string
    UnknownFieldType(String),
    /// Arrow data type with no field type mapping
    UnsupportedArrowType(String),
    /// Pivot transform rejected its input
    Pivot(String),
    /// Input conversion failed
    Conversion(String),
}

impl Error {
    /// Attach a field index to type errors raised below the frame level.
    pub(crate) fn at_field(self, index: usize) -> Self {
        match self {
            Error::TypeMismatch {
                expected, actual, ..
            } => Error::TypeMismatch {
                field_index: Some(index),
                expected,
                actual,
            },
            Error::NullNotAllowed { field_type, .. } => Error::NullNotAllowed {
                field_index: Some(index),
                field_type,
            },
            other => other,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Arrow(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Arrow(e) => write!(f, "Arrow error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Json(msg) => write!(f, "JSON error: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::NoFields => write!(f, "frame has no fields"),
            Error::FieldLengthMismatch {
                field_index,
                expected,
                actual,
            } => write!(
                f,
                "frame has different field lengths: field 0 has length {}, field {} has length {}",
                expected, field_index, actual
            ),
            Error::FieldCountMismatch { expected, actual } => write!(
                f,
                "frame has {} fields but {} values were given",
                expected, actual
            ),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for length {}", index, len)
            }
            Error::DuplicateField(name) => write!(f, "duplicate field: {}", name),
            Error::TypeMismatch {
                field_index: Some(idx),
                expected,
                actual,
            } => write!(
                f,
                "type mismatch at field {}: expected {}, got {}",
                idx, expected, actual
            ),
            Error::TypeMismatch {
                field_index: None,
                expected,
                actual,
            } => write!(f, "type mismatch: expected {}, got {}", expected, actual),
            Error::NullNotAllowed {
                field_index: Some(idx),
                field_type,
            } => write!(
                f,
                "null value at field {} of non-nullable type {}",
                idx, field_type
            ),
            Error::NullNotAllowed {
                field_index: None,
                field_type,
            } => write!(f, "null value for non-nullable type {}", field_type),
            Error::UnknownFieldType(s) => write!(f, "unknown field type: {}", s),
            Error::UnsupportedArrowType(s) => write!(f, "unsupported arrow type: {}", s),
            Error::Pivot(msg) => write!(f, "Pivot error: {}", msg),
            Error::Conversion(msg) => write!(f, "Conversion error: {}", msg),
        }
    }
}

impl From<arrow_schema::ArrowError> for Error {
    fn from(e: arrow_schema::ArrowError) -> Self {
        Error::Arrow(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}
