//! SQL column type mapping
//!
//! SQL adapters report two things per result column: the type the database
//! declared (`VARCHAR(64)`, `BIGINT UNSIGNED`, `timestamptz`, ...) and the
//! host type the driver scans into. This module is the one place that turns
//! that pair into a [`FieldType`].

use super::FieldType;
use crate::{Error, Result};

/// Host type a SQL driver scans a column into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Bytes,
    Bool,
    Time,
    /// Driver could not name a concrete type
    Any,
}

impl ScanType {
    fn field_type(&self) -> Option<FieldType> {
        let ft = match self {
            ScanType::Int8 => FieldType::Int8,
            ScanType::Int16 => FieldType::Int16,
            ScanType::Int32 => FieldType::Int32,
            ScanType::Int64 => FieldType::Int64,
            ScanType::UInt8 => FieldType::UInt8,
            ScanType::UInt16 => FieldType::UInt16,
            ScanType::UInt32 => FieldType::UInt32,
            ScanType::UInt64 => FieldType::UInt64,
            ScanType::Float32 => FieldType::Float32,
            ScanType::Float64 => FieldType::Float64,
            ScanType::String | ScanType::Bytes => FieldType::String,
            ScanType::Bool => FieldType::Bool,
            ScanType::Time => FieldType::Time,
            ScanType::Any => return None,
        };
        Some(ft)
    }
}

/// Declared database type names that override the scan type.
fn declared_field_type(declared: &str) -> Option<FieldType> {
    let upper = declared.trim().to_ascii_uppercase();
    // Strip precision/length arguments: VARCHAR(255) -> VARCHAR
    let base = upper.split('(').next().unwrap_or("").trim();
    let unsigned = base.ends_with(" UNSIGNED");
    let base = base.trim_end_matches(" UNSIGNED").trim();

    let ft = match base {
        "TINYINT" | "INT1" if unsigned => FieldType::UInt8,
        "TINYINT" | "INT1" => FieldType::Int8,
        "SMALLINT" | "INT2" if unsigned => FieldType::UInt16,
        "SMALLINT" | "INT2" => FieldType::Int16,
        "INT" | "INTEGER" | "MEDIUMINT" | "INT4" if unsigned => FieldType::UInt32,
        "INT" | "INTEGER" | "MEDIUMINT" | "INT4" => FieldType::Int32,
        "BIGINT" | "INT8" if unsigned => FieldType::UInt64,
        "BIGINT" | "INT8" => FieldType::Int64,
        "REAL" | "FLOAT4" => FieldType::Float32,
        "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" | "DECIMAL" | "NUMERIC" => {
            FieldType::Float64
        }
        "BOOL" | "BOOLEAN" | "BIT" => FieldType::Bool,
        "DATE" | "DATETIME" | "DATETIME2" | "TIMESTAMP" | "TIMESTAMPTZ"
        | "TIMESTAMP WITH TIME ZONE" | "TIMESTAMP WITHOUT TIME ZONE" => FieldType::Time,
        "CHAR" | "VARCHAR" | "NCHAR" | "NVARCHAR" | "TEXT" | "UUID" | "TIME" => {
            FieldType::String
        }
        "JSON" | "JSONB" => FieldType::Json,
        _ => return None,
    };
    Some(ft)
}

/// Map a SQL column to a field type.
///
/// A recognized declared type wins over the scan type, so a `DECIMAL`
/// column scanned as text still becomes a float. Unrecognized declared
/// types fall back to the scan type. Nullable columns get the nullable
/// field type.
pub fn sql_field_type(declared: &str, scan: ScanType, nullable: bool) -> Result<FieldType> {
    let ft = declared_field_type(declared)
        .or_else(|| scan.field_type())
        .ok_or_else(|| {
            Error::UnknownFieldType(format!(
                "no field type for SQL column declared as '{}' scanned as {:?}",
                declared, scan
            ))
        })?;
    Ok(if nullable { ft.nullable_type() } else { ft })
}
