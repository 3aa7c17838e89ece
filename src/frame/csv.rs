//! CSV export

use arrow::csv::WriterBuilder;
use arrow_array::{ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field as ArrowField, Schema};
use std::io::Write;
use std::sync::Arc;

use super::Frame;
use crate::{Error, Result};

/// CSV layout options.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    /// Header row of field names
    pub include_names: bool,
    /// Second header row of coarse types ("time", "number", ...)
    pub include_types: bool,
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            include_names: true,
            include_types: false,
            delimiter: b',',
        }
    }
}

impl Frame {
    /// Write the frame as CSV. Null values are written as empty strings.
    pub fn write_csv<W: Write>(&self, writer: W, options: &CsvOptions) -> Result<()> {
        let rows = self.row_len()?;
        let extra = usize::from(options.include_types);

        let mut schema_fields = Vec::with_capacity(self.fields.len());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let mut cells: Vec<Option<String>> = Vec::with_capacity(rows + extra);
            if options.include_types {
                cells.push(Some(field.field_type().coarse_type().as_str().to_string()));
            }
            cells.extend(
                field
                    .vector()
                    .iter()
                    .map(|v| if v.is_null() { None } else { Some(v.to_string()) }),
            );
            schema_fields.push(ArrowField::new(field.name.as_str(), DataType::Utf8, true));
            columns.push(Arc::new(StringArray::from(cells)));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(schema_fields)), columns)?;
        let mut csv = WriterBuilder::new()
            .with_header(options.include_names)
            .with_delimiter(options.delimiter)
            .build(writer);
        csv.write(&batch)?;
        Ok(())
    }

    pub fn to_csv(&self, options: &CsvOptions) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf, options)?;
        String::from_utf8(buf).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Field, Labels};
    use chrono::DateTime;

    fn frame() -> Frame {
        Frame::new(
            "csv",
            vec![
                Field::new(
                    "time",
                    Labels::new(),
                    vec![DateTime::from_timestamp(0, 0).unwrap(), DateTime::from_timestamp(60, 0).unwrap()],
                ),
                Field::new("host", Labels::new(), vec![Some("a,b".to_string()), None]),
                Field::new("value", Labels::new(), vec![Some(1.5f64), None]),
            ],
        )
    }

    #[test]
    fn test_names_and_types() {
        let out = frame()
            .to_csv(&CsvOptions {
                include_names: true,
                include_types: true,
                delimiter: b',',
            })
            .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "time,host,value");
        assert_eq!(lines[1], "time,string,number");
        assert_eq!(lines[2], "1970-01-01T00:00:00Z,\"a,b\",1.5");
        assert_eq!(lines[3], "1970-01-01T00:01:00Z,,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_no_headers() {
        let out = frame()
            .to_csv(&CsvOptions {
                include_names: false,
                include_types: false,
                delimiter: b';',
            })
            .unwrap();
        assert_eq!(out.lines().next(), Some("1970-01-01T00:00:00Z;a,b;1.5"));
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let mut f = frame();
        f.fields[0].extend(1);
        assert!(f.to_csv(&CsvOptions::default()).is_err());
    }
}
