//! Frame-level metadata

use serde::{Deserialize, Serialize};

/// Optional metadata describing a frame and the query that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<FrameType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_version: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_separator: Option<String>,
    /// Datasource-specific values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stats: Vec<QueryStat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_visualisation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_query_string: Option<String>,
}

/// Declared shape of a frame's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    #[serde(rename = "timeseries-wide")]
    TimeSeriesWide,
    #[serde(rename = "timeseries-long")]
    TimeSeriesLong,
    #[serde(rename = "timeseries-many")]
    TimeSeriesMany,
    #[serde(rename = "numeric-wide")]
    NumericWide,
    #[serde(rename = "numeric-long")]
    NumericLong,
    #[serde(rename = "table")]
    Table,
}

/// A named statistic about the query, e.g. rows scanned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStat {
    pub display_name: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    #[default]
    Info,
    Warning,
    Error,
}

/// User-facing message attached to a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Inspector tab to open, e.g. "data" or "error"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect: Option<String>,
}

impl Notice {
    pub fn new(severity: NoticeSeverity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            link: None,
            inspect: None,
        }
    }
}

/// In-memory warning raised while producing a frame.
///
/// Warnings are not part of either wire format and are dropped by
/// [`Frame::empty_copy`](super::Frame::empty_copy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_json_shape() {
        let meta = FrameMeta {
            frame_type: Some(FrameType::TimeSeriesLong),
            executed_query_string: Some("SELECT 1".to_string()),
            notices: vec![Notice::new(NoticeSeverity::Warning, "slow")],
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "timeseries-long");
        assert_eq!(json["executedQueryString"], "SELECT 1");
        assert_eq!(json["notices"][0]["severity"], "warning");
        assert!(json.get("stats").is_none());

        let back: FrameMeta = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }
}
