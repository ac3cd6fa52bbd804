//! Activity-monitor telemetry records.
//!
//! Telemetry files are line-delimited JSON, one object per tick and
//! container. The schema is loose: only three fields are read, and their names
//! are configurable through [`TelemetryFields`].

use crate::error::{BenchmarkError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// Names of the fields read from each telemetry object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryFields {
    /// Numeric sample (energy reading).
    pub value: String,
    /// Sample timestamp.
    pub timestamp: String,
    /// Container or source label.
    pub source: String,
}

impl Default for TelemetryFields {
    fn default() -> Self {
        Self {
            value: "cpuEnergy".to_string(),
            timestamp: "ts".to_string(),
            source: "containerName".to_string(),
        }
    }
}

/// One telemetry tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Source label; empty when the record carries none.
    pub source: String,
    /// Timestamp, if present and numeric.
    pub timestamp: Option<f64>,
    /// Sample value.
    pub value: f64,
}

impl TelemetryRecord {
    /// Extract a record from a JSON object. Returns `None` when the value
    /// field is missing or not numeric.
    pub fn from_json(object: &Value, fields: &TelemetryFields) -> Option<Self> {
        let value = object.get(&fields.value)?.as_f64()?;
        Some(Self {
            source: object
                .get(&fields.source)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            timestamp: object.get(&fields.timestamp).and_then(Value::as_f64),
            value,
        })
    }

    /// Whether the timestamp is present, finite and positive.
    pub fn has_valid_timestamp(&self) -> bool {
        self.timestamp.is_some_and(|ts| ts.is_finite() && ts > 0.0)
    }
}

/// Parse line-delimited telemetry. `origin` is only used in error messages.
pub fn parse_telemetry(
    text: &str,
    fields: &TelemetryFields,
    origin: &Path,
) -> Result<Vec<TelemetryRecord>> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let object: Value =
            serde_json::from_str(line).map_err(|source| BenchmarkError::MalformedRecord {
                path: origin.to_path_buf(),
                line: index + 1,
                source,
            })?;
        match TelemetryRecord::from_json(&object, fields) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            path = %origin.display(),
            skipped,
            field = %fields.value,
            "Skipped telemetry records without a numeric value"
        );
    }
    debug!(path = %origin.display(), records = records.len(), "Parsed telemetry");

    Ok(records)
}

/// Selects records by source label.
///
/// A label matches when it equals one of `exact` or starts with one of
/// `prefixes`. An empty filter matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFilter {
    /// Labels accepted verbatim.
    pub exact: Vec<String>,
    /// Accepted label prefixes.
    pub prefixes: Vec<String>,
}

impl SourceFilter {
    /// Filter accepting exactly the given labels.
    pub fn exact<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exact: labels.into_iter().map(Into::into).collect(),
            prefixes: Vec::new(),
        }
    }

    /// Filter accepting labels with any of the given prefixes.
    pub fn prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exact: Vec::new(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `label` is selected.
    pub fn matches(&self, label: &str) -> bool {
        self.exact.iter().any(|exact| exact == label)
            || self.prefixes.iter().any(|prefix| label.starts_with(prefix.as_str()))
    }
}

/// A timestamped sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp (strictly positive).
    pub timestamp: f64,
    /// Sample value.
    pub value: f64,
}

/// Samples of one target, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    /// Description of the selected sources.
    pub label: String,
    /// Retained samples.
    pub samples: Vec<Sample>,
}

impl SampleSeries {
    /// Keep the records selected by `filter` that carry a valid timestamp.
    pub fn from_records(
        label: impl Into<String>,
        records: &[TelemetryRecord],
        filter: &SourceFilter,
    ) -> Self {
        let samples = records
            .iter()
            .filter(|record| filter.matches(&record.source))
            .filter_map(|record| match record.timestamp {
                Some(timestamp) if record.has_valid_timestamp() => Some(Sample {
                    timestamp,
                    value: record.value,
                }),
                _ => None,
            })
            .collect();
        Self {
            label: label.into(),
            samples,
        }
    }

    /// Sample values in order.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.value).collect()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the series holds no sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time covered by the series, from first to last timestamp.
    pub fn span(&self) -> Option<f64> {
        let first = self.samples.iter().map(|s| s.timestamp).reduce(f64::min)?;
        let last = self.samples.iter().map(|s| s.timestamp).reduce(f64::max)?;
        Some(last - first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TELEMETRY: &str = r#"
{"containerName": "strapi_blog", "ts": 10, "cpuEnergy": 1.5}
{"containerName": "strapi_db", "ts": 10, "cpuEnergy": 9.0}

{"containerName": "strapi_blog", "ts": 0, "cpuEnergy": 2.0}
{"containerName": "strapi_blog", "ts": 12, "cpuEnergy": 2.5}
{"containerName": "strapi_blog", "cpuEnergy": 3.0}
{"containerName": "strapi_blog", "ts": 13}
"#;

    fn records() -> Vec<TelemetryRecord> {
        parse_telemetry(TELEMETRY, &TelemetryFields::default(), Path::new("t.jsonp")).unwrap()
    }

    #[test]
    fn test_parse_skips_blank_and_valueless_lines() {
        let records = records();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].source, "strapi_blog");
        assert_eq!(records[0].timestamp, Some(10.0));
        assert_eq!(records[4].timestamp, None);
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let err = parse_telemetry("{}\nnot json\n", &TelemetryFields::default(), Path::new("x"))
            .unwrap_err();
        match err {
            BenchmarkError::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_series_filters_source_and_timestamp() {
        let series = SampleSeries::from_records(
            "baseline",
            &records(),
            &SourceFilter::exact(["strapi_blog"]),
        );
        assert_eq!(series.values(), vec![1.5, 2.5]);
        assert_eq!(series.span(), Some(2.0));
    }

    #[test]
    fn test_prefix_filter() {
        let filter = SourceFilter::prefixes(["strapi_", "strapi-graphcl"]);
        assert!(filter.matches("strapi_db"));
        assert!(filter.matches("strapi-graphcl-1"));
        assert!(!filter.matches("postgres"));
        assert!(!SourceFilter::default().matches("strapi_blog"));
    }

    #[test]
    fn test_custom_fields() {
        let fields = TelemetryFields {
            value: "joules".to_string(),
            timestamp: "time".to_string(),
            source: "name".to_string(),
        };
        let object = serde_json::json!({"name": "a", "time": 1.0, "joules": 4.0});
        let record = TelemetryRecord::from_json(&object, &fields).unwrap();
        assert_eq!(record.value, 4.0);
        assert!(record.has_valid_timestamp());
    }

    #[test]
    fn test_empty_series() {
        let series = SampleSeries::from_records("x", &[], &SourceFilter::exact(["a"]));
        assert!(series.is_empty());
        assert_eq!(series.span(), None);
    }
}
