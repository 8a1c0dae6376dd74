/// Metric samples as returned by the metrics endpoint
///
/// A sample is a flat, schema-flexible map of metric name to numeric value.
/// Fields the dashboard knows about are listed in `utils::constants`, but any
/// other numeric member of the payload is kept as well.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::core::fetcher::FetchError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSample {
    values: BTreeMap<String, f64>,
}

impl MetricSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a response body. The body must be a JSON object; members that are
    /// not numbers are skipped.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        match value {
            Value::Object(map) => Ok(Self::from_object(map)),
            other => Err(FetchError::Shape {
                found: json_kind(&other),
            }),
        }
    }

    fn from_object(map: Map<String, Value>) -> Self {
        let mut values = BTreeMap::new();
        for (name, value) in map {
            match value.as_f64() {
                Some(number) => {
                    values.insert(name, number);
                }
                None => {
                    tracing::debug!(metric = %name, "skipping non-numeric member {}", json_kind(&value));
                }
            }
        }
        Self { values }
    }

    /// Builder-style insert, mostly useful for tests and the simulated backend
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Display helper: absent metrics read as zero without being stored
    pub fn value_or_zero(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.values).unwrap_or_else(|_| "{}".to_string())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A successfully parsed response together with when and how it arrived
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub sample: MetricSample,
    pub captured_at: DateTime<Local>,
    pub status: u16,
}

impl Capture {
    pub fn new(sample: MetricSample, status: u16) -> Self {
        Self {
            sample,
            captured_at: Local::now(),
            status,
        }
    }

    /// Non-2xx responses are kept but flagged
    pub fn warning(&self) -> Option<StatusWarning> {
        if (200..300).contains(&self.status) {
            None
        } else {
            Some(StatusWarning { status: self.status })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWarning {
    pub status: u16,
}

impl std::fmt::Display for StatusWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Non-200 response from backend: {}", self.status)
    }
}

/// One point of the trend chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub sample: MetricSample,
    /// Display time for the chart axis (HH:MM:SS)
    pub time: String,
    #[serde(skip)]
    pub captured_at: DateTime<Local>,
}

impl HistoryEntry {
    pub fn new(sample: MetricSample, captured_at: DateTime<Local>) -> Self {
        Self {
            time: captured_at.format("%H:%M:%S").to_string(),
            sample,
            captured_at,
        }
    }

    pub fn from_capture(capture: &Capture) -> Self {
        Self::new(capture.sample.clone(), capture.captured_at)
    }
}
