//! Request shapes for the monitoring backend's `timeSeries.create` call.
//!
//! Serialized field names follow the backend's JSON representation. The
//! request `name` travels in the URL and is not part of the body.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{ser::Error as _, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeSeriesRequest {
    /// Resource the series are written to, e.g. `projects/my-project`.
    #[serde(skip)]
    pub name: String,

    pub time_series: Vec<TimeSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub metric: Metric,
    pub resource: MonitoredResource,
    pub metric_kind: MetricKind,
    pub value_type: ValueType,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    #[serde(rename = "type")]
    pub metric_type: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricKind {
    /// Instantaneous measurement of a continuously varying value.
    Gauge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Double,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub interval: TimeInterval,
    pub value: TypedValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    pub end_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedValue {
    pub double_value: f64,
}

/// Whole seconds since the unix epoch. The backend accepts no finer
/// resolution from this daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self {
            seconds: value.timestamp(),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let time = DateTime::<Utc>::from_timestamp(self.seconds, 0)
            .ok_or_else(|| S::Error::custom("timestamp out of range"))?;
        serializer.collect_str(&time.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}
