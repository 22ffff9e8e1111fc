use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::models::{
    record::Record,
    time_series::{
        CreateTimeSeriesRequest, Metric, MetricKind, MonitoredResource, Point, TimeInterval,
        TimeSeries, Timestamp, TypedValue, ValueType,
    },
};

use super::ports::{MetricServiceError, MetricServicePort};

const METRIC_TYPE_PREFIX: &str = "custom.googleapis.com/environment";
const RESOURCE_TYPE: &str = "global";

/// The two quantities exported for every record.
#[derive(Debug, Clone, Copy)]
enum Quantity {
    Temperature,
    RelativeHumidity,
}

impl Quantity {
    fn metric_name(self) -> &'static str {
        match self {
            Quantity::Temperature => "temperature",
            Quantity::RelativeHumidity => "relative_humidity",
        }
    }

    fn value(self, record: &Record) -> f64 {
        match self {
            Quantity::Temperature => record.temperature_celsius,
            Quantity::RelativeHumidity => record.relative_humidity,
        }
    }
}

/// Submit `records` to the monitoring backend as a single batch of
/// `2 * records.len()` gauge series. Succeeds or fails as a whole.
#[tracing::instrument(skip_all)]
pub fn export<C: MetricServicePort + ?Sized>(
    client: &C,
    project_id: &str,
    records: &[Record],
) -> Result<(), MetricServiceError> {
    let request = build_request(project_id, records);
    debug!(
        "Submitting {} time series to {}.",
        request.time_series.len(),
        request.name
    );

    client.create_time_series(&request)?;

    info!("Exported {} records to monitoring.", records.len());
    Ok(())
}

pub fn build_request(project_id: &str, records: &[Record]) -> CreateTimeSeriesRequest {
    CreateTimeSeriesRequest {
        name: format!("projects/{}", project_id),
        time_series: records
            .iter()
            .flat_map(|record| {
                [Quantity::Temperature, Quantity::RelativeHumidity]
                    .map(|quantity| build_time_series(quantity, record))
            })
            .collect(),
    }
}

fn build_time_series(quantity: Quantity, record: &Record) -> TimeSeries {
    let labels = BTreeMap::from([
        (
            "device_id".to_string(),
            record.device_id.clone().unwrap_or_default(),
        ),
        ("channel_id".to_string(), record.channel_id.to_string()),
    ]);

    TimeSeries {
        metric: Metric {
            metric_type: format!("{}/{}", METRIC_TYPE_PREFIX, quantity.metric_name()),
            labels,
        },
        resource: MonitoredResource {
            resource_type: RESOURCE_TYPE.to_string(),
            labels: BTreeMap::new(),
        },
        metric_kind: MetricKind::Gauge,
        value_type: ValueType::Double,
        points: vec![Point {
            interval: TimeInterval {
                end_time: Timestamp::from(record.timestamp),
            },
            value: TypedValue {
                double_value: quantity.value(record),
            },
        }],
    }
}
