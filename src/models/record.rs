use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Serialize, Serializer};

/// Rendering used for the timestamp column of the log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Index of a slot behind the bus multiplexer.
#[derive(Debug, Display, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ChannelId(u8);

impl ChannelId {
    pub fn index(self) -> u8 {
        self.0
    }
}

/// One sensor reading taken during a scan pass.
///
/// Field order is the column order of the log. A record without a
/// `device_id` serializes without that column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    pub channel_id: ChannelId,

    #[serde(serialize_with = "serialize_reading")]
    pub temperature_celsius: f64,

    #[serde(serialize_with = "serialize_reading")]
    pub relative_humidity: f64,
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(Record: timestamp={}, device_id={}, channel_id={}, temperature={} degC, relative_humidity={}%)",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.device_id.as_deref().unwrap_or("-"),
            self.channel_id,
            self.temperature_celsius,
            self.relative_humidity
        )
    }
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
}

/// Shortest decimal form, so whole readings are written as `21` and not `21.0`.
fn serialize_reading<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
