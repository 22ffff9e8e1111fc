use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::models::record::{ChannelId, Record};

use super::ports::{BusError, BusPort, Channel, SensorPort};

/// Read every present sensor on the bus, in ascending channel order.
///
/// Every record shares `pass_timestamp` and `device_id`. An absent channel
/// is skipped and contributes no record. Any other bus fault aborts the
/// whole pass.
#[tracing::instrument(skip_all)]
pub fn scan<B: BusPort>(
    pass_timestamp: DateTime<Utc>,
    device_id: Option<&str>,
    bus: &mut B,
) -> Result<Vec<Record>, BusError> {
    info!("Scan started at {}.", pass_timestamp);

    let mut records = vec![];
    for channel in (0..bus.channel_count()).map(ChannelId::from) {
        let mut sensor = match bus.open(channel)? {
            Channel::Absent => {
                info!("No sensor found on channel {}.", channel);
                continue;
            }
            Channel::Present(sensor) => sensor,
        };

        let record = Record {
            timestamp: pass_timestamp,
            device_id: device_id.map(str::to_owned),
            channel_id: channel,
            temperature_celsius: sensor.temperature()?,
            relative_humidity: sensor.relative_humidity()?,
        };
        info!("Found sensor on channel {} with values {}.", channel, record);
        records.push(record);
    }

    debug!("Scan produced {} records.", records.len());
    Ok(records)
}
