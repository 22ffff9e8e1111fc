use std::{thread, time::Duration};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::models::record::ChannelId;

use super::ports::{BusError, BusPort, Channel, SensorPort};

/// Turn the heater of every present sensor on, block for `heat_for_seconds`,
/// then turn every heater off again.
///
/// A zero or negative duration skips the wait. If turning heaters on fails
/// the wait is skipped, but every channel is still switched off before the
/// error is returned.
#[tracing::instrument(skip_all)]
pub fn run_heat_cycle<B: BusPort>(heat_for_seconds: f64, bus: &mut B) -> Result<(), BusError> {
    info!("Heating started at {}.", Utc::now());

    let enabled = enable_heaters(bus);
    match &enabled {
        Ok(()) => thread::sleep(dwell_time(heat_for_seconds)),
        Err(e) => warn!("Skipping heater dwell. Error: {}", e),
    }
    let disabled = disable_heaters(bus);

    info!("Heating ended at {}.", Utc::now());
    enabled.and(disabled)
}

fn dwell_time(heat_for_seconds: f64) -> Duration {
    Duration::try_from_secs_f64(heat_for_seconds).unwrap_or(Duration::ZERO)
}

/// Stops at the first fault.
fn enable_heaters<B: BusPort>(bus: &mut B) -> Result<(), BusError> {
    for channel in (0..bus.channel_count()).map(ChannelId::from) {
        match bus.open(channel)? {
            Channel::Absent => info!("No sensor found on channel {}.", channel),
            Channel::Present(mut sensor) => {
                sensor.set_heater(true)?;
                info!("Turned heater on for sensor on channel {}.", channel);
            }
        }
    }
    Ok(())
}

/// Visits every channel even after a fault, returning the first one.
fn disable_heaters<B: BusPort>(bus: &mut B) -> Result<(), BusError> {
    let mut first_error = None;
    for channel in (0..bus.channel_count()).map(ChannelId::from) {
        let result = match bus.open(channel) {
            Ok(Channel::Absent) => {
                info!("No sensor found on channel {}.", channel);
                continue;
            }
            Ok(Channel::Present(mut sensor)) => sensor.set_heater(false),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!("Turned heater off for sensor on channel {}.", channel),
            Err(e) => {
                error!("Failed to turn heater off on channel {}. Error: {}", channel, e);
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}
