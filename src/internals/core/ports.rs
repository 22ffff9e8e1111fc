use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

use crate::models::{record::ChannelId, time_series::CreateTimeSeriesRequest};

/// Outcome of opening a multiplexer channel.
pub enum Channel<S> {
    /// A sensor answered on the channel.
    Present(S),

    /// Nothing answered on the channel. Expected, not a fault.
    Absent,
}

/// Faults on the sensor bus. Absence is never one of these.
#[derive(Error, Debug)]
pub enum BusError {
    /// The multiplexer itself did not accept the channel selection.
    #[error("Failed to select multiplexer channel {channel}. Error: {kind}")]
    ChannelSelect { channel: ChannelId, kind: ErrorKind },

    /// A transfer with a sensor that did answer the probe failed.
    #[error("I2C transfer with sensor failed. Error: {0}")]
    Transfer(ErrorKind),

    /// The sensor answered with data that failed its checksum.
    #[error("Sensor response failed checksum.")]
    Checksum,

    #[error("Channel {0} is outside of the multiplexer's range.")]
    InvalidChannel(ChannelId),
}

/// A sensor reachable on the currently selected channel.
pub trait SensorPort {
    fn temperature(&mut self) -> Result<f64, BusError>;
    fn relative_humidity(&mut self) -> Result<f64, BusError>;
    fn set_heater(&mut self, enabled: bool) -> Result<(), BusError>;
}

/// This port separates the multiplexed bus hardware from the scan and heat
/// logic. Channels are numbered `0..channel_count()`.
pub trait BusPort {
    type Sensor<'a>: SensorPort
    where
        Self: 'a;

    fn channel_count(&self) -> u8;

    /// Select `channel` and probe it. Only the case where no device
    /// responded maps to `Channel::Absent`; everything else is an error.
    fn open(&mut self, channel: ChannelId) -> Result<Channel<Self::Sensor<'_>>, BusError>;
}

#[derive(Error, Debug)]
pub enum MetricServiceError {
    #[error("Monitoring backend rejected the request with status {status}. Body: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to reach the monitoring backend. Error: {0}")]
    Transport(String),

    #[error("Failed to load the monitoring access token. Error: {0}")]
    Credentials(String),
}

/// Client of the monitoring backend. One call per submitted batch.
pub trait MetricServicePort {
    fn create_time_series(
        &self,
        request: &CreateTimeSeriesRequest,
    ) -> Result<(), MetricServiceError>;
}
