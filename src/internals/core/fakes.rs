//! Scriptable stand-ins for the bus and the monitoring backend.

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use embedded_hal::i2c::ErrorKind;

use crate::models::{record::ChannelId, time_series::CreateTimeSeriesRequest};

use super::ports::{BusError, BusPort, Channel, MetricServiceError, MetricServicePort, SensorPort};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeChannel {
    Absent,
    Present {
        temperature: f64,
        relative_humidity: f64,
    },
    /// Opening the channel fails with a transport fault.
    Faulty,
    /// The sensor answers the probe but every read fails its checksum.
    FaultyRead,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaterEvent {
    pub channel: ChannelId,
    pub enabled: bool,
    pub at: Instant,
}

pub struct FakeBus {
    channels: Vec<FakeChannel>,
    pub opened: Vec<ChannelId>,
    pub heater_events: Vec<HeaterEvent>,
}

impl FakeBus {
    pub fn new(channels: Vec<FakeChannel>) -> Self {
        Self {
            channels,
            opened: vec![],
            heater_events: vec![],
        }
    }

    /// Replace the script for one channel, e.g. to unplug a sensor mid-test.
    pub fn set_channel(&mut self, channel: u8, state: FakeChannel) {
        if let Some(slot) = self.channels.get_mut(channel as usize) {
            *slot = state;
        }
    }
}

pub struct FakeSensor<'a> {
    channel: ChannelId,
    reading: Option<(f64, f64)>,
    heater_events: &'a mut Vec<HeaterEvent>,
}

impl BusPort for FakeBus {
    type Sensor<'a> = FakeSensor<'a> where Self: 'a;

    fn channel_count(&self) -> u8 {
        self.channels.len() as u8
    }

    fn open(&mut self, channel: ChannelId) -> Result<Channel<Self::Sensor<'_>>, BusError> {
        self.opened.push(channel);
        match self.channels.get(channel.index() as usize) {
            None => Err(BusError::InvalidChannel(channel)),
            Some(FakeChannel::Absent) => Ok(Channel::Absent),
            Some(FakeChannel::Faulty) => Err(BusError::Transfer(ErrorKind::Bus)),
            Some(FakeChannel::Present {
                temperature,
                relative_humidity,
            }) => Ok(Channel::Present(FakeSensor {
                channel,
                reading: Some((*temperature, *relative_humidity)),
                heater_events: &mut self.heater_events,
            })),
            Some(FakeChannel::FaultyRead) => Ok(Channel::Present(FakeSensor {
                channel,
                reading: None,
                heater_events: &mut self.heater_events,
            })),
        }
    }
}

impl<'a> SensorPort for FakeSensor<'a> {
    fn temperature(&mut self) -> Result<f64, BusError> {
        self.reading
            .map(|(temperature, _)| temperature)
            .ok_or(BusError::Checksum)
    }

    fn relative_humidity(&mut self) -> Result<f64, BusError> {
        self.reading
            .map(|(_, relative_humidity)| relative_humidity)
            .ok_or(BusError::Checksum)
    }

    fn set_heater(&mut self, enabled: bool) -> Result<(), BusError> {
        self.heater_events.push(HeaterEvent {
            channel: self.channel,
            enabled,
            at: Instant::now(),
        });
        Ok(())
    }
}

/// Records every request it is given. Clones share the same record.
#[derive(Clone, Default)]
pub struct FakeMetricService {
    requests: Arc<Mutex<Vec<CreateTimeSeriesRequest>>>,
    reject: bool,
}

impl FakeMetricService {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<CreateTimeSeriesRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl MetricServicePort for FakeMetricService {
    fn create_time_series(
        &self,
        request: &CreateTimeSeriesRequest,
    ) -> Result<(), MetricServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.reject {
            return Err(MetricServiceError::Rejected {
                status: 400,
                body: "rejected by fake".into(),
            });
        }
        Ok(())
    }
}
