use embedded_hal::{
    delay::DelayNs,
    i2c::{Error as _, I2c},
};
use tracing::trace;

use crate::{
    internals::core::ports::{BusError, BusPort, Channel},
    models::record::ChannelId,
};

use super::services::{AddressNack, Sht31};

/// Default address of a TCA9548A with A0..A2 pulled low.
pub const TCA9548A_DEFAULT_ADDRESS: u8 = 0x70;

pub const TCA9548A_CHANNEL_COUNT: u8 = 8;

/// TCA9548A multiplexer with one SHT31-D per downstream channel.
pub struct Tca9548aBusAdapter<I2C, D> {
    i2c: I2C,
    delay: D,
    mux_address: u8,
    sensor_address: u8,
}

impl<I2C: I2c, D: DelayNs> Tca9548aBusAdapter<I2C, D> {
    pub fn new(i2c: I2C, delay: D, mux_address: u8, sensor_address: u8) -> Self {
        Self {
            i2c,
            delay,
            mux_address,
            sensor_address,
        }
    }

    /// Route the upstream bus to exactly one downstream channel.
    fn select(&mut self, channel: ChannelId) -> Result<(), BusError> {
        if channel.index() >= TCA9548A_CHANNEL_COUNT {
            return Err(BusError::InvalidChannel(channel));
        }
        trace!("Selecting multiplexer channel {}.", channel);
        self.i2c
            .write(self.mux_address, &[1u8 << channel.index()])
            .map_err(|e| BusError::ChannelSelect {
                channel,
                kind: e.kind(),
            })
    }
}

impl<I2C, D> BusPort for Tca9548aBusAdapter<I2C, D>
where
    I2C: I2c,
    I2C::Error: AddressNack,
    D: DelayNs,
{
    type Sensor<'a> = Sht31<'a, I2C, D> where Self: 'a;

    fn channel_count(&self) -> u8 {
        TCA9548A_CHANNEL_COUNT
    }

    fn open(&mut self, channel: ChannelId) -> Result<Channel<Self::Sensor<'_>>, BusError> {
        self.select(channel)?;
        Sht31::probe(&mut self.i2c, &mut self.delay, self.sensor_address)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use chrono::{TimeZone, Utc};
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};
    use linux_embedded_hal::{i2cdev::linux::LinuxI2CError, I2CError};

    use crate::{
        externals::hardware::services::{
            testing::{word, FakeI2c, NoDelay},
            SHT31_DEFAULT_ADDRESS,
        },
        internals::core::scanner::scan,
    };

    use super::*;

    fn adapter(i2c: FakeI2c) -> Tca9548aBusAdapter<FakeI2c, NoDelay> {
        Tca9548aBusAdapter::new(i2c, NoDelay, TCA9548A_DEFAULT_ADDRESS, SHT31_DEFAULT_ADDRESS)
    }

    /// `EREMOTEIO`, what the bcm2835 driver returns for an unanswered address.
    fn remote_io_error() -> I2CError {
        I2CError::from(LinuxI2CError::Errno(121))
    }

    /// Fake bus where the sensor address only answers while one of
    /// `populated` is the selected multiplexer channel.
    struct PopulatedMux {
        inner: FakeI2c<I2CError>,
        populated: Vec<u8>,
        selected: u8,
    }

    impl ErrorType for PopulatedMux {
        type Error = I2CError;
    }

    impl I2c for PopulatedMux {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if address == TCA9548A_DEFAULT_ADDRESS {
                if let [Operation::Write(bytes)] = operations {
                    self.selected = bytes[0];
                }
            } else if !self.populated.iter().any(|&c| self.selected == 1 << c) {
                return Err(remote_io_error());
            }
            self.inner.transaction(address, operations)
        }
    }

    #[test]
    fn test_open_selects_channel_before_probing() {
        let mut bus = adapter(FakeI2c {
            responding: vec![TCA9548A_DEFAULT_ADDRESS, SHT31_DEFAULT_ADDRESS],
            reads: VecDeque::from([word(0)]),
            ..Default::default()
        });

        let present = matches!(bus.open(ChannelId::from(5)), Ok(Channel::Present(_)));

        assert!(present);
        assert_eq!(
            bus.i2c.writes,
            vec![
                (TCA9548A_DEFAULT_ADDRESS, vec![0b0010_0000]),
                (SHT31_DEFAULT_ADDRESS, vec![0xF3, 0x2D]),
            ]
        );
    }

    #[test]
    fn test_missing_multiplexer_is_a_fault_not_absence() {
        let mut bus = adapter(FakeI2c::default());

        let result = bus.open(ChannelId::from(0));

        assert!(matches!(
            result,
            Err(BusError::ChannelSelect {
                kind: ErrorKind::NoAcknowledge(_),
                ..
            })
        ));
    }

    #[test]
    fn test_channel_out_of_range() {
        let mut bus = adapter(FakeI2c::default());

        assert!(matches!(
            bus.open(ChannelId::from(8)),
            Err(BusError::InvalidChannel(_))
        ));
    }

    #[test]
    fn test_scan_with_no_sensors_behind_multiplexer() {
        let mut bus = adapter(FakeI2c {
            responding: vec![TCA9548A_DEFAULT_ADDRESS],
            ..Default::default()
        });
        let time = Utc.with_ymd_and_hms(2023, 4, 2, 12, 56, 31).unwrap();

        let records = scan(time, None, &mut bus).expect("Scan failed");

        assert!(records.is_empty());
        let selections: Vec<u8> = bus
            .i2c
            .writes
            .iter()
            .map(|(_, bytes)| bytes[0])
            .collect();
        assert_eq!(selections, vec![1, 2, 4, 8, 16, 32, 64, 128]);
    }

    #[test]
    fn test_scan_treats_remote_io_nack_as_empty_channel() {
        let mut response = word(0x6666);
        response.extend(word(0x8000));
        let mut inner = FakeI2c::nacking_with(remote_io_error);
        inner.responding = vec![TCA9548A_DEFAULT_ADDRESS, SHT31_DEFAULT_ADDRESS];
        inner.reads = VecDeque::from([word(0), response]);
        let mut bus = Tca9548aBusAdapter::new(
            PopulatedMux {
                inner,
                populated: vec![0],
                selected: 0,
            },
            NoDelay,
            TCA9548A_DEFAULT_ADDRESS,
            SHT31_DEFAULT_ADDRESS,
        );
        let time = Utc.with_ymd_and_hms(2023, 4, 2, 12, 56, 31).unwrap();

        let records = scan(time, None, &mut bus).expect("Scan failed");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel_id, ChannelId::from(0));
        assert!((records[0].temperature_celsius - 25.0).abs() < 0.01);
    }
}
