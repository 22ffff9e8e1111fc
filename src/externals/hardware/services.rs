use embedded_hal::{
    delay::DelayNs,
    i2c::{Error, ErrorKind, I2c, NoAcknowledgeSource},
};
use linux_embedded_hal::{i2cdev::linux::LinuxI2CError, I2CError};
use tracing::trace;

use crate::internals::core::ports::{BusError, Channel, SensorPort};

/// Default address of an SHT31-D with its ADDR pin pulled low.
pub const SHT31_DEFAULT_ADDRESS: u8 = 0x44;

const CMD_READ_STATUS: u16 = 0xF32D;
const CMD_MEASURE_SINGLE_HIGH: u16 = 0x2400;
const CMD_HEATER_ENABLE: u16 = 0x306D;
const CMD_HEATER_DISABLE: u16 = 0x3066;

/// Upper bound of a high repeatability conversion per datasheet.
const MEASUREMENT_DURATION_MS: u32 = 16;

/// Linux errnos an I2C adapter driver returns when no device acknowledged
/// its address. i801 and friends use `ENXIO`; bcm2835 and DesignWare
/// report `EREMOTEIO`.
const ENXIO: i32 = 6;
const EREMOTEIO: i32 = 121;

/// Bus errors that can tell an unanswered address apart from other faults.
pub trait AddressNack: Error {
    fn is_address_nack(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address | NoAcknowledgeSource::Unknown)
        )
    }
}

impl AddressNack for ErrorKind {}

/// `I2CError::kind()` folds `EREMOTEIO` into `ErrorKind::Other`, so the
/// errno is inspected directly.
impl AddressNack for I2CError {
    fn is_address_nack(&self) -> bool {
        let errno = match self.inner() {
            LinuxI2CError::Errno(errno) => Some(*errno),
            LinuxI2CError::Io(e) => e.raw_os_error(),
        };
        matches!(errno, Some(ENXIO | EREMOTEIO))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub temperature_celsius: f64,
    pub relative_humidity: f64,
}

/// An SHT31-D reachable through the currently selected multiplexer channel.
///
/// The first read takes a measurement; later reads through the same handle
/// return values from that one conversion.
pub struct Sht31<'a, I2C, D> {
    i2c: &'a mut I2C,
    delay: &'a mut D,
    address: u8,
    measurement: Option<Measurement>,
}

impl<'a, I2C, D> Sht31<'a, I2C, D>
where
    I2C: I2c,
    I2C::Error: AddressNack,
    D: DelayNs,
{
    /// Read the status register to find out whether a sensor is there.
    /// A missing address acknowledge means absent; any other failure is a
    /// fault.
    pub fn probe(
        i2c: &'a mut I2C,
        delay: &'a mut D,
        address: u8,
    ) -> Result<Channel<Self>, BusError> {
        let mut status = [0u8; 3];
        match i2c.write_read(address, &CMD_READ_STATUS.to_be_bytes(), &mut status) {
            Ok(()) => {
                let status = checked_word([status[0], status[1], status[2]])?;
                trace!("Sensor status register: {:#06x}.", status);
                Ok(Channel::Present(Self {
                    i2c,
                    delay,
                    address,
                    measurement: None,
                }))
            }
            Err(e) if e.is_address_nack() => Ok(Channel::Absent),
            Err(e) => Err(BusError::Transfer(e.kind())),
        }
    }

    /// Trigger a single shot measurement and wait for its result.
    pub fn measure(&mut self) -> Result<Measurement, BusError> {
        self.command(CMD_MEASURE_SINGLE_HIGH)?;
        self.delay.delay_ms(MEASUREMENT_DURATION_MS);

        let mut buffer = [0u8; 6];
        self.i2c
            .read(self.address, &mut buffer)
            .map_err(|e| BusError::Transfer(e.kind()))?;

        let raw_temperature = checked_word([buffer[0], buffer[1], buffer[2]])?;
        let raw_humidity = checked_word([buffer[3], buffer[4], buffer[5]])?;
        Ok(Measurement {
            temperature_celsius: convert_temperature(raw_temperature),
            relative_humidity: convert_humidity(raw_humidity),
        })
    }

    fn reading(&mut self) -> Result<Measurement, BusError> {
        match self.measurement {
            Some(measurement) => Ok(measurement),
            None => {
                let measurement = self.measure()?;
                self.measurement = Some(measurement);
                Ok(measurement)
            }
        }
    }

    fn command(&mut self, command: u16) -> Result<(), BusError> {
        self.i2c
            .write(self.address, &command.to_be_bytes())
            .map_err(|e| BusError::Transfer(e.kind()))
    }
}

impl<'a, I2C, D> SensorPort for Sht31<'a, I2C, D>
where
    I2C: I2c,
    I2C::Error: AddressNack,
    D: DelayNs,
{
    fn temperature(&mut self) -> Result<f64, BusError> {
        Ok(self.reading()?.temperature_celsius)
    }

    fn relative_humidity(&mut self) -> Result<f64, BusError> {
        Ok(self.reading()?.relative_humidity)
    }

    fn set_heater(&mut self, enabled: bool) -> Result<(), BusError> {
        if enabled {
            self.command(CMD_HEATER_ENABLE)
        } else {
            self.command(CMD_HEATER_DISABLE)
        }
    }
}

/// Verify a big endian word followed by its CRC-8 (poly 0x31, init 0xFF).
fn checked_word(word: [u8; 3]) -> Result<u16, BusError> {
    if crc8(&word[..2]) != word[2] {
        return Err(BusError::Checksum);
    }
    Ok(u16::from_be_bytes([word[0], word[1]]))
}

fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0xFFu8;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn convert_temperature(raw: u16) -> f64 {
    -45f64 + 175f64 * (raw as f64) / 65535f64
}

fn convert_humidity(raw: u16) -> f64 {
    100f64 * (raw as f64) / 65535f64
}
