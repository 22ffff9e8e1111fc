use anyhow::{Context, Result};
use linux_embedded_hal::{Delay, I2cdev};
use tracing::info;

use crate::config::Config;

use self::adapters::Tca9548aBusAdapter;

pub mod adapters;
pub mod services;

pub struct HardwareModule {
    pub bus_adapter: Tca9548aBusAdapter<I2cdev, Delay>,
}

impl HardwareModule {
    /// Open the I2C character device once. The same handle is reused for
    /// every pass.
    pub fn initialize(config: &Config) -> Result<Self> {
        let i2c = I2cdev::new(&config.i2c_bus)
            .with_context(|| format!("Failed to open I2C bus {}", config.i2c_bus.display()))?;
        info!(
            "Opened I2C bus {} (multiplexer {:#04x}, sensors {:#04x}).",
            config.i2c_bus.display(),
            config.mux_address,
            config.sensor_address
        );

        Ok(Self {
            bus_adapter: Tca9548aBusAdapter::new(
                i2c,
                Delay,
                config.mux_address,
                config.sensor_address,
            ),
        })
    }
}
