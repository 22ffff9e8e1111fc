use std::{num::ParseIntError, path::PathBuf, time::Duration};

use clap::{ArgGroup, Parser};
use tracing::level_filters::LevelFilter;

use crate::externals::{
    cloud_monitoring::adapters::DEFAULT_MONITORING_ENDPOINT,
    hardware::{adapters::TCA9548A_DEFAULT_ADDRESS, services::SHT31_DEFAULT_ADDRESS},
};

/// Periodically scan a TCA9548A multiplexed bus of SHT31 sensors and log
/// their readings.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
#[command(group(ArgGroup::new("token_source").args(["access_token", "access_token_file"])))]
pub struct Config {
    /// Path of the CSV log readings are appended to.
    #[arg(long, env = "SENSE_OUTPUT_PATH", default_value = "/tmp/sense.csv")]
    pub output_path: PathBuf,

    /// Identifier of this host, written with every reading. Omit to log
    /// without a device id column.
    #[arg(long, env = "SENSE_DEVICE_ID")]
    pub device_id: Option<String>,

    /// Time between polling the sensors.
    #[arg(long, env = "SENSE_DELAY_SECONDS", default_value_t = 300)]
    pub sense_delay_seconds: u64,

    /// Time to run each sensor's heater after polling. Zero or less disables
    /// heating. The heater dwell adds to the delay between polls.
    #[arg(
        long,
        env = "SENSE_HEAT_FOR_SECONDS",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub heat_for_seconds: i64,

    #[arg(long, env = "SENSE_I2C_BUS", default_value = "/dev/i2c-1")]
    pub i2c_bus: PathBuf,

    #[arg(long, default_value_t = TCA9548A_DEFAULT_ADDRESS, value_parser = parse_address)]
    pub mux_address: u8,

    #[arg(long, default_value_t = SHT31_DEFAULT_ADDRESS, value_parser = parse_address)]
    pub sensor_address: u8,

    /// Cloud project to export metrics to. Omit to disable metric export.
    #[arg(long, env = "SENSE_PROJECT_ID", requires = "token_source")]
    pub project_id: Option<String>,

    /// Bearer token presented to the monitoring backend. It is used as given
    /// for as long as the daemon runs, so a short-lived token will start
    /// failing exports once it expires; use --access-token-file instead.
    #[arg(long, env = "SENSE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// File holding the bearer token. Read again before every export, so an
    /// external refresher can rotate it.
    #[arg(long, env = "SENSE_ACCESS_TOKEN_FILE")]
    pub access_token_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_MONITORING_ENDPOINT)]
    pub monitoring_endpoint: String,

    /// One of off, error, warn, info, debug, trace.
    #[arg(long, env = "SENSE_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Run a single pass and exit.
    #[arg(long)]
    pub once: bool,
}

impl Config {
    pub fn sense_delay(&self) -> Duration {
        Duration::from_secs(self.sense_delay_seconds)
    }
}

/// Accepts `0x70`-style hex as well as plain decimal.
fn parse_address(value: &str) -> Result<u8, ParseIntError> {
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    }
}
