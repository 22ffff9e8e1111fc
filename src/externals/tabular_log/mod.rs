use std::fs::File;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;

use self::adapters::open_log;

pub mod adapters;

pub struct TabularLogModule {
    pub log: File,
}

impl TabularLogModule {
    pub fn initialize(config: &Config) -> Result<Self> {
        let log = open_log(&config.output_path)
            .with_context(|| format!("Failed to open log {}", config.output_path.display()))?;
        info!("Appending readings to {}.", config.output_path.display());
        Ok(Self { log })
    }
}
