use std::io::Write;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use super::{
    heater::run_heat_cycle,
    metric_export::export,
    ports::{BusError, BusPort, MetricServiceError, MetricServicePort},
    scanner::scan,
    tabular_export::{write_records, TabularExportError},
};

/// Where and under which project readings are forwarded.
pub struct MonitoringTarget {
    pub client: Box<dyn MetricServicePort + Send>,
    pub project_id: String,
}

#[derive(Error, Debug)]
pub enum PassError {
    #[error("Scan aborted. Error: {0}")]
    Scan(BusError),

    #[error("Failed to write records to the log. Error: {0}")]
    TabularExport(TabularExportError),

    #[error("Failed to export records to monitoring. Error: {0}")]
    MetricExport(MetricServiceError),

    #[error("Heat cycle aborted. Error: {0}")]
    Heat(BusError),
}

/// What a completed pass did. Failures of the independent stages are
/// collected rather than cutting the pass short.
#[derive(Debug)]
pub struct PassReport {
    pub records: usize,
    pub failures: Vec<PassError>,
}

pub struct CoreSystem<B: BusPort, W: Write> {
    bus: B,
    log: W,
    device_id: Option<String>,
    monitoring: Option<MonitoringTarget>,
    heat_for_seconds: i64,
}

impl<B: BusPort, W: Write> CoreSystem<B, W> {
    pub fn new(
        bus: B,
        log: W,
        device_id: Option<String>,
        monitoring: Option<MonitoringTarget>,
        heat_for_seconds: i64,
    ) -> Self {
        CoreSystem {
            bus,
            log,
            device_id,
            monitoring,
            heat_for_seconds,
        }
    }

    /// Run one scan pass: scan, write the log, export, then heat.
    ///
    /// Only a failed scan ends the pass early, with `Err`. The exporters
    /// and the heat cycle run regardless of each other's outcome.
    #[tracing::instrument(skip_all)]
    pub fn tick(&mut self, pass_timestamp: DateTime<Utc>) -> Result<PassReport, PassError> {
        let records = scan(pass_timestamp, self.device_id.as_deref(), &mut self.bus)
            .map_err(PassError::Scan)?;

        let mut failures = vec![];

        if let Err(e) = write_records(&mut self.log, &records) {
            failures.push(PassError::TabularExport(e));
        }

        match &self.monitoring {
            Some(target) => {
                if let Err(e) = export(target.client.as_ref(), &target.project_id, &records) {
                    failures.push(PassError::MetricExport(e));
                }
            }
            None => debug!("No monitoring target configured. Skipping metric export."),
        }

        if self.heat_for_seconds > 0 {
            if let Err(e) = run_heat_cycle(self.heat_for_seconds as f64, &mut self.bus) {
                failures.push(PassError::Heat(e));
            }
        }

        info!(
            "Pass complete with {} records and {} failures.",
            records.len(),
            failures.len()
        );
        Ok(PassReport {
            records: records.len(),
            failures,
        })
    }

    #[cfg(test)]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    #[cfg(test)]
    pub fn log(&self) -> &W {
        &self.log
    }
}
