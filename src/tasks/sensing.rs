use std::{io::Write, time::Duration};

use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::internals::core::{ports::BusPort, system::CoreSystem};

/// Task: Run a scan pass, then sleep for `sense_delay`, until cancelled.
/// Passes run on the blocking pool since the bus and the heater dwell
/// block. Cancellation is observed between passes only.
#[tracing::instrument(skip_all)]
pub async fn task_sense_periodically<B, W>(
    token: CancellationToken,
    mut system: CoreSystem<B, W>,
    sense_delay: Duration,
    once: bool,
) -> Result<()>
where
    B: BusPort + Send + 'static,
    W: Write + Send + 'static,
{
    info!("Started.");

    loop {
        let (returned, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = system.tick(Utc::now());
            (system, outcome)
        })
        .await?;
        system = returned;

        match outcome {
            Ok(report) => {
                for failure in &report.failures {
                    error!("{}", failure);
                }
                info!("Scanned {} sensors.", report.records);
            }
            Err(e) => error!("{}", e),
        }

        if once {
            info!("Single pass requested. Stopping.");
            break;
        }

        info!(
            "Scan complete, sleeping for {} seconds.",
            sense_delay.as_secs()
        );
        tokio::select! {
            _ = token.cancelled() => {
                warn!("Cancelled.");
                break;
            },
            _ = tokio::time::sleep(sense_delay) => {}
        };
    }

    Ok(())
}
