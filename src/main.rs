pub mod config;
pub mod externals;
pub mod internals;
pub mod models;
pub mod tasks;

use anyhow::Result;
use clap::Parser;
use config::Config;
use externals::{
    cloud_monitoring::CloudMonitoringModule, hardware::HardwareModule,
    tabular_log::TabularLogModule,
};
use internals::core::system::CoreSystem;
use tasks::sensing::task_sense_periodically;
use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_max_level(config.log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let HardwareModule { bus_adapter } = HardwareModule::initialize(&config)?;
    let TabularLogModule { log } = TabularLogModule::initialize(&config)?;
    let monitoring = CloudMonitoringModule::initialize(&config).map(|module| module.target);

    let system = CoreSystem::new(
        bus_adapter,
        log,
        config.device_id.clone(),
        monitoring,
        config.heat_for_seconds,
    );

    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    let token_clone = token.clone();
    let sense_delay = config.sense_delay();
    let once = config.once;
    tracker.spawn(async move {
        if let Err(e) =
            task_sense_periodically(token_clone.clone(), system, sense_delay, once).await
        {
            tracing::error!("Sensing task failed. Error: {}", e);
        }
        token_clone.cancel();
    });

    let token_clone = token.clone();

    tokio::select! {
        _ = token_clone.cancelled() => {}
        res = signal::ctrl_c() => {
            match res {
                Ok(_) => {
                    tracing::info!("Received ctrl-c. Finishing current pass before exiting.");
                    token.cancel();
                },
                Err(e)=>{
                    tracing::error!("Failed to listen for ctrl_c. Error: {}", e);
                    token.cancel();
                }
            };
        },
    }

    tracker.close();
    tracker.wait().await;

    Ok(())
}
