use tracing::info;

use crate::{config::Config, internals::core::system::MonitoringTarget};

use self::adapters::{AccessToken, CloudMonitoringAdapter};

pub mod adapters;

pub struct CloudMonitoringModule {
    pub target: MonitoringTarget,
}

impl CloudMonitoringModule {
    /// Returns `None` when no project is configured, in which case readings
    /// are only written to the log.
    pub fn initialize(config: &Config) -> Option<Self> {
        let access_token = match (&config.access_token, &config.access_token_file) {
            (Some(token), _) => Some(AccessToken::Fixed(token.clone())),
            (None, Some(path)) => Some(AccessToken::File(path.clone())),
            (None, None) => None,
        };
        let (project_id, access_token) = match (&config.project_id, access_token) {
            (Some(project_id), Some(access_token)) => (project_id, access_token),
            _ => {
                info!("No monitoring project configured. Metric export disabled.");
                return None;
            }
        };

        info!("Exporting metrics to project {}.", project_id);
        Some(Self {
            target: MonitoringTarget {
                client: Box::new(CloudMonitoringAdapter::new(
                    &config.monitoring_endpoint,
                    access_token,
                )),
                project_id: project_id.clone(),
            },
        })
    }
}
