use std::{fs, path::PathBuf, time::Duration};

use tracing::{debug, warn};
use ureq::{Agent, AgentBuilder};

use crate::{
    internals::core::ports::{MetricServiceError, MetricServicePort},
    models::time_series::CreateTimeSeriesRequest,
};

pub const DEFAULT_MONITORING_ENDPOINT: &str = "https://monitoring.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of the bearer token presented to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessToken {
    /// Used as given for the lifetime of the daemon.
    Fixed(String),

    /// Read again before every request, so whatever refreshes the token
    /// can rewrite the file in place.
    File(PathBuf),
}

impl AccessToken {
    fn resolve(&self) -> Result<String, MetricServiceError> {
        let token = match self {
            AccessToken::Fixed(token) => token.clone(),
            AccessToken::File(path) => fs::read_to_string(path)
                .map_err(|e| {
                    MetricServiceError::Credentials(format!("{}: {}", path.display(), e))
                })?
                .trim()
                .to_string(),
        };
        if token.is_empty() {
            return Err(MetricServiceError::Credentials("Access token is empty.".into()));
        }
        Ok(token)
    }
}

/// Writes time series through the Cloud Monitoring REST API. Obtaining and
/// refreshing the token is left to whoever configures the daemon.
pub struct CloudMonitoringAdapter {
    agent: Agent,
    endpoint: String,
    access_token: AccessToken,
}

impl CloudMonitoringAdapter {
    pub fn new(endpoint: &str, access_token: AccessToken) -> Self {
        Self {
            agent: AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn url_for(&self, request: &CreateTimeSeriesRequest) -> String {
        format!("{}/v3/{}/timeSeries", self.endpoint, request.name)
    }
}

impl MetricServicePort for CloudMonitoringAdapter {
    fn create_time_series(
        &self,
        request: &CreateTimeSeriesRequest,
    ) -> Result<(), MetricServiceError> {
        let access_token = self.access_token.resolve()?;
        let url = self.url_for(request);
        debug!("Posting {} time series to {}.", request.time_series.len(), url);

        match self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", access_token))
            .send_json(request)
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                warn!("Monitoring backend answered {}.", status);
                Err(MetricServiceError::Rejected { status, body })
            }
            Err(e) => Err(MetricServiceError::Transport(e.to_string())),
        }
    }
}
