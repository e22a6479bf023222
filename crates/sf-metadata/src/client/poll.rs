use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use super::MetadataClient;
use crate::deploy::{DeployOptions, DeployOutcome, DeployState};
use crate::error::Result;
use crate::package::DeployPackage;

/// Poll budget for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Total time allowed before the deployment is reported as timed out.
    pub timeout: Duration,
    /// Delay between status requests.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            interval: Duration::from_secs(5),
        }
    }
}

impl PollConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// Watches a deployment until it reaches a terminal state.
#[derive(Debug, Clone)]
pub struct DeployMonitor {
    client: MetadataClient,
    config: PollConfig,
}

impl DeployMonitor {
    pub fn new(client: MetadataClient, config: PollConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// One status request, mapped to an outcome. The outcome may still be
    /// `Pending` or `InProgress`.
    pub async fn check(&self, job_id: &str) -> Result<DeployOutcome> {
        let result = self.client.check_status(job_id).await?;
        Ok(DeployOutcome::from_result(job_id, &result))
    }

    /// Poll until the job is terminal or the deadline passes.
    ///
    /// Never fails. A status read that errors says nothing about the job,
    /// so every read error is retried on the next interval; if the deadline
    /// passes first the outcome is `TimedOut` with the last read error as
    /// its diagnostic.
    #[instrument(skip(self), fields(timeout = ?self.config.timeout))]
    pub async fn poll(&self, job_id: &str) -> DeployOutcome {
        let deadline = Instant::now() + self.config.timeout;
        let mut last: Option<DeployOutcome> = None;
        let mut last_error: Option<String> = None;

        loop {
            match self.check(job_id).await {
                Ok(outcome) if outcome.state.is_terminal() => {
                    info!(
                        job_id,
                        state = %outcome.state,
                        deployed = ?outcome.number_components_deployed,
                        total = ?outcome.number_components_total,
                        "Deploy finished"
                    );
                    return outcome;
                }
                Ok(outcome) => {
                    debug!(
                        job_id,
                        status = ?outcome.remote_status,
                        deployed = ?outcome.number_components_deployed,
                        total = ?outcome.number_components_total,
                        "Deploy in progress"
                    );
                    last_error = None;
                    last = Some(DeployOutcome {
                        state: DeployState::InProgress,
                        ..outcome
                    });
                }
                Err(e) => {
                    warn!(
                        job_id,
                        error = %e,
                        transient = e.is_retryable(),
                        "Could not read deploy status, will retry"
                    );
                    last_error = Some(e.to_string());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(job_id, "Deploy polling timed out");
                let mut outcome = DeployOutcome::timed_out(job_id, last);
                if last_error.is_some() {
                    outcome.error_message = last_error;
                }
                return outcome;
            }
            sleep(self.config.interval.min(deadline - now)).await;
        }
    }
}

impl MetadataClient {
    /// Submit a package and poll it to completion.
    pub async fn deploy(
        &self,
        package: &DeployPackage,
        options: &DeployOptions,
        config: PollConfig,
    ) -> Result<DeployOutcome> {
        let job = self.submit_with_options(package, options).await?;
        Ok(self.monitor(config).poll(&job.id).await)
    }
}
