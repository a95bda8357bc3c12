//! Terminal-state polling with a fixed interval and a deadline
//!
//! The client checks job status every `interval` until a terminal state is
//! observed or `timeout` elapses. Exceeding the deadline surfaces
//! [`AppError::Timeout`], distinct from a FAILED job: the job may still be
//! running server-side, the client simply stops waiting. Dropping a poll has
//! no server-side effect.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{AppError, ErrorEnvelope, ErrorKind, Result};
use crate::job::{JobOutput, JobStatus, StatusResponse};

use super::JobClient;

/// Polling deadline and cadence
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            interval: Duration::from_secs(3),
        }
    }
}

/// Decision for one observed status
#[derive(Debug, PartialEq)]
pub(crate) enum PollStep {
    Wait,
    Done(JobOutput),
}

/// Pure transition: what one status observation means for the poll loop
pub(crate) fn step(response: StatusResponse) -> Result<PollStep> {
    match response.status {
        JobStatus::Queued | JobStatus::Running => Ok(PollStep::Wait),
        JobStatus::Completed => {
            let output = response.output.ok_or_else(|| {
                AppError::Internal(format!(
                    "job {} reported COMPLETED without an output",
                    response.id
                ))
            })?;
            Ok(PollStep::Done(output))
        }
        JobStatus::Failed => {
            let output = response.output.unwrap_or_else(|| {
                JobOutput::Error(ErrorEnvelope {
                    message: format!("job {} failed without details", response.id),
                    kind: ErrorKind::Internal,
                })
            });
            Ok(PollStep::Done(output))
        }
    }
}

impl JobClient {
    /// Poll a job until it is terminal or the deadline elapses
    ///
    /// A COMPLETED job yields its result; a FAILED job yields the carried
    /// error envelope as a value. Only deadline expiry is an `Err`.
    pub async fn poll(&self, job_id: &str, config: &PollConfig) -> Result<JobOutput> {
        let deadline = Instant::now() + config.timeout;

        loop {
            let response = self.status(job_id).await?;
            debug!(job_id, status = ?response.status, "Status check");

            if let PollStep::Done(output) = step(response)? {
                return Ok(output);
            }

            if Instant::now() + config.interval > deadline {
                return Err(AppError::Timeout(format!(
                    "job {} not terminal after {:?}",
                    job_id, config.timeout
                )));
            }
            sleep(config.interval).await;
        }
    }
}
