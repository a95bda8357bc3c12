//! Job submission and lifecycle client for the queue endpoint

pub mod output;
pub mod poll;

pub use poll::PollConfig;

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use crate::job::{EditRequest, JobSubmission, StatusResponse, SubmitResponse};

/// HTTP client for the queue submission and status endpoints
///
/// Transport and auth failures surface as [`AppError::Transport`]; they are
/// never converted into a job error envelope, since they describe
/// client-to-queue communication rather than job execution.
pub struct JobClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl JobClient {
    /// Create a new client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Submit a job; returns the queue-assigned identifier
    ///
    /// Not retried automatically: resubmission creates a new job identity,
    /// and a seed of -1 yields a different result each time.
    pub async fn submit(&self, request: &EditRequest) -> Result<String> {
        let url = format!("{}/run", self.endpoint);
        let body = JobSubmission {
            input: request.to_payload(),
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let submitted: SubmitResponse = response.json().await?;
        debug!(job_id = %submitted.id, "Job submitted");
        Ok(submitted.id)
    }

    /// Query the current status of a job
    pub async fn status(&self, job_id: &str) -> Result<StatusResponse> {
        let url = format!("{}/status/{}", self.endpoint, job_id);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Submit and block until the job is terminal, in one call
    pub async fn run_sync(&self, request: &EditRequest) -> Result<StatusResponse> {
        let url = format!("{}/runsync", self.endpoint);
        let body = JobSubmission {
            input: request.to_payload(),
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
