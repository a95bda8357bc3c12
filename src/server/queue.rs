//! In-process job queue with a single worker task
//!
//! Jobs move QUEUED -> RUNNING -> COMPLETED | FAILED. Terminal states are
//! written once and never touched again. The worker task owns the handler
//! (and through it the engine) and processes jobs strictly one at a time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::error::{AppError, Result};
use crate::job::{JobOutput, JobStatus};
use crate::worker::JobHandler;

/// Job with an optional completion channel for synchronous submissions
struct QueuedJob {
    id: Uuid,
    input: Value,
    done_tx: Option<oneshot::Sender<JobOutput>>,
}

/// Stored state of one submitted job
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: Uuid,
    pub status: JobStatus,
    pub output: Option<JobOutput>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Queue front-end shared with the HTTP routes
pub struct JobQueue {
    jobs: Arc<DashMap<Uuid, JobRecord>>,
    job_tx: mpsc::Sender<QueuedJob>,
}

impl JobQueue {
    /// Create a new queue with default configuration
    pub fn new(handler: JobHandler) -> Self {
        Self::with_config(handler, QueueConfig::default())
    }

    /// Create a new queue and start its worker task
    pub fn with_config(handler: JobHandler, config: QueueConfig) -> Self {
        let (job_tx, job_rx) = mpsc::channel(config.max_queue_size);
        let jobs = Arc::new(DashMap::new());

        tokio::spawn(Self::process_jobs(job_rx, handler, jobs.clone()));

        Self { jobs, job_tx }
    }

    /// Enqueue a job; returns the queue-assigned identifier
    pub fn submit(&self, input: Value) -> Result<Uuid> {
        let id = self.enqueue(input, None)?;
        debug!(job_id = %id, "Job queued");
        Ok(id)
    }

    /// Enqueue a job and wait for its terminal output in one call
    pub async fn submit_and_wait(&self, input: Value) -> Result<(Uuid, JobOutput)> {
        let (done_tx, done_rx) = oneshot::channel();
        let id = self.enqueue(input, Some(done_tx))?;
        debug!(job_id = %id, "Job queued (sync)");

        let output = done_rx
            .await
            .map_err(|_| AppError::Internal("Worker stopped before the job finished".to_string()))?;
        Ok((id, output))
    }

    fn enqueue(&self, input: Value, done_tx: Option<oneshot::Sender<JobOutput>>) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.jobs.insert(
            id,
            JobRecord {
                id,
                status: JobStatus::Queued,
                output: None,
                created_at: Utc::now(),
                finished_at: None,
            },
        );

        self.job_tx
            .try_send(QueuedJob { id, input, done_tx })
            .map_err(|_| {
                self.jobs.remove(&id);
                AppError::Internal("Job queue is full".to_string())
            })?;
        Ok(id)
    }

    /// Look up the current record of a job
    pub fn get(&self, id: &Uuid) -> Option<JobRecord> {
        self.jobs.get(id).map(|record| record.value().clone())
    }

    /// Number of jobs not yet terminal
    pub fn active_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|record| !record.value().status.is_terminal())
            .count()
    }

    async fn process_jobs(
        mut job_rx: mpsc::Receiver<QueuedJob>,
        handler: JobHandler,
        jobs: Arc<DashMap<Uuid, JobRecord>>,
    ) {
        // One job at a time: the engine is exclusively owned by the
        // in-flight job.
        while let Some(job) = job_rx.recv().await {
            if let Some(mut record) = jobs.get_mut(&job.id) {
                record.status = JobStatus::Running;
            }
            debug!(job_id = %job.id, "Job running");

            let output = handler.handle(&job.input).await;

            let status = if output.is_error() {
                JobStatus::Failed
            } else {
                JobStatus::Completed
            };

            if let Some(mut record) = jobs.get_mut(&job.id) {
                record.status = status;
                record.output = Some(output.clone());
                record.finished_at = Some(Utc::now());
            }
            info!(job_id = %job.id, status = ?status, "Job finished");

            if let Some(done_tx) = job.done_tx {
                let _ = done_tx.send(output);
            }
        }
    }
}
