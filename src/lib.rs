//! Asynchronous Image-Edit Job Serving
//!
//! Client and worker halves of a queued image-editing service. A client
//! submits base64-encoded images with an edit prompt to a queue endpoint and
//! polls for the generated results; a worker validates, decodes, and runs
//! each job against an inference engine, answering with either the edited
//! images or a uniform error envelope.

pub mod client;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod job;
pub mod middleware;
pub mod server;
pub mod worker;

pub use client::{JobClient, PollConfig};
pub use error::{AppError, ErrorEnvelope, ErrorKind, Result};
pub use job::{EditRequest, JobOutput, JobStatus};
pub use worker::JobHandler;
