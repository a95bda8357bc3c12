//! Single-job orchestration: validate, decode, run the engine, encode
//!
//! [`JobHandler::handle`] is the worker-side entry point. It converts every
//! internal failure into an [`ErrorEnvelope`] and never fails past this
//! boundary; the hosting runtime only ever sees a well-formed terminal
//! output.

pub mod validate;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::raster;
use crate::engine::{EngineRequest, ImageInput, InferenceEngine};
use crate::error::{AppError, ErrorEnvelope, Result};
use crate::job::JobOutput;

/// Processes one job at a time against an injected inference engine
///
/// The engine is constructor-time state; per-job parameters (including the
/// generation seed) are scoped to a single `handle` call and never retained.
pub struct JobHandler {
    engine: Arc<dyn InferenceEngine>,
}

impl JobHandler {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self { engine }
    }

    /// Process a single image-editing request
    pub async fn handle(&self, raw: &Value) -> JobOutput {
        match self.run(raw).await {
            Ok(output) => output,
            Err(err) => {
                warn!(engine = %self.engine.name(), error = %err, "Job failed");
                JobOutput::Error(ErrorEnvelope::from(err))
            }
        }
    }

    /// Entry point for `{"input": <raw payload>}` submissions
    pub async fn handle_submission(&self, job: &Value) -> JobOutput {
        match job.get("input") {
            Some(input) => self.handle(input).await,
            None => JobOutput::Error(ErrorEnvelope::from(AppError::MalformedInput(
                "payload must contain an 'input' object".to_string(),
            ))),
        }
    }

    async fn run(&self, raw: &Value) -> Result<JobOutput> {
        let request = validate::validate(raw)?;

        // All-or-nothing: any decode failure aborts the job before the
        // engine is touched.
        let mut decoded = Vec::with_capacity(request.images.len());
        for encoded in &request.images {
            decoded.push(raster::decode(encoded)?);
        }

        let images = if decoded.len() == 1 {
            ImageInput::Single(decoded.remove(0))
        } else {
            ImageInput::Multiple(decoded)
        };

        let seed = (request.seed >= 0).then_some(request.seed as u64);

        debug!(
            engine = %self.engine.name(),
            inputs = images.count(),
            steps = request.steps,
            seed = ?seed,
            num_images = request.num_images,
            "Running edit"
        );

        let outputs = self
            .engine
            .generate(EngineRequest {
                images,
                prompt: request.prompt.clone(),
                negative_prompt: request.negative_prompt.clone(),
                steps: request.steps,
                cfg_scale: request.cfg_scale,
                seed,
                num_images: request.num_images,
            })
            .await?;

        if outputs.len() != request.num_images as usize {
            return Err(AppError::Engine(format!(
                "engine returned {} images, expected {}",
                outputs.len(),
                request.num_images
            )));
        }

        let mut encoded = outputs
            .iter()
            .map(raster::encode)
            .collect::<Result<Vec<_>>>()?;

        // Output-shape mirroring: scalar result only for a scalar request
        // that asked for a single image.
        if request.single_input && request.num_images == 1 {
            Ok(JobOutput::Single {
                image: encoded.remove(0),
            })
        } else {
            Ok(JobOutput::Multiple { images: encoded })
        }
    }
}
