//! Inference engine capability consumed by the job handler

pub mod http;

use async_trait::async_trait;
use image::RgbImage;

use crate::error::Result;

/// Image argument shape for one engine invocation
///
/// Exactly one decoded input image is passed as `Single`, more than one as
/// `Multiple`. This shapes how the engine receives its image argument, not
/// the request semantics.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Single(RgbImage),
    Multiple(Vec<RgbImage>),
}

impl ImageInput {
    pub fn count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(images) => images.len(),
        }
    }
}

/// Parameters for one generation call
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub images: ImageInput,
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub cfg_scale: f32,
    /// `None` requests non-deterministic generation
    pub seed: Option<u64>,
    pub num_images: u32,
}

/// Trait for image-edit inference engines
///
/// The engine is exclusively owned by one in-flight job at a time; callers
/// must not invoke `generate` concurrently unless the implementation is
/// reentrant. Generation is all-or-nothing: on failure no partial result is
/// returned.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Get the engine name
    fn name(&self) -> &str;

    /// Run one edit and return the generated images
    async fn generate(&self, request: EngineRequest) -> Result<Vec<RgbImage>>;

    /// Check if the engine is ready to accept work
    async fn health_check(&self) -> bool;
}
