//! Shared test fixtures: stub engines and image helpers

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use edit_serving::codec::raster;
use edit_serving::engine::{EngineRequest, ImageInput, InferenceEngine};
use edit_serving::error::{AppError, Result};

/// What the stub engine observed for one `generate` call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub input_count: usize,
    pub single_input: bool,
    pub seed: Option<u64>,
    pub num_images: u32,
}

/// Deterministic in-memory engine: output pixels derive from the seed and
/// the image index, so identical requests produce identical results.
#[derive(Default)]
pub struct StubEngine {
    pub calls: Mutex<Vec<RecordedCall>>,
}

#[async_trait]
impl InferenceEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, request: EngineRequest) -> Result<Vec<RgbImage>> {
        let single_input = matches!(request.images, ImageInput::Single(_));
        self.calls.lock().unwrap().push(RecordedCall {
            input_count: request.images.count(),
            single_input,
            seed: request.seed,
            num_images: request.num_images,
        });

        let base = request.seed.unwrap_or(255) as u8;
        Ok((0..request.num_images)
            .map(|i| RgbImage::from_pixel(8, 8, Rgb([base, i as u8, 0])))
            .collect())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Engine that always fails mid-generation
pub struct FailingEngine;

#[async_trait]
impl InferenceEngine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: EngineRequest) -> Result<Vec<RgbImage>> {
        Err(AppError::Engine("CUDA out of memory".to_string()))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// Engine that ignores `num_images` and returns a fixed number of outputs
pub struct MiscountingEngine(pub u32);

#[async_trait]
impl InferenceEngine for MiscountingEngine {
    fn name(&self) -> &str {
        "miscounting"
    }

    async fn generate(&self, _request: EngineRequest) -> Result<Vec<RgbImage>> {
        Ok((0..self.0).map(|_| RgbImage::new(2, 2)).collect())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// A small valid base64 PNG
pub fn png_b64() -> String {
    raster::encode(&RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]))).unwrap()
}
