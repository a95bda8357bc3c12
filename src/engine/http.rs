//! HTTP engine client for a sidecar diffusion service

use async_trait::async_trait;
use image::RgbImage;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::codec::raster;
use crate::config::EngineConfig;
use crate::engine::{EngineRequest, ImageInput, InferenceEngine};
use crate::error::{AppError, Result};

/// Engine backed by an HTTP diffusion service on the same host
///
/// The service holds the model weights for the lifetime of the worker
/// process; this client carries no state between jobs beyond the connection
/// pool.
pub struct HttpEngine {
    name: String,
    client: Client,
    base_url: String,
}

/// Wire request for the sidecar generation endpoint
#[derive(Debug, Serialize)]
struct ApiEditRequest {
    prompt: String,
    negative_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    num_inference_steps: u32,
    true_cfg_scale: f32,
    seed: u64,
    num_images_per_prompt: u32,
}

/// Wire response from the sidecar generation endpoint
#[derive(Debug, Deserialize)]
struct ApiEditResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpEngine {
    /// Create a new HTTP engine from configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: config.name.clone(),
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_request(&self, request: &EngineRequest) -> Result<ApiEditRequest> {
        let (image, images) = match &request.images {
            ImageInput::Single(img) => (Some(raster::encode(img)?), None),
            ImageInput::Multiple(imgs) => {
                let encoded = imgs.iter().map(raster::encode).collect::<Result<Vec<_>>>()?;
                (None, Some(encoded))
            }
        };

        // The service wants a concrete seed. A caller that asked for
        // non-deterministic generation gets a freshly drawn one.
        let seed = request
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen::<u32>() as u64);

        Ok(ApiEditRequest {
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            image,
            images,
            num_inference_steps: request.steps,
            true_cfg_scale: request.cfg_scale,
            seed,
            num_images_per_prompt: request.num_images,
        })
    }
}

#[async_trait]
impl InferenceEngine for HttpEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: EngineRequest) -> Result<Vec<RgbImage>> {
        let api_request = self.build_request(&request)?;
        let url = format!("{}/generate", self.base_url);

        debug!(
            engine = %self.name,
            url = %url,
            inputs = request.images.count(),
            seed = api_request.seed,
            "Sending generate request"
        );

        let response = self
            .client
            .post(&url)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| AppError::Engine(format!("connection to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(engine = %self.name, status = %status, "Generate request rejected");
            return Err(AppError::Engine(format!(
                "service returned {}: {}",
                status, body
            )));
        }

        let api_response: ApiEditResponse = response
            .json()
            .await
            .map_err(|e| AppError::Engine(format!("failed to parse response: {}", e)))?;

        if let Some(message) = api_response.error {
            return Err(AppError::Engine(message));
        }

        api_response
            .images
            .iter()
            .map(|b64| {
                raster::decode(b64)
                    .map_err(|e| AppError::Engine(format!("undecodable output image: {}", e)))
            })
            .collect()
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(engine = %self.name, status = %response.status(), "Health check failed");
                false
            }
            Err(e) => {
                debug!(engine = %self.name, error = %e, "Health check failed");
                false
            }
        }
    }
}
