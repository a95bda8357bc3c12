//! Job lifecycle types shared by the worker, the queue server, and the client

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ErrorEnvelope;

/// Default number of inference steps
pub const DEFAULT_STEPS: u32 = 40;
/// Default classifier-free guidance scale
pub const DEFAULT_CFG_SCALE: f32 = 4.0;
/// Seed sentinel requesting non-deterministic generation
pub const DEFAULT_SEED: i64 = -1;
/// Default number of output images per prompt
pub const DEFAULT_NUM_IMAGES: u32 = 1;
/// Default negative prompt: a single space, i.e. no negative guidance text
pub const DEFAULT_NEGATIVE_PROMPT: &str = " ";

/// Validated image-edit request
///
/// `images` holds the transport-form (base64) input images; `single_input`
/// records whether the caller used the scalar `image` field, which drives the
/// output-shape mirroring contract.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub images: Vec<String>,
    pub single_input: bool,
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub cfg_scale: f32,
    pub seed: i64,
    pub num_images: u32,
}

impl EditRequest {
    /// Request built around one base64 image and default parameters
    pub fn single(image: String, prompt: impl Into<String>) -> Self {
        Self {
            images: vec![image],
            single_input: true,
            prompt: prompt.into(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            steps: DEFAULT_STEPS,
            cfg_scale: DEFAULT_CFG_SCALE,
            seed: DEFAULT_SEED,
            num_images: DEFAULT_NUM_IMAGES,
        }
    }

    /// Request built around a list of base64 images and default parameters
    pub fn multi(images: Vec<String>, prompt: impl Into<String>) -> Self {
        Self {
            images,
            single_input: false,
            prompt: prompt.into(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            steps: DEFAULT_STEPS,
            cfg_scale: DEFAULT_CFG_SCALE,
            seed: DEFAULT_SEED,
            num_images: DEFAULT_NUM_IMAGES,
        }
    }

    /// Transport-form payload with the wire field names the workers accept
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({
            "prompt": self.prompt,
            "negative_prompt": self.negative_prompt,
            "num_inference_steps": self.steps,
            "true_cfg_scale": self.cfg_scale,
            "seed": self.seed,
            "num_images_per_prompt": self.num_images,
        });
        if self.single_input {
            payload["image"] = json!(self.images[0]);
        } else {
            payload["images"] = json!(self.images);
        }
        payload
    }
}

/// Queue job state. Terminal states are immutable and final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Terminal worker output: exactly one of a scalar-shaped result, a
/// list-shaped result, or an error envelope. The shape mirrors the request:
/// scalar iff the caller used the `image` field and asked for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    Error(ErrorEnvelope),
    Single { image: String },
    Multiple { images: Vec<String> },
}

impl JobOutput {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Submission body: `{"input": <raw payload>}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSubmission {
    pub input: Value,
}

/// Response to a `/run` submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

/// Response to a `/status/{id}` query (also the `/runsync` response shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JobOutput>,
}
