//! Raw payload validation and normalization
//!
//! Pure transform from an untyped job-input payload to a typed
//! [`EditRequest`]. No side effects; identical input yields identical output.

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::job::{
    EditRequest, DEFAULT_CFG_SCALE, DEFAULT_NEGATIVE_PROMPT, DEFAULT_NUM_IMAGES, DEFAULT_SEED,
    DEFAULT_STEPS,
};

/// Validate a raw job input into an [`EditRequest`]
pub fn validate(raw: &Value) -> Result<EditRequest> {
    let (images, single_input) = parse_images(raw)?;
    let prompt = parse_prompt(raw)?;

    let negative_prompt = match raw.get("negative_prompt") {
        None | Some(Value::Null) => DEFAULT_NEGATIVE_PROMPT.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(AppError::MalformedParameter {
                field: "negative_prompt",
                detail: format!("expected a string, got {}", other),
            })
        }
    };

    let steps = coerce_u32(raw, "num_inference_steps", DEFAULT_STEPS)?;
    if steps < 1 {
        return Err(AppError::MalformedParameter {
            field: "num_inference_steps",
            detail: "must be at least 1".to_string(),
        });
    }

    let cfg_scale = coerce_f32(raw, "true_cfg_scale", DEFAULT_CFG_SCALE)?;
    if !cfg_scale.is_finite() || cfg_scale <= 0.0 {
        return Err(AppError::MalformedParameter {
            field: "true_cfg_scale",
            detail: "must be a positive number".to_string(),
        });
    }

    let seed = coerce_i64(raw, "seed", DEFAULT_SEED)?;

    let num_images = coerce_u32(raw, "num_images_per_prompt", DEFAULT_NUM_IMAGES)?;
    if num_images < 1 {
        return Err(AppError::MalformedParameter {
            field: "num_images_per_prompt",
            detail: "must be at least 1".to_string(),
        });
    }

    Ok(EditRequest {
        images,
        single_input,
        prompt,
        negative_prompt,
        steps,
        cfg_scale,
        seed,
        num_images,
    })
}

fn parse_images(raw: &Value) -> Result<(Vec<String>, bool)> {
    if let Some(value) = raw.get("images") {
        let list = value.as_array().ok_or_else(|| {
            AppError::MalformedInput(
                "'images' must be a non-empty list of base64 strings".to_string(),
            )
        })?;
        if list.is_empty() {
            return Err(AppError::MalformedInput(
                "'images' must be a non-empty list of base64 strings".to_string(),
            ));
        }
        let images = list
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    AppError::MalformedInput(
                        "'images' must be a non-empty list of base64 strings".to_string(),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok((images, false));
    }

    if let Some(value) = raw.get("image") {
        let image = value.as_str().ok_or_else(|| {
            AppError::MalformedInput("'image' must be a base64 string".to_string())
        })?;
        return Ok((vec![image.to_string()], true));
    }

    Err(AppError::MissingInput)
}

fn parse_prompt(raw: &Value) -> Result<String> {
    let prompt = raw
        .get("prompt")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if prompt.is_empty() {
        return Err(AppError::MissingPrompt);
    }
    Ok(prompt.to_string())
}

/// Coerce an optional field to u32, accepting integer-valued numbers and
/// numeric strings
fn coerce_u32(raw: &Value, field: &'static str, default: u32) -> Result<u32> {
    let Some(value) = present(raw, field) else {
        return Ok(default);
    };
    if let Some(n) = value.as_u64() {
        if n <= u32::MAX as u64 {
            return Ok(n as u32);
        }
    }
    // Integer-valued floats (e.g. 40.0) coerce the way int() would
    if let Some(f) = value.as_f64() {
        if f >= 0.0 && f <= u32::MAX as f64 && f.fract() == 0.0 {
            return Ok(f as u32);
        }
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.trim().parse::<u32>() {
            return Ok(n);
        }
    }
    Err(malformed(field, value))
}

fn coerce_i64(raw: &Value, field: &'static str, default: i64) -> Result<i64> {
    let Some(value) = present(raw, field) else {
        return Ok(default);
    };
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    if let Some(f) = value.as_f64() {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            return Ok(f as i64);
        }
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.trim().parse::<i64>() {
            return Ok(n);
        }
    }
    Err(malformed(field, value))
}

fn coerce_f32(raw: &Value, field: &'static str, default: f32) -> Result<f32> {
    let Some(value) = present(raw, field) else {
        return Ok(default);
    };
    if let Some(f) = value.as_f64() {
        return Ok(f as f32);
    }
    if let Some(s) = value.as_str() {
        if let Ok(f) = s.trim().parse::<f32>() {
            return Ok(f);
        }
    }
    Err(malformed(field, value))
}

fn present<'a>(raw: &'a Value, field: &str) -> Option<&'a Value> {
    match raw.get(field) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

fn malformed(field: &'static str, value: &Value) -> AppError {
    AppError::MalformedParameter {
        field,
        detail: format!("cannot coerce {} to a number", value),
    }
}
