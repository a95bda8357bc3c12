//! Materializes terminal job output to disk

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::codec::base64;
use crate::error::{AppError, Result};
use crate::job::JobOutput;

/// Write every returned image under `dir` as a PNG file
///
/// A scalar-shaped result becomes `result.png`; a list-shaped result becomes
/// `result_0.png`, `result_1.png`, ... An error output is surfaced as the
/// engine failure it carries.
pub async fn save_output(output: &JobOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    let images: Vec<(&str, PathBuf)> = match output {
        JobOutput::Error(envelope) => return Err(AppError::Engine(envelope.message.clone())),
        JobOutput::Single { image } => vec![(image.as_str(), dir.join("result.png"))],
        JobOutput::Multiple { images } => images
            .iter()
            .enumerate()
            .map(|(i, image)| (image.as_str(), dir.join(format!("result_{}.png", i))))
            .collect(),
    };

    fs::create_dir_all(dir).await?;

    let mut paths = Vec::with_capacity(images.len());
    for (encoded, path) in images {
        let bytes = base64::decode(encoded)?;
        fs::write(&path, &bytes).await?;
        debug!(path = ?path, size = bytes.len(), "Saved image file");
        paths.push(path);
    }
    Ok(paths)
}
