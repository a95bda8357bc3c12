//! CLI for submitting an image-edit job and saving the result

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use edit_serving::client::{output, JobClient, PollConfig};
use edit_serving::codec::base64;
use edit_serving::config::ClientConfig;
use edit_serving::job::{EditRequest, JobOutput};

#[derive(Debug, Parser)]
#[command(name = "edit-client", about = "Submit an image edit job and wait for the result")]
struct Args {
    /// Queue endpoint base URL
    #[arg(long, env = "EDIT_SERVING_ENDPOINT")]
    endpoint: String,

    /// API key for the queue endpoint
    #[arg(long, env = "EDIT_SERVING_API_KEY")]
    api_key: Option<String>,

    /// Input image paths (1-3)
    #[arg(required = true, num_args = 1..=3)]
    images: Vec<PathBuf>,

    /// Edit prompt
    #[arg(long)]
    prompt: String,

    /// Negative prompt
    #[arg(long)]
    negative_prompt: Option<String>,

    /// Inference steps
    #[arg(long, default_value_t = 40)]
    steps: u32,

    /// True CFG scale
    #[arg(long, default_value_t = 4.0)]
    cfg_scale: f32,

    /// Seed (-1 = random)
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    seed: i64,

    /// Number of images to generate
    #[arg(long, default_value_t = 1)]
    num_images: u32,

    /// Directory to save results
    #[arg(long, default_value = "./output")]
    output_dir: PathBuf,

    /// Submit via /runsync instead of polling
    #[arg(long)]
    sync: bool,

    /// Polling deadline in seconds
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,

    /// Delay between status checks in seconds
    #[arg(long, default_value_t = 3)]
    interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let args = Args::parse();

    let mut encoded = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        println!("Loaded {} ({} bytes)", path.display(), bytes.len());
        encoded.push(base64::encode(&bytes));
    }

    let mut request = if encoded.len() == 1 {
        EditRequest::single(encoded.remove(0), args.prompt.as_str())
    } else {
        EditRequest::multi(encoded, args.prompt.as_str())
    };
    if let Some(negative) = &args.negative_prompt {
        request.negative_prompt = negative.clone();
    }
    request.steps = args.steps;
    request.cfg_scale = args.cfg_scale;
    request.seed = args.seed;
    request.num_images = args.num_images;

    let client = JobClient::new(&ClientConfig {
        endpoint: args.endpoint.clone(),
        api_key: args.api_key.clone(),
        ..ClientConfig::default()
    })?;

    let output = if args.sync {
        println!("Submitting job (sync) ...");
        let response = client.run_sync(&request).await?;
        response
            .output
            .context("terminal response carried no output")?
    } else {
        println!("Submitting job ...");
        let job_id = client.submit(&request).await?;
        println!("Job ID: {job_id}");

        client
            .poll(
                &job_id,
                &PollConfig {
                    timeout: Duration::from_secs(args.timeout_secs),
                    interval: Duration::from_secs(args.interval_secs),
                },
            )
            .await?
    };

    if let JobOutput::Error(envelope) = &output {
        bail!("worker error ({:?}): {}", envelope.kind, envelope.message);
    }

    let paths = output::save_output(&output, &args.output_dir).await?;
    for path in paths {
        println!("Saved: {}", path.display());
    }
    println!("Done!");

    Ok(())
}
