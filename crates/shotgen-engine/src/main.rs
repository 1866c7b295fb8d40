//! Shot-list generation CLI.
//!
//! Usage: `shotgen [submission.json]`. Reads the batch from stdin when no
//! path is given and prints the per-segment results as JSON.

use std::io::Read;

use anyhow::{Context, Result};
use tracing::{error, info};

use shotgen_engine::logging::init_tracing;
use shotgen_engine::GenerationEngine;
use shotgen_models::BatchSubmission;

#[tokio::main]
async fn main() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        std::process::exit(1);
    }

    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let submission = read_submission()?;
    info!(segments = submission.segments.len(), "Loaded batch submission");

    let engine = GenerationEngine::from_env().await?;

    let results = engine.generate_submission(&submission).await?;

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        info!(failed, total = results.len(), "Some segments failed");
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn read_submission() -> Result<BatchSubmission> {
    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read submission file {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read submission from stdin")?;
            buf
        }
    };

    serde_json::from_str(&raw).context("submission is not a valid BatchSubmission")
}
