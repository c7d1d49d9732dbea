//! Score a batch file from the command line
//!
//! Usage: calculate_batch <input.json> [output.json]
//!
//! Reference data is read from `DATA_DIR` (default `data/reference`). Without
//! an output path the result is printed to stdout.

use anyhow::{bail, Context, Result};
use ci_scorer_rust::{AppConfig, BatchRequest, CiCalculator, ReferenceDataStore};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ci_scorer_rust=info,tower_http=debug,axum=debug,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input_path, output_path) = match args.as_slice() {
        [input] => (input.as_str(), None),
        [input, output] => (input.as_str(), Some(output.as_str())),
        _ => bail!("usage: calculate_batch <input.json> [output.json]"),
    };

    let config = AppConfig::from_env()?;
    config.log_summary();

    let load_start = Instant::now();
    let store = ReferenceDataStore::load(&config.data_dir)?;
    tracing::info!("Reference data loaded in {:.2?}", load_start.elapsed());

    let raw = std::fs::read_to_string(input_path).with_context(|| format!("Failed to read {}", input_path))?;
    let request: BatchRequest =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse batch request {}", input_path))?;

    let calculator = CiCalculator::new(Arc::new(store));
    let score_start = Instant::now();
    let output = if config.parallel_scoring {
        calculator.calculate_parallel(&request)?
    } else {
        calculator.calculate(&request)?
    };
    tracing::info!(
        "Scored {} records ({} rejected, {} certificates) in {:.2?}",
        output.results_collection.data.len(),
        output.results_collection.rejected.len(),
        output.certificates.len(),
        score_start.elapsed()
    );

    let json = serde_json::to_string_pretty(&output)?;
    match output_path {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path))?;
            tracing::info!("Results written to {}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
