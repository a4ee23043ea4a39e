mod cli;
mod config;
mod progress;

use std::sync::{mpsc, Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use engine_logging::{engine_info, engine_warn};
use harvester_engine::{write_manifest, ChannelProgressSink, HarvestEngine};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log_destination(), cli.log_level());

    let file_config = match cli.config.as_deref() {
        Some(path) => config::load_file_config(path)?,
        None => config::FileConfig::default(),
    };
    let settings = config::resolve(&cli, file_config)?;
    let output_dir = settings.output_dir.clone();

    let (event_tx, event_rx) = mpsc::channel();
    let progress = progress::spawn_progress_logger(event_rx);

    let engine = HarvestEngine::with_output_dir(settings.engine, output_dir.clone())
        .with_context(|| format!("preparing output directory {}", output_dir.display()))?
        .with_progress_sink(Arc::new(ChannelProgressSink::new(event_tx)));

    let report = if settings.index_urls.is_empty() {
        engine.run_from_catalog_root().await
    } else {
        engine.run(settings.index_urls).await
    };
    // Dropping the engine drops the last event sender and ends the progress thread.
    drop(engine);
    match progress.join() {
        Ok(tally) => engine_info!(
            "{} shards done, {} index pages failed, {} of {} finished downloads saved, {} attempts failed",
            tally.shards_done,
            tally.pages_failed,
            tally.saved,
            tally.finished,
            tally.attempts_failed
        ),
        Err(_) => engine_warn!("Progress logger thread panicked"),
    }

    let manifest = write_manifest(&output_dir, &report, &Utc::now().to_rfc3339())
        .context("writing run manifest")?;
    engine_info!(
        "Saved {} of {} resources; manifest at {:?}",
        report.downloads.saved.len(),
        report.resources,
        manifest
    );
    Ok(())
}
