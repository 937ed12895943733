//! Headless document-open agent.
//!
//! Usage: `docwatch-agent [CONFIG_PATH]`
//!
//! Detections are written to stdout as JSON lines; logs go to stderr.

use anyhow::Context;
use docwatch_detect::{new_callback, DetectConfig, DetectEvent, DetectionEngine, Sources};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn print_detection(event: DetectEvent) {
    match event {
        DetectEvent::FileOpened(file) => match serde_json::to_string(&file) {
            Ok(line) => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{line}").and_then(|_| stdout.flush()) {
                    tracing::warn!(error = %e, "Failed to write detection");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize detection"),
        },
        DetectEvent::Error(fault) => {
            tracing::error!(fault = %fault.message, cause = ?fault.cause, "Detection engine error");
        }
    }
}

fn load_config() -> anyhow::Result<DetectConfig> {
    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => match DetectConfig::default_path() {
            Some(path) => path,
            None => {
                tracing::debug!("No config directory, using defaults");
                return Ok(DetectConfig::default());
            }
        },
    };

    DetectConfig::load_or_default(&path)
        .with_context(|| format!("loading config from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,docwatch=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting docwatch agent");

    let config = load_config()?;
    let sources = Sources::platform(&config);
    let mut engine = DetectionEngine::new(config, sources, new_callback(print_detection));

    engine.start();
    if !engine.is_running() {
        anyhow::bail!("detection engine failed to start");
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;

    tracing::info!(status = ?engine.status(), "Shutting down");
    engine.stop();

    Ok(())
}
