//! `arranged`: headless front-end driver.
//!
//! Connects to the backend, runs the orchestrator, reads one JSON intent per
//! line on stdin and prints a state summary line on stdout after each
//! published change.

use std::sync::Arc;

use arrange_core::core::{event_channel, Orchestrator};
use arrange_core::intent::Intent;
use arrange_core::remote::RemoteBackend;
use arrange_core::state::Notification;
use arrange_proto::config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = arrange_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = arrange_proto::platform::log_path();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,arrange_core=debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("arranged log: {}", log_path.display());
    tracing::info!("arranged starting");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("config: {}; using defaults", e);
            Config::default()
        }
    };

    // ── Orchestrator queue + backend ─────────────────────────────────────────
    let (handle, event_rx) = event_channel();
    let backend = RemoteBackend::connect(&config.backend.address, handle.clone()).await?;

    let (broadcast_tx, mut broadcast_rx) = broadcast::channel::<Notification>(1024);
    let orchestrator = Orchestrator::new(config, Arc::new(backend), handle.clone(), broadcast_tx);
    let store = orchestrator.store();
    let core_task = tokio::spawn(orchestrator.run(event_rx));

    // ── Notifications → stdout ───────────────────────────────────────────────
    tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(Notification::StateUpdated { .. }) => {
                    println!("{}", store.get_state().await.summary_line());
                }
                Ok(Notification::PipelineFinished) => println!("pipeline finished"),
                Ok(Notification::ExportFinished { output_path }) => {
                    println!("exported {}", output_path)
                }
                Ok(Notification::CommandFailed { operation, message }) => {
                    println!("{} failed: {}", operation, message)
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("stdout printer lagged by {}", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // ── stdin intents ────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Intent>(line) {
            Ok(intent) => {
                if !handle.intent(intent) {
                    break;
                }
            }
            Err(e) => eprintln!("bad intent: {}", e),
        }
    }

    handle.shutdown();
    core_task.await??;
    tracing::info!("arranged exiting");
    Ok(())
}
