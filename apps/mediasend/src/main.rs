//! mediasend: uploads media files and prints their media ids.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mediasend_protocol::MediaId;
use mediasend_upload::{HttpTransport, MediaBatch, UploadEvent};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "mediasend")]
#[command(about = "Upload media through the chunked upload endpoint", version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Log per-chunk and per-poll progress
    #[arg(long)]
    debug: bool,

    /// Media files, uploaded in order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;
    tracing::debug!(url = %config.upload.upload_url(), "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let ids = rt.block_on(run(config, cli.files))?;

    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    println!("{}", ids.join(","));
    Ok(())
}

async fn run(config: AppConfig, files: Vec<PathBuf>) -> anyhow::Result<Vec<MediaId>> {
    let token = config.bearer_token()?;
    let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
        .context("bearer token is not a valid header value")?;
    auth.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);

    let http = reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(concat!("mediasend/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let transport = Arc::new(HttpTransport::new(http, &config.upload));

    let (tx, rx) = mpsc::channel(256);
    let reporter = tokio::spawn(report_events(rx));

    let result = MediaBatch::new(transport, config.upload)
        .with_events(tx)
        .upload_files(&files)
        .await;
    // The batch owned the last sender, so the reporter drains and exits.
    reporter.await.ok();

    result.map_err(|e| {
        let kind = e.kind();
        anyhow::Error::new(e).context(format!("upload failed ({kind:?})"))
    })
}

/// Logs session events as they arrive.
async fn report_events(mut rx: mpsc::Receiver<UploadEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            UploadEvent::Processing {
                state,
                progress_percent,
                check_after_secs,
            } => tracing::info!(
                %state,
                progress = progress_percent.unwrap_or(0),
                check_after_secs,
                "processing"
            ),
            UploadEvent::ChunkCompleted { segment, status } => {
                tracing::debug!(segment, status, "chunk uploaded")
            }
            other => tracing::trace!(event = ?other, "upload event"),
        }
    }
}
