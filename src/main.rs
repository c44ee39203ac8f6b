//! pagegrid - capture full-page website screenshots for vision-model
//! tiling pipelines.
//!
//! Thin caller around the capture engine: parse arguments, run one
//! capture, write the PNG.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagegrid_capture::{CaptureRequest, WaitUntil};

/// pagegrid CLI.
#[derive(Parser)]
#[command(name = "pagegrid")]
#[command(about = "Capture a full-page website screenshot")]
#[command(version)]
struct Cli {
    /// Page URL to capture (http or https)
    url: String,

    /// Viewport width in CSS pixels
    #[arg(long, default_value_t = 1440)]
    width: u32,

    /// Load-completion strategy: load, domcontentloaded or networkidle
    #[arg(long, default_value = "load")]
    wait_until: WaitUntil,

    /// Extra delay after the wait condition resolves, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Overall capture deadline in milliseconds
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Output PNG path
    #[arg(short, long, default_value = "page.png")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let request = CaptureRequest {
        url: cli.url,
        viewport_width: cli.width,
        wait_until: cli.wait_until,
        delay_ms: cli.delay_ms,
        timeout_ms: cli.timeout_ms,
    };

    let result = pagegrid_capture::capture(request).await?;
    std::fs::write(&cli.output, &result.image)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    info!(
        output = %cli.output.display(),
        width = result.page_width,
        height = result.page_height,
        segments = ?result.segments_stitched,
        "screenshot written"
    );
    Ok(())
}
