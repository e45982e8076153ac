// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docrect: find and unwarp photographed documents.
//
// Entry point. Initialises logging, builds the scan configuration from the
// command line, and scans each photo in turn. Reports go to stdout as one
// JSON object per line; logs go to stderr.

mod runner;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use docrect_core::config::FailurePolicy;
use docrect_core::error::{DocrectError, Result};
use docrect_core::human_errors::humanize_error;
use docrect_core::{PaperSize, ScanConfig};
use docrect_detect::DocumentScanner;
use tracing::{error, info, warn};

/// Find the page in each photo and straighten it.
#[derive(Parser, Debug)]
#[command(name = "docrect")]
#[command(version, about)]
struct Cli {
    /// JSON scan configuration. Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Paper size the crop should match ('a4', 'letter', or 'WxH' in mm).
    #[arg(long)]
    paper: Option<PaperSize>,

    /// Output height divided by width. Overrides --paper.
    #[arg(long)]
    ratio: Option<f64>,

    /// Report an error when no page is found instead of using the whole photo.
    #[arg(long)]
    strict: bool,

    /// Write each rectified page to this directory as <name>.png.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,

    /// Photos to scan.
    #[arg(required_unless_present = "print_config")]
    images: Vec<PathBuf>,
}

impl Cli {
    /// Layer the command-line overrides on top of the config file (or the
    /// defaults).
    fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)?,
            None => ScanConfig::default(),
        };
        if let Some(paper) = self.paper {
            config.aspect_ratio = paper.aspect_ratio().ok_or_else(|| {
                DocrectError::InvalidConfig(format!("paper size {:?} has no aspect ratio", paper))
            })?;
        }
        if let Some(ratio) = self.ratio {
            config.aspect_ratio = ratio;
        }
        if self.strict {
            config.failure_policy = FailurePolicy::Strict;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(summary) if summary.errors == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(DocrectError::Cancelled) => {
            warn!("Scan cancelled");
            ExitCode::from(130)
        }
        Err(err) => {
            let human = humanize_error(&err);
            error!(error = %err, "docrect failed");
            eprintln!("{} {}", human.message, human.suggestion);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<runner::Summary> {
    let config = cli.scan_config()?;
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(runner::Summary::default());
    }
    if let Some(dir) = &cli.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let scanner = Arc::new(DocumentScanner::new(config)?);
    info!(
        images = cli.images.len(),
        aspect_ratio = config.aspect_ratio,
        "docrect starting"
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current image");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let summary = runner::scan_all(
        scanner,
        cli.images,
        cli.output_dir,
        cancel,
        |report| match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(err) => error!(error = %err, "Report serialisation failed"),
        },
    )
    .await?;
    info!(
        scanned = summary.scanned,
        found = summary.found,
        errors = summary.errors,
        "docrect finished"
    );
    Ok(summary)
}
