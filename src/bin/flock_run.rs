//! flock_run - one-shot video analysis
//!
//! Processes a single video, prints the JSON summary and optionally writes
//! the per-bird CSV report.

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use flockwatch::ui::Ui;
use flockwatch::{pipeline, report, FlockConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Process one video and print the flock summary")]
struct Args {
    /// Video source: a file path (video-opencv builds) or a stub:// URI.
    #[arg(long)]
    input: Option<String>,
    /// Annotated output video path (null:// discards frames).
    #[arg(long)]
    output: Option<String>,
    /// Sampled frames per second.
    #[arg(long)]
    sample_fps: Option<u32>,
    /// Detector backend (stub, synthetic).
    #[arg(long)]
    backend: Option<String>,
    /// Write the per-bird CSV report here.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Progress style: auto, plain or pretty.
    #[arg(long)]
    ui: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = FlockConfig::load()?;
    if let Some(input) = args.input {
        cfg.input_uri = input;
    }
    if let Some(output) = args.output {
        cfg.output_path = output;
    }
    if let Some(fps) = args.sample_fps {
        cfg.sampling.target_fps = fps;
    }
    if let Some(backend) = args.backend {
        cfg.detector.backend = backend;
    }
    cfg.validate()?;

    let ui = Ui::from_args(args.ui.as_deref(), std::io::stderr().is_terminal());
    let stage = ui.stage("processing video");
    let result = pipeline::process_video(&cfg, &cfg.input_uri, &cfg.output_path)?;
    stage.done("processing complete");

    let summary = report::summarize(&cfg.input_uri, &result);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(csv) = args.csv {
        report::write_csv_report(&csv, &result)?;
        log::info!("csv report written to {}", csv.display());
    }

    Ok(())
}
