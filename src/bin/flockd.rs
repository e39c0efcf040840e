//! flockd - flockwatch API daemon
//!
//! This daemon:
//! 1. Loads the flock configuration
//! 2. Serves the video-processing boundary (summary runs, uploads, the
//!    annotated-video and CSV artifacts)
//! 3. Processes videos on demand, one run at a time

use anyhow::Result;
use std::sync::mpsc;

use flockwatch::api::ApiServer;
use flockwatch::FlockConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = FlockConfig::load()?;
    log::info!(
        "default input '{}', detector '{}', sample rate {} fps",
        cfg.input_uri,
        cfg.detector.backend,
        cfg.sampling.target_fps
    );

    let api_handle = ApiServer::new(cfg).spawn()?;
    log::info!("flock api listening on {}", api_handle.addr);

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    log::info!("flockd waiting for shutdown signal (Ctrl-C)...");
    let _ = rx.recv();
    log::info!("shutdown signal received, stopping API server...");
    api_handle.stop()?;

    Ok(())
}
