//! CLI progress reporting.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty)
    }

    /// Start a named stage: a spinner on interactive terminals, a log line
    /// otherwise.
    pub fn stage(&self, name: &str) -> StageGuard {
        let pretty = match self.mode {
            UiMode::Pretty => true,
            UiMode::Plain => false,
            UiMode::Auto => self.is_tty,
        };
        let spinner = if pretty {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(name.to_string());
            Some(spinner)
        } else {
            log::info!("{}...", name);
            None
        };
        StageGuard {
            spinner,
            name: name.to_string(),
            started: Instant::now(),
        }
    }
}

pub struct StageGuard {
    spinner: Option<ProgressBar>,
    name: String,
    started: Instant,
}

impl StageGuard {
    pub fn done(self, message: &str) {
        let elapsed = self.started.elapsed();
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(format!("{message} ({elapsed:.1?})")),
            None => log::info!("{}: {} ({:.1?})", self.name, message, elapsed),
        }
    }
}
