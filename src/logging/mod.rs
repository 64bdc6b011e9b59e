//! Logging setup and raw traffic logs.
//!
//! Diagnostics go through `tracing`. Separately, a [`TrafficLog`] can record
//! every raw protocol line to daily files named `<label>_<date>.log` in the
//! configured log directory (default: `~/.local/share/ferric-irc/logs/`).

use anyhow::{anyhow, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Install the global `tracing` subscriber. `level` is a level name such as
/// `info` or `debug`.
pub fn init_tracing(level: &str) -> Result<()> {
    let level = tracing::Level::from_str(level.trim())
        .map_err(|_| anyhow!("invalid log level {:?}", level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Inbound => "<<",
            Direction::Outbound => ">>",
        }
    }
}

/// Appends raw lines to a per-day file. If the file cannot be opened the
/// line is dropped and a warning is logged once per day.
pub struct TrafficLog {
    log_dir: PathBuf,
    label: String,
    current: Option<(String, File)>,
    failed_date: Option<String>,
}

impl TrafficLog {
    /// `label` names the files, usually the server name. `~` at the start of
    /// `log_dir` is expanded to the home directory.
    pub fn new(log_dir: &str, label: &str) -> Self {
        Self {
            log_dir: expand_home(log_dir),
            label: sanitize_label(label),
            current: None,
            failed_date: None,
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn record(&mut self, direction: Direction, line: &str) {
        let now = chrono::Local::now();
        let date = now.format("%Y-%m-%d").to_string();

        let stale = !matches!(&self.current, Some((open_date, _)) if *open_date == date);
        if stale {
            self.current = None;
            if self.failed_date.as_deref() == Some(date.as_str()) {
                return;
            }
            match self.open(&date) {
                Ok(file) => self.current = Some((date.clone(), file)),
                Err(e) => {
                    tracing::warn!(dir = %self.log_dir.display(), error = %e, "cannot open traffic log");
                    self.failed_date = Some(date);
                    return;
                }
            }
        }

        if let Some((_, file)) = self.current.as_mut() {
            let _ = writeln!(file, "[{}] {} {}", now.format("%H:%M:%S"), direction.arrow(), line);
        }
    }

    fn open(&self, date: &str) -> std::io::Result<File> {
        fs::create_dir_all(&self.log_dir)?;
        let path = self.log_dir.join(format!("{}_{}.log", self.label, date));
        OpenOptions::new().create(true).append(true).open(path)
    }
}

fn expand_home(dir: &str) -> PathBuf {
    match dir.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(dir)),
        None => PathBuf::from(dir),
    }
}

fn sanitize_label(label: &str) -> String {
    let safe: String = label
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    if safe.is_empty() {
        "irc".to_string()
    } else {
        safe
    }
}
