use anyhow::{Context, Result};
use chrono::Utc;
use once_cell::sync::OnceCell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::LoggingConfig;
use crate::constants::MAX_LOG_ENTRIES;

static LOGGING_INSTALLED: OnceCell<()> = OnceCell::new();

/// Install the global `fern` dispatcher described by `config`.
///
/// Does nothing when logging is disabled or a dispatcher was already
/// installed by an earlier call.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }
    let level = config.level_filter()?;

    LOGGING_INSTALLED
        .get_or_try_init(|| {
            let dispatch = fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{}] {:<5} {}: {}",
                        Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .level(level);

            let dispatch = match &config.file {
                Some(path) => dispatch.chain(
                    fern::log_file(path).with_context(|| format!("Failed to open log file: {}", path.display()))?,
                ),
                None => dispatch.chain(std::io::stderr()),
            };

            dispatch.apply().context("A global logger is already installed")
        })
        .map(|_| ())
}

/// Shared in-memory log buffer a host can show in a debug panel
///
/// Holds at most `capacity` entries; the oldest are dropped first.
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Logger {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            logs: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    /// Add a log entry
    pub fn log(&self, message: String) {
        let timestamp = Utc::now().format("%H:%M:%S%.3f").to_string();
        let formatted_message = format!("[{}] {}", timestamp, message);

        if let Ok(mut logs) = self.logs.lock() {
            while logs.len() >= self.capacity {
                logs.pop_front();
            }
            logs.push_back(formatted_message);
        }
    }

    /// Get all logs sorted by date (newest first)
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            logs.iter().rev().cloned().collect()
        } else {
            Vec::new()
        }
    }

    /// Clear all logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
