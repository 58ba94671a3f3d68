//! Subsystem log and tracing bootstrap.
//!
//! # Responsibility
//! - [`SubsystemLog`] is the line-oriented log the manager is handed at
//!   construction. It owns one file, truncated when the log is created.
//! - [`init_tracing`] installs the process-wide `tracing` subscriber for hosts
//!   that do not bring their own.
//!
//! # Invariants
//! - Writing to the log never panics and never returns an error to the caller.
//! - Every line written to the file is also emitted as a `tracing` event.

use chrono::Local;
use once_cell::sync::OnceCell;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MAX_MESSAGE_CHARS: usize = 160;

static TRACING_INSTALLED: OnceCell<()> = OnceCell::new();

/// Installs a `tracing` subscriber reading `RUST_LOG`, falling back to `default_filter`.
///
/// Calling this more than once is a no-op. Returns `false` when another
/// subscriber was already installed by the host.
pub fn init_tracing(default_filter: &str) -> bool {
    let mut installed = false;
    TRACING_INSTALLED.get_or_init(|| {
        installed = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok();
    });
    installed
}

/// Append-only log for one subsystem.
#[derive(Debug, Clone)]
pub struct SubsystemLog {
    file_path: Option<PathBuf>,
    write_to_console: bool,
}

impl SubsystemLog {
    /// Create a log backed by `file_path`, deleting any previous contents.
    pub fn new(file_path: impl AsRef<Path>, write_to_console: bool) -> io::Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::File::create(&file_path)?;

        Ok(Self {
            file_path: Some(file_path),
            write_to_console,
        })
    }

    /// A log that only mirrors to the console and `tracing`.
    pub fn console_only() -> Self {
        Self {
            file_path: None,
            write_to_console: true,
        }
    }

    /// A log that only emits `tracing` events.
    pub fn silent() -> Self {
        Self {
            file_path: None,
            write_to_console: false,
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn info(&self, message: &str) {
        tracing::info!(target: "spectrum", "{message}");
        self.write_line(&format!("[i][{}] {}", timestamp(), message));
    }

    pub fn error(&self, message: &str) {
        tracing::error!(target: "spectrum", "{message}");
        self.write_line(&format!("[!][{}] {}", timestamp(), message));
    }

    /// Log an error together with its cause chain.
    pub fn exception(&self, error: &anyhow::Error) {
        tracing::error!(target: "spectrum", "{error:#}");
        self.write_line(&format!("[e][{}] {}", timestamp(), error));

        let mut causes = error.chain().skip(1).peekable();
        if causes.peek().is_some() {
            self.write_line("   Caused by:");
            for cause in causes {
                self.write_line(&format!("      {}", sanitize_message(&cause.to_string())));
            }
        }
    }

    fn write_line(&self, text: &str) {
        if let Some(path) = &self.file_path {
            let written = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| writeln!(file, "{text}"));
            if let Err(e) = written {
                tracing::warn!("Failed to write log file {}: {}", path.display(), e);
            }
        }

        if self.write_to_console {
            println!("{text}");
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Flatten a message to one line and cap its length.
pub(crate) fn sanitize_message(value: &str) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(MAX_MESSAGE_CHARS).collect::<String>();
    if normalized.chars().count() > MAX_MESSAGE_CHARS {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use tempfile::tempdir;

    #[test]
    fn new_truncates_existing_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("manager.log");
        fs::write(&path, "stale line\n").unwrap();

        let log = SubsystemLog::new(&path, false).unwrap();
        log.info("fresh");

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale line"));
        assert!(content.starts_with("[i]["));
        assert!(content.trim_end().ends_with("fresh"));
    }

    #[test]
    fn severities_use_distinct_markers() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("logs").join("manager.log");
        let log = SubsystemLog::new(&path, false).unwrap();

        log.info("hello");
        log.error("broken");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[i]["));
        assert!(lines[1].starts_with("[!]["));
    }

    #[test]
    fn exception_writes_cause_chain() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("manager.log");
        let log = SubsystemLog::new(&path, false).unwrap();

        let error = Err::<(), _>(io::Error::new(io::ErrorKind::NotFound, "missing.lua"))
            .context("script failed")
            .unwrap_err();
        log.exception(&error);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[e]["));
        assert!(content.contains("script failed"));
        assert!(content.contains("Caused by:"));
        assert!(content.contains("missing.lua"));
    }

    #[test]
    fn init_tracing_only_installs_once() {
        init_tracing("spectrum=debug");
        assert!(!init_tracing("spectrum=debug"));
    }

    #[test]
    fn silent_log_has_no_file() {
        let log = SubsystemLog::silent();
        log.error("nowhere to go");
        assert!(log.file_path().is_none());
    }

    #[test]
    fn sanitize_message_removes_newlines_and_truncates() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 10);
        let sanitized = sanitize_message(&format!("line1\n{long}"));
        assert!(!sanitized.contains('\n'));
        assert!(sanitized.ends_with("..."));
    }
}
