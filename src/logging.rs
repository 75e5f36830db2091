// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Logging bootstrap
//!
//! CLI mode writes the application log to a timestamped file under the
//! configured log directory so stdout stays clean for user-facing text.
//! Web mode logs to stderr only (12-factor; no file).

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Where application logs go
pub enum LogMode {
    /// Log to a file under the directory (CLI mode)
    File {
        dir: PathBuf,
        filename: Option<String>,
    },
    /// Log to stderr (web mode)
    Stderr,
}

/// Initialize the global tracing subscriber
///
/// Returns the appender guard in file mode; dropping it flushes pending
/// log lines, so the caller holds it for the process lifetime.
pub fn init(level: &str, mode: LogMode) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    match mode {
        LogMode::File { dir, filename } => {
            std::fs::create_dir_all(&dir)?;
            let filename = filename.unwrap_or_else(default_log_filename);
            let appender = tracing_appender::rolling::never(&dir, filename);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        LogMode::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Timestamped log file name
fn default_log_filename() -> String {
    format!(
        "maestro-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    )
}

/// Split an explicit log file path into (dir, filename) for file mode
pub fn split_log_file(path: &Path) -> (PathBuf, Option<String>) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string());
    (dir, filename)
}
