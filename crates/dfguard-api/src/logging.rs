//! Tracing subscriber setup.
//!
//! Console output is colored for dev, JSON when `LOG_FORMAT=json`. Setting
//! `LOG_FILE` additionally appends plain-text records to that file so
//! prediction history survives restarts.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "dfguard=info";

/// Log file path from `LOG_FILE`, ignoring blank values.
pub fn log_file_from_env() -> Option<PathBuf> {
    std::env::var("LOG_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Open `path` for appending, creating it if missing.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn file_layer<S>(file: Arc<File>) -> fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, Arc<File>> {
    fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file)
}

/// Install the global subscriber. Call once at startup.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = match DEFAULT_DIRECTIVE.parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    // The subscriber isn't up yet, so a bad path can only go to stderr.
    let log_file = log_file_from_env().and_then(|path| match open_log_file(&path) {
        Ok(file) => Some(Arc::new(file)),
        Err(e) => {
            eprintln!("Failed to open LOG_FILE {}: {}", path.display(), e);
            None
        }
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(log_file.map(file_layer))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(log_file.map(file_layer))
            .with(env_filter)
            .init();
    }
}
