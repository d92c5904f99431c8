use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "schema-deploy";
const LOG_FILE_SUFFIX: &str = "log";

/// Keeps the non-blocking file writer flushing until dropped.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

// Diagnostics go to stderr; stdout carries the deployment report.
pub fn init_tracing(config: &Config) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(true);

    let file_writer = if config.file_logs {
        match open_log_file(&config.log_dir) {
            Ok(appender) => Some(tracing_appender::non_blocking(appender)),
            Err(err) => {
                eprintln!("file logging disabled, {}: {err}", config.log_dir.display());
                None
            }
        }
    } else {
        None
    };

    let (file_layer, guard) = match file_writer {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard.map(|guard| FileLogGuard { _guard: guard })
}

/// Daily-rotated `schema-deploy.<date>.log` under `dir`, creating it if needed.
pub fn open_log_file(dir: &Path) -> io::Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(dir)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))
}
