use std::any::Any;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// File logging under `log_dir`; the terminal itself belongs to the UI.
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(log_dir: &Path) -> anyhow::Result<impl Any> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .filename_prefix("inst-ratio-dash")
        .filename_suffix("log")
        .max_log_files(7)
        .rotation(Rotation::DAILY)
        .build(log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;
    Ok(guard)
}
