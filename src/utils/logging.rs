use std::io;
use std::path::Path;
use chrono::Local;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{ RollingFileAppender, Rotation };
use tracing_subscriber::{ fmt::{ self, format::FmtSpan }, filter::LevelFilter, prelude::*, EnvFilter };

use crate::config::{ LogConfig, LogRotation };

/// Keeps the non-blocking writers flushing. Hold it until the process exits.
#[must_use = "dropping the guards stops the background log writers"]
pub struct LogGuards {
    _file: WorkerGuard,
    _console: Option<WorkerGuard>,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Install the global subscriber: a rolling file log always, plus a coloured
/// console log in debug mode. `RUST_LOG` directives are honoured on top of `level`.
pub fn init_logging(level: Level, debug: bool, log_config: &LogConfig) -> io::Result<LogGuards> {
    std::fs::create_dir_all(&log_config.directory)?;

    let filename = format!(
        "{}_{}.log",
        log_config.filename_prefix,
        Local::now().format("%Y%m%d")
    );
    let appender = RollingFileAppender::new(
        log_config.rotation.into(),
        &log_config.directory,
        filename
    );
    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt
        ::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true);

    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::from_level(level).into());

    let console_guard = if debug {
        let (console_writer, console_guard) = tracing_appender::non_blocking(io::stdout());
        let console_layer = fmt
            ::layer()
            .with_writer(console_writer)
            .with_ansi(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);

        tracing_subscriber::registry().with(filter).with(file_layer).with(console_layer).init();
        Some(console_guard)
    } else {
        tracing_subscriber::registry().with(filter).with(file_layer).init();
        None
    };

    if let Some(max_files) = log_config.max_files {
        // Pruning is best effort
        if let Err(e) = cleanup_old_logs(&log_config.directory, &log_config.filename_prefix, max_files) {
            tracing::warn!("Failed to clean up old log files: {}", e);
        }
    }

    tracing::info!(
        log_dir = %log_config.directory.display(),
        log_prefix = %log_config.filename_prefix,
        "Logging initialized at level {}",
        level
    );

    Ok(LogGuards { _file: file_guard, _console: console_guard })
}

/// Keep the `max_files` most recently modified logs with `prefix`, delete the rest
fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_files: usize) -> io::Result<usize> {
    let mut logs = std::fs
        ::read_dir(log_dir)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            let is_log = path.is_file() && path.file_name()?.to_string_lossy().starts_with(prefix);
            if !is_log {
                return None;
            }
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect::<Vec<_>>();

    if logs.len() <= max_files {
        return Ok(0);
    }

    // Newest first
    logs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in logs.iter().skip(max_files) {
        std::fs::remove_file(path)?;
        removed += 1;
    }

    Ok(removed)
}
