use std::path::PathBuf;

use tracing::{Level, Subscriber};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{MakeWriter, time::ChronoUtc},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the application (default: INFO)
    pub level: Level,
    /// Whether to use json format for logs (default: false)
    pub json_format: bool,
    /// Path to store log files. If None, logs only go to stderr
    pub log_dir: Option<String>,
    /// Whether to colorize logs when output is a terminal (default: true)
    pub colorize: bool,
    /// Log file name to use if log_dir is specified
    pub log_file_name: String,
    /// Log targets the level applies to
    pub log_targets: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            log_dir: None,
            colorize: true,
            log_file_name: "stream-translate".to_string(),
            log_targets: vec!["stream_translate".to_string()],
        }
    }
}

/// Keeps the file appender worker thread alive; hold it for the lifetime of
/// the program.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a level name such as "debug" or "WARN".
pub fn parse_level(level: &str) -> Option<Level> {
    level.parse().ok()
}

fn filter_directives(config: &LoggingConfig) -> String {
    let level = config.level.to_string().to_lowercase();
    config
        .log_targets
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn fmt_layer<S, W>(writer: W, ansi: bool, json: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::new(TIME_FORMAT.to_string()));

    if json {
        layer.json().flatten_event(true).boxed()
    } else {
        layer.boxed()
    }
}

/// Initialize the logging system with the given configuration.
///
/// `RUST_LOG` overrides the configured level and targets. If the log
/// directory cannot be created, logging continues on stderr only.
/// Initialization errors, including a subscriber already being set, are
/// ignored.
pub fn init_logging(config: LoggingConfig) -> LogGuard {
    // Forward `log` records to tracing
    let _ = LogTracer::init();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config)));

    let mut layers = vec![fmt_layer(
        std::io::stderr,
        config.colorize,
        config.json_format,
    )];
    let mut file_guard = None;

    if let Some(log_dir) = config.log_dir.as_deref().map(PathBuf::from) {
        match std::fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let file_appender =
                    RollingFileAppender::new(Rotation::DAILY, log_dir, &config.log_file_name);
                let (writer, guard) = tracing_appender::non_blocking(file_appender);
                file_guard = Some(guard);
                layers.push(fmt_layer(writer, false, config.json_format));
            }
            Err(e) => eprintln!(
                "Failed to create log directory {}: {e}; logging to stderr only",
                log_dir.display()
            ),
        }
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init();

    LogGuard {
        _file_guard: file_guard,
    }
}
