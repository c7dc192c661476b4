use std::io;

use once_cell::sync::OnceCell;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;

static INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone)]
pub enum OutputType {
    Stdout,
    File,
}

#[derive(Debug, Clone)]
pub struct TracingFactoryOptions {
    pub output_type: OutputType,
    pub level: Level,
    pub log_dir: Option<String>,
}

impl Default for TracingFactoryOptions {
    fn default() -> Self {
        TracingFactoryOptions {
            output_type: OutputType::Stdout,
            level: Level::INFO,
            log_dir: None,
        }
    }
}

impl TracingFactoryOptions {
    pub fn new_with_debug(debug: bool) -> Self {
        TracingFactoryOptions {
            level: if debug { Level::DEBUG } else { Level::INFO },
            ..Default::default()
        }
    }
}

/// Initializes the global tracing subscriber exactly once. Subsequent calls
/// are no-ops so components can each call `init_log` defensively at startup.
pub struct TracingFactory;

impl TracingFactory {
    pub fn init_log(debug: bool) {
        Self::init_log_with_options(TracingFactoryOptions::new_with_debug(debug))
    }

    pub fn init_log_with_options(opts: TracingFactoryOptions) {
        INIT.get_or_init(|| {
            let format = tracing_subscriber::fmt::format()
                .with_file(true)
                .with_line_number(false)
                .with_target(false)
                .with_thread_ids(true)
                .with_thread_names(true)
                .compact();

            match opts.output_type {
                OutputType::Stdout => {
                    let _ = tracing_subscriber::fmt()
                        .with_max_level(opts.level)
                        .event_format(format)
                        .try_init();
                }
                OutputType::File => {
                    let dir = opts.log_dir.unwrap_or_else(|| String::from("/tmp/cdc-sync/logs"));
                    let file_appender = rolling::daily(dir, "cdc-sync.log");
                    let writer = file_appender.and(io::stdout);
                    let _ = tracing_subscriber::fmt()
                        .with_max_level(opts.level)
                        .event_format(format)
                        .with_writer(writer)
                        .try_init();
                }
            }
        });
    }

    /// Initializes a quiet, stdout-only subscriber for unit tests.
    pub fn init_test_log() {
        Self::init_log_with_options(TracingFactoryOptions {
            output_type: OutputType::Stdout,
            level: Level::WARN,
            log_dir: None,
        });
    }
}

pub fn init_test_log() {
    TracingFactory::init_test_log();
}
