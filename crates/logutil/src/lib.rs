//! Utilities for logging.

use std::io;

use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    HumanReadable,
    Json,
    Compact,
}

/// Configure the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn configure_global_logger<W>(default_level: Level, format: LogFormat, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if let Err(e) = try_configure_global_logger(default_level, format, writer) {
        // Already configured, likely from a test.
        eprintln!("Failed to configure global logger: {e}");
    }
}

fn try_configure_global_logger<W>(
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> Result<(), SetGlobalDefaultError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_thread_ids(true);

    match format {
        LogFormat::HumanReadable => {
            tracing::subscriber::set_global_default(builder.with_file(true).finish())
        }
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.compact().finish()),
    }
}

/// Initialize a logger for tests.
///
/// Safe to call from every test, only the first call installs the subscriber.
pub fn init_test() {
    let _ = try_configure_global_logger(Level::DEBUG, LogFormat::Compact, io::stderr);
}
