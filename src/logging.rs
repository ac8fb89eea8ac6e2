//! Opt-in file logging for applications that embed the client.
//!
//! The library only emits `tracing` events and never installs a subscriber
//! by itself. A host application with no subscriber of its own can call
//! [`init`] with [`LogOptions`] to write those events to a daily-rotating
//! file. Nothing here reads environment variables; the filter and the
//! directory come from the caller.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Filter used when the caller does not supply one.
pub const DEFAULT_LOG_FILTER: &str = "zotero_client=info,warn";

const LOG_FILE_PREFIX: &str = "zotero-client.log";

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Directory that receives the rotated log files.
    pub directory: PathBuf,
    /// Filter directives in `tracing-subscriber` syntax, e.g.
    /// `zotero_client=debug`.
    pub filter: String,
}

impl LogOptions {
    /// Options writing to the platform local data directory:
    /// - Linux: `~/.local/share/zotero-client/logs/`
    /// - macOS: `~/Library/Application Support/zotero-client/logs/`
    /// - Windows: `C:\Users\<User>\AppData\Local\zotero-client\logs\`
    pub fn platform_default() -> anyhow::Result<Self> {
        Ok(Self::in_directory(default_log_directory()?))
    }

    /// Options writing to `directory` with the default filter.
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Replace the filter directives.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// Install a global subscriber writing to a daily-rotating file.
///
/// `zotero_client=debug` logs every request and profile lookup;
/// `zotero_client=trace` also logs every request log append.
///
/// # Errors
///
/// Returns an error if:
/// - The filter directives do not parse
/// - The log directory cannot be created
/// - A global subscriber is already set
///
/// # Example
///
/// ```no_run
/// use zotero_client::logging::{self, LogOptions};
///
/// # fn main() -> anyhow::Result<()> {
/// let options = LogOptions::platform_default()?.with_filter("zotero_client=debug");
/// logging::init(&options)?;
/// # Ok(())
/// # }
/// ```
pub fn init(options: &LogOptions) -> anyhow::Result<()> {
    let filter = build_filter(&options.filter)?;

    std::fs::create_dir_all(&options.directory).with_context(|| {
        format!("Could not create log directory {}", options.directory.display())
    })?;

    let file_appender =
        RollingFileAppender::new(Rotation::DAILY, &options.directory, LOG_FILE_PREFIX);

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "zotero-client logging started");
    tracing::debug!(log_dir = %options.directory.display(), "Log directory");

    Ok(())
}

fn build_filter(directives: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .with_context(|| format!("Invalid log filter '{}'", directives))
}

fn default_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("zotero-client").join("logs"))
}

/// The platform default log directory, if one can be determined.
pub fn log_directory() -> Option<PathBuf> {
    default_log_directory().ok()
}
