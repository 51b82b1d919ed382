//! Subscriber setup for the `lgdf-report` binary.
//!
//! Logging is configured once from the command line: a level filter, an
//! optional stderr console layer and an optional append-only log file.

use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self, FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Filter used when neither `RUST_LOG` nor `--log-level` is given.
pub const DEFAULT_FILTER: &str = "info,lgdf_report=debug";

/// Startup logging choices.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions<'a> {
    /// A bare level ("debug") or any EnvFilter directive. Overrides `RUST_LOG`.
    pub level: Option<&'a str>,
    /// Suppress the stderr console layer. File logging is unaffected.
    pub quiet: bool,
    /// Append log lines to this file, created if missing.
    pub file: Option<&'a Path>,
}

struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");

        if writer.has_ansi_escapes() {
            let color = match *meta.level() {
                Level::ERROR => "\x1b[1;31m",
                Level::WARN => "\x1b[1;33m",
                Level::INFO => "\x1b[1;32m",
                Level::DEBUG => "\x1b[1;34m",
                Level::TRACE => "\x1b[1;35m",
            };
            write!(
                writer,
                "\x1b[2m{stamp}\x1b[0m {color}{:>5}\x1b[0m \x1b[36m{}\x1b[0m ",
                meta.level(),
                meta.target()
            )?;
        } else {
            write!(writer, "{stamp} {:>5} {} ", meta.level(), meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// `level`, else `RUST_LOG`, else [`DEFAULT_FILTER`].
fn build_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"))
        }
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Installs the global subscriber.
///
/// The console layer writes to stderr, so tables and CSV on stdout stay
/// clean, and is colored only when stderr is a terminal.
///
/// # Errors
///
/// Fails on an invalid level, an unopenable log file, or when a global
/// subscriber is already installed.
pub fn init_logging(options: &LogOptions<'_>) -> Result<()> {
    let filter = build_filter(options.level)?;

    let console = (!options.quiet).then(|| {
        fmt::layer()
            .event_format(LocalFmt)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
    });

    let file = match options.file {
        Some(path) => {
            let log_file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            Some(
                fmt::layer()
                    .event_format(LocalFmt)
                    .with_ansi(false)
                    .with_writer(Mutex::new(log_file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("logging is already initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_levels_and_directives_are_accepted() {
        assert!(build_filter(Some("debug")).is_ok());
        assert!(build_filter(Some("warn,lgdf_core=trace")).is_ok());
    }

    #[test]
    fn bad_level_names_the_input() {
        let err = build_filter(Some("lgdf_core=loud")).unwrap_err();

        assert!(err.to_string().contains("lgdf_core=loud"));
    }
}
