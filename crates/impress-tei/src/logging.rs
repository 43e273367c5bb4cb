//! Log output in `LEVEL: message` form
//!
//! The library only emits `tracing` events. A binary (or a test) installs a
//! subscriber built by [`subscriber`], either globally with [`init`] or for a
//! scope with `tracing::subscriber::with_default`.

use std::fmt;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Formats each event as one `LEVEL: message` line, without timestamps or targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelPrefix;

impl<S, N> FormatEvent<S, N> for LevelPrefix
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{}: ", level_label(event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

pub fn level_label(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Default filter: `RUST_LOG` if set, otherwise info (debug when verbose).
pub fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// Build a subscriber writing `LEVEL: message` lines to `writer`.
pub fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .event_format(LevelPrefix)
        .with_env_filter(filter)
        .with_writer(writer)
        .finish()
}

/// Install the stderr subscriber for the whole process.
///
/// Returns false if a global subscriber was already set.
pub fn init(verbose: bool) -> bool {
    tracing::subscriber::set_global_default(subscriber(default_filter(verbose), std::io::stderr))
        .is_ok()
}
