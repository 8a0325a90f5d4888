use std::fmt::{self as stdfmt, Write as _};
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use evb_config::{LogFormat, LoggingConfig};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, FormattedFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

// ---------------------------------------------------------------------------
// DomainFormat
// ---------------------------------------------------------------------------

/// Plain-text event format with the `domain` field lifted into a prefix:
///
/// ```text
/// 2024-07-01T02:08:05.120Z  INFO [pipe] batch_writer{dir=/data}: rotated batch file rows=301
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct DomainFormat;

impl DomainFormat {
    pub fn new() -> Self {
        Self
    }
}

impl<S, N> FormatEvent<S, N> for DomainFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'w> FormatFields<'w> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: fmt::format::Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        SystemTime.format_time(&mut writer)?;
        write!(writer, " {:>5} ", event.metadata().level())?;

        let mut fields = DomainExtractor::default();
        event.record(&mut fields);
        if let Some(domain) = &fields.domain {
            write!(writer, "[{domain}] ")?;
        }

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}{{", span.name())?;
                if let Some(formatted) = span.extensions().get::<FormattedFields<N>>() {
                    write!(writer, "{formatted}")?;
                }
                write!(writer, "}}: ")?;
            }
        }

        write!(writer, "{}", fields.message)?;
        if !fields.rest.is_empty() {
            write!(writer, " {}", fields.rest)?;
        }
        writeln!(writer)
    }
}

/// Splits an event into `domain`, `message` and the remaining `key=value` pairs.
#[derive(Default)]
struct DomainExtractor {
    domain: Option<String>,
    message: String,
    rest: String,
}

impl DomainExtractor {
    fn push_field(&mut self, name: &str, value: stdfmt::Arguments<'_>) {
        if !self.rest.is_empty() {
            self.rest.push(' ');
        }
        let _ = write!(self.rest, "{name}={value}");
    }
}

impl Visit for DomainExtractor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "domain" => self.domain = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            name => self.push_field(name, format_args!("{value:?}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn stdfmt::Debug) {
        match field.name() {
            "message" => {
                let _ = write!(self.message, "{value:?}");
            }
            name => self.push_field(name, format_args!("{value:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// One output layer in the configured format. Plain output never carries
/// ANSI escapes, so stderr and the log file share span field formatting.
fn output_layer<W>(format: LogFormat, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Plain => fmt::layer()
            .event_format(DomainFormat)
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok(EnvFilter::from_default_env());
    }
    let directives = config.directives();
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log filter '{directives}'"))
}

/// Install the global subscriber: stderr plus an optional non-blocking log
/// file, filtered by `RUST_LOG` when set and by `config` otherwise.
///
/// The returned guard flushes the log file on drop; hold it until exit.
pub fn init_tracing(config: &LoggingConfig, base_dir: &Path) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config)?;
    let mut layers = vec![output_layer(config.format, io::stderr)];
    let mut guard = None;

    if let Some(path) = config.file_path(base_dir) {
        let dir = path
            .parent()
            .with_context(|| format!("log file {} has no parent directory", path.display()))?;
        let name = path
            .file_name()
            .with_context(|| format!("log file {} has no file name", path.display()))?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        let (file_writer, file_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        layers.push(output_layer(config.format, file_writer));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("tracing subscriber already installed")?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture(format: LogFormat, emit: impl FnOnce()) -> String {
        let out = Captured::default();
        let subscriber = tracing_subscriber::registry().with(vec![output_layer(format, out.clone())]);
        tracing::subscriber::with_default(subscriber, emit);
        out.text()
    }

    #[test]
    fn plain_line_has_domain_prefix_and_fields() {
        let out = capture(LogFormat::Plain, || {
            evb_info!(pipe, rows = 3_u64, path = "a.csv", "closed batch file");
        });
        assert!(
            out.contains(" INFO [pipe] closed batch file rows=3 path=\"a.csv\""),
            "{out}"
        );
        assert!(!out.contains('\x1b'), "{out}");
    }

    #[test]
    fn plain_line_shows_span_context() {
        let out = capture(LogFormat::Plain, || {
            let span = tracing::info_span!("batch_writer", dir = %"/data");
            let _entered = span.enter();
            evb_warn!(sys, "background task fault");
        });
        assert!(
            out.contains("WARN [sys] batch_writer{dir=/data}: background task fault"),
            "{out}"
        );
    }

    #[test]
    fn event_without_domain_has_no_prefix() {
        let out = capture(LogFormat::Plain, || {
            tracing::info!(events = 2_u64, "request body consumed");
        });
        assert!(out.contains(" INFO request body consumed events=2"), "{out}");
    }

    #[test]
    fn json_line_keeps_domain_as_field() {
        let out = capture(LogFormat::Json, || {
            evb_error!(res, error = "disk full", "unable to close expired file");
        });
        let line: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(line["level"], "ERROR");
        assert_eq!(line["fields"]["domain"], "res");
        assert_eq!(line["fields"]["message"], "unable to close expired file");
    }
}
