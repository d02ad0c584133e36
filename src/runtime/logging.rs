use crate::error::{Error, Result};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Console layout of the build-script logger: `ERROR: msg`, `WARNING: msg`,
/// `DEBUG: module: line: msg`, and the bare message otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelPrefixFormat;

impl<S, N> FormatEvent<S, N> for LevelPrefixFormat
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
        let meta = event.metadata();
        match *meta.level() {
            Level::ERROR => write!(writer, "ERROR: ")?,
            Level::WARN => write!(writer, "WARNING: ")?,
            Level::INFO => {}
            level => write!(
                writer,
                "{}: {}: {}: ",
                level,
                meta.module_path().unwrap_or("?"),
                meta.line().unwrap_or(0)
            )?,
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Map a level name to a tracing level. Accepts the names used by build
/// scripts (`critical`, `warning`) alongside tracing's own.
pub fn parse_level(name: &str) -> Result<Level> {
    match name.trim().to_lowercase().as_str() {
        "critical" | "error" => Ok(Level::ERROR),
        "warning" | "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(Error::InvalidLevel(name.to_string())),
    }
}

/// Install the global stderr subscriber. `RUST_LOG` takes precedence over
/// `level`. Calling this again once a subscriber is installed does nothing.
pub fn init_logging(level: &str) -> Result<()> {
    let level = parse_level(level)?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let installed = tracing_subscriber::fmt()
        .with_ansi(false)
        .event_format(LevelPrefixFormat)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if !installed {
        tracing::debug!("Logger already initialized, keeping existing subscriber");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let cases = vec![
            ("critical", Level::ERROR),
            ("ERROR", Level::ERROR),
            ("Warning", Level::WARN),
            ("warn", Level::WARN),
            ("info", Level::INFO),
            (" debug ", Level::DEBUG),
            ("trace", Level::TRACE),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_level(input).unwrap(), expected);
        }
    }

    #[test]
    fn test_parse_level_unknown() {
        assert!(matches!(
            parse_level("verbose"),
            Err(Error::InvalidLevel(name)) if name == "verbose"
        ));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_level_prefix_format() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(LevelPrefixFormat)
            .with_max_level(Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("bitstream missing");
            tracing::warn!("board {} not listed", "KV260");
            tracing::info!("plain message");
            tracing::debug!("details");
        });

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ERROR: bitstream missing");
        assert_eq!(lines[1], "WARNING: board KV260 not listed");
        assert_eq!(lines[2], "plain message");
        assert!(lines[3].starts_with("DEBUG: pynq_utils::runtime::logging::tests: "));
        assert!(lines[3].ends_with(": details"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_init_logging_twice() {
        assert!(init_logging("info").is_ok());
        assert!(init_logging("debug").is_ok());
        assert!(init_logging("loud").is_err());
    }
}
