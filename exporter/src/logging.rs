//! Logging setup.

use anyhow::Error;
use std::str::FromStr;
use tracing::{level_filters::LevelFilter, Span};
use tracing_subscriber::EnvFilter;

/// Interpret a `LOG_LEVEL` value.
///
/// Accepts the usual `tracing` level names in any case, as well as the `WARNING` and `CRITICAL`
/// spellings used by other DataHub services.
pub fn parse_level(level: &str) -> Result<LevelFilter, Error> {
    match level.to_ascii_uppercase().as_str() {
        "WARNING" => Ok(LevelFilter::WARN),
        "CRITICAL" | "FATAL" => Ok(LevelFilter::ERROR),
        _ => LevelFilter::from_str(level)
            .map_err(|_| Error::msg(format!("invalid log level {level}"))),
    }
}

/// Install the global subscriber.
///
/// `level` is the default level; a `RUST_LOG` directive takes precedence over it. If any
/// `tags` are given, records are written as one JSON object per line, for consumption by
/// Logstash, and every record emitted inside the returned span carries the tags.
///
/// Installing a subscriber more than once is harmless: later calls keep the first subscriber.
pub fn init_logging(level: &str, tags: &[String]) -> Result<Span, Error> {
    let filter = EnvFilter::builder()
        .with_default_directive(parse_level(level)?.into())
        .from_env_lossy();
    let res = if tags.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(filter)
            .try_init()
    };
    if let Err(err) = res {
        tracing::debug!("logging already initialized: {err}");
    }

    if tags.is_empty() {
        Ok(Span::none())
    } else {
        // Error level, so that the span is enabled whatever the configured level.
        Ok(tracing::error_span!("etl", tags = %tags.join(",")))
    }
}
