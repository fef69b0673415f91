//! Tracing subscriber setup for the binary.

use std::str::FromStr;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "SIGNALBENCH_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?} (expected text or json)")),
        }
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean.
///
/// A second call keeps the subscriber installed by the first.
pub fn init_tracing(level: &str, format: LogFormat) -> Result<(), String> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .map_err(|err| format!("invalid log filter {filter:?}: {err}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if let Err(err) = installed {
        tracing::debug!(%err, "subscriber already installed, keeping the existing one");
    }
    Ok(())
}
