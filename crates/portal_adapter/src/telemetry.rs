#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Installs the global `tracing` subscriber. Call once per process.
pub fn init_tracing(filter: &str, format: LogFormat) -> Result<(), String> {
    let env_filter =
        EnvFilter::try_new(filter).map_err(|err| format!("invalid log filter '{filter}': {err}"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    result.map_err(|err| format!("failed to install tracing subscriber: {err}"))
}
