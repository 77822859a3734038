//! # quay-logging
//!
//! `tracing` subscriber initialization for the gateway.
//!
//! The filter is taken from the `QUAY_LOG` environment variable when set
//! (standard `EnvFilter` syntax), otherwise from the default directive
//! passed to [`init`]. Output is either human-readable or JSON lines,
//! selected at startup.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter.
pub const LOG_ENV_VAR: &str = "QUAY_LOG";

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Pretty,
    /// JSON lines, one event per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Build the filter from `QUAY_LOG`, falling back to `default_directive`.
fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global tracing subscriber.
///
/// Returns an error if a global subscriber is already installed (tests
/// that initialize logging more than once can ignore it).
pub fn init(format: LogFormat, default_directive: &str) -> Result<(), String> {
    let filter = build_filter(default_directive);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| e.to_string())
}
