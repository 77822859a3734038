//! Settings schema with compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Gateway server settings.
    pub server: ServerSettings,
    /// Terminal session settings.
    pub terminal: TerminalSettings,
    /// Restart behavior settings.
    pub restart: RestartSettings,
}

/// Gateway server settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Heartbeat timeout in seconds (drop after this long without a sign of life).
    pub heartbeat_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 18789,
            max_connections: 50,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
        }
    }
}

/// Terminal session settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalSettings {
    /// Shell program to spawn. `None` falls back to `$SHELL`, then `/bin/bash`.
    pub shell: Option<String>,
    /// Idle window in seconds before an inactive session is evicted.
    pub idle_timeout_secs: u64,
    /// Value exported as `TERM` inside the session.
    pub term: String,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            shell: None,
            idle_timeout_secs: 600,
            term: "xterm-256color".into(),
        }
    }
}

/// Restart behavior settings.
///
/// Consumed opaquely by the restart coordinator; only logged, never
/// interpreted, when a restart signal is emitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestartSettings {
    /// Optional chat-command alias that triggers a restart.
    pub command_alias: Option<String>,
}
