//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Current WebSocket connection count.
    pub connections: usize,
    /// Whether a terminal session is currently open.
    pub terminal_session_active: bool,
    /// Whether a gateway restart is deferred behind a setup wizard.
    pub restart_pending: bool,
    /// Whether a setup wizard is currently mid-flow.
    pub wizard_active: bool,
}

/// Build a health response from live counters.
pub fn health_check(
    start_time: Instant,
    connections: usize,
    terminal_session_active: bool,
    restart_pending: bool,
    wizard_active: bool,
) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        connections,
        terminal_session_active,
        restart_pending,
        wizard_active,
    }
}
