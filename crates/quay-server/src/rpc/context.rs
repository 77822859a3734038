//! RPC dependency-injection context.

use std::sync::Arc;
use std::time::Instant;

use quay_runtime::{RestartCoordinator, TerminalManager, WizardFlag};
use quay_settings::Settings;

use crate::shutdown::ShutdownCoordinator;
use crate::websocket::broadcast::BroadcastManager;

/// Shared context passed to every RPC handler.
pub struct RpcContext {
    /// Terminal session manager (process-wide singleton session).
    pub terminal: Arc<TerminalManager>,
    /// Restart coordinator (defer-behind-wizard logic).
    pub restart: Arc<RestartCoordinator>,
    /// Shared wizard-active flag.
    pub wizard: Arc<WizardFlag>,
    /// Broadcast manager for event fan-out.
    pub broadcast: Arc<BroadcastManager>,
    /// Loaded gateway settings.
    pub settings: Settings,
    /// When the server started (for uptime calculation).
    pub server_start_time: Instant,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::handlers::test_helpers::make_test_context;

    #[test]
    fn context_has_server_start_time() {
        let ctx = make_test_context();
        let elapsed = ctx.server_start_time.elapsed();
        assert!(elapsed.as_secs() < 5);
    }

    #[tokio::test]
    async fn context_starts_without_terminal_session() {
        let ctx = make_test_context();
        assert!(ctx.terminal.active_session_id().await.is_none());
    }

    #[test]
    fn context_starts_without_pending_restart() {
        let ctx = make_test_context();
        assert!(!ctx.restart.restart_pending());
    }

    #[test]
    fn context_starts_without_connections() {
        let ctx = make_test_context();
        assert_eq!(ctx.broadcast.connection_count(), 0);
    }

    #[test]
    fn context_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RpcContext>();
    }
}
