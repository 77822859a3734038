//! System handlers: ping and health.

use async_trait::async_trait;
use quay_rpc::RpcError;
use quay_runtime::WizardGate;
use serde_json::{Value, json};
use tracing::instrument;

use crate::health;
use crate::rpc::context::RpcContext;
use crate::rpc::registry::MethodHandler;

/// `system.ping` — trivial liveness probe.
pub struct PingHandler;

#[async_trait]
impl MethodHandler for PingHandler {
    #[instrument(skip(self, _ctx), fields(method = "system.ping"))]
    async fn handle(&self, _params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(json!({
            "pong": true,
            "timestamp": chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }))
    }
}

/// `system.health` — the `/health` payload over RPC.
pub struct HealthHandler;

#[async_trait]
impl MethodHandler for HealthHandler {
    #[instrument(skip(self, ctx), fields(method = "system.health"))]
    async fn handle(&self, _params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let resp = health::health_check(
            ctx.server_start_time,
            ctx.broadcast.connection_count(),
            ctx.terminal.active_session_id().await.is_some(),
            ctx.restart.restart_pending(),
            ctx.wizard.is_setup_wizard_active(),
        );
        serde_json::to_value(resp).map_err(|e| RpcError::Internal {
            message: format!("failed to serialize health response: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::handlers::test_helpers::{make_test_context, make_test_fixture};
    use quay_core::ReloadPlan;

    #[tokio::test]
    async fn ping_returns_pong() {
        let ctx = make_test_context();
        let result = PingHandler.handle(None, &ctx).await.unwrap();
        assert_eq!(result["pong"], true);
        assert!(result["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn health_reports_idle_gateway() {
        let ctx = make_test_context();
        let result = HealthHandler.handle(None, &ctx).await.unwrap();
        assert_eq!(result["status"], "ok");
        assert_eq!(result["connections"], 0);
        assert_eq!(result["terminal_session_active"], false);
        assert_eq!(result["restart_pending"], false);
        assert_eq!(result["wizard_active"], false);
    }

    #[tokio::test]
    async fn health_reflects_active_terminal() {
        let fx = make_test_fixture();
        let _ = fx.ctx.terminal.open(None, None).await.unwrap();
        let result = HealthHandler.handle(None, &fx.ctx).await.unwrap();
        assert_eq!(result["terminal_session_active"], true);
    }

    #[tokio::test]
    async fn health_reflects_pending_restart() {
        let fx = make_test_fixture();
        let wizard = quay_runtime::WizardSession::begin(
            fx.ctx.wizard.clone(),
            fx.ctx.restart.clone(),
        );
        fx.ctx.restart.request_gateway_restart(
            ReloadPlan::gateway_restart(["port changed"]),
            fx.ctx.settings.clone(),
        );

        let result = HealthHandler.handle(None, &fx.ctx).await.unwrap();
        assert_eq!(result["restart_pending"], true);
        assert_eq!(result["wizard_active"], true);

        wizard.finish();
        let result = HealthHandler.handle(None, &fx.ctx).await.unwrap();
        assert_eq!(result["restart_pending"], false);
        assert_eq!(result["wizard_active"], false);
    }
}
