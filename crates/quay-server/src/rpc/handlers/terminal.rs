//! Terminal handlers: open, input, resize, close.

use async_trait::async_trait;
use quay_rpc::RpcError;
use quay_runtime::TerminalError;
use serde_json::{Value, json};
use tracing::instrument;

use crate::rpc::context::RpcContext;
use crate::rpc::handlers::{optional_f64_param, require_string_param};
use crate::rpc::registry::MethodHandler;
use crate::rpc::validation::{MAX_INPUT_LENGTH, MAX_PARAM_LENGTH, validate_string_param};

fn map_terminal_error(err: TerminalError) -> RpcError {
    match err {
        TerminalError::SpawnFailed(_) => RpcError::NotAvailable {
            message: err.to_string(),
        },
        TerminalError::NoSession => RpcError::invalid_params(err.to_string()),
    }
}

/// `terminal.open` — open a new session, replacing any existing one.
pub struct OpenTerminalHandler;

#[async_trait]
impl MethodHandler for OpenTerminalHandler {
    #[instrument(skip(self, ctx), fields(method = "terminal.open"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let cols = optional_f64_param(params.as_ref(), "cols");
        let rows = optional_f64_param(params.as_ref(), "rows");

        let opened = ctx
            .terminal
            .open(cols, rows)
            .await
            .map_err(map_terminal_error)?;

        Ok(json!({
            "sessionId": opened.session_id,
            "cols": opened.cols,
            "rows": opened.rows,
        }))
    }
}

/// `terminal.input` — write input to the active session.
pub struct TerminalInputHandler;

#[async_trait]
impl MethodHandler for TerminalInputHandler {
    #[instrument(skip(self, params, ctx), fields(method = "terminal.input"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let p = params.as_ref();
        let (Ok(session_id), Ok(data)) = (
            require_string_param(p, "sessionId"),
            require_string_param(p, "data"),
        ) else {
            return Err(RpcError::invalid_params("sessionId and data required"));
        };
        validate_string_param(&session_id, "sessionId", MAX_PARAM_LENGTH)?;
        validate_string_param(&data, "data", MAX_INPUT_LENGTH)?;

        ctx.terminal
            .input(&session_id, &data)
            .await
            .map_err(map_terminal_error)?;
        Ok(json!({ "ok": true }))
    }
}

/// `terminal.resize` — resize the active session's terminal.
pub struct TerminalResizeHandler;

#[async_trait]
impl MethodHandler for TerminalResizeHandler {
    #[instrument(skip(self, ctx), fields(method = "terminal.resize"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let p = params.as_ref();
        let session_id = require_string_param(p, "sessionId")?;
        let (Some(cols), Some(rows)) = (
            optional_f64_param(p, "cols"),
            optional_f64_param(p, "rows"),
        ) else {
            return Err(RpcError::invalid_params("cols and rows required"));
        };

        ctx.terminal
            .resize(&session_id, cols, rows)
            .await
            .map_err(map_terminal_error)?;
        Ok(json!({ "ok": true }))
    }
}

/// `terminal.close` — close the session. Idempotent: closing an unknown or
/// already-closed session succeeds.
pub struct CloseTerminalHandler;

#[async_trait]
impl MethodHandler for CloseTerminalHandler {
    #[instrument(skip(self, ctx), fields(method = "terminal.close"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;
        ctx.terminal.close(&session_id).await;
        Ok(json!({ "ok": true }))
    }
}
