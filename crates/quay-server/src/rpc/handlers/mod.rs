//! RPC method handlers and shared parameter helpers.

pub mod system;
pub mod terminal;

use quay_rpc::RpcError;
use serde_json::Value;

/// Extract a required string parameter.
pub fn require_string_param(params: Option<&Value>, name: &str) -> Result<String, RpcError> {
    params
        .and_then(|p| p.get(name))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| RpcError::invalid_params(format!("Missing required parameter '{name}'")))
}

/// Extract an optional numeric parameter.
///
/// Absent, null, or non-numeric values all read as `None`, so callers fall
/// back to their defaults instead of rejecting the request.
pub fn optional_f64_param(params: Option<&Value>, name: &str) -> Option<f64> {
    params.and_then(|p| p.get(name)).and_then(Value::as_f64)
}

#[cfg(test)]
pub mod test_helpers {
    //! Context construction for handler tests, backed by the runtime's
    //! deterministic doubles.

    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use quay_runtime::testing::{CountingRequester, MockPtySpawner, RecordingSink};
    use quay_runtime::{RestartCoordinator, TerminalManager, WizardFlag, WizardGate};
    use quay_settings::Settings;

    use crate::rpc::context::RpcContext;
    use crate::shutdown::ShutdownCoordinator;
    use crate::websocket::broadcast::BroadcastManager;

    /// A test context plus the doubles it was wired with.
    pub struct TestFixture {
        /// The context handlers receive.
        pub ctx: RpcContext,
        /// Scripted PTY factory behind `ctx.terminal`.
        pub spawner: Arc<MockPtySpawner>,
        /// Recording sink behind `ctx.terminal`.
        pub sink: Arc<RecordingSink>,
        /// Counting requester behind `ctx.restart`.
        pub requester: Arc<CountingRequester>,
    }

    /// Build a fully wired fixture.
    pub fn make_test_fixture() -> TestFixture {
        let spawner = Arc::new(MockPtySpawner::default());
        let sink = Arc::new(RecordingSink::default());
        let requester = Arc::new(CountingRequester::default());
        let wizard = Arc::new(WizardFlag::new());

        let settings = Settings::default();
        let terminal = Arc::new(TerminalManager::new(
            spawner.clone(),
            sink.clone(),
            Duration::from_secs(settings.terminal.idle_timeout_secs),
        ));
        let gate: Arc<dyn WizardGate> = wizard.clone();
        let restart = Arc::new(RestartCoordinator::new(gate, requester.clone()));

        let ctx = RpcContext {
            terminal,
            restart,
            wizard,
            broadcast: Arc::new(BroadcastManager::new()),
            settings,
            server_start_time: Instant::now(),
            shutdown: Arc::new(ShutdownCoordinator::new()),
        };

        TestFixture {
            ctx,
            spawner,
            sink,
            requester,
        }
    }

    /// Build a bare test context.
    pub fn make_test_context() -> RpcContext {
        make_test_fixture().ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_string_param_present() {
        let params = json!({"sessionId": "t1"});
        let v = require_string_param(Some(&params), "sessionId").unwrap();
        assert_eq!(v, "t1");
    }

    #[test]
    fn require_string_param_missing() {
        let params = json!({});
        let err = require_string_param(Some(&params), "sessionId").unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMS");
        assert!(err.to_string().contains("sessionId"));
    }

    #[test]
    fn require_string_param_no_params() {
        let err = require_string_param(None, "data").unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMS");
    }

    #[test]
    fn require_string_param_wrong_type() {
        let params = json!({"sessionId": 42});
        assert!(require_string_param(Some(&params), "sessionId").is_err());
    }

    #[test]
    fn optional_f64_reads_numbers() {
        let params = json!({"cols": 120, "rows": 40.5});
        assert_eq!(optional_f64_param(Some(&params), "cols"), Some(120.0));
        assert_eq!(optional_f64_param(Some(&params), "rows"), Some(40.5));
    }

    #[test]
    fn optional_f64_absent_or_non_numeric() {
        let params = json!({"cols": "wide", "rows": null});
        assert_eq!(optional_f64_param(Some(&params), "cols"), None);
        assert_eq!(optional_f64_param(Some(&params), "rows"), None);
        assert_eq!(optional_f64_param(Some(&params), "missing"), None);
        assert_eq!(optional_f64_param(None, "cols"), None);
    }
}
