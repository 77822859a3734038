//! Bridges runtime [`GatewayEvent`]s into wire-format [`RpcEvent`]s and
//! fans them out through the [`BroadcastManager`].

use std::sync::Arc;

use quay_core::GatewayEvent;
use quay_rpc::RpcEvent;
use quay_runtime::EventSink;

use super::broadcast::BroadcastManager;

/// [`EventSink`] that broadcasts every runtime event to all connected
/// clients, wrapped in the standard event envelope.
pub struct BroadcastSink {
    broadcast: Arc<BroadcastManager>,
}

impl BroadcastSink {
    /// Create a sink feeding the given broadcast manager.
    pub fn new(broadcast: Arc<BroadcastManager>) -> Self {
        Self { broadcast }
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: GatewayEvent) {
        let envelope = RpcEvent::now(
            event.event_type(),
            Some(event.session_id().to_owned()),
            Some(event.payload()),
        );
        self.broadcast.broadcast_all(&envelope);
    }
}
