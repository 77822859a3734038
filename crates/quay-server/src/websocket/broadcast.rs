//! Event fan-out to connected WebSocket clients.
//!
//! Locking is synchronous (`parking_lot`) so events can be emitted from
//! non-async contexts. Sends are `try_send` through each connection's
//! channel, so a slow client drops messages rather than stalling the
//! broadcast.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use parking_lot::RwLock;
use quay_rpc::RpcEvent;
use tracing::{debug, warn};

use super::connection::ClientConnection;
use crate::metrics::{WS_BROADCAST_DROPS_TOTAL, WS_CONNECTIONS_ACTIVE};

/// Manages event broadcasting to connected clients.
pub struct BroadcastManager {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
}

impl BroadcastManager {
    /// Create a new broadcast manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection.
    pub fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write();
        let _ = conns.insert(connection.id.clone(), connection);
        #[allow(clippy::cast_precision_loss)]
        gauge!(WS_CONNECTIONS_ACTIVE).set(conns.len() as f64);
    }

    /// Remove a connection by ID.
    pub fn remove(&self, connection_id: &str) {
        let mut conns = self.connections.write();
        let _ = conns.remove(connection_id);
        #[allow(clippy::cast_precision_loss)]
        gauge!(WS_CONNECTIONS_ACTIVE).set(conns.len() as f64);
    }

    /// Broadcast an event to all connections. Best-effort: failed sends
    /// are counted and logged, never retried.
    pub fn broadcast_all(&self, event: &RpcEvent) {
        let json = match serde_json::to_string(event) {
            Ok(j) => Arc::new(j),
            Err(e) => {
                warn!(event_type = event.event_type, error = %e, "failed to serialize event");
                return;
            }
        };
        let conns = self.connections.read();
        debug!(
            event_type = event.event_type,
            recipients = conns.len(),
            "broadcast event to all"
        );
        for conn in conns.values() {
            if !conn.send(json.clone()) {
                counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                warn!(conn_id = %conn.id, "failed to send event to client");
            }
        }
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }
}

impl Default for BroadcastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::connection::OutboundMessage;
    use tokio::sync::mpsc;

    fn make_connection_with_rx(
        id: &str,
    ) -> (Arc<ClientConnection>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(32);
        (Arc::new(ClientConnection::new(id.into(), tx)), rx)
    }

    fn make_event(event_type: &str, session_id: Option<&str>) -> RpcEvent {
        RpcEvent {
            event_type: event_type.into(),
            session_id: session_id.map(Into::into),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            data: None,
        }
    }

    #[test]
    fn add_connection() {
        let bm = BroadcastManager::new();
        let (conn, _rx) = make_connection_with_rx("c1");
        bm.add(conn);
        assert_eq!(bm.connection_count(), 1);
    }

    #[test]
    fn remove_connection() {
        let bm = BroadcastManager::new();
        let (conn, _rx) = make_connection_with_rx("c1");
        bm.add(conn);
        bm.remove("c1");
        assert_eq!(bm.connection_count(), 0);
    }

    #[test]
    fn remove_nonexistent_connection() {
        let bm = BroadcastManager::new();
        bm.remove("no_such");
        assert_eq!(bm.connection_count(), 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let bm = BroadcastManager::new();
        let (c1, mut rx1) = make_connection_with_rx("c1");
        let (c2, mut rx2) = make_connection_with_rx("c2");
        bm.add(c1);
        bm.add(c2);

        let event = make_event("terminal.output", Some("t1"));
        bm.broadcast_all(&event);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn broadcast_to_empty_manager_is_noop() {
        let bm = BroadcastManager::new();
        let event = make_event("terminal.closed", Some("t1"));
        bm.broadcast_all(&event);
    }

    #[tokio::test]
    async fn broadcast_event_is_valid_json() {
        let bm = BroadcastManager::new();
        let (conn, mut rx) = make_connection_with_rx("c1");
        bm.add(conn);

        let event = RpcEvent {
            event_type: "terminal.output".into(),
            session_id: Some("t1".into()),
            timestamp: "2026-02-13T15:30:00.000Z".into(),
            data: Some(serde_json::json!({"data": "hello"})),
        };
        bm.broadcast_all(&event);

        let OutboundMessage::Text(msg) = rx.recv().await.unwrap() else {
            panic!("expected a text message");
        };
        let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(parsed["type"], "terminal.output");
        assert_eq!(parsed["sessionId"], "t1");
        assert_eq!(parsed["data"]["data"], "hello");
    }

    #[tokio::test]
    async fn dead_connection_does_not_block_others() {
        let bm = BroadcastManager::new();
        let (tx, rx) = mpsc::channel(32);
        drop(rx);
        bm.add(Arc::new(ClientConnection::new("dead".into(), tx)));
        let (live, mut live_rx) = make_connection_with_rx("live");
        bm.add(live);

        bm.broadcast_all(&make_event("terminal.closed", Some("t1")));
        assert!(live_rx.try_recv().is_ok());
    }

    #[test]
    fn add_connection_overwrites_same_id() {
        let bm = BroadcastManager::new();
        let (c1, _rx1) = make_connection_with_rx("same_id");
        let (c2, _rx2) = make_connection_with_rx("same_id");
        bm.add(c1);
        bm.add(c2);
        assert_eq!(bm.connection_count(), 1);
    }
}
