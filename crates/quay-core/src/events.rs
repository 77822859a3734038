//! Broadcast event model.
//!
//! [`GatewayEvent`] is the typed form of every event the gateway pushes to
//! connected clients. Events are advisory: delivery is best-effort and a
//! client that misses `terminal.output` chunks must treat `terminal.closed`
//! as the authoritative end-of-session signal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events broadcast to all connected clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GatewayEvent {
    /// A chunk of output from the active terminal session's shell.
    #[serde(rename = "terminal.output")]
    TerminalOutput {
        /// Session the output belongs to.
        #[serde(rename = "sessionId")]
        session_id: String,
        /// Raw output chunk (lossy UTF-8).
        data: String,
    },

    /// The terminal session ended (explicit close, idle eviction, or the
    /// shell exiting on its own).
    #[serde(rename = "terminal.closed")]
    TerminalClosed {
        /// Session that ended.
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

impl GatewayEvent {
    /// Wire event name (e.g. `terminal.output`).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TerminalOutput { .. } => "terminal.output",
            Self::TerminalClosed { .. } => "terminal.closed",
        }
    }

    /// Session this event refers to.
    pub fn session_id(&self) -> &str {
        match self {
            Self::TerminalOutput { session_id, .. } | Self::TerminalClosed { session_id } => {
                session_id
            }
        }
    }

    /// Event payload as sent inside the wire envelope's `data` field.
    pub fn payload(&self) -> Value {
        match self {
            Self::TerminalOutput { session_id, data } => serde_json::json!({
                "sessionId": session_id,
                "data": data,
            }),
            Self::TerminalClosed { session_id } => serde_json::json!({
                "sessionId": session_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_event_type() {
        let ev = GatewayEvent::TerminalOutput {
            session_id: "t1".into(),
            data: "ls\r\n".into(),
        };
        assert_eq!(ev.event_type(), "terminal.output");
        assert_eq!(ev.session_id(), "t1");
    }

    #[test]
    fn closed_event_type() {
        let ev = GatewayEvent::TerminalClosed {
            session_id: "t2".into(),
        };
        assert_eq!(ev.event_type(), "terminal.closed");
        assert_eq!(ev.session_id(), "t2");
    }

    #[test]
    fn serializes_with_tag_and_camel_case() {
        let ev = GatewayEvent::TerminalOutput {
            session_id: "t1".into(),
            data: "hello".into(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "terminal.output");
        assert_eq!(json["sessionId"], "t1");
        assert_eq!(json["data"], "hello");
    }

    #[test]
    fn payload_carries_session_and_data() {
        let ev = GatewayEvent::TerminalOutput {
            session_id: "t1".into(),
            data: "x".into(),
        };
        let payload = ev.payload();
        assert_eq!(payload["sessionId"], "t1");
        assert_eq!(payload["data"], "x");
    }

    #[test]
    fn closed_payload_has_no_data_field() {
        let ev = GatewayEvent::TerminalClosed {
            session_id: "t9".into(),
        };
        let payload = ev.payload();
        assert_eq!(payload["sessionId"], "t9");
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn deserialize_roundtrip() {
        let ev = GatewayEvent::TerminalClosed {
            session_id: "t3".into(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: GatewayEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }
}
