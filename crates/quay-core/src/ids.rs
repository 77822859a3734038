//! Branded ID newtypes for type safety.
//!
//! Entities in the gateway carry distinct ID types implemented as newtype
//! wrappers around `String`, so a terminal session ID can never be passed
//! where a connection ID is expected.
//!
//! All IDs are UUID v7 (time-ordered) generated via [`uuid::Uuid::now_v7`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a new UUID v7 string (time-ordered).
fn new_v7() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v7())
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a live pseudo-terminal session.
    TerminalSessionId
}

branded_id! {
    /// Unique identifier for a WebSocket client connection.
    ConnectionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = TerminalSessionId::new();
        let b = TerminalSessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_time_ordered() {
        let a = TerminalSessionId::new();
        let b = TerminalSessionId::new();
        // UUID v7 sorts lexicographically by creation time.
        assert!(a.as_str() <= b.as_str());
    }

    #[test]
    fn from_str_roundtrip() {
        let id = TerminalSessionId::from("term_abc");
        assert_eq!(id.as_str(), "term_abc");
        let s: String = id.into();
        assert_eq!(s, "term_abc");
    }

    #[test]
    fn display_matches_inner() {
        let id = ConnectionId::from("conn_1");
        assert_eq!(id.to_string(), "conn_1");
    }

    #[test]
    fn serde_transparent() {
        let id = TerminalSessionId::from("t1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"t1\"");
        let back: TerminalSessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn distinct_types_do_not_compare() {
        // Compile-time property: this only checks both types construct.
        let t = TerminalSessionId::new();
        let c = ConnectionId::new();
        assert_ne!(t.as_str(), "");
        assert_ne!(c.as_str(), "");
    }

    #[test]
    fn into_inner_returns_string() {
        let id = TerminalSessionId::from("inner");
        assert_eq!(id.into_inner(), "inner");
    }
}
