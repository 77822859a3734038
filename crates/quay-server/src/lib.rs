//! # quay-server
//!
//! Axum HTTP + `WebSocket` server for the gateway control plane.
//!
//! - HTTP endpoints: `/health`, `/metrics`
//! - `WebSocket` gateway: connection management, heartbeat, RPC dispatch
//! - Event fan-out to every connected client via the `BroadcastManager`
//! - Graceful shutdown (and restart-exit signaling) via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod rpc;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use server::{AppState, GatewayServer};
pub use shutdown::ShutdownCoordinator;
