//! # quay-rpc
//!
//! RPC protocol layer for the quay gateway: wire-format request/response
//! types, the server-pushed event envelope, and the error taxonomy shared
//! by every method handler.
//!
//! The surface is deliberately small:
//! - Terminal: open, input, resize, close
//! - System: ping, health
//!
//! Every response is a tagged success/failure with a machine-readable
//! error code and a human-readable message.

#![deny(unsafe_code)]

pub mod errors;
pub mod types;

pub use errors::RpcError;
pub use types::{RpcErrorBody, RpcEvent, RpcRequest, RpcResponse};
