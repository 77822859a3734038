//! RPC dispatch: method registry, handler context, and the handlers
//! themselves.

pub mod context;
pub mod handlers;
pub mod registry;
pub mod validation;
