//! # quay-core
//!
//! Shared domain types for the quay gateway:
//!
//! - Branded ID newtypes (UUID v7, time-ordered)
//! - The broadcast event model ([`events::GatewayEvent`])
//! - The reload-plan value object ([`reload::ReloadPlan`]) consumed by
//!   the restart coordinator

#![deny(unsafe_code)]

pub mod events;
pub mod ids;
pub mod reload;

pub use events::GatewayEvent;
pub use ids::{ConnectionId, TerminalSessionId};
pub use reload::ReloadPlan;
