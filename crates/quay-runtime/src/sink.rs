//! Outbound event sink.

use quay_core::GatewayEvent;

/// Destination for events pushed toward connected clients.
///
/// Delivery is best-effort: implementations must never block the caller
/// on a slow consumer. The terminal monitor task emits output chunks
/// through this trait, so a blocking sink would stall the PTY relay.
pub trait EventSink: Send + Sync {
    /// Emit one event. Failures are the implementation's problem; the
    /// caller neither observes nor retries them.
    fn emit(&self, event: GatewayEvent);
}

