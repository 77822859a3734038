//! # quay-runtime
//!
//! The gateway's control plane:
//!
//! - [`terminal::TerminalManager`] — owns the single live pseudo-terminal
//!   session, enforces exclusivity, relays output to clients, and evicts
//!   idle sessions.
//! - [`restart::RestartCoordinator`] — decides whether a reload plan
//!   triggers an immediate self-restart signal or must be deferred while
//!   a setup wizard is mid-flow, and flushes the deferred restart once
//!   the conflict clears.
//!
//! Both coordinators are constructed once at gateway startup and passed
//! by `Arc` to request handlers; neither is ambient global state. Their
//! collaborators (pseudo-terminal factory, broadcast sink, restart
//! signal, wizard gate) are injected traits so tests run with
//! deterministic doubles.

#![deny(unsafe_code)]

pub mod errors;
pub mod restart;
pub mod sink;
pub mod terminal;
pub mod testing;

pub use errors::TerminalError;
pub use restart::{RestartCoordinator, RestartRequester, WizardFlag, WizardGate, WizardSession};
pub use sink::EventSink;
pub use terminal::pty::{NativePtySpawner, PtyEvent, PtyHandle, PtySpawner};
pub use terminal::{OpenedTerminal, TerminalManager};
