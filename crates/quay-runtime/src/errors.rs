//! Runtime error types.

use thiserror::Error;

/// Errors surfaced to callers by the terminal session manager.
///
/// These are the only handler-visible failures in the terminal component.
/// Everything else (killing an already-dead shell, dropped notifications)
/// is swallowed because the desired end state was already reached.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The pseudo-terminal could not be created. Environment or resource
    /// problem, not a caller mistake.
    #[error("terminal could not be started: {0}")]
    SpawnFailed(String),

    /// The request referenced a session that is not the current one, or
    /// no session exists.
    #[error("no active terminal session")]
    NoSession,
}
