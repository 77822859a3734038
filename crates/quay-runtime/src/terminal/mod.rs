//! Terminal session lifecycle management.
//!
//! At most one pseudo-terminal session exists per process. `open` tears
//! down any previous session before creating the new one, `input` and
//! `resize` must name the current session, and `close` is idempotent. A
//! session dies four ways: explicit close, idle eviction, the shell
//! exiting on its own, and process-wide cleanup at shutdown.
//!
//! Each session runs one monitor task that owns both the PTY event
//! channel and the idle deadline in a single `select!` loop, so output
//! relay, exit detection, and eviction cannot race each other.

pub mod pty;

use std::sync::{Arc, Weak};
use std::time::Duration;

use metrics::counter;
use parking_lot::Mutex as SyncMutex;
use quay_core::{GatewayEvent, TerminalSessionId};
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::TerminalError;
use crate::sink::EventSink;
use pty::{PtyEvent, PtyHandle, PtySpawner};

/// Default terminal width when the caller omits `cols`.
pub const DEFAULT_COLS: u16 = 80;
/// Default terminal height when the caller omits `rows`.
pub const DEFAULT_ROWS: u16 = 24;

/// Result of a successful `terminal.open`.
#[derive(Clone, Debug)]
pub struct OpenedTerminal {
    /// The new session's ID.
    pub session_id: TerminalSessionId,
    /// Effective column count after clamping.
    pub cols: u16,
    /// Effective row count after clamping.
    pub rows: u16,
}

/// Why a session is being torn down from the monitor side.
enum CloseReason {
    Idle,
    Exited,
}

struct ActiveSession {
    id: TerminalSessionId,
    handle: Box<dyn PtyHandle>,
    deadline: Arc<SyncMutex<Instant>>,
    cancel: CancellationToken,
}

impl ActiveSession {
    /// Push the idle deadline out by one full window.
    fn touch(&self, window: Duration) {
        *self.deadline.lock() = Instant::now() + window;
    }
}

/// Owns the process-wide terminal session singleton.
pub struct TerminalManager {
    spawner: Arc<dyn PtySpawner>,
    sink: Arc<dyn EventSink>,
    idle_timeout: Duration,
    active: Mutex<Option<ActiveSession>>,
}

impl TerminalManager {
    /// Create a manager with its injected collaborators.
    pub fn new(
        spawner: Arc<dyn PtySpawner>,
        sink: Arc<dyn EventSink>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            spawner,
            sink,
            idle_timeout,
            active: Mutex::new(None),
        }
    }

    /// Open a new terminal session, destroying any existing one first.
    ///
    /// Dimensions are floored and clamped to at least 1; omitted or
    /// non-numeric values default to 80×24. On spawn failure no session
    /// exists afterward — the old one is already gone and no new one is
    /// created.
    pub async fn open(
        self: &Arc<Self>,
        cols: Option<f64>,
        rows: Option<f64>,
    ) -> Result<OpenedTerminal, TerminalError> {
        let cols = clamp_dimension(cols, DEFAULT_COLS);
        let rows = clamp_dimension(rows, DEFAULT_ROWS);

        // The slot lock is held across teardown and spawn so back-to-back
        // opens always observe "old destroyed before new created".
        let mut slot = self.active.lock().await;
        if let Some(old) = slot.take() {
            self.destroy_session(old, true);
        }

        let (handle, events) = self.spawner.spawn_shell(cols, rows).map_err(|e| {
            warn!(error = %e, "failed to spawn terminal shell");
            TerminalError::SpawnFailed(e.to_string())
        })?;

        let id = TerminalSessionId::new();
        let deadline = Arc::new(SyncMutex::new(Instant::now() + self.idle_timeout));
        let cancel = CancellationToken::new();
        let _ = tokio::spawn(monitor_loop(
            Arc::downgrade(self),
            id.clone(),
            events,
            deadline.clone(),
            cancel.clone(),
            self.sink.clone(),
        ));

        *slot = Some(ActiveSession {
            id: id.clone(),
            handle,
            deadline,
            cancel,
        });

        counter!("terminal_sessions_opened_total").increment(1);
        info!(session_id = %id, cols, rows, "terminal session opened");
        Ok(OpenedTerminal {
            session_id: id,
            cols,
            rows,
        })
    }

    /// Write input to the active session and reset its idle timer.
    pub async fn input(&self, session_id: &str, data: &str) -> Result<(), TerminalError> {
        let mut slot = self.active.lock().await;
        let sess = match slot.as_mut() {
            Some(s) if s.id.as_str() == session_id => s,
            _ => return Err(TerminalError::NoSession),
        };
        if let Err(e) = sess.handle.write(data.as_bytes()) {
            // The shell may have died under us; the monitor will reap it.
            debug!(session_id, error = %e, "write to terminal ignored");
        }
        sess.touch(self.idle_timeout);
        Ok(())
    }

    /// Resize the active session and reset its idle timer.
    pub async fn resize(
        &self,
        session_id: &str,
        cols: f64,
        rows: f64,
    ) -> Result<(), TerminalError> {
        let cols = clamp_dimension(Some(cols), DEFAULT_COLS);
        let rows = clamp_dimension(Some(rows), DEFAULT_ROWS);
        let mut slot = self.active.lock().await;
        let sess = match slot.as_mut() {
            Some(s) if s.id.as_str() == session_id => s,
            _ => return Err(TerminalError::NoSession),
        };
        if let Err(e) = sess.handle.resize(cols, rows) {
            debug!(session_id, error = %e, "terminal resize ignored");
        }
        sess.touch(self.idle_timeout);
        Ok(())
    }

    /// Close the session with the given ID.
    ///
    /// Idempotent: an unknown or stale ID succeeds with no effect.
    pub async fn close(&self, session_id: &str) {
        let mut slot = self.active.lock().await;
        let Some(sess) = slot.take_if(|s| s.id.as_str() == session_id) else {
            debug!(session_id, "close for unknown terminal session ignored");
            return;
        };
        drop(slot);
        self.destroy_session(sess, true);
    }

    /// ID of the active session, if any.
    pub async fn active_session_id(&self) -> Option<TerminalSessionId> {
        self.active.lock().await.as_ref().map(|s| s.id.clone())
    }

    /// Process-wide cleanup at shutdown.
    ///
    /// Destroys the active session without broadcasting — the channel may
    /// already be gone.
    pub async fn shutdown(&self) {
        let mut slot = self.active.lock().await;
        if let Some(sess) = slot.take() {
            drop(slot);
            self.destroy_session(sess, false);
        }
    }

    /// Monitor-initiated teardown (idle eviction or shell exit).
    async fn reap(&self, session_id: &TerminalSessionId, reason: CloseReason) {
        let mut slot = self.active.lock().await;
        let Some(sess) = slot.take_if(|s| s.id == *session_id) else {
            return;
        };
        drop(slot);
        match reason {
            CloseReason::Idle => {
                counter!("terminal_idle_evictions_total").increment(1);
                info!(session_id = %session_id, "idle terminal session evicted");
            }
            CloseReason::Exited => {
                info!(session_id = %session_id, "terminal shell exited");
            }
        }
        self.destroy_session(sess, true);
    }

    fn destroy_session(&self, mut sess: ActiveSession, broadcast: bool) {
        sess.cancel.cancel();
        if let Err(e) = sess.handle.kill() {
            // The process may already be dead; the end state is reached.
            debug!(session_id = %sess.id, error = %e, "terminal kill ignored");
        }
        if broadcast {
            self.sink.emit(GatewayEvent::TerminalClosed {
                session_id: sess.id.to_string(),
            });
        }
        info!(session_id = %sess.id, "terminal session closed");
    }
}

/// Per-session monitor: relays output, detects exit, enforces the idle
/// deadline. Exits when the session is destroyed from any path.
async fn monitor_loop(
    manager: Weak<TerminalManager>,
    session_id: TerminalSessionId,
    mut events: mpsc::Receiver<PtyEvent>,
    deadline: Arc<SyncMutex<Instant>>,
    cancel: CancellationToken,
    sink: Arc<dyn EventSink>,
) {
    loop {
        let next_deadline = *deadline.lock();
        tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(PtyEvent::Output(data)) => {
                    sink.emit(GatewayEvent::TerminalOutput {
                        session_id: session_id.to_string(),
                        data: String::from_utf8_lossy(&data).into_owned(),
                    });
                }
                Some(PtyEvent::Exited) | None => {
                    if let Some(mgr) = manager.upgrade() {
                        mgr.reap(&session_id, CloseReason::Exited).await;
                    }
                    break;
                }
            },
            () = tokio::time::sleep_until(next_deadline) => {
                // Activity may have moved the deadline while we slept.
                if *deadline.lock() <= Instant::now() {
                    if let Some(mgr) = manager.upgrade() {
                        mgr.reap(&session_id, CloseReason::Idle).await;
                    }
                    break;
                }
            }
        }
    }
}

/// Floor a caller-supplied dimension and clamp it to at least 1.
///
/// `None` and non-finite values fall back to the default.
fn clamp_dimension(value: Option<f64>, default: u16) -> u16 {
    match value {
        Some(v) if v.is_finite() => {
            let floored = v.floor();
            if floored < 1.0 {
                1
            } else if floored >= f64::from(u16::MAX) {
                u16::MAX
            } else {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    floored as u16
                }
            }
        }
        _ => default,
    }
}
