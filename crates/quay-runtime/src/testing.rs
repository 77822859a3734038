//! Deterministic test doubles for the runtime's collaborator traits.
//!
//! Shared across this crate's unit tests and downstream crates' handler
//! tests, so they live in a regular (non-`cfg(test)`) module.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use quay_core::GatewayEvent;
use tokio::sync::mpsc;

use crate::restart::{RestartRequester, WizardGate};
use crate::sink::EventSink;
use crate::terminal::pty::{PtyEvent, PtyHandle, PtySpawner};

/// Restart requester that counts invocations instead of signaling.
#[derive(Default)]
pub struct CountingRequester {
    count: AtomicUsize,
}

impl CountingRequester {
    /// Number of restart signals emitted so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl RestartRequester for CountingRequester {
    fn request_restart(&self) {
        let _ = self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Wizard gate with a fixed (but settable) answer.
pub struct StaticGate {
    active: AtomicBool,
}

impl StaticGate {
    /// Create a gate with the given initial answer.
    pub fn new(active: bool) -> Self {
        Self {
            active: AtomicBool::new(active),
        }
    }

    /// Change the gate's answer.
    pub fn set(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

impl WizardGate for StaticGate {
    fn is_setup_wizard_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Event sink that records everything it is given.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<GatewayEvent>>,
}

impl RecordingSink {
    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<GatewayEvent> {
        self.events.lock().clone()
    }

    /// Recorded `terminal.closed` session IDs, in order.
    pub fn closed_sessions(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                GatewayEvent::TerminalClosed { session_id } => Some(session_id.clone()),
                GatewayEvent::TerminalOutput { .. } => None,
            })
            .collect()
    }

    /// Recorded `terminal.output` data chunks, in order.
    pub fn output_chunks(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                GatewayEvent::TerminalOutput { data, .. } => Some(data.clone()),
                GatewayEvent::TerminalClosed { .. } => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: GatewayEvent) {
        self.events.lock().push(event);
    }
}

/// Shared observable state of one scripted PTY handle.
#[derive(Default)]
pub struct HandleState {
    /// Bytes written to the shell, one entry per `write` call.
    pub writes: Mutex<Vec<Vec<u8>>>,
    /// Resize calls as `(cols, rows)`.
    pub resizes: Mutex<Vec<(u16, u16)>>,
    /// Number of `kill` calls.
    pub kills: AtomicUsize,
    /// When set, `kill` returns an error (process already dead).
    pub fail_kill: AtomicBool,
}

impl HandleState {
    /// Number of times the handle was killed.
    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

struct MockPtyHandle {
    state: Arc<HandleState>,
}

impl PtyHandle for MockPtyHandle {
    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.state.writes.lock().push(data.to_vec());
        Ok(())
    }

    fn resize(&mut self, cols: u16, rows: u16) -> std::io::Result<()> {
        self.state.resizes.lock().push((cols, rows));
        Ok(())
    }

    fn kill(&mut self) -> std::io::Result<()> {
        let _ = self.state.kills.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_kill.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("no such process"));
        }
        Ok(())
    }
}

/// Record of one scripted spawn.
pub struct SpawnRecord {
    /// Requested columns.
    pub cols: u16,
    /// Requested rows.
    pub rows: u16,
    /// Observable handle state.
    pub state: Arc<HandleState>,
    /// Sender used to script output/exit events into the session.
    pub events: mpsc::Sender<PtyEvent>,
}

/// Scripted PTY factory.
///
/// Records every spawn and hands back a channel the test drives to
/// simulate shell output and exit.
#[derive(Default)]
pub struct MockPtySpawner {
    fail: AtomicBool,
    spawned: Mutex<Vec<SpawnRecord>>,
}

impl MockPtySpawner {
    /// Make the next spawns fail (simulates PTY exhaustion).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of spawns performed.
    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().len()
    }

    /// Run `f` against the n-th spawn record.
    pub fn with_spawn<R>(&self, index: usize, f: impl FnOnce(&SpawnRecord) -> R) -> Option<R> {
        self.spawned.lock().get(index).map(f)
    }
}

impl PtySpawner for MockPtySpawner {
    fn spawn_shell(
        &self,
        cols: u16,
        rows: u16,
    ) -> std::io::Result<(Box<dyn PtyHandle>, mpsc::Receiver<PtyEvent>)> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("pty unavailable"));
        }
        let (tx, rx) = mpsc::channel(32);
        let state = Arc::new(HandleState::default());
        self.spawned.lock().push(SpawnRecord {
            cols,
            rows,
            state: state.clone(),
            events: tx,
        });
        Ok((Box::new(MockPtyHandle { state }), rx))
    }
}
