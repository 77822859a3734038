//! Gateway restart coordination.
//!
//! A reload plan that requires a full gateway restart cannot always be
//! acted on immediately: restarting while a human is mid-way through an
//! interactive setup wizard would throw away the wizard's in-memory
//! progress. The [`RestartCoordinator`] therefore defers rather than
//! rejects — the restart is owed, and it fires as soon as the conflict
//! clears.
//!
//! Deferral is latest-wins: only the fact that *a* restart is owed
//! matters for the signal, so a second deferred request replaces the
//! first. The held plan's reasons are carried for logging only and
//! staleness is acceptable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use metrics::counter;
use parking_lot::Mutex;
use quay_core::ReloadPlan;
use quay_settings::Settings;
use tracing::{debug, info};

/// Conflict gate consulted before signaling a restart.
pub trait WizardGate: Send + Sync {
    /// Whether an interactive setup wizard is currently mid-flow.
    fn is_setup_wizard_active(&self) -> bool;
}

/// Self-restart signal primitive.
///
/// An asynchronous, self-directed request to the host process supervisor
/// to tear down and relaunch this process. Fire-and-forget: the
/// coordinator does not wait for teardown, and in-flight connections are
/// the supervisor's problem.
pub trait RestartRequester: Send + Sync {
    /// Ask the supervisor to restart this process.
    fn request_restart(&self);
}

/// Shared wizard-active flag.
///
/// The gateway-side owner of "is a setup wizard running". Implements
/// [`WizardGate`] for the coordinator and is toggled through
/// [`WizardSession`].
#[derive(Default)]
pub struct WizardFlag {
    active: AtomicBool,
}

impl WizardFlag {
    /// Create a new flag, initially inactive.
    pub fn new() -> Self {
        Self::default()
    }

    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

impl WizardGate for WizardFlag {
    fn is_setup_wizard_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// The most recently deferred restart request.
struct DeferredRestart {
    plan: ReloadPlan,
    settings: Settings,
}

/// Decides whether a reload plan restarts the gateway now or later.
///
/// Owns the process-wide deferred-restart slot. At most one deferred
/// restart is held at a time; it is consumed exactly once by
/// [`RestartCoordinator::flush_deferred_restart`].
pub struct RestartCoordinator {
    gate: Arc<dyn WizardGate>,
    requester: Arc<dyn RestartRequester>,
    deferred: Mutex<Option<DeferredRestart>>,
}

impl RestartCoordinator {
    /// Create a coordinator with its injected collaborators.
    pub fn new(gate: Arc<dyn WizardGate>, requester: Arc<dyn RestartRequester>) -> Self {
        Self {
            gate,
            requester,
            deferred: Mutex::new(None),
        }
    }

    /// Handle a computed reload plan.
    ///
    /// No-op unless the plan requires a gateway restart. When it does:
    /// signal immediately if no setup wizard is active, otherwise store
    /// the `(plan, settings)` pair — replacing any previously held pair —
    /// and return without signaling. Never errors; restart requests are
    /// always accepted and either executed or queued.
    pub fn request_gateway_restart(&self, plan: ReloadPlan, settings: Settings) {
        if !plan.restart_gateway {
            debug!(
                changed_paths = ?plan.changed_paths,
                "reload plan does not require a gateway restart"
            );
            return;
        }

        if self.gate.is_setup_wizard_active() {
            counter!("gateway_restarts_deferred_total").increment(1);
            info!(
                reasons = ?plan.restart_reasons,
                "setup wizard active, deferring gateway restart"
            );
            *self.deferred.lock() = Some(DeferredRestart { plan, settings });
            return;
        }

        self.signal(&plan, &settings);
    }

    /// Emit the deferred restart signal, if one is pending.
    ///
    /// No-op when nothing is pending, which makes a rapid double-call
    /// safe: the first call consumes and signals, the second observes an
    /// empty slot. The gate is deliberately not re-checked here — the
    /// gateway only calls flush after the conflict has cleared.
    pub fn flush_deferred_restart(&self) {
        let Some(held) = self.deferred.lock().take() else {
            return;
        };
        info!("flushing deferred gateway restart");
        self.signal(&held.plan, &held.settings);
    }

    /// Whether a deferred restart is currently held.
    pub fn restart_pending(&self) -> bool {
        self.deferred.lock().is_some()
    }

    fn signal(&self, plan: &ReloadPlan, settings: &Settings) {
        counter!("gateway_restarts_requested_total").increment(1);
        info!(
            reasons = ?plan.restart_reasons,
            changed_paths = ?plan.changed_paths,
            command_alias = settings.restart.command_alias.is_some(),
            "requesting gateway restart"
        );
        self.requester.request_restart();
    }
}

/// RAII marker for an in-flight setup wizard.
///
/// Marks the wizard active on [`begin`](WizardSession::begin). On
/// [`finish`](WizardSession::finish) — or on drop, so an abandoned wizard
/// cannot wedge the gateway — the flag clears and any deferred restart is
/// flushed.
pub struct WizardSession {
    flag: Arc<WizardFlag>,
    coordinator: Arc<RestartCoordinator>,
    finished: bool,
}

impl WizardSession {
    /// Start a wizard session, blocking restarts until it finishes.
    pub fn begin(flag: Arc<WizardFlag>, coordinator: Arc<RestartCoordinator>) -> Self {
        flag.set_active(true);
        info!("setup wizard started, gateway restarts deferred");
        Self {
            flag,
            coordinator,
            finished: false,
        }
    }

    /// Finish the wizard and flush any restart deferred while it ran.
    pub fn finish(mut self) {
        self.complete();
    }

    fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.flag.set_active(false);
        info!("setup wizard finished");
        self.coordinator.flush_deferred_restart();
    }
}

impl Drop for WizardSession {
    fn drop(&mut self) {
        self.complete();
    }
}
