//! Reload-plan value object.
//!
//! A [`ReloadPlan`] is the computed result of diffing two configuration
//! snapshots, describing which subsystems must reload or restart. The plan
//! is produced elsewhere and consumed opaquely here: the restart
//! coordinator only reads [`ReloadPlan::restart_gateway`] and the
//! reasons/paths it logs to justify the decision.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Immutable description of what a configuration change requires.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReloadPlan {
    /// Whether the whole gateway process must restart.
    pub restart_gateway: bool,
    /// Ordered reasons justifying a gateway restart (logging only).
    pub restart_reasons: Vec<String>,
    /// Ordered configuration paths that changed (logging only).
    pub changed_paths: Vec<String>,
    /// Hook definitions must be reloaded in place.
    pub reload_hooks: bool,
    /// The heartbeat subsystem must restart.
    pub restart_heartbeat: bool,
    /// The cron subsystem must restart.
    pub restart_cron: bool,
    /// The browser-control subsystem must restart.
    pub restart_browser_control: bool,
    /// The Gmail watcher subsystem must restart.
    pub restart_gmail_watcher: bool,
    /// Channel identifiers whose plugins must restart.
    pub restart_channels: BTreeSet<String>,
    /// Reasons that were absorbed by hot reload (diagnostics only).
    pub hot_reasons: Vec<String>,
    /// Changed paths that required no action (diagnostics only).
    pub noop_paths: Vec<String>,
}

impl ReloadPlan {
    /// Build a plan that requires a full gateway restart.
    pub fn gateway_restart<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            restart_gateway: true,
            restart_reasons: reasons.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Whether the plan requires no action at all.
    pub fn is_noop(&self) -> bool {
        !self.restart_gateway
            && !self.reload_hooks
            && !self.restart_heartbeat
            && !self.restart_cron
            && !self.restart_browser_control
            && !self.restart_gmail_watcher
            && self.restart_channels.is_empty()
    }
}
