//! Notifications fired after mutating flows

use tracing::{info, warn};

use super::target::SyncTarget;
use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Saved {
        target: SyncTarget,
        /// Whether the change was substantive enough to refresh the working tree
        synced: bool,
    },
    Committed {
        target: SyncTarget,
        commit: String,
    },
    Pushed {
        target: SyncTarget,
        commit: Option<String>,
    },
    Pulled {
        target: SyncTarget,
        nodes: usize,
        cards: usize,
    },
    BranchCreated {
        target: SyncTarget,
        from: String,
    },
    Restored {
        target: SyncTarget,
        entry_id: String,
    },
    RemoteSet {
        domain: String,
        mmid: i64,
        /// Redacted for display
        remote: String,
    },
    Failed {
        target: SyncTarget,
        flow: &'static str,
        kind: ErrorKind,
        message: String,
    },
}

/// Receiver of [`SyncEvent`]s
///
/// Called after the flow's locks are released; implementations must not
/// block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &SyncEvent);
}

/// Emits every event as a structured log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn emit(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Saved { target, synced } => {
                info!(
                    domain = %target.domain,
                    mmid = target.mmid,
                    branch = %target.branch,
                    synced,
                    "Mindmap saved"
                );
            }
            SyncEvent::Committed { target, commit } => {
                info!(
                    domain = %target.domain,
                    mmid = target.mmid,
                    branch = %target.branch,
                    commit = %commit,
                    "Changes committed"
                );
            }
            SyncEvent::Pushed { target, commit } => {
                info!(
                    domain = %target.domain,
                    mmid = target.mmid,
                    branch = %target.branch,
                    commit = ?commit,
                    "Branch pushed"
                );
            }
            SyncEvent::Pulled { target, nodes, cards } => {
                info!(
                    domain = %target.domain,
                    mmid = target.mmid,
                    branch = %target.branch,
                    nodes,
                    cards,
                    "Branch pulled"
                );
            }
            SyncEvent::BranchCreated { target, from } => {
                info!(
                    domain = %target.domain,
                    mmid = target.mmid,
                    branch = %target.branch,
                    from = %from,
                    "Branch created"
                );
            }
            SyncEvent::Restored { target, entry_id } => {
                info!(
                    domain = %target.domain,
                    mmid = target.mmid,
                    branch = %target.branch,
                    entry = %entry_id,
                    "History restored"
                );
            }
            SyncEvent::RemoteSet { domain, mmid, remote } => {
                info!(domain = %domain, mmid, remote = %remote, "Remote configured");
            }
            SyncEvent::Failed {
                target,
                flow,
                kind,
                message,
            } => {
                warn!(
                    domain = %target.domain,
                    mmid = target.mmid,
                    branch = %target.branch,
                    flow,
                    kind = %kind,
                    error = %message,
                    "Flow failed"
                );
            }
        }
    }
}
