//! Uniform results of mutating flows

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::tree::{ExportSummary, MirrorPlan};
use crate::Error;

/// Error half of a [`FlowOutcome`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for FlowError {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result of save, commit, push, pull, branch-create and restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOutcome {
    pub ok: bool,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FlowError>,
}

impl FlowOutcome {
    pub fn success(branch: impl Into<String>, commit: Option<String>) -> Self {
        Self {
            ok: true,
            branch: branch.into(),
            commit,
            error: None,
        }
    }

    pub fn failure(branch: impl Into<String>, err: &Error) -> Self {
        Self {
            ok: false,
            branch: branch.into(),
            commit: None,
            error: Some(FlowError::from(err)),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// What one `sync_without_commit` did to the working tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub working_dir: PathBuf,
    pub export: ExportSummary,
    pub plan: MirrorPlan,
}

impl SyncReport {
    /// Whether the working tree was already up to date
    pub fn unchanged(&self) -> bool {
        self.plan.is_empty()
    }
}
