//! Aggregated result of one identify run.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use idassert_assertion::AssertionExpression;
use idassert_core::{ProofSet, ProofState};

use crate::diff::{TrackDiff, TrackDiffDeleted};
use crate::error::IdentifyError;
use crate::proof_link::RemoteProof;
use crate::track::{TrackIdComponent, TrackSummary};

/// Failure reported by the proof checker for one proof.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProofCheckError {
    message: String,
    temporary: bool,
}

impl ProofCheckError {
    /// A permanent failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            temporary: false,
        }
    }

    /// A failure that may go away on retry.
    pub fn temporary(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            temporary: true,
        }
    }

    /// Whether the failure is transient.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Proof state implied by this failure.
    pub fn observed_state(&self) -> ProofState {
        if self.temporary {
            ProofState::TempFailure
        } else {
            ProofState::PermFailure
        }
    }
}

/// Check result for one active proof.
#[derive(Debug, Clone)]
pub struct LinkCheckResult {
    /// The proof that was checked.
    pub proof: RemoteProof,
    /// Display position among the active proofs.
    pub position: usize,
    /// Difference from the tracked value.
    pub diff: Option<TrackDiff>,
    /// Difference from the tracked proof state.
    pub remote_diff: Option<TrackDiff>,
    /// State recorded in the tracking statement.
    pub tracked_proof_state: ProofState,
    /// Check failure, if any.
    pub err: Option<ProofCheckError>,
}

impl LinkCheckResult {
    pub(crate) fn new(proof: RemoteProof, position: usize) -> Self {
        Self {
            proof,
            position,
            diff: None,
            remote_diff: None,
            tracked_proof_state: ProofState::None,
            err: None,
        }
    }

    fn breaks_tracking(&self) -> bool {
        breaks(&self.diff) || breaks(&self.remote_diff)
    }

    fn is_same_as_tracked(&self) -> bool {
        !changed(&self.diff) && !changed(&self.remote_diff)
    }
}

fn breaks(diff: &Option<TrackDiff>) -> bool {
    diff.as_ref().is_some_and(TrackDiff::breaks_tracking)
}

fn changed(diff: &Option<TrackDiff>) -> bool {
    diff.as_ref().is_some_and(|d| !d.is_same_as_tracked())
}

/// Non-fatal problem found during identify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning(String);

impl Warning {
    /// Create a warning.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Warning text.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered list of warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    /// Append a warning.
    pub fn push(&mut self, warning: Warning) {
        self.0.push(warning);
    }

    /// Number of warnings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no warnings.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Warnings in the order they were raised.
    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }
}

/// Where an identified user stands relative to a tracking statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    /// Tracked before, and some tracked component now fails.
    UpdateBrokenFailedProofs,
    /// Tracked before, and a tracked proof was revoked or deleted.
    UpdateBrokenRevoked,
    /// Tracked before, nothing broken, but something changed.
    UpdateNewProofs,
    /// Tracked before and unchanged.
    UpdateOk,
    /// Not tracked, and no proof checked out.
    NewZeroProofs,
    /// Not tracked, and some proof failed.
    NewFailProofs,
    /// Not tracked, and every proof checked out.
    NewOk,
}

impl TrackStatus {
    /// String representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::UpdateBrokenFailedProofs => "update_broken_failed_proofs",
            TrackStatus::UpdateBrokenRevoked => "update_broken_revoked",
            TrackStatus::UpdateNewProofs => "update_new_proofs",
            TrackStatus::UpdateOk => "update_ok",
            TrackStatus::NewZeroProofs => "new_zero_proofs",
            TrackStatus::NewFailProofs => "new_fail_proofs",
            TrackStatus::NewOk => "new_ok",
        }
    }
}

/// Everything one identify run found.
#[derive(Debug, Clone, Default)]
pub struct IdentifyOutcome {
    /// Upstream failure of the whole run.
    pub error: Option<String>,
    /// Eldest-key difference, when both keys were known.
    pub key_diff: Option<TrackDiff>,
    /// Tracked proofs that disappeared.
    pub deleted: Vec<TrackDiffDeleted>,
    /// One result per active proof.
    pub proof_checks: Vec<LinkCheckResult>,
    /// Warnings raised during the run.
    pub warnings: Warnings,
    /// Tracking statement the run was checked against.
    pub track_used: Option<TrackSummary>,
    /// A track was used and nothing differs from it.
    pub track_equal: bool,
    /// The user identified themselves.
    pub me_set: bool,
}

impl IdentifyOutcome {
    /// Tracked proofs that disappeared.
    pub fn num_deleted(&self) -> usize {
        self.deleted.len()
    }

    /// Proof checks that returned an error.
    pub fn num_proof_failures(&self) -> usize {
        self.proof_checks.iter().filter(|c| c.err.is_some()).count()
    }

    /// Proof checks that succeeded.
    pub fn num_proof_successes(&self) -> usize {
        self.proof_checks.iter().filter(|c| c.err.is_none()).count()
    }

    /// Components whose differences invalidate the tracking statement.
    pub fn num_track_failures(&self) -> usize {
        let checks = self.proof_checks.iter().filter(|c| c.breaks_tracking()).count();
        checks + usize::from(breaks(&self.key_diff))
    }

    /// Components that differ from the tracking statement in any way.
    pub fn num_track_changes(&self) -> usize {
        let checks = self.proof_checks.iter().filter(|c| !c.is_same_as_tracked()).count();
        checks + usize::from(changed(&self.key_diff))
    }

    /// Summarize the run relative to tracking.
    pub fn track_status(&self) -> TrackStatus {
        if self.num_track_failures() > 0 {
            TrackStatus::UpdateBrokenFailedProofs
        } else if self.num_deleted() > 0 {
            TrackStatus::UpdateBrokenRevoked
        } else if self.track_used.is_some() {
            if self.num_track_changes() > 0 {
                TrackStatus::UpdateNewProofs
            } else {
                TrackStatus::UpdateOk
            }
        } else if self.num_proof_successes() == 0 {
            TrackStatus::NewZeroProofs
        } else if self.num_proof_failures() > 0 {
            TrackStatus::NewFailProofs
        } else {
            TrackStatus::NewOk
        }
    }

    /// Fold the outcome into an optional error and the remaining warnings.
    ///
    /// Deletions and failed checks are errors in strict mode and warnings
    /// otherwise. Broken tracking is always an error.
    pub fn get_error_and_warnings(&self, strict: bool) -> (Option<IdentifyError>, Warnings) {
        let mut warnings = self.warnings.clone();
        if let Some(error) = &self.error {
            return (Some(IdentifyError::Upstream(error.clone())), warnings);
        }

        let mut problems = Vec::new();
        let soft = self
            .deleted
            .iter()
            .map(ToString::to_string)
            .chain(self.proof_checks.iter().filter_map(|c| {
                c.err.as_ref().map(|err| {
                    format!("problem with {} proof: {}", c.proof.to_id_string(), err)
                })
            }));
        for message in soft {
            if strict {
                problems.push(message);
            } else {
                warnings.push(Warning::new(message));
            }
        }

        let failures = self.num_track_failures();
        if failures > 0 {
            problems.push(format!("{} track component(s) failed", failures));
        }

        let error = if problems.is_empty() {
            None
        } else {
            let error = IdentifyError::Failed { problems };
            debug!("Identify failed (strict={}): {}", strict, error);
            Some(error)
        };
        (error, warnings)
    }

    /// Facts established by the run: proofs that checked out and are `Ok`
    /// on the chain.
    pub fn to_proof_set(&self) -> ProofSet {
        self.proof_checks
            .iter()
            .filter(|c| c.err.is_none() && c.proof.state().is_ok())
            .map(|c| c.proof.to_proof())
            .collect()
    }

    /// Whether the established facts satisfy an assertion.
    pub fn satisfies(&self, expr: &AssertionExpression) -> bool {
        expr.match_set(&self.to_proof_set())
    }
}
