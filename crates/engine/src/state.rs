//! Step-by-step state of one identify run.
//!
//! A run moves through fixed phases:
//!
//! ```text
//! Initialized -> ResultsListed -> DiffsComputed -> DeletionsComputed -> finalize()
//! ```
//!
//! Proof check results may be recorded at any point after the result list
//! exists. Without a prior tracking statement the two diff steps may be
//! skipped.

use std::fmt;
use tracing::debug;

use idassert_core::ProofState;

use crate::diff::{compute_key_diff, compute_remote_diff, TrackDiffDeleted};
use crate::error::{EngineError, Result};
use crate::outcome::{IdentifyOutcome, LinkCheckResult, ProofCheckError};
use crate::proof_link::{collect_active_proofs, RemoteProof};
use crate::track::{TrackIdComponent, TrackLookup, TrackSet};

/// Phase of an identify run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IdentifyPhase {
    /// Created; nothing computed.
    Initialized,
    /// One check result exists per active proof.
    ResultsListed,
    /// Per-proof diffs against the track are known.
    DiffsComputed,
    /// Deleted proofs are known.
    DeletionsComputed,
}

impl IdentifyPhase {
    /// String representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifyPhase::Initialized => "initialized",
            IdentifyPhase::ResultsListed => "results_listed",
            IdentifyPhase::DiffsComputed => "diffs_computed",
            IdentifyPhase::DeletionsComputed => "deletions_computed",
        }
    }
}

impl fmt::Display for IdentifyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state of one identify run. Owned by that run only.
#[derive(Debug)]
pub struct IdentifyState {
    phase: IdentifyPhase,
    links: Vec<RemoteProof>,
    track: Option<TrackLookup>,
    observed_eldest_kid: Option<String>,
    outcome: IdentifyOutcome,
}

impl IdentifyState {
    /// Start a run over the proofs claimed by a sigchain, in chain order,
    /// optionally against a prior tracking statement.
    pub fn new(links: Vec<RemoteProof>, track: Option<TrackLookup>) -> Self {
        Self {
            phase: IdentifyPhase::Initialized,
            links,
            track,
            observed_eldest_kid: None,
            outcome: IdentifyOutcome::default(),
        }
    }

    /// Mark the run as the user identifying themselves.
    pub fn me_set(mut self, me_set: bool) -> Self {
        self.outcome.me_set = me_set;
        self
    }

    /// Eldest key found on the chain now.
    pub fn observed_eldest_kid(mut self, kid: impl Into<String>) -> Self {
        self.observed_eldest_kid = Some(kid.into());
        self
    }

    /// Current phase.
    pub fn phase(&self) -> IdentifyPhase {
        self.phase
    }

    /// Prior tracking statement, if any.
    pub fn track(&self) -> Option<&TrackLookup> {
        self.track.as_ref()
    }

    /// Outcome so far.
    pub fn outcome(&self) -> &IdentifyOutcome {
        &self.outcome
    }

    fn out_of_order<T>(&self, step: &'static str) -> Result<T> {
        Err(EngineError::OutOfOrder {
            step,
            phase: self.phase,
        })
    }

    /// Whether the diff steps may be skipped.
    fn untracked(&self) -> bool {
        self.track.is_none()
    }

    /// Create one check result per active proof.
    pub fn init_result_list(&mut self) -> Result<()> {
        if self.phase != IdentifyPhase::Initialized {
            return self.out_of_order("init_result_list");
        }
        self.outcome.proof_checks = collect_active_proofs(&self.links)
            .into_iter()
            .enumerate()
            .map(|(position, proof)| LinkCheckResult::new(proof, position))
            .collect();
        debug!(
            "Listed {} active proofs out of {} links",
            self.outcome.proof_checks.len(),
            self.links.len()
        );
        self.phase = IdentifyPhase::ResultsListed;
        Ok(())
    }

    /// Diff each active proof, and the eldest key, against the track.
    pub fn compute_track_diffs(&mut self) -> Result<()> {
        if self.phase != IdentifyPhase::ResultsListed {
            return self.out_of_order("compute_track_diffs");
        }
        self.phase = IdentifyPhase::DiffsComputed;
        let Some(track) = &self.track else {
            return Ok(());
        };

        for check in &mut self.outcome.proof_checks {
            let diff = check.proof.compute_track_diff(track);
            check.tracked_proof_state = track.set().proof_state(&check.proof);
            debug!("Track diff for {}: {}", check.proof.to_id_string(), diff);
            check.diff = Some(diff);
        }
        self.outcome.key_diff =
            compute_key_diff(track.eldest_kid(), self.observed_eldest_kid.as_deref());
        Ok(())
    }

    /// Record tracked proofs that were `Ok` and are no longer active.
    pub fn compute_deleted_proofs(&mut self) -> Result<()> {
        let ready = match self.phase {
            IdentifyPhase::DiffsComputed => true,
            IdentifyPhase::ResultsListed => self.untracked(),
            _ => false,
        };
        if !ready {
            return self.out_of_order("compute_deleted_proofs");
        }
        self.phase = IdentifyPhase::DeletionsComputed;
        let Some(track) = &self.track else {
            return Ok(());
        };

        let mut found = TrackSet::new();
        for check in &self.outcome.proof_checks {
            found.add(&check.proof);
        }
        let tracked = track.set();
        for component in tracked.subtract(&found) {
            if component.proof_state() != ProofState::Ok {
                continue;
            }
            let id = component.to_id_string();
            let Some(position) = tracked.position_of(&id) else {
                continue;
            };
            debug!("Tracked proof {} was deleted", id);
            self.outcome.deleted.push(TrackDiffDeleted {
                component,
                position,
            });
        }
        Ok(())
    }

    /// Store the checker's verdict for the proof at `position`.
    pub fn record_check(
        &mut self,
        position: usize,
        result: std::result::Result<(), ProofCheckError>,
    ) -> Result<()> {
        if self.phase == IdentifyPhase::Initialized {
            return self.out_of_order("record_check");
        }
        let check = self
            .outcome
            .proof_checks
            .iter_mut()
            .find(|c| c.position == position)
            .ok_or(EngineError::UnknownPosition(position))?;

        let observed = match &result {
            Ok(()) => ProofState::Ok,
            Err(err) => err.observed_state(),
        };
        if let Some(track) = &self.track {
            let tracked = track.set().proof_state(&check.proof);
            check.tracked_proof_state = tracked;
            check.remote_diff = Some(compute_remote_diff(tracked, observed));
        }
        debug!("Proof {} checked as {}", check.proof.to_id_string(), observed);
        check.err = result.err();
        Ok(())
    }

    /// Finish the run.
    pub fn finalize(mut self) -> Result<IdentifyOutcome> {
        let ready = match self.phase {
            IdentifyPhase::DeletionsComputed => true,
            IdentifyPhase::ResultsListed => self.untracked(),
            _ => false,
        };
        if !ready {
            return self.out_of_order("finalize");
        }

        self.outcome.track_used = self.track.as_ref().map(|t| t.summary().clone());
        self.outcome.track_equal = self.outcome.track_used.is_some()
            && self.outcome.num_track_changes() == 0
            && self.outcome.num_deleted() == 0;
        debug!(
            "Identify finished: {} checks, {} deleted, status {}",
            self.outcome.proof_checks.len(),
            self.outcome.num_deleted(),
            self.outcome.track_status().as_str()
        );
        Ok(self.outcome)
    }
}
