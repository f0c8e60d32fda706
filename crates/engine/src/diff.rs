//! Differences between a tracking statement and what an identify run observed.

use serde::Serialize;
use std::fmt;

use idassert_core::ProofState;

use crate::track::{ServiceBlock, TrackIdComponent};

/// How one observation differs from what was tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackDiff {
    /// Identical to the tracked value.
    None,
    /// Same site, stronger protocol.
    Upgraded {
        /// Protocol at tracking time.
        prev: String,
        /// Protocol now.
        curr: String,
    },
    /// Nothing was tracked for this proof.
    New,
    /// A different value than the one tracked for this service.
    Clash {
        /// Value found now.
        observed: String,
        /// Value tracked.
        expected: String,
    },
    /// A proof that was tracked as working now fails.
    RemoteFail {
        /// State found now.
        observed: ProofState,
    },
    /// A proof that was tracked as not working now works.
    RemoteWorking {
        /// State at tracking time.
        tracked: ProofState,
    },
    /// A non-working proof changed how it fails.
    RemoteChanged {
        /// State at tracking time.
        tracked: ProofState,
        /// State found now.
        observed: ProofState,
    },
    /// The account's eldest key changed.
    NewEldest {
        /// Eldest key at tracking time.
        tracked: String,
        /// Eldest key now.
        observed: String,
    },
}

impl TrackDiff {
    /// Whether this difference invalidates the tracking statement.
    pub fn breaks_tracking(&self) -> bool {
        matches!(
            self,
            TrackDiff::Clash { .. } | TrackDiff::RemoteFail { .. } | TrackDiff::NewEldest { .. }
        )
    }

    /// Whether the observation is exactly what was tracked.
    pub fn is_same_as_tracked(&self) -> bool {
        matches!(self, TrackDiff::None)
    }
}

impl fmt::Display for TrackDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackDiff::None => f.write_str("tracked"),
            TrackDiff::Upgraded { prev, curr } => write!(f, "Upgraded from {} to {}", prev, curr),
            TrackDiff::New => f.write_str("new"),
            TrackDiff::Clash { expected, .. } => write!(f, "CHANGED from {:?}", expected),
            TrackDiff::RemoteFail { .. } => f.write_str("remote failed"),
            TrackDiff::RemoteWorking { .. } => f.write_str("newly working"),
            TrackDiff::RemoteChanged { .. } => f.write_str("changed"),
            TrackDiff::NewEldest { tracked, observed } if tracked.is_empty() => write!(
                f,
                "No key when followed; established new key {}",
                observed
            ),
            TrackDiff::NewEldest { tracked, observed } => write!(
                f,
                "Account reset! Old key was {}; new key is {}",
                tracked, observed
            ),
        }
    }
}

/// A tracked proof that has no counterpart among the current proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDiffDeleted {
    /// The tracked component.
    pub component: ServiceBlock,
    /// Position of the component in the tracking statement.
    pub position: usize,
}

impl TrackDiffDeleted {
    /// Deletions always invalidate the tracking statement.
    pub fn breaks_tracking(&self) -> bool {
        true
    }
}

impl fmt::Display for TrackDiffDeleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deleted proof: {}", self.component.to_id_string())
    }
}

/// Compare a tracked proof state with the state observed now.
pub fn compute_remote_diff(tracked: ProofState, observed: ProofState) -> TrackDiff {
    if observed == tracked {
        TrackDiff::None
    } else if observed.is_ok() {
        TrackDiff::RemoteWorking { tracked }
    } else if tracked.is_ok() {
        TrackDiff::RemoteFail { observed }
    } else {
        TrackDiff::RemoteChanged { tracked, observed }
    }
}

/// Compare eldest keys. `None` unless both are known.
pub fn compute_key_diff(tracked: Option<&str>, observed: Option<&str>) -> Option<TrackDiff> {
    let (tracked, observed) = (tracked?, observed?);
    if tracked.eq_ignore_ascii_case(observed) {
        Some(TrackDiff::None)
    } else {
        Some(TrackDiff::NewEldest {
            tracked: tracked.to_string(),
            observed: observed.to_string(),
        })
    }
}
