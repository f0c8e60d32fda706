//! Identify engine.
//!
//! Compares what an identify run observes against a prior tracking
//! statement:
//! - Each active proof gets a [`TrackDiff`] against the tracked value and,
//!   once checked, against the tracked proof state
//! - Tracked proofs that were `Ok` and have disappeared become
//!   [`TrackDiffDeleted`] entries
//! - [`IdentifyOutcome`] counts failures and changes and folds them into an
//!   error plus warnings, strict or lax

#![warn(missing_docs)]

pub mod diff;
pub mod error;
pub mod outcome;
pub mod proof_link;
pub mod state;
pub mod track;

pub use diff::{compute_key_diff, compute_remote_diff, TrackDiff, TrackDiffDeleted};
pub use error::{EngineError, IdentifyError, Result};
pub use outcome::{
    IdentifyOutcome, LinkCheckResult, ProofCheckError, TrackStatus, Warning, Warnings,
};
pub use proof_link::{collect_active_proofs, RemoteProof, RemoteProofKind};
pub use state::{IdentifyPhase, IdentifyState};
pub use track::{
    ServiceBlock, TrackIdComponent, TrackLookup, TrackSet, TrackSummary, TrackedProof,
    TrackingStatement,
};
