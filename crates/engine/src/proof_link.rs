//! Proofs currently claimed by a user's sigchain.

use std::collections::HashSet;

use idassert_core::{CoreError, Proof, ProofState, ServiceClass, ServiceDirectory, ServiceKey};

use crate::diff::TrackDiff;
use crate::track::{id_string, TrackIdComponent, TrackLookup};

/// Kind of remote proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteProofKind {
    /// Site proof over `http`, `https` or `dns`.
    Web,
    /// Account on a social network.
    Social,
}

/// A remote proof as claimed by a sigchain link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProof {
    kind: RemoteProofKind,
    key: ServiceKey,
    value: String,
    state: ProofState,
    last_writer_wins: bool,
}

impl RemoteProof {
    /// Site proof. `protocol` is `http`, `https` or `dns`.
    pub fn web(
        protocol: &str,
        host: impl Into<String>,
        state: ProofState,
    ) -> idassert_core::Result<Self> {
        Ok(Self {
            kind: RemoteProofKind::Web,
            key: ServiceKey::new(protocol)?,
            value: host.into(),
            state,
            last_writer_wins: false,
        })
    }

    /// Social proof. Only the newest proof per service counts.
    pub fn social(
        service: &str,
        username: impl Into<String>,
        state: ProofState,
    ) -> idassert_core::Result<Self> {
        Ok(Self {
            kind: RemoteProofKind::Social,
            key: ServiceKey::new(service)?,
            value: username.into(),
            state,
            last_writer_wins: true,
        })
    }

    /// Build a proof using the directory's policy for `service`.
    ///
    /// Unregistered services are treated as social. Keybase and fingerprint
    /// services are rejected.
    pub fn from_directory(
        directory: &ServiceDirectory,
        service: &str,
        value: impl Into<String>,
        state: ProofState,
    ) -> idassert_core::Result<Self> {
        let key = ServiceKey::new(service)?;
        let kind = match directory.lookup(key.as_str()).map(|p| p.class) {
            Some(ServiceClass::Host | ServiceClass::Web) => RemoteProofKind::Web,
            Some(ServiceClass::Social) | None => RemoteProofKind::Social,
            Some(ServiceClass::Keybase | ServiceClass::Fingerprint) => {
                return Err(CoreError::NotRemoteService(key.to_string()));
            }
        };
        let last_writer_wins =
            kind == RemoteProofKind::Social && directory.last_writer_wins(key.as_str());
        Ok(Self {
            kind,
            key,
            value: value.into(),
            state,
            last_writer_wins,
        })
    }

    /// Proof kind.
    pub fn kind(&self) -> RemoteProofKind {
        self.kind
    }

    /// Service key.
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// Claimed value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// State recorded on the chain.
    pub fn state(&self) -> ProofState {
        self.state
    }

    /// Table the proof is filed under. `https` shares the `http` table.
    pub fn table_key(&self) -> &str {
        match self.key.as_str() {
            "https" => "http",
            other => other,
        }
    }

    /// Diff against a prior tracking statement.
    pub fn compute_track_diff(&self, track: &TrackLookup) -> TrackDiff {
        let tracked = |key: &str| {
            track
                .values_for(key)
                .iter()
                .any(|v| v.eq_ignore_ascii_case(&self.value))
        };
        match self.kind {
            RemoteProofKind::Web => {
                if tracked(self.key.as_str()) {
                    TrackDiff::None
                } else if self.key.as_str() == "https" && tracked("http") {
                    TrackDiff::Upgraded {
                        prev: "http".to_string(),
                        curr: "https".to_string(),
                    }
                } else {
                    TrackDiff::New
                }
            }
            RemoteProofKind::Social => match track.values_for(self.key.as_str()).last() {
                None => TrackDiff::New,
                Some(expected) if !expected.eq_ignore_ascii_case(&self.value) => TrackDiff::Clash {
                    observed: self.value.clone(),
                    expected: expected.clone(),
                },
                Some(_) => TrackDiff::None,
            },
        }
    }

    /// The `(key, value)` fact this proof asserts.
    pub fn to_proof(&self) -> Proof {
        Proof::with_key(self.key.clone(), self.value.clone())
    }
}

impl TrackIdComponent for RemoteProof {
    fn to_id_string(&self) -> String {
        id_string(self.key.as_str(), &self.value, self.last_writer_wins)
    }

    fn to_key_value_pair(&self) -> (&str, &str) {
        (self.key.as_str(), &self.value)
    }

    fn proof_state(&self) -> ProofState {
        self.state
    }

    fn last_writer_wins(&self) -> bool {
        self.last_writer_wins
    }
}

/// Proofs still in force, in chain order.
///
/// A revoked link drops its proof along with any older link for the same id.
/// For last-writer-wins services only the newest proof per table survives;
/// other services keep every distinct proof.
pub fn collect_active_proofs(links: &[RemoteProof]) -> Vec<RemoteProof> {
    let mut seen_ids = HashSet::new();
    let mut seen_tables = HashSet::new();
    let mut active: Vec<RemoteProof> = links
        .iter()
        .rev()
        .filter(|p| seen_ids.insert(p.to_id_string()))
        .filter(|p| p.state != ProofState::Revoked)
        .filter(|p| !p.last_writer_wins || seen_tables.insert(p.table_key().to_string()))
        .cloned()
        .collect();
    active.reverse();
    active
}
