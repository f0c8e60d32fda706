//! Tracking statements and the track sets built from them.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use idassert_core::{ProofState, ServiceDirectory, ServiceKey};

use crate::error::Result;

/// Anything that can be recorded in a [`TrackSet`].
pub trait TrackIdComponent {
    /// Canonical id: `value@key` for last-writer-wins services, `key://value`
    /// otherwise.
    fn to_id_string(&self) -> String;

    /// `(service key, value)`.
    fn to_key_value_pair(&self) -> (&str, &str);

    /// Recorded proof state.
    fn proof_state(&self) -> ProofState;

    /// Whether only the latest proof of this service counts.
    fn last_writer_wins(&self) -> bool;
}

pub(crate) fn id_string(key: &str, value: &str, last_writer_wins: bool) -> String {
    if last_writer_wins {
        format!("{}@{}", value, key)
    } else {
        format!("{}://{}", key, value)
    }
}

/// A proof as recorded in a tracking statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBlock {
    key: ServiceKey,
    value: String,
    state: ProofState,
    social: bool,
}

impl ServiceBlock {
    /// Create a service block.
    pub fn new(key: ServiceKey, value: impl Into<String>, state: ProofState, social: bool) -> Self {
        Self {
            key,
            value: value.into(),
            state,
            social,
        }
    }

    /// Snapshot any track component.
    pub fn from_component<C: TrackIdComponent + ?Sized>(component: &C) -> Self {
        let (key, value) = component.to_key_value_pair();
        Self {
            key: ServiceKey::new_unchecked(key),
            value: value.to_string(),
            state: component.proof_state(),
            social: component.last_writer_wins(),
        }
    }

    /// Service key.
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// Tracked value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this is a social (last-writer-wins) proof.
    pub fn is_social(&self) -> bool {
        self.social
    }
}

impl TrackIdComponent for ServiceBlock {
    fn to_id_string(&self) -> String {
        id_string(self.key.as_str(), &self.value, self.social)
    }

    fn to_key_value_pair(&self) -> (&str, &str) {
        (self.key.as_str(), &self.value)
    }

    fn proof_state(&self) -> ProofState {
        self.state
    }

    fn last_writer_wins(&self) -> bool {
        self.social
    }
}

/// Set of track components with last-writer-wins membership.
///
/// Insertion order is kept so `subtract` is deterministic and every entry
/// has a stable position.
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    components: Vec<ServiceBlock>,
    ids: HashMap<String, usize>,
    services: HashSet<ServiceKey>,
}

impl TrackSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component. Re-adding an id updates its state in place.
    pub fn add<C: TrackIdComponent + ?Sized>(&mut self, component: &C) {
        let block = ServiceBlock::from_component(component);
        if block.social {
            self.services.insert(block.key.clone());
        }
        let id = block.to_id_string();
        match self.ids.get(&id) {
            Some(&i) => self.components[i] = block,
            None => {
                self.ids.insert(id, self.components.len());
                self.components.push(block);
            }
        }
    }

    /// Membership test.
    ///
    /// Last-writer-wins components are members if their service was seen at
    /// all; others only if their exact id was.
    pub fn has_member<C: TrackIdComponent + ?Sized>(&self, component: &C) -> bool {
        if component.last_writer_wins() {
            let (key, _) = component.to_key_value_pair();
            self.services.contains(key)
        } else {
            self.ids.contains_key(&component.to_id_string())
        }
    }

    /// Components of `self` that are not members of `other`.
    pub fn subtract(&self, other: &TrackSet) -> Vec<ServiceBlock> {
        self.components
            .iter()
            .filter(|c| !other.has_member(*c))
            .cloned()
            .collect()
    }

    /// State recorded for the component's id, `ProofState::None` if absent.
    pub fn proof_state<C: TrackIdComponent + ?Sized>(&self, component: &C) -> ProofState {
        self.ids
            .get(&component.to_id_string())
            .map_or(ProofState::None, |&i| self.components[i].state)
    }

    /// Insertion position of an id.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.ids.get(id).copied()
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether both sets hold the same number of ids.
    pub fn len_eq(&self, other: &TrackSet) -> bool {
        self.len() == other.len()
    }

    /// Components in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceBlock> {
        self.components.iter()
    }
}

/// One remote proof line of a tracking statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProof {
    /// Service key.
    pub key: ServiceKey,
    /// Tracked value.
    pub value: String,
    /// State at tracking time.
    #[serde(default)]
    pub state: ProofState,
}

/// Persisted form of a prior tracking statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStatement {
    /// Tracked username.
    pub username: String,
    /// Sequence number of the tracking link in the tracker's chain.
    pub tracker_seqno: u64,
    /// Eldest key of the tracked user at tracking time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eldest_kid: Option<String>,
    /// Remote proofs, in statement order.
    #[serde(default)]
    pub remote_proofs: Vec<TrackedProof>,
}

impl TrackingStatement {
    /// Decode a statement from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Which tracking statement an identify run was checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    /// Tracked username.
    pub username: String,
    /// Sequence number of the tracking link.
    pub tracker_seqno: u64,
}

/// Read-only view of a prior tracking statement.
#[derive(Debug, Clone)]
pub struct TrackLookup {
    set: TrackSet,
    ids: HashMap<ServiceKey, Vec<String>>,
    summary: TrackSummary,
    eldest_kid: Option<String>,
}

impl TrackLookup {
    /// Build from a statement. Last-writer-wins policy comes from the
    /// directory; unregistered services are last-writer-wins.
    pub fn new(directory: &ServiceDirectory, statement: &TrackingStatement) -> Self {
        let mut set = TrackSet::new();
        let mut ids: HashMap<ServiceKey, Vec<String>> = HashMap::new();
        for proof in &statement.remote_proofs {
            let social = directory.last_writer_wins(proof.key.as_str());
            set.add(&ServiceBlock::new(
                proof.key.clone(),
                proof.value.clone(),
                proof.state,
                social,
            ));
            ids.entry(proof.key.clone())
                .or_default()
                .push(proof.value.clone());
        }
        Self {
            set,
            ids,
            summary: TrackSummary {
                username: statement.username.clone(),
                tracker_seqno: statement.tracker_seqno,
            },
            eldest_kid: statement.eldest_kid.clone(),
        }
    }

    /// Tracked components.
    pub fn set(&self) -> &TrackSet {
        &self.set
    }

    /// Values tracked for `key`, oldest first.
    pub fn values_for(&self, key: &str) -> &[String] {
        self.ids.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Statement summary.
    pub fn summary(&self) -> &TrackSummary {
        &self.summary
    }

    /// Eldest key at tracking time, if recorded.
    pub fn eldest_kid(&self) -> Option<&str> {
        self.eldest_kid.as_deref()
    }
}
