//! Service directory: which proof providers exist and how their values compare.
//!
//! The directory is built once (from the baseline table, optionally extended
//! by configuration) and then passed by reference to the parser. Leaves
//! resolve their [`MatchRule`] at construction, so matching never needs the
//! directory again.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::*;
use crate::proof::Proof;
use crate::types::ServiceKey;

/// How a registered service name behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceClass {
    /// Alias satisfied by any site proof (`web`).
    Web,
    /// A site proof keyed by protocol (`http`, `https`, `dns`).
    Host,
    /// PGP key fingerprint, matched on suffix.
    Fingerprint,
    /// Keybase username.
    Keybase,
    /// Remote social network account.
    Social,
}

/// Per-service policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePolicy {
    /// Behaviour class.
    pub class: ServiceClass,
    /// Whether values compare case-sensitively.
    pub case_sensitive: bool,
    /// Whether only the most recent proof for the service counts.
    pub last_writer_wins: bool,
}

impl ServicePolicy {
    /// Policy of the `web` alias.
    pub const fn web() -> Self {
        Self {
            class: ServiceClass::Web,
            case_sensitive: false,
            last_writer_wins: false,
        }
    }

    /// Policy of a site proof (`http`, `https`, `dns`).
    pub const fn host() -> Self {
        Self {
            class: ServiceClass::Host,
            case_sensitive: false,
            last_writer_wins: false,
        }
    }

    /// Policy of PGP fingerprints.
    pub const fn fingerprint() -> Self {
        Self {
            class: ServiceClass::Fingerprint,
            case_sensitive: false,
            last_writer_wins: false,
        }
    }

    /// Policy of keybase usernames.
    pub const fn keybase() -> Self {
        Self {
            class: ServiceClass::Keybase,
            case_sensitive: false,
            last_writer_wins: true,
        }
    }

    /// Policy of a case-insensitive social network.
    pub const fn social() -> Self {
        Self {
            class: ServiceClass::Social,
            case_sensitive: false,
            last_writer_wins: true,
        }
    }

    /// Same as [`ServicePolicy::social`] with case-sensitive usernames.
    pub const fn social_case_sensitive() -> Self {
        Self {
            case_sensitive: true,
            ..Self::social()
        }
    }
}

/// How a proof value is compared to an asserted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueComparison {
    /// Byte-for-byte equality.
    Exact,
    /// Equality after lower-casing both sides.
    CaseInsensitive,
    /// The lower-cased proof value ends with the lower-cased asserted value.
    /// An empty asserted value never matches.
    Suffix,
}

impl ValueComparison {
    /// Compare a proof value against an asserted value.
    pub fn matches(&self, proof_value: &str, asserted: &str) -> bool {
        match self {
            ValueComparison::Exact => proof_value == asserted,
            ValueComparison::CaseInsensitive => {
                proof_value.to_lowercase() == asserted.to_lowercase()
            }
            ValueComparison::Suffix => {
                !asserted.is_empty()
                    && proof_value
                        .to_lowercase()
                        .ends_with(&asserted.to_lowercase())
            }
        }
    }
}

/// The proof keys an assertion leaf consults and how it compares values.
///
/// A rule with no keys never matches; that is what unregistered services get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    keys: Vec<ServiceKey>,
    comparison: ValueComparison,
}

impl MatchRule {
    /// Build a rule over `keys`.
    pub fn new(keys: Vec<ServiceKey>, comparison: ValueComparison) -> Self {
        Self { keys, comparison }
    }

    /// A rule that matches nothing.
    pub fn never() -> Self {
        Self {
            keys: Vec::new(),
            comparison: ValueComparison::Exact,
        }
    }

    /// Proof keys consulted by this rule.
    pub fn keys(&self) -> &[ServiceKey] {
        &self.keys
    }

    /// Value comparison used by this rule.
    pub fn comparison(&self) -> ValueComparison {
        self.comparison
    }

    /// Whether this rule can never match.
    pub fn is_never(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether a single proof satisfies this rule for `value`.
    pub fn matches(&self, proof: &Proof, value: &str) -> bool {
        self.keys.iter().any(|k| k == proof.key()) && self.comparison.matches(proof.value(), value)
    }
}

/// Immutable directory of known services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDirectory {
    services: BTreeMap<ServiceKey, ServicePolicy>,
}

impl ServiceDirectory {
    /// Create an empty directory.
    pub fn empty() -> Self {
        Self {
            services: BTreeMap::new(),
        }
    }

    /// The baseline table shipped with the engine.
    pub fn baseline() -> Self {
        let entries = [
            (SERVICE_WEB, ServicePolicy::web()),
            (SERVICE_HTTP, ServicePolicy::host()),
            (SERVICE_HTTPS, ServicePolicy::host()),
            (SERVICE_DNS, ServicePolicy::host()),
            (SERVICE_FINGERPRINT, ServicePolicy::fingerprint()),
            (SERVICE_KEYBASE, ServicePolicy::keybase()),
            (SERVICE_TWITTER, ServicePolicy::social()),
            (SERVICE_GITHUB, ServicePolicy::social()),
            (SERVICE_REDDIT, ServicePolicy::social()),
            (SERVICE_COINBASE, ServicePolicy::social()),
            (SERVICE_HACKERNEWS, ServicePolicy::social_case_sensitive()),
        ];
        let services = entries
            .into_iter()
            .map(|(name, policy)| (ServiceKey::new_unchecked(name), policy))
            .collect();
        Self { services }
    }

    /// Return a copy with `key` registered (or re-registered) under `policy`.
    pub fn with_service(mut self, key: ServiceKey, policy: ServicePolicy) -> Self {
        self.services.insert(key, policy);
        self
    }

    /// Look up a service by name.
    pub fn lookup(&self, name: &str) -> Option<&ServicePolicy> {
        self.services.get(name)
    }

    /// Whether a service is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no services are registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Iterate over registered services in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&ServiceKey, &ServicePolicy)> {
        self.services.iter()
    }

    /// Whether values of `name` compare case-sensitively.
    ///
    /// Unregistered services are treated as case-insensitive.
    pub fn is_case_sensitive(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|p| p.case_sensitive)
    }

    /// Whether proofs of `name` follow last-writer-wins.
    ///
    /// Unregistered services default to last-writer-wins, like any remote
    /// social account.
    pub fn last_writer_wins(&self, name: &str) -> bool {
        self.lookup(name).map_or(true, |p| p.last_writer_wins)
    }

    /// Resolve the match rule for an assertion on `service`.
    pub fn match_rule(&self, service: &ServiceKey) -> MatchRule {
        let Some(policy) = self.lookup(service.as_str()) else {
            return MatchRule::never();
        };
        match policy.class {
            ServiceClass::Web => {
                MatchRule::new(keys_of(&WEB_PROOF_KEYS), ValueComparison::CaseInsensitive)
            }
            ServiceClass::Host if service.as_str() == SERVICE_HTTP => {
                MatchRule::new(keys_of(&HTTP_PROOF_KEYS), ValueComparison::CaseInsensitive)
            }
            ServiceClass::Host => {
                MatchRule::new(vec![service.clone()], ValueComparison::CaseInsensitive)
            }
            ServiceClass::Fingerprint => {
                MatchRule::new(vec![service.clone()], ValueComparison::Suffix)
            }
            ServiceClass::Keybase | ServiceClass::Social => {
                let comparison = if policy.case_sensitive {
                    ValueComparison::Exact
                } else {
                    ValueComparison::CaseInsensitive
                };
                MatchRule::new(vec![service.clone()], comparison)
            }
        }
    }
}

fn keys_of(names: &[&str]) -> Vec<ServiceKey> {
    names.iter().map(|n| ServiceKey::new_unchecked(n)).collect()
}

impl Default for ServiceDirectory {
    fn default() -> Self {
        Self::baseline()
    }
}
