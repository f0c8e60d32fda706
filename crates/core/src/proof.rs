//! Proofs and proof sets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::service::MatchRule;
use crate::types::ServiceKey;

/// A single `(service, value)` identity fact, as established by the
/// sigchain collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proof {
    key: ServiceKey,
    value: String,
}

impl Proof {
    /// Create a proof. The key is lower-cased but otherwise taken as given,
    /// since proofs come from already-verified data.
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: ServiceKey::new_unchecked(key),
            value: value.into(),
        }
    }

    /// Create a proof from an already-built key.
    pub fn with_key(key: ServiceKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// The proof's service key.
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// The claimed identifier.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// The live proofs an assertion is evaluated against.
///
/// Built once from a flat list, then only queried. Proofs are bucketed by
/// key so a leaf only scans the keys its [`MatchRule`] names.
#[derive(Debug, Clone, Default)]
pub struct ProofSet {
    proofs: HashMap<ServiceKey, Vec<Proof>>,
    len: usize,
}

impl ProofSet {
    /// Build a proof set.
    pub fn new(proofs: Vec<Proof>) -> Self {
        proofs.into_iter().collect()
    }

    /// All proofs recorded under any of `keys`.
    pub fn get<'a>(&'a self, keys: &'a [ServiceKey]) -> impl Iterator<Item = &'a Proof> + 'a {
        keys.iter()
            .filter_map(move |key| self.proofs.get(key))
            .flat_map(|list| list.iter())
    }

    /// Whether any proof satisfies `rule` for the asserted `value`.
    pub fn has_match(&self, rule: &MatchRule, value: &str) -> bool {
        self.get(rule.keys())
            .any(|proof| rule.comparison().matches(proof.value(), value))
    }

    /// Whether any proof is recorded under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.proofs.get(key).is_some_and(|list| !list.is_empty())
    }

    /// Number of proofs.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the set holds no proofs.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over every proof (order unspecified).
    pub fn iter(&self) -> impl Iterator<Item = &Proof> {
        self.proofs.values().flat_map(|list| list.iter())
    }
}

impl FromIterator<Proof> for ProofSet {
    fn from_iter<I: IntoIterator<Item = Proof>>(iter: I) -> Self {
        let mut proofs: HashMap<ServiceKey, Vec<Proof>> = HashMap::new();
        let mut len = 0;
        for proof in iter {
            proofs.entry(proof.key.clone()).or_default().push(proof);
            len += 1;
        }
        Self { proofs, len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceDirectory;

    fn sample() -> ProofSet {
        ProofSet::new(vec![
            Proof::new("http", "maxk.org"),
            Proof::new("Twitter", "MaxTaco"),
            Proof::new("fingerprint", "0000AABBCC"),
            Proof::new("dns", "maxk.org"),
        ])
    }

    #[test]
    fn test_proof_key_is_lowercased() {
        let p = Proof::new("GitHub", "Max");
        assert_eq!(p.key().as_str(), "github");
        assert_eq!(p.value(), "Max");
        assert_eq!(p.to_string(), "github:Max");
    }

    #[test]
    fn test_get_by_keys() {
        let ps = sample();
        assert_eq!(ps.len(), 4);
        let keys = vec![ServiceKey::new_unchecked("http"), ServiceKey::new_unchecked("dns")];
        assert_eq!(ps.get(&keys).count(), 2);
        assert!(ps.contains_key("twitter"));
        assert!(!ps.contains_key("reddit"));
    }

    #[test]
    fn test_has_match_uses_rule() {
        let dir = ServiceDirectory::baseline();
        let ps = sample();
        let web = dir.match_rule(&ServiceKey::new_unchecked("web"));
        let https = dir.match_rule(&ServiceKey::new_unchecked("https"));
        let fp = dir.match_rule(&ServiceKey::new_unchecked("fingerprint"));
        let twitter = dir.match_rule(&ServiceKey::new_unchecked("twitter"));

        assert!(ps.has_match(&web, "MAXK.org"));
        assert!(!ps.has_match(&https, "maxk.org"));
        assert!(ps.has_match(&fp, "aabbcc"));
        assert!(!ps.has_match(&fp, ""));
        assert!(ps.has_match(&twitter, "maxtaco"));
    }

    #[test]
    fn test_empty_set() {
        let ps = ProofSet::default();
        assert!(ps.is_empty());
        assert_eq!(ps.iter().count(), 0);
    }
}
