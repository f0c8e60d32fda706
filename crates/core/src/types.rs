//! Core types for identity proofs.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::error::{CoreError, Result};

/// Name of a proof provider (`twitter`, `web`, `dns`, `fingerprint`, ...).
///
/// Always stored lower-case. Validation happens on construction and on
/// deserialization, so a key that made it into the system matches
/// `[a-z.]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey(String);

impl ServiceKey {
    /// Create a new ServiceKey, validating the name and lower-casing it.
    pub fn new(name: &str) -> Result<Self> {
        if !is_valid_service_name(name) {
            return Err(CoreError::InvalidServiceName(name.to_string()));
        }
        Ok(ServiceKey(name.to_ascii_lowercase()))
    }

    /// Create a ServiceKey without validation (use with caution).
    ///
    /// The name is still lower-cased so lookups stay consistent.
    pub fn new_unchecked(name: &str) -> Self {
        ServiceKey(name.to_ascii_lowercase())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether `name` matches `[a-zA-Z.]+`.
pub fn is_valid_service_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphabetic() || b == b'.')
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ServiceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for ServiceKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ServiceKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        ServiceKey::new(&name).map_err(|e| serde::de::Error::custom(format!("{}", e)))
    }
}

/// State of a proof as last recorded by the sigchain or a tracking statement.
///
/// Numeric codes match the wire protocol so legacy statements can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofState {
    /// Nothing recorded.
    #[default]
    None,
    /// Proof was checked and valid.
    Ok,
    /// Proof check failed with a transient error.
    TempFailure,
    /// Proof check failed permanently.
    PermFailure,
    /// Proof is still being looked up.
    Looking,
    /// Proof was replaced by a newer one for the same service.
    Superseded,
    /// Proof was posted but not yet checked.
    Posted,
    /// Proof was revoked by its owner.
    Revoked,
}

impl ProofState {
    /// Wire code for this state.
    pub const fn code(&self) -> u8 {
        match self {
            ProofState::None => 0,
            ProofState::Ok => 1,
            ProofState::TempFailure => 2,
            ProofState::PermFailure => 3,
            ProofState::Looking => 4,
            ProofState::Superseded => 5,
            ProofState::Posted => 6,
            ProofState::Revoked => 7,
        }
    }

    /// Whether the proof is in the `Ok` state.
    pub const fn is_ok(&self) -> bool {
        matches!(self, ProofState::Ok)
    }

    /// Canonical lowercase string form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProofState::None => "none",
            ProofState::Ok => "ok",
            ProofState::TempFailure => "temp_failure",
            ProofState::PermFailure => "perm_failure",
            ProofState::Looking => "looking",
            ProofState::Superseded => "superseded",
            ProofState::Posted => "posted",
            ProofState::Revoked => "revoked",
        }
    }
}

impl TryFrom<u8> for ProofState {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self> {
        let state = match code {
            0 => ProofState::None,
            1 => ProofState::Ok,
            2 => ProofState::TempFailure,
            3 => ProofState::PermFailure,
            4 => ProofState::Looking,
            5 => ProofState::Superseded,
            6 => ProofState::Posted,
            7 => ProofState::Revoked,
            other => return Err(CoreError::InvalidProofState(other)),
        };
        Ok(state)
    }
}

impl fmt::Display for ProofState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_key_creation() {
        assert_eq!(ServiceKey::new("Twitter").unwrap().as_str(), "twitter");
        assert_eq!(ServiceKey::new("web.archive").unwrap().as_str(), "web.archive");
        assert!(ServiceKey::new("").is_err());
        assert!(ServiceKey::new("git-hub").is_err());
        assert!(ServiceKey::new("http2").is_err());
    }

    #[test]
    fn test_service_key_unchecked_lowercases() {
        assert_eq!(ServiceKey::new_unchecked("DNS").as_str(), "dns");
    }

    #[test]
    fn test_service_key_serde() {
        let key: ServiceKey = serde_json::from_str("\"GitHub\"").unwrap();
        assert_eq!(key.as_str(), "github");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"github\"");

        let result: std::result::Result<ServiceKey, _> = serde_json::from_str("\"bad name\"");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Invalid service name"), "{}", err);
    }

    #[test]
    fn test_proof_state_codes_roundtrip() {
        for code in 0..=7u8 {
            let state = ProofState::try_from(code).unwrap();
            assert_eq!(state.code(), code);
        }
        assert_eq!(
            ProofState::try_from(8),
            Err(CoreError::InvalidProofState(8))
        );
    }

    #[test]
    fn test_proof_state_serialization() {
        assert_eq!(
            serde_json::to_string(&ProofState::PermFailure).unwrap(),
            "\"perm_failure\""
        );
        let state: ProofState = serde_json::from_str("\"ok\"").unwrap();
        assert!(state.is_ok());
        assert_eq!(ProofState::default(), ProofState::None);
    }
}
