//! Assertion leaves: one `(service, value)` requirement.

use std::fmt;

use idassert_core::checks::{check_fingerprint, check_hostname, check_username};
use idassert_core::{
    CoreError, MatchRule, Proof, ProofSet, ServiceClass, ServiceDirectory, ServiceKey,
    MIN_FINGERPRINT_QUERY_LEN, PGP_FINGERPRINT_HEX_LEN, SERVICE_KEYBASE,
};

use crate::error::{ParseError, ParseErrorKind};

/// Which surface form a leaf was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// `value@service`
    At,
    /// `service:value` or `service://value`
    Colon,
    /// bare `value`, service implied
    Name,
}

/// A single leaf of an assertion expression.
///
/// The value is normalized for its service and the match rule is resolved
/// against the directory when the leaf is built; after that the leaf is
/// self-contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionUrl {
    kind: UrlKind,
    service: ServiceKey,
    value: String,
    class: Option<ServiceClass>,
    rule: MatchRule,
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn is_escaped_name(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'@' | b'+'))
}

/// Accept `name` as a value: plain, `(escaped)`, or empty.
fn unescape_name(name: &str) -> Option<&str> {
    if name.is_empty() || is_name(name) {
        return Some(name);
    }
    name.strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .filter(|inner| is_escaped_name(inner))
}

/// Split a URL token into `(kind, service, value)`.
///
/// `value@service` is tried first (splitting at the last `@`), then
/// `service:value` (first `:`, optional `//`), then a bare name.
fn split_token(s: &str) -> Option<(UrlKind, Option<&str>, &str)> {
    if let Some(at) = s.rfind('@') {
        let (name, service) = (&s[..at], &s[at + 1..]);
        if idassert_core::is_valid_service_name(service) {
            if let Some(value) = unescape_name(name) {
                return Some((UrlKind::At, Some(service), value));
            }
        }
    }

    if let Some(colon) = s.find(':') {
        let service = &s[..colon];
        let name = &s[colon + 1..];
        let name = name.strip_prefix("//").unwrap_or(name);
        if idassert_core::is_valid_service_name(service) {
            if let Some(value) = unescape_name(name) {
                return Some((UrlKind::Colon, Some(service), value));
            }
        }
    }

    is_name(s).then_some((UrlKind::Name, None, s))
}

impl AssertionUrl {
    /// Parse a single URL token such as `bb@twitter` or `dns://maxk.org`.
    ///
    /// Errors are reported at position 0; the expression parser re-anchors
    /// them at the token's offset.
    pub fn parse(
        directory: &ServiceDirectory,
        token: &str,
        strict: bool,
    ) -> Result<Self, ParseError> {
        Self::from_token(directory, token, strict).map_err(|kind| ParseError::new(0, kind))
    }

    pub(crate) fn from_token(
        directory: &ServiceDirectory,
        token: &str,
        strict: bool,
    ) -> Result<Self, ParseErrorKind> {
        let (kind, service, value) = split_token(token)
            .ok_or_else(|| ParseErrorKind::InvalidIdentity(token.to_string()))?;
        Self::from_key_value(directory, kind, service, value, strict)
    }

    /// Build a leaf from an already split key and value.
    ///
    /// A missing service means `keybase`, unless `strict` is set.
    pub fn from_key_value(
        directory: &ServiceDirectory,
        kind: UrlKind,
        service: Option<&str>,
        value: &str,
        strict: bool,
    ) -> Result<Self, ParseErrorKind> {
        let service = match service {
            Some(service) => service,
            None if strict => return Err(ParseErrorKind::MissingService(value.to_string())),
            None => SERVICE_KEYBASE,
        };
        let service = ServiceKey::new(service).map_err(ParseErrorKind::InvalidValue)?;
        let policy = directory.lookup(service.as_str()).copied();

        let value = match policy {
            Some(p) => match p.class {
                ServiceClass::Web | ServiceClass::Host => check_hostname(service.as_str(), value),
                ServiceClass::Fingerprint => check_fingerprint(value),
                ServiceClass::Keybase => check_username(value),
                ServiceClass::Social if value.is_empty() => {
                    Err(CoreError::EmptyValue(service.to_string()))
                }
                ServiceClass::Social if p.case_sensitive => Ok(value.to_string()),
                ServiceClass::Social => Ok(value.to_lowercase()),
            },
            None => Ok(value.to_string()),
        }
        .map_err(ParseErrorKind::InvalidValue)?;

        let rule = directory.match_rule(&service);
        Ok(Self {
            kind,
            service,
            value,
            class: policy.map(|p| p.class),
            rule,
        })
    }

    /// Surface form the leaf was written in.
    pub fn kind(&self) -> UrlKind {
        self.kind
    }

    /// Service the leaf names.
    pub fn service(&self) -> &ServiceKey {
        &self.service
    }

    /// Normalized value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Directory class of the service, `None` if unregistered.
    pub fn class(&self) -> Option<ServiceClass> {
        self.class
    }

    /// Resolved match rule.
    pub fn rule(&self) -> &MatchRule {
        &self.rule
    }

    /// `(service, value)`.
    pub fn to_key_value_pair(&self) -> (&str, &str) {
        (self.service.as_str(), &self.value)
    }

    /// `service:value`, for caches keyed by assertion.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.service, self.value)
    }

    /// Keybase username leaf.
    pub fn is_keybase(&self) -> bool {
        self.class == Some(ServiceClass::Keybase)
    }

    /// PGP fingerprint leaf.
    pub fn is_fingerprint(&self) -> bool {
        self.class == Some(ServiceClass::Fingerprint)
    }

    /// Social accounts, including services the directory does not know.
    pub fn is_social(&self) -> bool {
        matches!(self.class, Some(ServiceClass::Social) | None)
    }

    /// Whether the proof lives on a remote service (sites and social accounts).
    pub fn is_remote(&self) -> bool {
        self.is_social() || matches!(self.class, Some(ServiceClass::Web | ServiceClass::Host))
    }

    /// Whether `proof` satisfies this leaf.
    pub fn match_proof(&self, proof: &Proof) -> bool {
        self.rule.matches(proof, &self.value)
    }

    /// Whether any proof in `ps` satisfies this leaf.
    pub fn match_set(&self, ps: &ProofSet) -> bool {
        ps.has_match(&self.rule, &self.value)
    }

    /// The `(lookup key, value)` pair used to resolve this leaf to a user.
    pub fn to_lookup(&self) -> idassert_core::Result<(&str, &str)> {
        match self.class {
            Some(ServiceClass::Keybase) => Ok(("username", &self.value)),
            Some(ServiceClass::Fingerprint) => {
                let len = self.value.len();
                if len < MIN_FINGERPRINT_QUERY_LEN {
                    Err(CoreError::InvalidFingerprintQuery(
                        "fingerprint queries must be at least 2 bytes long".to_string(),
                    ))
                } else if len == PGP_FINGERPRINT_HEX_LEN {
                    Ok(("key_fingerprint", &self.value))
                } else if len < PGP_FINGERPRINT_HEX_LEN {
                    Ok(("key_suffix", &self.value))
                } else {
                    Err(CoreError::InvalidFingerprintQuery(format!(
                        "bad fingerprint; too long: {}",
                        self.value
                    )))
                }
            }
            _ => Ok((self.service.as_str(), &self.value)),
        }
    }
}

impl fmt::Display for AssertionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_keybase() {
            f.write_str(&self.value)
        } else if self.value.contains(|c: char| c == '@' || c == '+') {
            write!(f, "({})@{}", self.value, self.service)
        } else {
            write!(f, "{}@{}", self.value, self.service)
        }
    }
}
