//! Value checks applied when an assertion leaf is built.
//!
//! Each `check_*` function lower-cases its input where the service is
//! case-insensitive and returns the normalized value.

use crate::constants::{MAX_USERNAME_LEN, MIN_USERNAME_LEN};
use crate::error::{CoreError, Result};

/// Whether `s` is a usable DNS hostname.
///
/// Requires at least two dot-separated labels of `[a-zA-Z0-9-]`, no label
/// may start or end with `-`, and the last label must be 2+ characters.
pub fn is_valid_hostname(s: &str) -> bool {
    let labels: Vec<&str> = s.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let label_ok = |label: &str| {
        !label.is_empty()
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    };
    if !labels.iter().all(|label| label_ok(label)) {
        return false;
    }
    labels.last().is_some_and(|tld| tld.len() >= 2)
}

/// Whether `s` is a syntactically valid keybase username.
pub fn is_valid_username(s: &str) -> bool {
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&s.len()) {
        return false;
    }
    if !s.bytes().next().is_some_and(|b| b.is_ascii_alphanumeric()) {
        return false;
    }
    s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') && !s.contains("__")
}

/// Whether `s` is hex (the empty string counts).
pub fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Normalize and check a hostname value for `service`.
pub fn check_hostname(service: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(CoreError::EmptyValue(service.to_string()));
    }
    let host = value.to_ascii_lowercase();
    if !is_valid_hostname(&host) {
        return Err(CoreError::InvalidHostname(host));
    }
    Ok(host)
}

/// Normalize and check a fingerprint value.
pub fn check_fingerprint(value: &str) -> Result<String> {
    let fp = value.to_ascii_lowercase();
    if !is_hex(&fp) {
        return Err(CoreError::InvalidFingerprint(fp));
    }
    Ok(fp)
}

/// Normalize and check a keybase username.
pub fn check_username(value: &str) -> Result<String> {
    let name = value.to_ascii_lowercase();
    if !is_valid_username(&name) {
        return Err(CoreError::InvalidUsername(name));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostnames() {
        for good in ["maxk.org", "a.b.co", "my-site.example.com", "x1.io"] {
            assert!(is_valid_hostname(good), "{}", good);
        }
        for bad in ["localhost", "maxk.o", "-a.com", "a-.com", "a..com", "a_b.com", ""] {
            assert!(!is_valid_hostname(bad), "{}", bad);
        }
    }

    #[test]
    fn test_usernames() {
        for good in ["max", "malgorithms", "a_b", "bb", "x1234567890abcde"] {
            assert!(is_valid_username(good), "{}", good);
        }
        for bad in ["m", "_max", "a__b", "max.k", "x1234567890abcdef"] {
            assert!(!is_valid_username(bad), "{}", bad);
        }
    }

    #[test]
    fn test_check_hostname_normalizes() {
        assert_eq!(check_hostname("dns", "MaxK.org").unwrap(), "maxk.org");
        assert_eq!(
            check_hostname("dns", ""),
            Err(CoreError::EmptyValue("dns".to_string()))
        );
        assert!(matches!(
            check_hostname("https", "nope"),
            Err(CoreError::InvalidHostname(_))
        ));
    }

    #[test]
    fn test_check_fingerprint() {
        assert_eq!(check_fingerprint("AABBCC").unwrap(), "aabbcc");
        assert_eq!(check_fingerprint("").unwrap(), "");
        assert!(check_fingerprint("aabbzz").is_err());
    }

    #[test]
    fn test_check_username() {
        assert_eq!(check_username("Max").unwrap(), "max");
        assert!(check_username("m").is_err());
    }
}
