//! Canonical service names and limits.
//!
//! The names below form the baseline service directory. Deployments may
//! register more through configuration, but these keys are what the
//! sigchain collaborator reports for the proofs it knows about.

/// Alias service satisfied by any of `http`, `https` or `dns` proofs.
pub const SERVICE_WEB: &str = "web";
/// Plain HTTP site proof.
pub const SERVICE_HTTP: &str = "http";
/// HTTPS site proof.
pub const SERVICE_HTTPS: &str = "https";
/// DNS TXT record proof.
pub const SERVICE_DNS: &str = "dns";
/// PGP key fingerprint.
pub const SERVICE_FINGERPRINT: &str = "fingerprint";
/// Keybase username, implied for bare names.
pub const SERVICE_KEYBASE: &str = "keybase";
/// Twitter account proof.
pub const SERVICE_TWITTER: &str = "twitter";
/// GitHub account proof.
pub const SERVICE_GITHUB: &str = "github";
/// Reddit account proof.
pub const SERVICE_REDDIT: &str = "reddit";
/// Coinbase account proof.
pub const SERVICE_COINBASE: &str = "coinbase";
/// Hacker News account proof. Usernames are case-sensitive.
pub const SERVICE_HACKERNEWS: &str = "hackernews";

/// Proof keys that satisfy a `web` assertion.
pub const WEB_PROOF_KEYS: [&str; 3] = [SERVICE_HTTP, SERVICE_HTTPS, SERVICE_DNS];

/// Proof keys that satisfy an `http` assertion (an https proof upgrades http).
pub const HTTP_PROOF_KEYS: [&str; 2] = [SERVICE_HTTP, SERVICE_HTTPS];

/// Length of a full PGP fingerprint in hex characters.
pub const PGP_FINGERPRINT_HEX_LEN: usize = 40;

/// Shortest fingerprint suffix accepted for a key lookup (2 bytes).
pub const MIN_FINGERPRINT_QUERY_LEN: usize = 4;

/// Bounds on keybase username length.
pub const MIN_USERNAME_LEN: usize = 2;
/// See [`MIN_USERNAME_LEN`].
pub const MAX_USERNAME_LEN: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_keys_cover_http_keys() {
        for key in HTTP_PROOF_KEYS {
            assert!(WEB_PROOF_KEYS.contains(&key));
        }
        assert!(WEB_PROOF_KEYS.contains(&SERVICE_DNS));
    }

    #[test]
    fn test_fingerprint_limits() {
        assert_eq!(PGP_FINGERPRINT_HEX_LEN, 40);
        assert!(MIN_FINGERPRINT_QUERY_LEN < PGP_FINGERPRINT_HEX_LEN);
    }
}
