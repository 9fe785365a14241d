//! Signed, time-limited session tokens.
//!
//! Tokens have the shape `b64url(identity).b64url(timestamp).b64url(mac)`
//! where the MAC is HMAC-SHA256 over the first two fields. Verification
//! checks the MAC (any bit-level modification invalidates the token) and
//! then the timestamp against the caller's maximum age.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies session tokens with a fixed key.
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    /// Creates a signer from the configured secret.
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    /// Issues a token for an authenticated identity, stamped with the
    /// current time.
    pub fn issue(&self, identity: &str) -> String {
        self.issue_at(identity, unix_now())
    }

    fn issue_at(&self, identity: &str, timestamp: u64) -> String {
        let payload = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(identity.as_bytes()),
            URL_SAFE_NO_PAD.encode(timestamp.to_be_bytes())
        );
        let mac = self.mac(payload.as_bytes());
        format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(mac))
    }

    /// Verifies a token and returns the identity it was issued for.
    ///
    /// Returns `None` for malformed, tampered, future-dated, or expired
    /// tokens. A token older than `max_age_secs` is invalid regardless of
    /// its signature.
    pub fn verify(&self, token: &str, max_age_secs: u64) -> Option<String> {
        let (payload, mac_b64) = token.rsplit_once('.')?;
        let mac = URL_SAFE_NO_PAD.decode(mac_b64).ok()?;

        let mut verifier = HmacSha256::new_from_slice(&self.key).ok()?;
        verifier.update(payload.as_bytes());
        verifier.verify_slice(&mac).ok()?;

        let (identity_b64, ts_b64) = payload.split_once('.')?;
        let ts_bytes: [u8; 8] = URL_SAFE_NO_PAD.decode(ts_b64).ok()?.try_into().ok()?;
        let issued = u64::from_be_bytes(ts_bytes);

        let now = unix_now();
        if issued > now || now - issued > max_age_secs {
            return None;
        }

        let identity = URL_SAFE_NO_PAD.decode(identity_b64).ok()?;
        String::from_utf8(identity).ok()
    }

    fn mac(&self, data: &[u8]) -> Vec<u8> {
        // An HMAC key of any length is valid; new_from_slice cannot fail.
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-unit-tests";

    #[test]
    fn test_roundtrip() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue("alice");
        assert_eq!(signer.verify(&token, 3600), Some("alice".to_string()));
    }

    #[test]
    fn test_different_users_get_different_tokens() {
        let signer = TokenSigner::new(SECRET);
        assert_ne!(signer.issue("alice"), signer.issue("bob"));
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let signer = TokenSigner::new(SECRET);
        let other = TokenSigner::new("wrong-secret");
        let token = signer.issue("alice");
        assert_eq!(other.verify(&token, 3600), None);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue("alice");
        let tampered = format!("{}XXXXX", &token[..token.len() - 5]);
        assert_eq!(signer.verify(&tampered, 3600), None);
    }

    #[test]
    fn test_single_bit_flip_is_invalid() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue("alice");

        // Flip one bit in every position; no variant may verify.
        for i in 0..token.len() {
            let mut bytes = token.as_bytes().to_vec();
            bytes[i] ^= 0x01;
            if let Ok(flipped) = String::from_utf8(bytes) {
                assert_eq!(signer.verify(&flipped, 3600), None, "bit flip at {i}");
            }
        }
    }

    #[test]
    fn test_garbage_tokens_are_invalid() {
        let signer = TokenSigner::new(SECRET);
        assert_eq!(signer.verify("not.a.valid.token", 3600), None);
        assert_eq!(signer.verify("", 3600), None);
        assert_eq!(signer.verify("nodots", 3600), None);
    }

    #[test]
    fn test_zero_max_age_rejects_elapsed_token() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue_at("alice", unix_now() - 1);
        assert_eq!(signer.verify(&token, 0), None);
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue_at("alice", unix_now() - 100);
        assert_eq!(signer.verify(&token, 50), None);
        assert_eq!(signer.verify(&token, 3600), Some("alice".to_string()));
    }

    #[test]
    fn test_future_dated_token_is_invalid() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue_at("alice", unix_now() + 600);
        assert_eq!(signer.verify(&token, 3600), None);
    }

    #[test]
    fn test_identity_with_dots_survives() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue("alice.smith");
        assert_eq!(signer.verify(&token, 3600), Some("alice.smith".to_string()));
    }
}
