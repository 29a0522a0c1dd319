//! Signed, expiring bearer tokens.
//!
//! A token is `base64url(claims-json) . base64url(hmac-sha256(payload))`,
//! keyed by the configured token secret. Verification checks the signature
//! first (constant time via the HMAC tag comparison), then the embedded
//! expiry. Authorization checks (blacklist, account state) live in the
//! authentication gate, not here.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use orchard_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Errors from token verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token is structurally invalid.
    #[error("malformed token")]
    Malformed,
    /// The signature does not match the payload.
    #[error("invalid token signature")]
    InvalidSignature,
    /// The token's expiry has passed.
    #[error("token expired")]
    Expired,
}

/// Claims carried inside a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user.
    pub sub: UserId,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Unique token id; makes every issuance distinct.
    pub jti: Uuid,
}

/// Issues and verifies HMAC-signed bearer tokens.
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    /// Create a signer from the configured secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    /// Issue a token for a user with the given lifetime.
    #[must_use]
    pub fn issue(&self, user_id: UserId, ttl: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
        };

        // Claims are plain serializable data; encoding cannot fail.
        let payload_json =
            serde_json::to_vec(&claims).unwrap_or_else(|_| b"{}".to_vec());
        let payload = URL_SAFE_NO_PAD.encode(payload_json);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));

        format!("{payload}.{signature}")
    }

    /// Verify a token's signature and expiry, returning its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed` for structural problems,
    /// `InvalidSignature` for a bad signature, `Expired` past the expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (payload, signature_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if payload.is_empty() || signature_b64.contains('.') {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| TokenError::InvalidSignature)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload_json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload_json).map_err(|_| TokenError::Malformed)?;

        if claims.exp < Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

/// SHA-256 hex digest of a token, for the revocation blacklist.
///
/// The raw token never hits the database; only this digest does.
#[must_use]
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"0123456789abcdef0123456789abcdef")
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let signer = signer();
        let user_id = UserId::generate();
        let token = signer.issue(user_id, Duration::days(7));

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_each_issuance_is_unique() {
        let signer = signer();
        let user_id = UserId::generate();
        let a = signer.issue(user_id, Duration::days(7));
        let b = signer.issue(user_id, Duration::days(7));
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let signer = signer();
        let token = signer.issue(UserId::generate(), Duration::days(7));
        let (payload, signature) = token.split_once('.').unwrap();

        // Re-encode different claims with the original signature
        let other = signer.issue(UserId::generate(), Duration::days(7));
        let (other_payload, _) = other.split_once('.').unwrap();
        assert_ne!(payload, other_payload);

        let forged = format!("{other_payload}.{signature}");
        assert_eq!(signer.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer().issue(UserId::generate(), Duration::days(7));
        let other = TokenSigner::new(b"fedcba9876543210fedcba9876543210");
        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let token = signer.issue(UserId::generate(), Duration::seconds(-10));
        assert_eq!(signer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let signer = signer();
        assert_eq!(signer.verify(""), Err(TokenError::Malformed));
        assert_eq!(signer.verify("no-dot-here"), Err(TokenError::Malformed));
        assert_eq!(signer.verify("a.b.c"), Err(TokenError::Malformed));
        assert_eq!(
            signer.verify("!!!not-base64.!!!neither"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_token_digest_is_stable_hex() {
        let digest = token_digest("some-token");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, token_digest("some-token"));
        assert_ne!(digest, token_digest("other-token"));
    }
}
