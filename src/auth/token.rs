//! Identity tokens: HS256-signed claims binding a user id to an absolute
//! expiry. Stateless — there is no revocation list; expiry is checked
//! lazily at verify time.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,
}

/// Issues and verifies identity tokens with a process-wide symmetric
/// secret loaded once at startup.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Produces a signed token for the given user, expiring `ttl` from now.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_with_ttl(user_id, self.ttl)
    }

    /// Issue with an explicit lifetime. A non-positive lifetime yields an
    /// already-expired token, which tests use to exercise the expiry path.
    pub fn issue_with_ttl(&self, user_id: Uuid, ttl: Duration) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Pure verification: signature, then expiry. Returns the embedded
    /// user id on success. No side effects, no caching across calls.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    Err(TokenError::InvalidSignature)
                }
                _ => Err(TokenError::Malformed),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", 30)
    }

    #[test]
    fn verify_returns_issued_identity() {
        let signer = signer();
        let user_id = Uuid::new_v4();
        let token = signer.issue(user_id).unwrap();
        assert_eq!(signer.verify(&token), Ok(user_id));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = signer();
        let token = signer
            .issue_with_ttl(Uuid::new_v4(), Duration::seconds(-60))
            .unwrap();
        assert_eq!(signer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenSigner::new("different-secret", 30);
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert_eq!(signer().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            signer().verify("not.a.token"),
            Err(TokenError::Malformed)
        );
        assert_eq!(signer().verify(""), Err(TokenError::Malformed));
    }
}
