use crate::error::{AppError, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Signs and verifies HS256 access tokens with a process-wide secret.
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenCodec").field("algorithm", &Algorithm::HS256).finish_non_exhaustive()
    }
}

impl AccessTokenCodec {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Mints a token for the user that expires `ttl` from now.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if encoding fails.
    pub fn sign(&self, user_id: Uuid, username: &str, ttl: Duration) -> Result<SignedToken> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            tracing::error!(ttl = %ttl, "Access token expiry out of range");
            AppError::Internal
        })?;
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign access token");
            AppError::Internal
        })?;

        Ok(SignedToken { token, expires_at: claims.exp })
    }

    /// Checks signature and expiry. No storage is consulted.
    ///
    /// # Errors
    /// Returns the [`TokenError`] describing why the token was rejected.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roundtrip() {
        let codec = AccessTokenCodec::new("test_secret");
        let user_id = Uuid::new_v4();

        let signed = codec.sign(user_id, "alice", Duration::minutes(15)).unwrap();
        let claims = codec.verify(&signed.token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp, signed.expires_at);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let token = AccessTokenCodec::new("secret1").sign(Uuid::new_v4(), "alice", Duration::minutes(1)).unwrap();

        let result = AccessTokenCodec::new("secret2").verify(&token.token);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = AccessTokenCodec::new("test_secret");
        let token = codec.sign(Uuid::new_v4(), "alice", Duration::seconds(-5)).unwrap();

        assert_eq!(codec.verify(&token.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = AccessTokenCodec::new("test_secret");

        assert_eq!(codec.verify("not.a.jwt"), Err(TokenError::Malformed));
        assert_eq!(codec.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = AccessTokenCodec::new("test_secret");
        let token = codec.sign(Uuid::new_v4(), "alice", Duration::minutes(1)).unwrap().token;
        let other = codec.sign(Uuid::new_v4(), "mallory", Duration::minutes(1)).unwrap().token;

        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(codec.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let codec = AccessTokenCodec::new("test_secret");
        let result = codec.sign(Uuid::new_v4(), "alice", Duration::seconds(i64::MAX));
        assert!(matches!(result, Err(AppError::Internal)));
    }

    #[test]
    fn test_debug_hides_key_material() {
        let codec = AccessTokenCodec::new("super-secret-signing-key");
        let rendered = format!("{codec:?}");
        assert!(!rendered.contains("super-secret-signing-key"));
    }

    #[test]
    fn test_accepted_until_ttl_elapses() {
        let codec = AccessTokenCodec::new("test_secret");
        let token = codec.sign(Uuid::new_v4(), "alice", Duration::seconds(1)).unwrap();
        assert!(codec.verify(&token.token).is_ok());

        std::thread::sleep(std::time::Duration::from_millis(2100));
        assert_eq!(codec.verify(&token.token), Err(TokenError::Expired));
    }
}
