use crate::api::AppState;
use crate::core::jwt::AccessTokenCodec;
use crate::domain::auth::Identity;
use crate::error::{AppError, Result};
use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header, request::Parts},
};

/// Resolves an `Authorization` header to the caller's identity.
///
/// # Errors
/// `NoToken` if the header is absent, `MalformedHeader` unless it is exactly
/// `Bearer <token>`, `InvalidToken` if the token fails verification.
pub fn authenticate(codec: &AccessTokenCodec, header: Option<&HeaderValue>) -> Result<Identity> {
    let header = header.ok_or(AppError::NoToken)?;
    let value = header.to_str().map_err(|_| AppError::MalformedHeader)?;

    let token = match value.split(' ').collect::<Vec<_>>().as_slice() {
        ["Bearer", token] => *token,
        _ => return Err(AppError::MalformedHeader),
    };

    let claims = codec.verify(token).map_err(|e| {
        tracing::debug!(reason = %e, "Access token rejected");
        AppError::InvalidToken
    })?;

    Ok(Identity { user_id: claims.sub, username: claims.username })
}

#[derive(Debug)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let identity = authenticate(state.auth_service.codec(), parts.headers.get(header::AUTHORIZATION))?;
        tracing::Span::current().record("user_id", tracing::field::display(identity.user_id));
        Ok(Self(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use uuid::Uuid;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn test_valid_bearer_token() {
        let codec = AccessTokenCodec::new("secret");
        let user_id = Uuid::new_v4();
        let signed = codec.sign(user_id, "alice", Duration::minutes(5)).unwrap();

        let identity = authenticate(&codec, Some(&header(&format!("Bearer {}", signed.token)))).unwrap();
        assert_eq!(identity, Identity { user_id, username: "alice".into() });
    }

    #[test]
    fn test_missing_header() {
        let codec = AccessTokenCodec::new("secret");
        assert!(matches!(authenticate(&codec, None), Err(AppError::NoToken)));
    }

    #[test]
    fn test_malformed_headers() {
        let codec = AccessTokenCodec::new("secret");
        for value in ["Bearer", "Token abc", "bearer abc", "Bearer a b", "Bearer  abc", ""] {
            let result = authenticate(&codec, Some(&header(value)));
            assert!(matches!(result, Err(AppError::MalformedHeader)), "{value:?}");
        }
    }

    #[test]
    fn test_foreign_signature_is_invalid() {
        let ours = AccessTokenCodec::new("secret");
        let theirs = AccessTokenCodec::new("other");
        let signed = theirs.sign(Uuid::new_v4(), "mallory", Duration::minutes(5)).unwrap();

        let result = authenticate(&ours, Some(&header(&format!("Bearer {}", signed.token))));
        assert!(matches!(result, Err(AppError::InvalidToken)));
        assert!(matches!(authenticate(&ours, Some(&header("Bearer garbage"))), Err(AppError::InvalidToken)));
    }
}
