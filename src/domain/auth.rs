use time::OffsetDateTime;
use uuid::Uuid;

/// A persisted refresh token row. The raw secret is never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
}

impl RefreshToken {
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    #[must_use]
    pub const fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// The raw secret of a freshly issued refresh token. Only ever returned to the client.
#[derive(Clone)]
pub struct IssuedRefreshToken {
    pub secret: String,
    pub expires_at: OffsetDateTime,
}

impl std::fmt::Debug for IssuedRefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedRefreshToken").field("secret", &"<redacted>").field("expires_at", &self.expires_at).finish()
    }
}

/// The caller identity asserted by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}
