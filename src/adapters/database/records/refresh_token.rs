use super::from_unix;
use crate::domain::auth::RefreshToken;
use crate::error::AppError;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub revoked_at: Option<i64>,
}

impl TryFrom<RefreshTokenRecord> for RefreshToken {
    type Error = AppError;

    fn try_from(record: RefreshTokenRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            user_id: record.user_id,
            token_hash: record.token_hash,
            issued_at: from_unix(record.issued_at)?,
            expires_at: from_unix(record.expires_at)?,
            revoked_at: record.revoked_at.map(from_unix).transpose()?,
        })
    }
}
