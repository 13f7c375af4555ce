use super::from_unix;
use crate::domain::user::User;
use crate::error::AppError;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

impl TryFrom<UserRecord> for User {
    type Error = AppError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            username: record.username,
            password_hash: record.password_hash,
            created_at: from_unix(record.created_at)?,
        })
    }
}
