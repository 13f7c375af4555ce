use crate::adapters::database::records::RefreshTokenRecord;
use crate::domain::auth::RefreshToken;
use crate::error::{AppError, Result};
use sqlx::SqliteConnection;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct RefreshTokenRepository {}

impl RefreshTokenRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Creates a new refresh token record.
    /// Note: We store the HASH, not the raw token.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, token_hash), err)]
    pub(crate) async fn create(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        token_hash: &str,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<RefreshToken> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r"
            INSERT INTO refresh_tokens (id, user_id, token_hash, issued_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, user_id, token_hash, issued_at, expires_at, revoked_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token_hash)
        .bind(issued_at.unix_timestamp())
        .bind(expires_at.unix_timestamp())
        .fetch_one(conn)
        .await
        .map_err(AppError::Database)?;

        record.try_into()
    }

    /// Atomically consumes a live token: marks it revoked only if it is neither
    /// revoked nor expired, in a single statement. Of any number of concurrent
    /// callers presenting the same hash, at most one gets `Some`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn, token_hash), err)]
    pub(crate) async fn consume_live(
        &self,
        conn: &mut SqliteConnection,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<RefreshToken>> {
        let now = now.unix_timestamp();
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r"
            UPDATE refresh_tokens
            SET revoked_at = ?
            WHERE token_hash = ? AND revoked_at IS NULL AND expires_at > ?
            RETURNING id, user_id, token_hash, issued_at, expires_at, revoked_at
            ",
        )
        .bind(now)
        .bind(token_hash)
        .bind(now)
        .fetch_optional(conn)
        .await?;

        record.map(RefreshToken::try_from).transpose()
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn, token_hash), err)]
    pub(crate) async fn find_by_hash(&self, conn: &mut SqliteConnection, token_hash: &str) -> Result<Option<RefreshToken>> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r"
            SELECT id, user_id, token_hash, issued_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = ?
            ",
        )
        .bind(token_hash)
        .fetch_optional(conn)
        .await?;

        record.map(RefreshToken::try_from).transpose()
    }

    /// Revokes a row by id. An already revoked row keeps its first `revoked_at`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub async fn revoke(&self, conn: &mut SqliteConnection, id: Uuid, at: OffsetDateTime) -> Result<bool> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL")
            .bind(at.unix_timestamp())
            .bind(id)
            .execute(conn)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Revokes the unrevoked row with this hash. Revoking twice is a no-op;
    /// returns whether this call changed anything.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn, token_hash), err)]
    pub(crate) async fn revoke_by_hash(
        &self,
        conn: &mut SqliteConnection,
        token_hash: &str,
        at: OffsetDateTime,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked_at = ? WHERE token_hash = ? AND revoked_at IS NULL")
                .bind(at.unix_timestamp())
                .bind(token_hash)
                .execute(conn)
                .await
                .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes all refresh tokens that expired before `now`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub async fn delete_expired(&self, conn: &mut SqliteConnection, now: OffsetDateTime) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(now.unix_timestamp())
            .execute(conn)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::test_pool;
    use crate::adapters::database::user_repo::UserRepository;
    use time::Duration;

    async fn seed_user(conn: &mut SqliteConnection) -> Uuid {
        UserRepository::new().create(conn, &format!("user_{}", Uuid::new_v4()), "hash").await.unwrap().id
    }

    #[tokio::test]
    async fn test_consume_live_succeeds_once() {
        let pool = test_pool().await;
        let repo = RefreshTokenRepository::new();
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;
        let now = OffsetDateTime::now_utc();

        let created = repo.create(&mut conn, user_id, "h1", now, now + Duration::days(1)).await.unwrap();
        assert!(created.revoked_at.is_none());

        let consumed = repo.consume_live(&mut conn, "h1", now).await.unwrap().unwrap();
        assert_eq!(consumed.id, created.id);
        assert_eq!(consumed.user_id, user_id);
        assert!(consumed.revoked_at.is_some());

        assert!(repo.consume_live(&mut conn, "h1", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_consume_live_skips_expired() {
        let pool = test_pool().await;
        let repo = RefreshTokenRepository::new();
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;
        let now = OffsetDateTime::now_utc();

        repo.create(&mut conn, user_id, "h1", now - Duration::days(2), now).await.unwrap();

        assert!(repo.consume_live(&mut conn, "h1", now).await.unwrap().is_none());
        let row = repo.find_by_hash(&mut conn, "h1").await.unwrap().unwrap();
        assert!(row.revoked_at.is_none(), "expired rows are left untouched");
    }

    #[tokio::test]
    async fn test_revoke_by_hash_only_touches_live_rows() {
        let pool = test_pool().await;
        let repo = RefreshTokenRepository::new();
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;
        let now = OffsetDateTime::now_utc();

        repo.create(&mut conn, user_id, "h1", now, now + Duration::days(1)).await.unwrap();

        assert!(repo.revoke_by_hash(&mut conn, "h1", now).await.unwrap());
        assert!(!repo.revoke_by_hash(&mut conn, "h1", now + Duration::hours(1)).await.unwrap());
        assert!(!repo.revoke_by_hash(&mut conn, "unknown", now).await.unwrap());

        let row = repo.find_by_hash(&mut conn, "h1").await.unwrap().unwrap();
        assert_eq!(row.revoked_at.map(OffsetDateTime::unix_timestamp), Some(now.unix_timestamp()));
    }

    #[tokio::test]
    async fn test_revoke_by_id_is_idempotent() {
        let pool = test_pool().await;
        let repo = RefreshTokenRepository::new();
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;
        let now = OffsetDateTime::now_utc();

        let token = repo.create(&mut conn, user_id, "h1", now, now + Duration::days(1)).await.unwrap();

        assert!(repo.revoke(&mut conn, token.id, now).await.unwrap());
        assert!(!repo.revoke(&mut conn, token.id, now + Duration::hours(1)).await.unwrap());
        assert!(!repo.revoke(&mut conn, Uuid::new_v4(), now).await.unwrap());

        let row = repo.find_by_hash(&mut conn, "h1").await.unwrap().unwrap();
        assert_eq!(row.revoked_at.map(OffsetDateTime::unix_timestamp), Some(now.unix_timestamp()));
        assert!(repo.consume_live(&mut conn, "h1", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_live_rows() {
        let pool = test_pool().await;
        let repo = RefreshTokenRepository::new();
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;
        let now = OffsetDateTime::now_utc();

        repo.create(&mut conn, user_id, "old", now - Duration::days(31), now - Duration::days(1)).await.unwrap();
        repo.create(&mut conn, user_id, "live", now, now + Duration::days(30)).await.unwrap();

        assert_eq!(repo.delete_expired(&mut conn, now).await.unwrap(), 1);
        assert!(repo.find_by_hash(&mut conn, "old").await.unwrap().is_none());
        assert!(repo.find_by_hash(&mut conn, "live").await.unwrap().is_some());
    }
}
