use crate::adapters::database::records::UserRecord;
use crate::domain::user::User;
use crate::error::{AppError, Result};
use sqlx::SqliteConnection;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct UserRepository {}

impl UserRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Inserts a new user. The username column is `UNIQUE`, so of two concurrent
    /// registrations for the same name exactly one succeeds.
    ///
    /// # Errors
    /// Returns `AppError::DuplicateUsername` if the username is taken, or `AppError::Database` otherwise.
    #[tracing::instrument(level = "debug", skip(self, conn, password_hash), err)]
    pub(crate) async fn create(&self, conn: &mut SqliteConnection, username: &str, password_hash: &str) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, username, password_hash, created_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc().unix_timestamp())
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicateUsername,
            other => AppError::Database(other),
        })?;

        record.try_into()
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn find_by_username(&self, conn: &mut SqliteConnection, username: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_optional(conn)
        .await?;

        record.map(User::try_from).transpose()
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn find_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        record.map(User::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::test_pool;

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = test_pool().await;
        let repo = UserRepository::new();
        let mut conn = pool.acquire().await.unwrap();

        let user = repo.create(&mut conn, "alice", "hash").await.unwrap();
        assert_eq!(user.username, "alice");

        let by_name = repo.find_by_username(&mut conn, "alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_name.password_hash, "hash");

        let by_id = repo.find_by_id(&mut conn, user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let pool = test_pool().await;
        let repo = UserRepository::new();
        let mut conn = pool.acquire().await.unwrap();

        repo.create(&mut conn, "alice", "hash").await.unwrap();
        let result = repo.create(&mut conn, "alice", "other").await;

        assert!(matches!(result, Err(AppError::DuplicateUsername)));
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let pool = test_pool().await;
        let repo = UserRepository::new();
        let mut conn = pool.acquire().await.unwrap();

        repo.create(&mut conn, "alice", "hash").await.unwrap();
        repo.create(&mut conn, "Alice", "hash").await.unwrap();

        assert!(repo.find_by_username(&mut conn, "ALICE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let found = UserRepository::new().find_by_id(&mut conn, Uuid::new_v4()).await.unwrap();
        assert!(found.is_none());
    }
}
