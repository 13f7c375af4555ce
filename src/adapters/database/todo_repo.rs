use crate::adapters::database::records::TodoRecord;
use crate::domain::todo::{NewTodo, Todo};
use crate::error::{AppError, Result};
use sqlx::SqliteConnection;
use time::OffsetDateTime;
use uuid::Uuid;

fn encode_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).map_err(|_| AppError::Internal)
}

/// Every query is scoped by owner; a todo id alone never reaches another user's row.
#[derive(Clone, Debug, Default)]
pub struct TodoRepository {}

impl TodoRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn list(&self, conn: &mut SqliteConnection, user_id: Uuid) -> Result<Vec<Todo>> {
        let records = sqlx::query_as::<_, TodoRecord>(
            r"
            SELECT id, user_id, text, done, due_date, tags, created_at
            FROM todos
            WHERE user_id = ?
            ORDER BY id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?;

        records.into_iter().map(Todo::try_from).collect()
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn find(&self, conn: &mut SqliteConnection, user_id: Uuid, id: i64) -> Result<Option<Todo>> {
        let record = sqlx::query_as::<_, TodoRecord>(
            r"
            SELECT id, user_id, text, done, due_date, tags, created_at
            FROM todos
            WHERE id = ? AND user_id = ?
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        record.map(Todo::try_from).transpose()
    }

    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, todo), err)]
    pub(crate) async fn create(&self, conn: &mut SqliteConnection, user_id: Uuid, todo: &NewTodo) -> Result<Todo> {
        let record = sqlx::query_as::<_, TodoRecord>(
            r"
            INSERT INTO todos (user_id, text, done, due_date, tags, created_at)
            VALUES (?, ?, 0, ?, ?, ?)
            RETURNING id, user_id, text, done, due_date, tags, created_at
            ",
        )
        .bind(user_id)
        .bind(&todo.text)
        .bind(todo.due_date.as_deref())
        .bind(encode_tags(&todo.tags)?)
        .bind(OffsetDateTime::now_utc().unix_timestamp())
        .fetch_one(conn)
        .await?;

        record.try_into()
    }

    /// Writes back every mutable field of `todo`. Returns `None` if the row is not the owner's.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn, todo), fields(todo_id = todo.id), err)]
    pub(crate) async fn update(&self, conn: &mut SqliteConnection, todo: &Todo) -> Result<Option<Todo>> {
        let record = sqlx::query_as::<_, TodoRecord>(
            r"
            UPDATE todos
            SET text = ?, done = ?, due_date = ?, tags = ?
            WHERE id = ? AND user_id = ?
            RETURNING id, user_id, text, done, due_date, tags, created_at
            ",
        )
        .bind(&todo.text)
        .bind(todo.done)
        .bind(todo.due_date.as_deref())
        .bind(encode_tags(&todo.tags)?)
        .bind(todo.id)
        .bind(todo.user_id)
        .fetch_optional(conn)
        .await?;

        record.map(Todo::try_from).transpose()
    }

    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn delete(&self, conn: &mut SqliteConnection, user_id: Uuid, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(conn)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
