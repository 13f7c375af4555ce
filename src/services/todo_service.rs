use crate::adapters::database::DbPool;
use crate::adapters::database::todo_repo::TodoRepository;
use crate::domain::todo::{NewTodo, Todo, TodoPatch};
use crate::error::{AppError, Result};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct TodoService {
    pool: DbPool,
    repo: TodoRepository,
}

impl TodoService {
    #[must_use]
    pub const fn new(pool: DbPool, repo: TodoRepository) -> Self {
        Self { pool, repo }
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(skip(self), err)]
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Todo>> {
        let mut conn = self.pool.acquire().await?;
        self.repo.list(&mut conn, user_id).await
    }

    /// # Errors
    /// `BadRequest("Missing text")` if the text is empty.
    #[tracing::instrument(skip(self, todo), err(level = "debug"))]
    pub async fn create(&self, user_id: Uuid, todo: NewTodo) -> Result<Todo> {
        if todo.text.trim().is_empty() {
            return Err(AppError::BadRequest("Missing text".into()));
        }

        let mut conn = self.pool.acquire().await?;
        let created = self.repo.create(&mut conn, user_id, &todo).await?;

        tracing::debug!(todo_id = created.id, "Todo created");
        Ok(created)
    }

    /// Applies `patch` to the caller's todo. Last writer wins.
    ///
    /// # Errors
    /// `NotFound` if the todo does not exist or belongs to someone else.
    #[tracing::instrument(skip(self, patch), err(level = "debug"))]
    pub async fn update(&self, user_id: Uuid, id: i64, patch: TodoPatch) -> Result<Todo> {
        let mut conn = self.pool.acquire().await?;

        let mut todo = self.repo.find(&mut conn, user_id, id).await?.ok_or(AppError::NotFound)?;
        todo.apply(patch);

        self.repo.update(&mut conn, &todo).await?.ok_or(AppError::NotFound)
    }

    /// Deleting a missing or foreign todo is not an error.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(skip(self), err)]
    pub async fn delete(&self, user_id: Uuid, id: i64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        if !self.repo.delete(&mut conn, user_id, id).await? {
            tracing::debug!("Nothing to delete");
        }
        Ok(())
    }
}
