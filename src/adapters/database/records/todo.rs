use super::from_unix;
use crate::domain::todo::{Todo, parse_tags};
use crate::error::AppError;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub struct TodoRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub text: String,
    pub done: bool,
    pub due_date: Option<String>,
    pub tags: String,
    pub created_at: i64,
}

impl TryFrom<TodoRecord> for Todo {
    type Error = AppError;

    fn try_from(record: TodoRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            user_id: record.user_id,
            text: record.text,
            done: record.done,
            due_date: record.due_date.filter(|d| !d.is_empty()),
            tags: parse_tags(&record.tags),
            created_at: from_unix(record.created_at)?,
        })
    }
}
