use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub user_id: Uuid,
    pub text: String,
    pub done: bool,
    pub due_date: Option<String>,
    pub tags: Vec<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub text: String,
    pub due_date: Option<String>,
    pub tags: Vec<String>,
}

/// A partial update. `due_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub done: Option<bool>,
    pub due_date: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl Todo {
    pub fn apply(&mut self, patch: TodoPatch) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(done) = patch.done {
            self.done = done;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }
}

/// Trims every tag and drops the empty ones.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().map(|t| t.as_ref().trim().to_string()).filter(|t| !t.is_empty()).collect()
}

/// Parses tags given as text: a JSON array of strings, or a comma-separated list.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => normalize_tags(list),
        Err(_) => normalize_tags(raw.split(',')),
    }
}
