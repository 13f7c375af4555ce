use crate::domain::todo::{NewTodo, Todo, TodoPatch, normalize_tags, parse_tags};
use serde::{Deserialize, Deserializer, Serialize};

/// Tags arrive either as a list or as one comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Text(String),
}

impl TagsInput {
    #[must_use]
    pub fn into_tags(self) -> Vec<String> {
        match self {
            Self::List(list) => normalize_tags(list),
            Self::Text(text) => parse_tags(&text),
        }
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTodo {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub tags: Option<TagsInput>,
}

impl From<CreateTodo> for NewTodo {
    fn from(body: CreateTodo) -> Self {
        Self {
            text: body.text,
            due_date: body.due_date.filter(|d| !d.is_empty()),
            tags: body.tags.map(TagsInput::into_tags).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTodo {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<TagsInput>,
}

impl From<UpdateTodo> for TodoPatch {
    fn from(body: UpdateTodo) -> Self {
        Self {
            text: body.text,
            done: body.done,
            due_date: body.due_date,
            tags: body.tags.map(TagsInput::into_tags),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: i64,
    pub text: String,
    pub done: bool,
    pub due_date: Option<String>,
    pub tags: Vec<String>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            text: todo.text,
            done: todo.done,
            due_date: todo.due_date.filter(|d| !d.is_empty()),
            tags: todo.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_accept_list_or_text() {
        let list: CreateTodo = serde_json::from_str(r#"{"text":"a","tags":[" x ","", "y"]}"#).unwrap();
        assert_eq!(NewTodo::from(list).tags, vec!["x", "y"]);

        let text: CreateTodo = serde_json::from_str(r#"{"text":"a","tags":"x, y,,"}"#).unwrap();
        assert_eq!(NewTodo::from(text).tags, vec!["x", "y"]);
    }

    #[test]
    fn test_due_date_null_differs_from_absent() {
        let absent: UpdateTodo = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(absent.due_date.is_none());

        let cleared: UpdateTodo = serde_json::from_str(r#"{"dueDate":null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let set: UpdateTodo = serde_json::from_str(r#"{"dueDate":"2026-12-24"}"#).unwrap();
        assert_eq!(set.due_date, Some(Some("2026-12-24".to_string())));
    }

    #[test]
    fn test_empty_due_date_on_create_is_none() {
        let body: CreateTodo = serde_json::from_str(r#"{"text":"a","dueDate":""}"#).unwrap();
        assert!(NewTodo::from(body).due_date.is_none());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<UpdateTodo>(r#"{"owner":"someone"}"#).is_err());
    }
}
