use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::todos::{CreateTodo, TodoResponse, UpdateTodo};
use crate::error::Result;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

pub async fn list_todos(AuthUser(identity): AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let todos = state.todo_service.list(identity.user_id).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect::<Vec<_>>()))
}

pub async fn create_todo(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateTodo>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    let todo = state.todo_service.create(identity.user_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(TodoResponse::from(todo))))
}

pub async fn update_todo(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let todo = state.todo_service.update(identity.user_id, id, payload.into()).await?;
    Ok(Json(TodoResponse::from(todo)))
}

pub async fn delete_todo(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    state.todo_service.delete(identity.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
