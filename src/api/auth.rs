use crate::api::AppState;
use crate::api::schemas::auth::{AuthSession as AuthSessionSchema, Credentials, Logout, RegisteredUser, Refresh};
use crate::domain::auth_session::AuthSession;
use crate::error::Result;
use axum::{
    Json,
    body::Bytes,
    extract::{
        State,
        rejection::{BytesRejection, JsonRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    let user = state.account_service.register(&payload.username, &payload.password).await?;

    Ok((StatusCode::CREATED, Json(RegisteredUser { id: user.id, username: user.username })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    let session = state.account_service.login(&payload.username, &payload.password).await?;
    Ok(Json(map_session(session)))
}

pub async fn refresh(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Refresh>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    let session = state.account_service.refresh(&payload.refresh_token).await?;
    Ok(Json(map_session(session)))
}

/// Always 204. The body is parsed as JSON whatever its content type.
pub async fn logout(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let payload = body.map(|body| Logout::from_body(&body)).unwrap_or_default();
    state.account_service.logout(payload.refresh_token.as_deref()).await;
    StatusCode::NO_CONTENT
}

fn map_session(session: AuthSession) -> AuthSessionSchema {
    AuthSessionSchema {
        token: session.token,
        refresh_token: session.refresh_token,
        username: session.username,
        expires_at: session.expires_at,
    }
}
