use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `/register` and `/login`. Absent fields deserialize as empty and
/// are rejected by the account service.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Refresh {
    #[serde(default)]
    pub refresh_token: String,
}

/// Body of `/logout`. Read leniently: extra fields, a missing content type or
/// an unreadable body never stop a present `refreshToken` from being revoked.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Logout {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Logout {
    #[must_use]
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub refresh_token: String,
    pub username: String,
    pub expires_at: i64,
}

#[derive(Serialize)]
pub struct RegisteredUser {
    pub id: Uuid,
    pub username: String,
}
