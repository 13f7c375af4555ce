/// Tokens handed to a client after login or rotation.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub refresh_token: String,
    pub username: String,
    pub expires_at: i64,
}
