use crate::adapters::database::refresh_token_repo::RefreshTokenRepository;
use crate::config::AuthConfig;
use crate::core::jwt::AccessTokenCodec;
use crate::core::password::PasswordScheme;
use crate::core::token::{generate_opaque_token, hash_token};
use crate::domain::auth::{IssuedRefreshToken, RefreshToken};
use crate::domain::auth_session::AuthSession;
use crate::domain::user::User;
use crate::error::{AppError, Result};
use sqlx::SqliteConnection;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Issues, redeems and revokes credentials. Holds the signing keys and the
/// password scheme; never sees a raw refresh secret after handing it out.
#[derive(Clone, Debug)]
pub struct AuthService {
    codec: AccessTokenCodec,
    passwords: Arc<dyn PasswordScheme>,
    refresh_repo: RefreshTokenRepository,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthService {
    #[must_use]
    pub fn new(config: &AuthConfig, passwords: Arc<dyn PasswordScheme>, refresh_repo: RefreshTokenRepository) -> Self {
        Self {
            codec: AccessTokenCodec::new(&config.jwt_secret),
            passwords,
            refresh_repo,
            access_ttl: Duration::seconds(i64::try_from(config.access_token_ttl_secs).unwrap_or(i64::MAX)),
            refresh_ttl: Duration::seconds(config.refresh_token_ttl_days.saturating_mul(86_400)),
        }
    }

    #[must_use]
    pub const fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    /// # Errors
    /// Returns `AppError::Internal` if hashing fails or the blocking task panics.
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let passwords = Arc::clone(&self.passwords);
        tokio::task::spawn_blocking(move || passwords.hash(&password)).await.map_err(|_| AppError::Internal)?
    }

    /// # Errors
    /// Returns `AppError::Internal` if the stored hash is unreadable or the blocking task panics.
    pub async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        let passwords = Arc::clone(&self.passwords);
        tokio::task::spawn_blocking(move || passwords.verify(&password, &password_hash))
            .await
            .map_err(|_| AppError::Internal)?
    }

    /// Spends the same work as a real verification, for logins naming an unknown user.
    pub async fn verify_against_dummy(&self, password: &str) {
        let password = password.to_string();
        let passwords = Arc::clone(&self.passwords);
        let _ = tokio::task::spawn_blocking(move || passwords.verify(&password, passwords.dummy_hash())).await;
    }

    /// Generates a fresh secret, stores only its hash, and returns the secret.
    /// This is the only time the raw value exists on the server.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn issue_refresh_token(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
    ) -> Result<IssuedRefreshToken> {
        let secret = generate_opaque_token();
        let issued_at = OffsetDateTime::now_utc();
        let expires_at = issued_at.checked_add(self.refresh_ttl).ok_or(AppError::Internal)?;

        let row = self.refresh_repo.create(conn, user_id, &hash_token(&secret), issued_at, expires_at).await?;

        Ok(IssuedRefreshToken { secret, expires_at: row.expires_at })
    }

    /// Redeems a secret, revoking its row in the same statement that checks it.
    ///
    /// # Errors
    /// `InvalidRefreshToken` if unknown, `RefreshTokenRevoked` if already used or
    /// logged out, `RefreshTokenExpired` if past its expiry.
    #[tracing::instrument(level = "debug", skip(self, conn, secret), err(level = "debug"))]
    pub(crate) async fn redeem_refresh_token(&self, conn: &mut SqliteConnection, secret: &str) -> Result<RefreshToken> {
        let hash = hash_token(secret);
        let now = OffsetDateTime::now_utc();

        if let Some(token) = self.refresh_repo.consume_live(conn, &hash, now).await? {
            return Ok(token);
        }

        // Nothing was consumed; look again only to say why.
        match self.refresh_repo.find_by_hash(conn, &hash).await? {
            None => Err(AppError::InvalidRefreshToken),
            Some(token) if token.is_revoked() => Err(AppError::RefreshTokenRevoked),
            Some(token) if token.is_expired_at(now) => Err(AppError::RefreshTokenExpired),
            // Claimed by a concurrent redeem between the two statements.
            Some(_) => Err(AppError::RefreshTokenRevoked),
        }
    }

    /// Revokes the live row matching this secret, if any.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn, secret), err)]
    pub(crate) async fn revoke_refresh_token(&self, conn: &mut SqliteConnection, secret: &str) -> Result<bool> {
        self.refresh_repo.revoke_by_hash(conn, &hash_token(secret), OffsetDateTime::now_utc()).await
    }

    /// Mints an access token and a new refresh token for `user`.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if signing fails or `AppError::Database` if the refresh token cannot be stored.
    #[tracing::instrument(level = "debug", skip(self, conn, user), fields(user_id = %user.id), err)]
    pub(crate) async fn create_session(&self, conn: &mut SqliteConnection, user: &User) -> Result<AuthSession> {
        let access = self.codec.sign(user.id, &user.username, self.access_ttl)?;
        let refresh = self.issue_refresh_token(conn, user.id).await?;

        Ok(AuthSession {
            token: access.token,
            refresh_token: refresh.secret,
            username: user.username.clone(),
            expires_at: access.expires_at,
        })
    }
}
