use crate::adapters::database::DbPool;
use crate::adapters::database::user_repo::UserRepository;
use crate::domain::auth_session::AuthSession;
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use opentelemetry::{global, metrics::Counter};

#[derive(Clone, Debug)]
struct AccountMetrics {
    users_registered_total: Counter<u64>,
    login_total: Counter<u64>,
    refresh_total: Counter<u64>,
    logout_total: Counter<u64>,
}

impl AccountMetrics {
    fn new() -> Self {
        let meter = global::meter("todo-server");
        Self {
            users_registered_total: meter
                .u64_counter("users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
            login_total: meter
                .u64_counter("auth_login_total")
                .with_description("Total number of successful login attempts")
                .build(),
            refresh_total: meter
                .u64_counter("auth_refresh_total")
                .with_description("Total number of successful token rotations")
                .build(),
            logout_total: meter
                .u64_counter("auth_logout_total")
                .with_description("Total number of logout requests")
                .build(),
        }
    }
}

/// Registration, login, refresh-token rotation and logout.
///
/// Refresh token lifecycle: issued (live) -> redeemed or revoked, or live -> expired.
/// Both outcomes are terminal.
#[derive(Clone, Debug)]
pub struct AccountService {
    pool: DbPool,
    user_repo: UserRepository,
    auth_service: AuthService,
    metrics: AccountMetrics,
}

impl AccountService {
    #[must_use]
    pub fn new(pool: DbPool, user_repo: UserRepository, auth_service: AuthService) -> Self {
        Self { pool, user_repo, auth_service, metrics: AccountMetrics::new() }
    }

    /// # Errors
    /// `MissingFields` if either field is empty, `DuplicateUsername` if the name is taken.
    #[tracing::instrument(
        skip(self, username, password),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::MissingFields);
        }

        let password_hash = self.auth_service.hash_password(password).await?;

        let mut conn = self.pool.acquire().await?;
        let user = self.user_repo.create(&mut conn, username, &password_hash).await?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        tracing::info!("User registered successfully");
        self.metrics.users_registered_total.add(1, &[]);

        Ok(user)
    }

    /// Unknown usernames and wrong passwords fail identically.
    ///
    /// # Errors
    /// `MissingFields` if either field is empty, `InvalidCredentials` otherwise.
    #[tracing::instrument(
        skip(self, username, password),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::MissingFields);
        }

        let found = {
            let mut conn = self.pool.acquire().await?;
            self.user_repo.find_by_username(&mut conn, username).await?
        };

        let Some(user) = found else {
            self.auth_service.verify_against_dummy(password).await;
            tracing::warn!("Login failed: user not found");
            return Err(AppError::InvalidCredentials);
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        if !self.auth_service.verify_password(password, &user.password_hash).await? {
            tracing::warn!("Login failed: invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let mut tx = self.pool.begin().await?;
        let session = self.auth_service.create_session(&mut tx, &user).await?;
        tx.commit().await?;

        tracing::info!("User logged in successfully");
        self.metrics.login_total.add(1, &[]);

        Ok(session)
    }

    /// Redeems `refresh_token` and issues a replacement pair. The redeem is the
    /// first statement of the transaction, so the old secret works exactly once.
    /// It stays live if storing the replacement fails, and stays spent if its
    /// owner no longer exists.
    ///
    /// # Errors
    /// `MissingToken`, `InvalidRefreshToken`, `RefreshTokenRevoked`, `RefreshTokenExpired` or `UserMissing`.
    #[tracing::instrument(
        skip(self, refresh_token),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession> {
        if refresh_token.is_empty() {
            return Err(AppError::MissingToken);
        }

        let mut tx = self.pool.begin().await?;

        let consumed = self.auth_service.redeem_refresh_token(&mut tx, refresh_token).await?;
        tracing::Span::current().record("user_id", tracing::field::display(consumed.user_id));

        let Some(user) = self.user_repo.find_by_id(&mut tx, consumed.user_id).await? else {
            // Keep the secret spent; a failed refresh is final for it.
            tx.commit().await?;
            return Err(AppError::UserMissing);
        };
        let session = self.auth_service.create_session(&mut tx, &user).await?;

        tx.commit().await?;

        tracing::info!("Tokens rotated successfully");
        self.metrics.refresh_total.add(1, &[]);

        Ok(session)
    }

    /// Best-effort revocation of the presented secret. Never fails: an unknown,
    /// expired or already revoked secret grants no session either way.
    #[tracing::instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: Option<&str>) {
        self.metrics.logout_total.add(1, &[]);

        let Some(refresh_token) = refresh_token.filter(|t| !t.is_empty()) else {
            tracing::debug!("Logout without refresh token");
            return;
        };

        let revoked = match self.pool.acquire().await {
            Ok(mut conn) => self.auth_service.revoke_refresh_token(&mut conn, refresh_token).await,
            Err(e) => Err(AppError::Database(e)),
        };

        match revoked {
            Ok(true) => tracing::info!("User logged out"),
            Ok(false) => tracing::debug!("Logout presented no live refresh token"),
            Err(e) => tracing::error!(error = %e, "Logout revocation failed"),
        }
    }
}
