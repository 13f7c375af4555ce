#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::database::DbPool;
use crate::adapters::database::refresh_token_repo::RefreshTokenRepository;
use crate::adapters::database::todo_repo::TodoRepository;
use crate::adapters::database::user_repo::UserRepository;
use crate::api::ServiceContainer;
use crate::config::Config;
use crate::core::password::{Argon2Scheme, PasswordScheme};
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::health_service::HealthService;
use crate::services::todo_service::TodoService;
use crate::workers::RefreshTokenCleanupWorker;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Applies the embedded migrations.
///
/// # Errors
/// Returns an error if a migration fails to apply.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}

/// Flips the shutdown channel on Ctrl+C or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received, draining connections...");
        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the configured log output.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();

        tracing::error!(location = %location, payload = %payload, "Process panicked");
    }));
}

/// Background tasks owned by the application.
#[derive(Debug)]
pub struct Workers {
    refresh_token_cleanup: RefreshTokenCleanupWorker,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        vec![tokio::spawn(self.refresh_token_cleanup.run(shutdown_rx))]
    }
}

#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
    pub workers: Workers,
}

/// Wires repositories, services and workers together.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    pool: Option<DbPool>,
    passwords: Option<Arc<dyn PasswordScheme>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, pool: None, passwords: None }
    }

    #[must_use]
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Overrides the Argon2 scheme derived from the configuration.
    #[must_use]
    pub fn with_password_scheme(mut self, passwords: Arc<dyn PasswordScheme>) -> Self {
        self.passwords = Some(passwords);
        self
    }

    /// # Errors
    /// Returns an error if no database was provided, a token lifetime is out of
    /// range, or the password scheme cannot be built.
    pub fn build(self) -> anyhow::Result<App> {
        let pool = self.pool.ok_or_else(|| anyhow::anyhow!("database pool is required"))?;
        let auth_config = &self.config.auth;
        auth_config.validate()?;

        let passwords: Arc<dyn PasswordScheme> = match self.passwords {
            Some(passwords) => passwords,
            None => Arc::new(Argon2Scheme::new(
                auth_config.password_memory_kib,
                auth_config.password_iterations,
                auth_config.password_parallelism,
            )?),
        };

        let refresh_repo = RefreshTokenRepository::new();
        let auth_service = AuthService::new(auth_config, passwords, refresh_repo.clone());
        let account_service = AccountService::new(pool.clone(), UserRepository::new(), auth_service.clone());
        let todo_service = TodoService::new(pool.clone(), TodoRepository::new());
        let health_service = HealthService::new(pool.clone(), self.config.health.clone());

        let workers = Workers {
            refresh_token_cleanup: RefreshTokenCleanupWorker::new(pool, refresh_repo, auth_config.cleanup_interval_secs),
        };

        Ok(App { services: ServiceContainer { account_service, auth_service, todo_service }, health_service, workers })
    }
}
