#![allow(dead_code)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Once;
use todo_server::adapters::database::{self, DbPool};
use todo_server::api::{MgmtState, app_router, mgmt_router};
use todo_server::config::{
    AuthConfig, Config, DatabaseConfig, HealthConfig, LogFormat, RateLimitConfig, ServerConfig, TelemetryConfig,
};
use todo_server::{AppBuilder, run_migrations};
use tokio::net::TcpListener;
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("todo_server=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

pub fn get_test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_secs: 5,
            busy_timeout_ms: 5000,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            request_timeout_secs: 10,
            shutdown_timeout_secs: 1,
        },
        auth: AuthConfig {
            jwt_secret: "test_secret".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_days: 30,
            cleanup_interval_secs: 0,
            password_memory_kib: 1024,
            password_iterations: 1,
            password_parallelism: 1,
        },
        rate_limit: RateLimitConfig { auth_per_second: 10_000, auth_burst: 10_000 },
        health: HealthConfig { db_timeout_ms: 1000 },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

pub fn generate_username(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..8])
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: Client,
    pub pool: DbPool,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        setup_tracing();

        let pool = database::init_pool(&config.database).await.expect("Failed to open test database");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let app = AppBuilder::new(config.clone()).with_database(pool.clone()).build().expect("Failed to build app");

        let router = app_router(&config, app.services).expect("Failed to build router");
        let mgmt = mgmt_router(MgmtState { health_service: app.health_service });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        let mgmt_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt).await.unwrap();
        });

        Self {
            server_url: format!("http://{addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: Client::new(),
            pool,
        }
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client.post(format!("{}{path}", self.server_url)).json(body).send().await.unwrap()
    }

    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/register", &json!({ "username": username, "password": password })).await
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/login", &json!({ "username": username, "password": password })).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.post("/refresh", &json!({ "refreshToken": refresh_token })).await
    }

    pub async fn logout(&self, refresh_token: &str) -> reqwest::Response {
        self.post("/logout", &json!({ "refreshToken": refresh_token })).await
    }

    /// Registers a fresh user and logs in, returning the session body.
    pub async fn register_and_login(&self) -> (String, Value) {
        let username = generate_username("user");
        let resp = self.register(&username, "password123").await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = self.login(&username, "password123").await;
        assert_eq!(resp.status(), StatusCode::OK);
        (username, resp.json().await.unwrap())
    }

    pub fn todos(&self, token: &str) -> TodoClient<'_> {
        TodoClient { app: self, token: token.to_string() }
    }
}

pub struct TodoClient<'a> {
    app: &'a TestApp,
    token: String,
}

impl TodoClient<'_> {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.app.server_url)
    }

    pub async fn list(&self) -> reqwest::Response {
        self.app.client.get(self.url("/todos")).bearer_auth(&self.token).send().await.unwrap()
    }

    pub async fn create(&self, body: &Value) -> reqwest::Response {
        self.app.client.post(self.url("/todos")).bearer_auth(&self.token).json(body).send().await.unwrap()
    }

    pub async fn update(&self, id: i64, body: &Value) -> reqwest::Response {
        self.app.client.put(self.url(&format!("/todos/{id}"))).bearer_auth(&self.token).json(body).send().await.unwrap()
    }

    pub async fn delete(&self, id: i64) -> reqwest::Response {
        self.app.client.delete(self.url(&format!("/todos/{id}"))).bearer_auth(&self.token).send().await.unwrap()
    }
}

pub async fn error_of(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}
