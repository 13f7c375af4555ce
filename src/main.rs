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

use std::net::SocketAddr;
use std::time::Duration;
use todo_server::api::{MgmtState, app_router, mgmt_router};
use todo_server::config::Config;
use todo_server::{AppBuilder, Workers, adapters, telemetry};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::Instrument;

/// Everything bound and wired, but not yet serving.
struct Server {
    api_listener: TcpListener,
    mgmt_listener: TcpListener,
    api: axum::Router,
    mgmt: axum::Router,
    workers: Workers,
}

async fn boot(config: &Config, shutdown_tx: watch::Sender<bool>) -> anyhow::Result<Server> {
    let pool = adapters::database::init_pool(&config.database).await?;
    todo_server::run_migrations(&pool).await?;
    todo_server::spawn_signal_handler(shutdown_tx);

    let app = AppBuilder::new(config.clone()).with_database(pool).build()?;
    let api = app_router(config, app.services)?;
    let mgmt = mgmt_router(MgmtState { health_service: app.health_service });

    let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let mgmt_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.mgmt_port).parse()?;
    let api_listener = TcpListener::bind(api_addr).await?;
    let mgmt_listener = TcpListener::bind(mgmt_addr).await?;

    tracing::info!(address = %api_addr, "listening");
    tracing::info!(address = %mgmt_addr, "management server listening");

    Ok(Server { api_listener, mgmt_listener, api, mgmt, workers: app.workers })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;
    todo_server::setup_panic_hook();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = boot(&config, shutdown_tx.clone()).instrument(tracing::info_span!("boot_server")).await?;

    let worker_tasks = server.workers.spawn_all(shutdown_rx.clone());

    let mut api_rx = shutdown_rx.clone();
    let api = axum::serve(server.api_listener, server.api.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = api_rx.wait_for(|&s| s).await;
        });

    let mut mgmt_rx = shutdown_rx;
    let mgmt = axum::serve(server.mgmt_listener, server.mgmt).with_graceful_shutdown(async move {
        let _ = mgmt_rx.wait_for(|&s| s).await;
    });

    if let Err(e) = tokio::try_join!(api, mgmt) {
        tracing::error!(error = %e, "Server error");
    }

    // A server error ends serving too; make sure the workers hear about it.
    let _ = shutdown_tx.send(true);
    let drain = futures::future::join_all(worker_tasks);
    if tokio::time::timeout(Duration::from_secs(config.server.shutdown_timeout_secs), drain).await.is_ok() {
        tracing::info!("Background tasks finished");
    } else {
        tracing::warn!("Timed out waiting for background tasks");
    }

    telemetry_guard.shutdown();
    Ok(())
}
