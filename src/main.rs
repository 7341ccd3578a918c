use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use storefront_api::config::{init_tracing, load_config};
use storefront_api::db::{establish_connection, run_migrations};
use storefront_api::events;
use storefront_api::gateway::PaymentGatewayClient;
use storefront_api::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(&config.log_level, config.log_json);

    let db = Arc::new(
        establish_connection(&config)
            .await
            .context("failed to connect to database")?,
    );
    if config.auto_migrate {
        run_migrations(db.as_ref())
            .await
            .context("failed to run migrations")?;
    }

    let gateway = Arc::new(PaymentGatewayClient::new(&config.gateway)?);

    let (event_sender, event_rx) = events::channel();
    tokio::spawn(events::process_events(event_rx));

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(db, Arc::new(config), gateway, Arc::new(event_sender));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
