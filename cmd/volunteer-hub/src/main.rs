//! # Volunteer Hub
//!
//! Assembles the service from the compiled-in adapters and serves the JSON API.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState};
use configs::{LogSettings, Settings};
use domains::AuthProvider;
use services::Services;
use storage_adapters::MemoryStore;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

// Adapters are compiled in by feature.
#[cfg(feature = "auth-jwt")]
use auth_adapters::JwtAuthProvider;
#[cfg(any(feature = "auth-jwt", feature = "db-postgres"))]
use secrecy::ExposeSecret;
#[cfg(feature = "db-postgres")]
use storage_adapters::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);

    let auth = auth_provider(&settings)?;
    let services = build_services(&settings, auth).await?;

    let app = router(AppState::new(services));

    let addr = settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "volunteer hub listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down cleanly");
    Ok(())
}

#[cfg(feature = "auth-jwt")]
fn auth_provider(settings: &Settings) -> anyhow::Result<Arc<dyn AuthProvider>> {
    Ok(Arc::new(JwtAuthProvider::new(
        settings.auth.jwt_secret.expose_secret(),
        settings.auth.token_ttl_hours,
    )))
}

#[cfg(not(feature = "auth-jwt"))]
fn auth_provider(_settings: &Settings) -> anyhow::Result<Arc<dyn AuthProvider>> {
    anyhow::bail!("no auth provider compiled in; enable the `auth-jwt` feature")
}

#[cfg(feature = "db-postgres")]
async fn build_services(settings: &Settings, auth: Arc<dyn AuthProvider>) -> anyhow::Result<Services> {
    let Some(url) = &settings.database.url else {
        return Ok(memory_services(auth));
    };
    let store = PgStore::connect(url.expose_secret(), settings.database.max_connections)
        .await
        .context("connecting to postgres")?;
    if settings.database.run_migrations {
        store.migrate().await.context("running migrations")?;
    }
    tracing::info!("using postgres store");
    Ok(Services::new(Arc::new(store), auth))
}

#[cfg(not(feature = "db-postgres"))]
async fn build_services(settings: &Settings, auth: Arc<dyn AuthProvider>) -> anyhow::Result<Services> {
    if settings.database.url.is_some() {
        tracing::warn!("database.url is set but postgres support is not compiled in");
    }
    Ok(memory_services(auth))
}

fn memory_services(auth: Arc<dyn AuthProvider>) -> Services {
    tracing::warn!("no database configured; data lives in memory and is lost on exit");
    Services::new(Arc::new(MemoryStore::new()), auth)
}

/// `RUST_LOG` overrides the configured filter.
fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    if log.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
