//! Repertoire engine API server.
//!
//! Serves the payroll, leave, identifier and permission engines over HTTP.
//!
//! ```bash
//! REPERTOIRE_PORT=8080 cargo run
//! ```

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repertoire_engine::api::{AppState, create_router};
use repertoire_engine::config::{ConfigLoader, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repertoire_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Repertoire engine v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let settings = Settings::from_env().context("reading settings")?;
    let config = ConfigLoader::load(&settings.config_dir).with_context(|| {
        format!("loading rules from {}", settings.config_dir.display())
    })?;
    tracing::info!(
        config_dir = %settings.config_dir.display(),
        financial_years = config.financial_years().len(),
        "Rules loaded"
    );

    let state = AppState::with_settings(config, &settings);
    let sweeper = state.clone();
    let sweep_every = settings.permission_cache_ttl.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sweeper.sweep_expired();
        }
    });

    let router = create_router(state);
    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;

    tracing::info!("Server listening on http://{}", address);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, exiting...");
        })
        .await?;

    Ok(())
}
