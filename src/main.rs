use std::sync::Arc;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use consent_core::{AppConfig, ConsentService, DomainCache, PolicyDirectoryClient};
use registry_client::GicsClient;

/// Main entry point for the consent status service
///
/// Loads configuration, fills the domain directory from the registry, keeps it refreshed in the
/// background and serves the REST API until Ctrl-C. On shutdown the HTTP server drains first,
/// then the refresh task is stopped.
///
/// # Environment Variables
/// - `CONSENTED_CONFIG`: configuration file (default: `app.yml`)
/// - `RUST_LOG`: log filter, overriding `app.log-level`
/// - any configuration key, e.g. `GICS_FHIR_BASE` for `gics.fhir.base`
///
/// # Errors
/// Returns an error if:
/// - the configuration is invalid,
/// - the registry client cannot be built,
/// - the HTTP port cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.app.log_level))?,
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        registry = %config.gics.fhir.base,
        update_interval = %humantime::format_duration(config.gics.update_interval),
        "++ Starting consented"
    );

    let client: Arc<dyn PolicyDirectoryClient> =
        Arc::new(GicsClient::from_config(&config.gics.fhir)?);
    let cache = Arc::new(DomainCache::new(client.clone()));
    let refresh = cache.start(config.gics.update_interval).await;

    let state = AppState::new(
        ConsentService::new(cache, client),
        config.app.http.auth.clone(),
    );

    let addr = format!("0.0.0.0:{}", config.app.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("++ Serving REST API on {}", addr);

    let served = api_rest::serve(listener, state, shutdown_signal()).await;

    refresh.stop().await;
    tracing::info!("-- Stopped consented");

    served.map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
