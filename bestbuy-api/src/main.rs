use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use bestbuy_api::{app, AppState};
use bestbuy_catalog::PriceResolver;
use bestbuy_core::{BestBuyService, CatalogRepository};
use bestbuy_store::app_config::{Config, StorageBackend};
use bestbuy_store::{DbClient, InMemoryCatalogRepository, PgCatalogRepository, SeedData};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bestbuy_api=debug,bestbuy_core=debug,bestbuy_store=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        "Starting Best Buy Scanner on port {} ({:?} storage)",
        config.server.port,
        config.storage.backend
    );

    let seed = match &config.storage.seed_path {
        Some(path) => Some(SeedData::from_path(path).context("Failed to load seed data")?),
        None => None,
    };

    let mut db: Option<DbClient> = None;
    let repo: Arc<dyn CatalogRepository> = match config.storage.backend {
        StorageBackend::Memory => match seed {
            Some(seed) => Arc::new(InMemoryCatalogRepository::from_seed(seed)),
            None => {
                tracing::warn!("No seed_path configured; starting with an empty catalog");
                Arc::new(InMemoryCatalogRepository::new())
            }
        },
        StorageBackend::Postgres => {
            let db_config = config
                .database
                .as_ref()
                .context("storage.backend = postgres requires a [database] section")?;
            let client = DbClient::new(db_config)
                .await
                .context("Failed to connect to Postgres")?;
            client.migrate().await.context("Failed to run migrations")?;

            let pg_repo = PgCatalogRepository::new(client.pool.clone());
            if let Some(seed) = &seed {
                pg_repo
                    .seed_if_empty(seed)
                    .await
                    .context("Failed to seed database")?;
            }
            db = Some(client);
            Arc::new(pg_repo)
        }
    };

    let service = BestBuyService::new(repo, PriceResolver::new(config.pricing.resolver_config()));
    let app = app(AppState::new(service, config.pricing.scan_options()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(db) = db {
        db.pool.close().await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
