//! # Bookery API Server
//!
//! REST API for the Bookery storefront and admin dashboard: user
//! registration and login, and book CRUD with cover/content uploads relayed
//! to a remote media host.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p bookery-api
//! ```

use bookery_api::{
    app::{build_router, AppState},
    config::Config,
    media::Cloudinary,
    sweep::{Sweeper, SweeperConfig},
    upload,
};
use bookery_shared::db::{
    migrations::{ensure_database_exists, run_migrations},
    pool::{create_pool, DatabaseConfig},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookery_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Bookery API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    // Database: create if missing, pool up, migrate
    ensure_database_exists(&config.database.url).await?;
    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    // Scratch directory for staged uploads
    upload::ensure_upload_dir(&config.api.upload_dir).await?;

    let media = Arc::new(Cloudinary::new(&config.media));

    // Background reconciliation of orphaned remote assets
    let sweeper = Sweeper::new(
        pool.clone(),
        media.clone(),
        config.api.upload_dir.clone(),
        SweeperConfig::default(),
    );
    let sweep_shutdown = sweeper.shutdown_token();
    let sweep_handle = tokio::spawn(async move { sweeper.run().await });

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config, media);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    sweep_shutdown.cancel();
    let _ = sweep_handle.await;

    tracing::info!("Server stopped");
    Ok(())
}
