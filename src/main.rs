use dotenvy::dotenv;
use std::sync::Arc;
use storefront_admin::{
    api::{self, AppState},
    config::{
        app::load_default_config,
        database::{create_connection, create_tables},
        payment::load_payment_credentials,
    },
    core::slug::backfill_slugs,
    errors::Result,
    payment::LocalGateway,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Application configuration
    let app_config = load_default_config()?;
    info!("Successfully processed application configuration.");

    // 4. Database
    let db = create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // Maintenance mode: fill in missing slugs and exit
    if std::env::args().nth(1).as_deref() == Some("backfill-slugs") {
        let report = backfill_slugs(&db, app_config.catalog.slug_max_attempts)
            .await
            .inspect_err(|e| error!("Slug backfill failed: {}", e))?;
        info!("Slug backfill finished: {:?}", report);
        return Ok(());
    }

    // 5. Payment gateway; secrets are read here, directly before use
    let credentials = load_payment_credentials()
        .inspect_err(|e| error!("Payment credentials not configured: {}", e))?;

    let bind_address = app_config.server.bind_address.clone();
    let state = AppState {
        db,
        config: Arc::new(app_config),
        gateway: Arc::new(LocalGateway::new(credentials.key_id.clone())),
        webhook_secret: Arc::from(credentials.webhook_secret.as_str()),
    };

    // 6. Serve until Ctrl-C
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", bind_address, e))?;
    info!("Storefront API listening on {}", bind_address);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}
