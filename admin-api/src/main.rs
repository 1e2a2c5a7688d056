use supabase_client::SupabaseClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use property_admin_api::config::Config;
use property_admin_api::{build_router, start_background_tasks, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "property_admin_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Configuration loaded successfully");

    // Backend client
    let (auth, tables) = SupabaseClient::new(config.supabase())?.into_apis();
    tracing::info!(url = %config.backend.url, "Backend client ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, auth, tables);
    let _tasks = start_background_tasks(&state);

    let app = build_router(state);

    // Start server
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
