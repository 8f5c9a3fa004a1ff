use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidstream::config::Config;
use vidstream::database::{create_pool, run_migrations};
use vidstream::redis::RedisClient;
use vidstream::repositories::Repositories;
use vidstream::{AppState, create_app};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidstream=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection pool created");

    run_migrations(&db).await?;
    tracing::info!("Database migrations completed");

    let redis = Arc::new(RedisClient::new(&config.redis_url).await?);
    tracing::info!("Redis client created");

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(Repositories::postgres(db), redis, config);

    let app = create_app(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
