use std::net::SocketAddr;
use std::sync::Arc;
use token_issuer::config::Config;
use token_issuer::handlers::auth_handler::AppState;
use token_issuer::repositories::users::PgCredentialStore;
use token_issuer::routes;
use token_issuer::services::auth_service::AuthService;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_issuer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Token Issuer");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let issuer_config = config.issuer_config().map_err(|e| {
        error!("Invalid issuer configuration: {}", e);
        e
    })?;

    info!(
        algorithm = %config.signing_algorithm,
        key_id = %config.signing_key_id,
        valid_for_seconds = config.valid_for_seconds,
        "Configuration loaded successfully"
    );

    // Initialize database connection pool
    info!("Connecting to database...");
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    info!("Database connection established");

    // Signs and reads back a probe token before accepting traffic
    let auth_service =
        AuthService::new(issuer_config, Arc::new(PgCredentialStore::new(db_pool))).map_err(
            |e| {
                error!("Signing key self-check failed: {}", e);
                e
            },
        )?;

    let metrics_handle = routes::init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    let state = Arc::new(AppState { auth_service });
    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Token Issuer listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
