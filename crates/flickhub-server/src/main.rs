mod config;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use flickhub_api::AppStateInner;
use flickhub_api::middleware::SessionConfig;
use flickhub_db::Pool;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flickhub=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let pool = Pool::open(&config.db_path, config.db_readers)?;

    let session = SessionConfig {
        jwt_secret: config.jwt_secret.clone(),
        ttl: config.session_ttl()?,
        secure_cookie: config.cookie_secure,
    };
    let state = AppStateInner::new(pool, session);

    let app = flickhub_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("flickhub listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
