use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod database;
mod error;
mod gate;
mod identity;
mod models;
mod repositories;
mod routes;
mod session;
mod validation;
mod wheel;

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    identity::{HttpIdentityProvider, IdentityConfig},
    repositories::{PrizeRepository, UserRepository, WinRepository},
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub sessions: SessionManager,
    pub prizes: PrizeRepository,
    pub wins: WinRepository,
    /// Secure flag for the session cookie, on in production
    pub secure_cookies: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting game service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    // Identity provider client
    let identity_config = IdentityConfig::from_env()?;
    let identity = Arc::new(HttpIdentityProvider::new(identity_config));

    let sessions = SessionManager::new(identity, UserRepository::new(pool.clone()));
    let prizes = PrizeRepository::new(pool.clone());
    let wins = WinRepository::new(pool.clone());

    let secure_cookies = std::env::var("APP_ENV")
        .map(|env| env == "production")
        .unwrap_or(false);

    let app_state = AppState {
        db_pool: pool,
        sessions,
        prizes,
        wins,
        secure_cookies,
    };

    info!("Game service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Game service listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
