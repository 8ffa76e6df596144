mod analytics;
mod config;
mod error;
mod models;
mod query;
mod routes;
mod state;
mod store;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::routes::TokenKeys;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;
    init_tracing();

    let tokens = TokenKeys::new(&config.jwt_secret, config.token_ttl);
    let state = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_db_connections)
                .connect(url)
                .await?;
            sqlx::migrate!().run(&pool).await?;
            tracing::info!("connected to postgres, migrations applied");
            AppState::new(PgStore::new(pool), tokens)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, tasks are kept in memory");
            AppState::in_memory(tokens)
        }
    };

    if config.seed_demo_user && routes::ensure_demo_user(state.users.as_ref()).await? {
        tracing::info!("demo user created");
    }

    let app = routes::routes(state);
    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!(addr = %config.addr(), "server is chilling");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}
