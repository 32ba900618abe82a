//! # TaskCamp API Server
//!
//! Project-management REST API: user authentication (registration, email
//! verification, login/logout, password reset, token refresh) and
//! project/task/membership CRUD with per-project role authorization.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskcamp-api
//! ```

use taskcamp_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskcamp_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskcamp_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskCamp API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Misconfiguration (missing DATABASE_URL, short JWT_SECRET) is fatal
    // here, before the listener opens.
    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(db, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
