pub(crate) mod controllers;
pub(crate) mod core;
pub(crate) mod routes;
pub(crate) mod types;
pub(crate) mod utils;

use config::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::error::ConfigError as Error;
use crate::core::{config::Args, state::AppState};

pub async fn run() -> Result<(), Error> {
    let config = Config::builder()
        .add_source(config::Environment::with_prefix("KANBAN"))
        .build()
        .map_err(Error::Config)?;

    let config = config.try_deserialize::<Args>().map_err(Error::Config)?;

    let database_url = format!(
        "postgresql://{}:{}@{}:{}/{}",
        config.database_user,
        config.database_password,
        config.database_host,
        config.database_port,
        config.database_name
    );

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.log_level).unwrap_or_default())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .map_err(Error::Sql)?;

    let state = AppState::new(pool, &config)?;

    sqlx::migrate!()
        .run(&state.pool)
        .await
        .map_err(Error::DatabaseMigration)?;

    let app = routes::router::routes(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .map_err(Error::IO)?;

    tracing::debug!("listening on port {}", config.port);

    axum::serve(listener, app).await.map_err(Error::IO)?;

    Ok(())
}
