use sqlx::postgres::PgPool;

use crate::controllers::identifier::IdentifierController;
use crate::controllers::kanban::KanbanController;
use crate::core::client::Client;
use crate::core::config::Args;
use crate::core::error::ConfigError;
use crate::utils::jwt::Jwt;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pub(crate) pool: PgPool,
    pub(crate) jwt: Jwt,
    pub(crate) oauth: Client,
    pub(crate) identifiers: IdentifierController,
    pub(crate) kanban: KanbanController,
}

impl AppState {
    pub(crate) fn new(pool: PgPool, config: &Args) -> Result<Self, ConfigError> {
        Ok(AppState {
            pool: pool.clone(),
            jwt: Jwt::new(&config.secret, config.token_ttl_seconds),
            oauth: Client::new(&config.user, config)?,
            identifiers: IdentifierController::new(pool.clone())?,
            kanban: KanbanController::new(pool),
        })
    }
}
