use regex::Regex;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};
use tracing::instrument;

use crate::core::error::{self, Error};
use crate::types::IdentifierType;

/// Projects an external identity value onto the durable numeric identifier
/// row for it, creating the row on first sight.
#[derive(Clone)]
pub(crate) struct IdentifierController {
    pool: PgPool,
    email_pattern: Regex,
}

impl std::fmt::Debug for IdentifierController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierController")
            .field("email_pattern", &self.email_pattern.as_str())
            .finish()
    }
}

impl IdentifierController {
    pub(crate) fn new(pool: PgPool) -> Result<Self, error::ConfigError> {
        Ok(Self {
            pool,
            email_pattern: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?,
        })
    }

    /// Idempotent lookup-or-create on `(type, value)`. The upsert is a single
    /// statement, so concurrent first-time logins for the same identity all
    /// resolve to the same id without surfacing a conflict.
    #[instrument(skip(self))]
    pub(crate) async fn resolve(
        &self,
        kind: IdentifierType,
        value: &str,
    ) -> Result<i64, Error> {
        if kind == IdentifierType::Email && !self.email_pattern.is_match(value) {
            return Err(Error::InvalidIdentifier);
        }

        let id = sqlx::query(
            "INSERT INTO identifiers (type, value)
            VALUES ($1, $2)
            ON CONFLICT (type, value) DO UPDATE SET value = EXCLUDED.value
            RETURNING id;",
        )
        .bind(kind.as_str())
        .bind(value)
        .map(|row: PgRow| row.get("id"))
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
