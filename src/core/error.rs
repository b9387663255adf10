use axum::http::StatusCode;
use axum::http::header::InvalidHeaderValue;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database migration error: {0}")]
    DatabaseMigration(#[from] sqlx::migrate::MigrateError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("URL encoding error: {0}")]
    URLEncode(#[from] serde_urlencoded::ser::Error),
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Board not found")]
    BoardNotFound,
    #[error("Card not found")]
    CardNotFound,
    #[error("No email from identity provider")]
    NoEmail,
    #[error("Invalid identifier value")]
    InvalidIdentifier,
    #[error("Invalid title")]
    InvalidTitle,
    #[error("Invalid description")]
    InvalidDescription,
    #[error("Invalid column")]
    InvalidColumn,
    #[error("Column already exists")]
    DuplicateColumn,
    #[error("Card cannot move past the board edge")]
    InvalidMove,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("{:?}", self);

        let (status, message) = match self {
            Error::HTTPClient(_) => (StatusCode::BAD_GATEWAY, "Identity provider error"),
            Error::URLEncode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "URL encoding error"),
            Error::Sql(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SQL error"),
            Error::Serialize(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error"),
            Error::Header(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid header value"),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Error::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            Error::BoardNotFound => (StatusCode::NOT_FOUND, "Board not found"),
            Error::CardNotFound => (StatusCode::NOT_FOUND, "Card not found"),
            Error::NoEmail => (StatusCode::BAD_GATEWAY, "No email from identity provider"),
            Error::InvalidIdentifier => (StatusCode::BAD_REQUEST, "Invalid identifier value"),
            Error::InvalidTitle => (StatusCode::BAD_REQUEST, "Invalid title"),
            Error::InvalidDescription => (StatusCode::BAD_REQUEST, "Invalid description"),
            Error::InvalidColumn => (StatusCode::BAD_REQUEST, "Invalid column"),
            Error::DuplicateColumn => (StatusCode::BAD_REQUEST, "Column already exists"),
            Error::InvalidMove => (StatusCode::BAD_REQUEST, "Card cannot move past the board edge"),
        };

        (status, message).into_response()
    }
}
