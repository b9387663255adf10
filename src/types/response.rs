use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct BoardSummary {
    pub(crate) id: i64,
    pub(crate) title: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Board {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) columns: Vec<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BoardDetail {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) columns: Vec<ColumnCards>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ColumnCards {
    pub(crate) column: String,
    pub(crate) cards: Vec<Card>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct Card {
    pub(crate) id: i32,
    pub(crate) index: i32,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) column: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CardInsert {
    pub(crate) id: i32,
    pub(crate) index: i32,
}
