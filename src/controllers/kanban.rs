use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};
use tracing::instrument;

use crate::core::error::Error;
use crate::types::request::Movement;
use crate::types::response::{Board, BoardSummary, Card, CardInsert};

pub(crate) const DEFAULT_COLUMNS: [&str; 3] = ["To do", "In progress", "Done"];

#[derive(Clone, Debug)]
pub(crate) struct KanbanController {
    pool: PgPool,
}

impl KanbanController {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub(crate) async fn create_board(
        &self,
        identifier_id: i64,
        title: &str,
    ) -> Result<i64, Error> {
        validate_title(title)?;

        let columns: Vec<String> = DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect();

        let mut tx = self.pool.begin().await?;

        let board_id: i64 =
            sqlx::query("INSERT INTO kanban_boards (title, columns) VALUES ($1, $2) RETURNING id;")
                .bind(title)
                .bind(&columns)
                .map(|row: PgRow| row.get("id"))
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            "INSERT INTO kanban_ownership (identifier_id, board_ids)
            VALUES ($1, ARRAY[$2]::BIGINT[])
            ON CONFLICT (identifier_id)
            DO UPDATE SET board_ids = array_append(kanban_ownership.board_ids, $2);",
        )
        .bind(identifier_id)
        .bind(board_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(board_id)
    }

    #[instrument(skip(self))]
    pub(crate) async fn get_boards(&self, identifier_id: i64) -> Result<Vec<BoardSummary>, Error> {
        let boards = sqlx::query(
            "SELECT k.id, k.title
            FROM kanban_ownership o
            JOIN kanban_boards k ON k.id = ANY(o.board_ids)
            WHERE o.identifier_id = $1
            ORDER BY k.id;",
        )
        .bind(identifier_id)
        .map(map_board_summary)
        .fetch_all(&self.pool)
        .await?;

        Ok(boards)
    }

    #[instrument(skip(self))]
    pub(crate) async fn has_board_access(
        &self,
        identifier_id: i64,
        board_id: i64,
    ) -> Result<bool, Error> {
        let has_access = sqlx::query(
            "SELECT EXISTS(
                SELECT 1 FROM kanban_ownership
                WHERE identifier_id = $1 AND $2 = ANY(board_ids)
            ) AS has_access;",
        )
        .bind(identifier_id)
        .bind(board_id)
        .map(|row: PgRow| row.get("has_access"))
        .fetch_one(&self.pool)
        .await?;

        Ok(has_access)
    }

    #[instrument(skip(self))]
    pub(crate) async fn get_board(&self, board_id: i64) -> Result<Board, Error> {
        match sqlx::query(
            "SELECT id, title, columns, created_at, updated_at FROM kanban_boards WHERE id = $1;",
        )
        .bind(board_id)
        .map(map_board)
        .fetch_one(&self.pool)
        .await
        {
            Ok(board) => Ok(board),
            Err(sqlx::Error::RowNotFound) => Err(Error::BoardNotFound),
            Err(e) => Err(Error::Sql(e)),
        }
    }

    #[instrument(skip(self))]
    pub(crate) async fn update_title(&self, board_id: i64, title: &str) -> Result<(), Error> {
        validate_title(title)?;

        let result =
            sqlx::query("UPDATE kanban_boards SET title = $2, updated_at = now() WHERE id = $1;")
                .bind(board_id)
                .bind(title)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Error::BoardNotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) async fn delete_board(
        &self,
        identifier_id: i64,
        board_id: i64,
    ) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM kanban_boards WHERE id = $1;")
            .bind(board_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::BoardNotFound);
        }

        sqlx::query(
            "UPDATE kanban_ownership SET board_ids = array_remove(board_ids, $2)
            WHERE identifier_id = $1;",
        )
        .bind(identifier_id)
        .bind(board_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) async fn get_columns(&self, board_id: i64) -> Result<Vec<String>, Error> {
        match sqlx::query("SELECT columns FROM kanban_boards WHERE id = $1;")
            .bind(board_id)
            .map(|row: PgRow| row.get("columns"))
            .fetch_one(&self.pool)
            .await
        {
            Ok(columns) => Ok(columns),
            Err(sqlx::Error::RowNotFound) => Err(Error::BoardNotFound),
            Err(e) => Err(Error::Sql(e)),
        }
    }

    #[instrument(skip(self))]
    pub(crate) async fn add_column(
        &self,
        board_id: i64,
        name: &str,
        after: Option<&str>,
    ) -> Result<Vec<String>, Error> {
        let columns = self.get_columns(board_id).await?;
        let columns = insert_column_after(&columns, name, after)?;

        self.update_columns(board_id, &columns).await?;

        Ok(columns)
    }

    #[instrument(skip(self))]
    pub(crate) async fn update_columns(
        &self,
        board_id: i64,
        columns: &[String],
    ) -> Result<(), Error> {
        let result =
            sqlx::query("UPDATE kanban_boards SET columns = $2, updated_at = now() WHERE id = $1;")
                .bind(board_id)
                .bind(columns)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Error::BoardNotFound);
        }

        Ok(())
    }

    /// Removes a column and the cards in it.
    #[instrument(skip(self))]
    pub(crate) async fn delete_column(
        &self,
        board_id: i64,
        column: &str,
    ) -> Result<Vec<String>, Error> {
        let columns = self.get_columns(board_id).await?;

        if !columns.iter().any(|c| c == column) {
            return Err(Error::InvalidColumn);
        }

        let columns: Vec<String> = columns.into_iter().filter(|c| c != column).collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE kanban_boards SET columns = $2, updated_at = now() WHERE id = $1;")
            .bind(board_id)
            .bind(&columns)
            .execute(&mut *tx)
            .await?;

        sqlx::query(r#"DELETE FROM kanban_cards WHERE board_id = $1 AND "column" = $2;"#)
            .bind(board_id)
            .bind(column)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(columns)
    }

    #[instrument(skip(self))]
    pub(crate) async fn get_cards(&self, board_id: i64) -> Result<Vec<Card>, Error> {
        let cards = sqlx::query(
            r#"SELECT id, index, title, description, "column"
            FROM kanban_cards
            WHERE board_id = $1
            ORDER BY index;"#,
        )
        .bind(board_id)
        .map(map_card)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    #[instrument(skip(self))]
    pub(crate) async fn get_cards_in_column(
        &self,
        board_id: i64,
        column: &str,
    ) -> Result<Vec<Card>, Error> {
        let cards = sqlx::query(
            r#"SELECT id, index, title, description, "column"
            FROM kanban_cards
            WHERE board_id = $1 AND "column" = $2
            ORDER BY index;"#,
        )
        .bind(board_id)
        .bind(column)
        .map(map_card)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    #[instrument(skip(self))]
    pub(crate) async fn get_card(&self, board_id: i64, card_id: i32) -> Result<Card, Error> {
        match sqlx::query(
            r#"SELECT id, index, title, description, "column"
            FROM kanban_cards
            WHERE board_id = $1 AND id = $2;"#,
        )
        .bind(board_id)
        .bind(card_id)
        .map(map_card)
        .fetch_one(&self.pool)
        .await
        {
            Ok(card) => Ok(card),
            Err(sqlx::Error::RowNotFound) => Err(Error::CardNotFound),
            Err(e) => Err(Error::Sql(e)),
        }
    }

    /// Card ids are per board, indexes per column; both are allocated by the
    /// insert statement itself.
    #[instrument(skip(self))]
    pub(crate) async fn add_card(
        &self,
        board_id: i64,
        title: &str,
        description: &str,
        column: &str,
    ) -> Result<CardInsert, Error> {
        validate_title(title)?;
        validate_description(description)?;

        let columns = self.get_columns(board_id).await?;

        if !columns.iter().any(|c| c == column) {
            return Err(Error::InvalidColumn);
        }

        let inserted = sqlx::query(
            r#"INSERT INTO kanban_cards (board_id, id, title, description, index, "column")
            VALUES (
                $1,
                (SELECT coalesce(max(id), 0) + 1 FROM kanban_cards WHERE board_id = $1),
                $2,
                $3,
                (SELECT coalesce(max(index), 0) + 1 FROM kanban_cards
                    WHERE board_id = $1 AND "column" = $4),
                $4)
            RETURNING id, index;"#,
        )
        .bind(board_id)
        .bind(title)
        .bind(description)
        .bind(column)
        .map(|row: PgRow| CardInsert {
            id: row.get("id"),
            index: row.get("index"),
        })
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    #[instrument(skip(self))]
    pub(crate) async fn update_card(
        &self,
        board_id: i64,
        card_id: i32,
        title: &str,
        description: &str,
    ) -> Result<(), Error> {
        validate_title(title)?;
        validate_description(description)?;

        let result = sqlx::query(
            "UPDATE kanban_cards SET title = $3, description = $4, updated_at = now()
            WHERE board_id = $1 AND id = $2;",
        )
        .bind(board_id)
        .bind(card_id)
        .bind(title)
        .bind(description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::CardNotFound);
        }

        Ok(())
    }

    /// Appends the card to the target column.
    #[instrument(skip(self))]
    pub(crate) async fn move_card(
        &self,
        board_id: i64,
        card_id: i32,
        column: &str,
    ) -> Result<(), Error> {
        let result = sqlx::query(
            r#"UPDATE kanban_cards
            SET "column" = $3,
                index = (SELECT coalesce(max(index), 0) + 1 FROM kanban_cards
                    WHERE board_id = $1 AND "column" = $3),
                updated_at = now()
            WHERE board_id = $1 AND id = $2;"#,
        )
        .bind(board_id)
        .bind(card_id)
        .bind(column)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::CardNotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) async fn delete_card(&self, board_id: i64, card_id: i32) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM kanban_cards WHERE board_id = $1 AND id = $2;")
            .bind(board_id)
            .bind(card_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::CardNotFound);
        }

        Ok(())
    }
}

pub(crate) fn validate_title(title: &str) -> Result<(), Error> {
    if title.trim().is_empty() || title.len() > 128 {
        return Err(Error::InvalidTitle);
    }

    Ok(())
}

pub(crate) fn validate_description(description: &str) -> Result<(), Error> {
    if description.trim().is_empty() || description.len() > 1024 {
        return Err(Error::InvalidDescription);
    }

    Ok(())
}

pub(crate) fn insert_column_after(
    columns: &[String],
    name: &str,
    after: Option<&str>,
) -> Result<Vec<String>, Error> {
    if name.trim().is_empty() || name.len() > 64 {
        return Err(Error::InvalidColumn);
    }

    if columns.iter().any(|c| c == name) {
        return Err(Error::DuplicateColumn);
    }

    let mut updated = Vec::with_capacity(columns.len() + 1);

    match after {
        None => {
            updated.push(name.to_string());
            updated.extend(columns.iter().cloned());
        }
        Some(after) => {
            if !columns.iter().any(|c| c == after) {
                return Err(Error::InvalidColumn);
            }

            for column in columns {
                updated.push(column.clone());

                if column == after {
                    updated.push(name.to_string());
                }
            }
        }
    }

    Ok(updated)
}

/// Resolves the column next to `current` in the given direction; moving past
/// either edge of the board is an error.
pub(crate) fn adjacent_column(
    columns: &[String],
    current: &str,
    movement: Movement,
) -> Result<String, Error> {
    let position = columns
        .iter()
        .position(|c| c == current)
        .ok_or(Error::InvalidColumn)?;

    let target = match movement {
        Movement::Next => position + 1,
        Movement::Prev => position.checked_sub(1).ok_or(Error::InvalidMove)?,
    };

    match columns.get(target) {
        Some(column) => Ok(column.clone()),
        None => Err(Error::InvalidMove),
    }
}

fn map_board_summary(row: PgRow) -> BoardSummary {
    BoardSummary {
        id: row.get("id"),
        title: row.get("title"),
    }
}

fn map_board(row: PgRow) -> Board {
    Board {
        id: row.get("id"),
        title: row.get("title"),
        columns: row.get("columns"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_card(row: PgRow) -> Card {
    Card {
        id: row.get("id"),
        index: row.get("index"),
        title: row.get("title"),
        description: row.get("description"),
        column: row.get("column"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn inserts_column_after_reference() {
        let updated = insert_column_after(&columns(), "Review", Some("In progress")).unwrap();

        assert_eq!(updated, vec!["To do", "In progress", "Review", "Done"]);
    }

    #[test]
    fn inserts_column_at_front_without_reference() {
        let updated = insert_column_after(&columns(), "Backlog", None).unwrap();

        assert_eq!(updated, vec!["Backlog", "To do", "In progress", "Done"]);
    }

    #[test]
    fn rejects_duplicate_column() {
        assert!(matches!(
            insert_column_after(&columns(), "Done", Some("To do")),
            Err(Error::DuplicateColumn)
        ));
    }

    #[test]
    fn rejects_unknown_reference_column() {
        assert!(matches!(
            insert_column_after(&columns(), "Review", Some("Missing")),
            Err(Error::InvalidColumn)
        ));
    }

    #[test]
    fn rejects_blank_or_oversized_column_names() {
        assert!(insert_column_after(&columns(), "  ", None).is_err());
        assert!(insert_column_after(&columns(), &"x".repeat(65), None).is_err());
    }

    #[test]
    fn moves_to_the_neighbouring_column() {
        let columns = columns();

        assert_eq!(
            adjacent_column(&columns, "To do", Movement::Next).unwrap(),
            "In progress"
        );
        assert_eq!(
            adjacent_column(&columns, "Done", Movement::Prev).unwrap(),
            "In progress"
        );
    }

    #[test]
    fn rejects_moves_past_the_board_edge() {
        let columns = columns();

        assert!(matches!(
            adjacent_column(&columns, "To do", Movement::Prev),
            Err(Error::InvalidMove)
        ));
        assert!(matches!(
            adjacent_column(&columns, "Done", Movement::Next),
            Err(Error::InvalidMove)
        ));
    }

    #[test]
    fn rejects_moves_from_an_unknown_column() {
        assert!(matches!(
            adjacent_column(&columns(), "Missing", Movement::Next),
            Err(Error::InvalidColumn)
        ));
    }

    #[test]
    fn validates_title_and_description_bounds() {
        assert!(validate_title("Board").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(129)).is_err());

        assert!(validate_description("Something to do").is_ok());
        assert!(validate_description("").is_err());
        assert!(validate_description(&"x".repeat(1025)).is_err());
    }
}
