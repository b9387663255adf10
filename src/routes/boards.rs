use axum::Extension;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_macros::debug_handler;
use tracing::instrument;

use crate::controllers::kanban;
use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::Principal;
use crate::types::request::{MoveCard, NewBoard, NewCard, NewColumn, UpdateCard, UpdateTitle};
use crate::types::response::{BoardDetail, BoardSummary, CardInsert, ColumnCards};

async fn authorize_board(
    state: &AppState,
    principal: &Principal,
    board_id: i64,
) -> Result<(), Error> {
    if state
        .kanban
        .has_board_access(principal.identifier_id, board_id)
        .await?
    {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

#[instrument(skip(state, principal))]
pub(crate) async fn get_all(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<BoardSummary>>, Error> {
    let boards = state.kanban.get_boards(principal.identifier_id).await?;

    Ok(Json(boards))
}

#[debug_handler]
#[instrument(skip(state, principal, params))]
pub(crate) async fn post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(params): Json<NewBoard>,
) -> Result<(StatusCode, Json<i64>), Error> {
    let board_id = state
        .kanban
        .create_board(principal.identifier_id, &params.title)
        .await?;

    Ok((StatusCode::CREATED, Json(board_id)))
}

#[instrument(skip(state, principal))]
pub(crate) async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(board_id): Path<i64>,
) -> Result<Json<BoardDetail>, Error> {
    authorize_board(&state, &principal, board_id).await?;

    let board = state.kanban.get_board(board_id).await?;
    let cards = state.kanban.get_cards(board_id).await?;

    let columns = board
        .columns
        .iter()
        .map(|column| ColumnCards {
            column: column.clone(),
            cards: cards
                .iter()
                .filter(|card| &card.column == column)
                .cloned()
                .collect(),
        })
        .collect();

    Ok(Json(BoardDetail {
        id: board.id,
        title: board.title,
        columns,
    }))
}

#[instrument(skip(state, principal, params))]
pub(crate) async fn put_title(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(board_id): Path<i64>,
    Json(params): Json<UpdateTitle>,
) -> Result<impl IntoResponse, Error> {
    authorize_board(&state, &principal, board_id).await?;

    state.kanban.update_title(board_id, &params.title).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, principal))]
pub(crate) async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(board_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    authorize_board(&state, &principal, board_id).await?;

    state
        .kanban
        .delete_board(principal.identifier_id, board_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, principal))]
pub(crate) async fn get_columns(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(board_id): Path<i64>,
) -> Result<Json<Vec<String>>, Error> {
    authorize_board(&state, &principal, board_id).await?;

    let columns = state.kanban.get_columns(board_id).await?;

    Ok(Json(columns))
}

#[instrument(skip(state, principal, params))]
pub(crate) async fn post_column(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(board_id): Path<i64>,
    Json(params): Json<NewColumn>,
) -> Result<Json<Vec<String>>, Error> {
    authorize_board(&state, &principal, board_id).await?;

    let columns = state
        .kanban
        .add_column(board_id, &params.name, params.after.as_deref())
        .await?;

    Ok(Json(columns))
}

#[instrument(skip(state, principal))]
pub(crate) async fn delete_column(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((board_id, column)): Path<(i64, String)>,
) -> Result<Json<Vec<String>>, Error> {
    authorize_board(&state, &principal, board_id).await?;

    let columns = state.kanban.delete_column(board_id, &column).await?;

    Ok(Json(columns))
}

#[instrument(skip(state, principal, params))]
pub(crate) async fn post_card(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((board_id, column)): Path<(i64, String)>,
    Json(params): Json<NewCard>,
) -> Result<(StatusCode, Json<CardInsert>), Error> {
    authorize_board(&state, &principal, board_id).await?;

    let inserted = state
        .kanban
        .add_card(board_id, &params.title, &params.description, &column)
        .await?;

    Ok((StatusCode::CREATED, Json(inserted)))
}

#[instrument(skip(state, principal, params))]
pub(crate) async fn put_card(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((board_id, card_id)): Path<(i64, i32)>,
    Json(params): Json<UpdateCard>,
) -> Result<impl IntoResponse, Error> {
    authorize_board(&state, &principal, board_id).await?;

    state
        .kanban
        .update_card(board_id, card_id, &params.title, &params.description)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Moves a card to the adjacent column and returns the two affected columns.
#[instrument(skip(state, principal, params))]
pub(crate) async fn move_card(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((board_id, card_id)): Path<(i64, i32)>,
    Json(params): Json<MoveCard>,
) -> Result<Json<Vec<ColumnCards>>, Error> {
    authorize_board(&state, &principal, board_id).await?;

    let columns = state.kanban.get_columns(board_id).await?;
    let card = state.kanban.get_card(board_id, card_id).await?;

    let target = kanban::adjacent_column(&columns, &card.column, params.movement)?;

    state.kanban.move_card(board_id, card_id, &target).await?;

    let source_cards = state.kanban.get_cards_in_column(board_id, &card.column).await?;
    let target_cards = state.kanban.get_cards_in_column(board_id, &target).await?;

    Ok(Json(vec![
        ColumnCards {
            column: card.column,
            cards: source_cards,
        },
        ColumnCards {
            column: target,
            cards: target_cards,
        },
    ]))
}

#[instrument(skip(state, principal))]
pub(crate) async fn delete_card(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((board_id, card_id)): Path<(i64, i32)>,
) -> Result<impl IntoResponse, Error> {
    authorize_board(&state, &principal, board_id).await?;

    state.kanban.delete_card(board_id, card_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
