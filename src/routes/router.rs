use axum::http::Request;
use axum::{
    Router,
    extract::MatchedPath,
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::core::session;
use crate::core::state::AppState;
use crate::routes::{auth, boards};
use crate::utils;

pub(crate) fn routes(state: AppState) -> Router {
    let board_routes = Router::new()
        .route("/", get(boards::get_all).post(boards::post))
        .route("/{id}", get(boards::get).delete(boards::delete))
        .route("/{id}/title", put(boards::put_title))
        .route(
            "/{id}/columns",
            get(boards::get_columns).post(boards::post_column),
        )
        .route("/{id}/columns/{column}", delete(boards::delete_column))
        .route("/{id}/columns/{column}/cards", post(boards::post_card))
        .route(
            "/{id}/cards/{card_id}",
            put(boards::put_card).delete(boards::delete_card),
        )
        .route("/{id}/cards/{card_id}/move", put(boards::move_card))
        .route_layer(middleware::from_fn(utils::auth::require_auth));

    Router::new()
        .route("/", get(auth::root))
        .route("/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
        .route(
            "/me",
            get(auth::me).layer(middleware::from_fn(utils::auth::require_auth)),
        )
        .nest("/boards", board_routes)
        .with_state(state.clone())
        .layer(
            // The session layer runs before the verifier so that the token's
            // session binding has a live session id to compare against.
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        let matched_path = request
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str);

                        info_span!(
                            "request",
                            method = ?request.method(),
                            matched_path,
                        )
                    }),
                )
                .layer(middleware::from_fn(session::session))
                .layer(middleware::from_fn_with_state(
                    state,
                    utils::auth::authenticate,
                )),
        )
}
