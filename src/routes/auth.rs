use axum::Extension;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{AppendHeaders, IntoResponse, Json, Redirect};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::session::{SESSION_COOKIE, SessionId};
use crate::core::state::AppState;
use crate::types::request::CallbackParams;
use crate::types::{IdentifierType, Principal};
use crate::utils::auth::AUTH_COOKIE;
use crate::utils::cookies;
use crate::utils::jwt::Claims;

pub(crate) const OAUTH_STATE_COOKIE: &str = "OAUTH_STATE";

#[instrument(skip_all)]
pub(crate) async fn root(Extension(principal): Extension<Option<Principal>>) -> Redirect {
    match principal {
        Some(_) => Redirect::to("/boards"),
        None => Redirect::to("/login"),
    }
}

/// Sends the client to the identity provider, with a state nonce pinned in a
/// short-lived cookie for the callback to check.
#[instrument(skip_all)]
pub(crate) async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Error> {
    let nonce = new_state_nonce();
    let authorize_url = state.oauth.authorize_url(&nonce)?;

    let cookie = cookies::build(
        OAUTH_STATE_COOKIE,
        &nonce,
        Some(600),
        cookies::is_secure(&headers),
    )?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to(&authorize_url),
    ))
}

/// Completes the login: exchanges the authorization code, projects the
/// provider identity onto an identifier row, and mints the session-bound
/// token into the `AUTH_TOKEN` cookie.
#[instrument(skip_all)]
pub(crate) async fn callback(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, Error> {
    let expected = cookies::get(&headers, OAUTH_STATE_COOKIE).ok_or(Error::Unauthorized)?;

    if params.state != expected {
        tracing::debug!("oauth state mismatch");
        return Err(Error::Unauthorized);
    }

    let access_token = state.oauth.exchange_code(&params.code).await?;
    let profile = state.oauth.userinfo(&access_token).await?;

    let email = profile.email.ok_or(Error::NoEmail)?;

    let identifier_id = state
        .identifiers
        .resolve(IdentifierType::Email, &email)
        .await?;

    let now = Utc::now().timestamp();

    let claims = Claims {
        sub: profile.sub,
        name: profile.name,
        email: Some(email),
        authorities: vec!["ROLE_USER".to_string()],
        session_id: Some(session.0.clone()),
        auth_source: Some("oauth2".to_string()),
        identifier_id: Some(identifier_id),
        iat: now,
        exp: now + state.jwt.ttl_seconds(),
    };

    let token = state.jwt.encode(&claims)?;

    let secure = cookies::is_secure(&headers);
    let auth_cookie = cookies::build(AUTH_COOKIE, &token, Some(state.jwt.ttl_seconds()), secure)?;
    let clear_state = cookies::expire(OAUTH_STATE_COOKIE, secure)?;

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, auth_cookie),
            (header::SET_COOKIE, clear_state),
        ]),
        Redirect::to("/boards"),
    ))
}

#[instrument(skip_all)]
pub(crate) async fn me(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

#[instrument(skip_all)]
pub(crate) async fn logout(headers: HeaderMap) -> Result<impl IntoResponse, Error> {
    let secure = cookies::is_secure(&headers);

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, cookies::expire(AUTH_COOKIE, secure)?),
            (header::SET_COOKIE, cookies::expire(SESSION_COOKIE, secure)?),
        ]),
        Redirect::to("/"),
    ))
}

fn new_state_nonce() -> String {
    let mut buf = [0u8; 16];
    getrandom::getrandom(&mut buf).expect("system entropy source");

    URL_SAFE_NO_PAD.encode(buf)
}
