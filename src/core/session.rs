use axum::body::Body;
use axum::extract::Request;
use axum::http::{Response, header};
use axum::middleware::Next;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::utils::cookies;

pub(crate) const SESSION_COOKIE: &str = "SESSION";

/// Identifier of the live web session, installed as a request extension by
/// the session middleware. Signed tokens carry a copy of this id; the
/// verifier rejects a token presented under any other session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SessionId(pub(crate) String);

pub(crate) fn new_session_id() -> String {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).expect("system entropy source");

    URL_SAFE_NO_PAD.encode(buf)
}

/// Ensures every request carries a session id, creating one and setting the
/// cookie on the way out when the client did not present one.
pub(crate) async fn session(mut request: Request, next: Next) -> Response<Body> {
    let existing = cookies::get(request.headers(), SESSION_COOKIE)
        .filter(|session_id| !session_id.is_empty());

    let (session_id, fresh) = match existing {
        Some(session_id) => (session_id, false),
        None => (new_session_id(), true),
    };

    let secure = cookies::is_secure(request.headers());

    request
        .extensions_mut()
        .insert(SessionId(session_id.clone()));

    let mut response = next.run(request).await;

    if fresh {
        match cookies::build(SESSION_COOKIE, &session_id, None, secure) {
            Ok(cookie) => {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Err(e) => tracing::error!("failed to set session cookie: {:?}", e),
        }
    }

    response
}
