use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Response};
use axum::middleware::Next;
use chrono::Utc;

use crate::core::error::Error;
use crate::core::session::SessionId;
use crate::core::state::AppState;
use crate::types::Principal;
use crate::utils::cookies;
use crate::utils::jwt::Jwt;

pub(crate) const AUTH_COOKIE: &str = "AUTH_TOKEN";

/// Verifies the `AUTH_TOKEN` cookie and installs `Option<Principal>` into the
/// request extensions. Never blocks the request: a missing or rejected token
/// leaves the principal absent, and `require_auth` decides downstream.
pub(crate) async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response<Body> {
    if request.extensions().get::<Option<Principal>>().is_none() {
        let session = request.extensions().get::<SessionId>().cloned();

        let principal = verify_request(
            request.headers(),
            session.as_ref(),
            &state.jwt,
            Utc::now().timestamp(),
        );

        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}

pub(crate) fn verify_request(
    headers: &HeaderMap,
    session: Option<&SessionId>,
    jwt: &Jwt,
    now: i64,
) -> Option<Principal> {
    let token = cookies::get(headers, AUTH_COOKIE).filter(|token| !token.is_empty())?;

    let claims = match jwt.decode(&token, now) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("rejected auth token: {}", e);
            return None;
        }
    };

    // Anti-replay binding: a token minted for one session must not
    // authenticate under another.
    if let Some(bound_session) = claims.session_id.as_deref() {
        match session {
            Some(live) if live.0 == bound_session => {}
            _ => {
                tracing::debug!("auth token bound to another session");
                return None;
            }
        }
    }

    let identifier_id = match claims.identifier_id {
        Some(identifier_id) => identifier_id,
        None => {
            tracing::debug!("auth token carries no identifier id");
            return None;
        }
    };

    Some(Principal {
        subject: claims.sub,
        identifier_id,
        email: claims.email,
        name: claims.name,
        authorities: claims.authorities,
        authenticated: true,
    })
}

/// Authorization gate for protected routes: turns an absent principal into a
/// 401 and re-installs the unwrapped `Principal` for handlers.
pub(crate) async fn require_auth(
    mut request: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let principal = request
        .extensions()
        .get::<Option<Principal>>()
        .cloned()
        .flatten();

    match principal {
        Some(principal) => {
            request.extensions_mut().insert(principal);

            Ok(next.run(request).await)
        }
        None => Err(Error::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    use crate::utils::jwt::Claims;

    const NOW: i64 = 1_700_000_000;

    fn codec() -> Jwt {
        Jwt::new("test-secret-test-secret-test-secret", 3600)
    }

    fn claims(session_id: Option<&str>) -> Claims {
        Claims {
            sub: "u1".to_string(),
            name: None,
            email: Some("u1@example.com".to_string()),
            authorities: vec!["ROLE_USER".to_string()],
            session_id: session_id.map(str::to_string),
            auth_source: Some("oauth2".to_string()),
            identifier_id: Some(7),
            iat: NOW,
            exp: NOW + 3600,
        }
    }

    fn headers_with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("AUTH_TOKEN={}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn valid_token_with_matching_session_authenticates() {
        let jwt = codec();
        let token = jwt.encode(&claims(Some("session-a"))).unwrap();
        let session = SessionId("session-a".to_string());

        let principal =
            verify_request(&headers_with_token(&token), Some(&session), &jwt, NOW).unwrap();

        assert_eq!(principal.subject, "u1");
        assert_eq!(principal.identifier_id, 7);
        assert_eq!(principal.authorities, vec!["ROLE_USER".to_string()]);
        assert!(principal.authenticated);
    }

    #[test]
    fn token_replayed_under_another_session_is_rejected() {
        let jwt = codec();
        let token = jwt.encode(&claims(Some("session-a"))).unwrap();
        let other = SessionId("session-b".to_string());

        assert!(verify_request(&headers_with_token(&token), Some(&other), &jwt, NOW).is_none());
    }

    #[test]
    fn session_bound_token_without_live_session_is_rejected() {
        let jwt = codec();
        let token = jwt.encode(&claims(Some("session-a"))).unwrap();

        assert!(verify_request(&headers_with_token(&token), None, &jwt, NOW).is_none());
    }

    #[test]
    fn unbound_token_skips_the_session_check() {
        let jwt = codec();
        let token = jwt.encode(&claims(None)).unwrap();
        let session = SessionId("session-b".to_string());

        assert!(verify_request(&headers_with_token(&token), Some(&session), &jwt, NOW).is_some());
    }

    #[test]
    fn missing_cookie_leaves_request_unauthenticated() {
        assert!(verify_request(&HeaderMap::new(), None, &codec(), NOW).is_none());
    }

    #[test]
    fn blank_cookie_leaves_request_unauthenticated() {
        assert!(verify_request(&headers_with_token(""), None, &codec(), NOW).is_none());
    }

    #[test]
    fn garbage_cookie_leaves_request_unauthenticated() {
        let headers = headers_with_token("not.a.valid.token");

        assert!(verify_request(&headers, None, &codec(), NOW).is_none());
    }

    #[test]
    fn expired_token_leaves_request_unauthenticated() {
        let jwt = codec();
        let mut expired = claims(Some("session-a"));
        expired.exp = NOW - 1;

        let token = jwt.encode(&expired).unwrap();
        let session = SessionId("session-a".to_string());

        assert!(verify_request(&headers_with_token(&token), Some(&session), &jwt, NOW).is_none());
    }

    #[test]
    fn token_without_identifier_id_is_rejected() {
        let jwt = codec();
        let mut anonymous = claims(Some("session-a"));
        anonymous.identifier_id = None;

        let token = jwt.encode(&anonymous).unwrap();
        let session = SessionId("session-a".to_string());

        assert!(verify_request(&headers_with_token(&token), Some(&session), &jwt, NOW).is_none());
    }
}
