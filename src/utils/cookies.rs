use axum::http::{HeaderMap, HeaderValue};

use crate::core::error::Error;

pub(crate) fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let cookies = cookies.to_str().ok()?;

    for part in cookies.split(';') {
        let part = part.trim();

        if let Some(eq) = part.find('=') {
            let (key, value) = part.split_at(eq);

            if key == name {
                return Some(value[1..].to_string());
            }
        }
    }

    None
}

/// Behind a TLS-terminating proxy the request itself is plaintext, so the
/// forwarded protocol header decides whether cookies are marked `Secure`.
pub(crate) fn is_secure(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|proto| proto.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

pub(crate) fn build(
    name: &str,
    value: &str,
    max_age: Option<i64>,
    secure: bool,
) -> Result<HeaderValue, Error> {
    let mut cookie = format!("{}={}; HttpOnly; Path=/; SameSite=Lax", name, value);

    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }

    if secure {
        cookie.push_str("; Secure");
    }

    Ok(HeaderValue::from_str(&cookie)?)
}

pub(crate) fn expire(name: &str, secure: bool) -> Result<HeaderValue, Error> {
    build(name, "deleted", Some(0), secure)
}
