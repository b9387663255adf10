//! Compact HS256 token codec. Only supports compact JWS with the fixed
//! header `{"alg":"HS256","typ":"JWT"}` and a flat claims payload.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::core::error::Error;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) authorities: Vec<String>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub(crate) session_id: Option<String>,
    #[serde(rename = "authSource", skip_serializing_if = "Option::is_none")]
    pub(crate) auth_source: Option<String>,
    #[serde(rename = "identifierId", skip_serializing_if = "Option::is_none")]
    pub(crate) identifier_id: Option<i64>,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub(crate) enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    Signature,
    #[error("token expired")]
    Expired,
}

#[derive(Clone)]
pub(crate) struct Jwt {
    key: Vec<u8>,
    ttl_seconds: i64,
}

impl std::fmt::Debug for Jwt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwt")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl Jwt {
    pub(crate) fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
            ttl_seconds,
        }
    }

    pub(crate) fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub(crate) fn encode(&self, claims: &Claims) -> Result<String, Error> {
        let header = URL_SAFE_NO_PAD.encode(HEADER.as_bytes());
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);

        let signing_input = format!("{}.{}", header, payload);
        let signature = self.sign(signing_input.as_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Verifies the signature and expiry, then parses the payload. `now` is
    /// seconds since the epoch; a token with `exp <= now` is expired.
    pub(crate) fn decode(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();

        if segments.len() != 3 {
            return Err(TokenError::Malformed);
        }

        let signing_input = format!("{}.{}", segments[0], segments[1]);
        let expected = self.sign(signing_input.as_bytes());

        if !constant_time_eq(segments[2].as_bytes(), expected.as_bytes()) {
            return Err(TokenError::Signature);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(segments[1])
            .map_err(|_| TokenError::Malformed)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(data);

        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

// Always walks the longer of the two inputs; missing bytes compare as zero.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = 0u8;

    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= x ^ y;
    }

    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn codec() -> Jwt {
        Jwt::new("test-secret-test-secret-test-secret", 3600)
    }

    fn claims() -> Claims {
        Claims {
            sub: "u1".to_string(),
            name: Some("User One".to_string()),
            email: Some("u1@example.com".to_string()),
            authorities: vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()],
            session_id: Some("session-a".to_string()),
            auth_source: Some("oauth2".to_string()),
            identifier_id: Some(42),
            iat: NOW,
            exp: NOW + 3600,
        }
    }

    #[test]
    fn round_trip_preserves_claims() {
        let jwt = codec();
        let claims = claims();

        let token = jwt.encode(&claims).unwrap();
        let decoded = jwt.decode(&token, NOW).unwrap();

        assert_eq!(decoded, claims);
    }

    #[test]
    fn encoding_is_deterministic() {
        let jwt = codec();

        assert_eq!(jwt.encode(&claims()).unwrap(), jwt.encode(&claims()).unwrap());
    }

    #[test]
    fn token_has_three_unpadded_segments() {
        let token = codec().encode(&claims()).unwrap();
        let segments: Vec<&str> = token.split('.').collect();

        assert_eq!(segments.len(), 3);
        assert!(!token.contains('='));
        assert_eq!(
            URL_SAFE_NO_PAD.decode(segments[0]).unwrap(),
            HEADER.as_bytes()
        );
    }

    #[test]
    fn flipping_any_byte_invalidates_the_token() {
        let jwt = codec();
        let token = jwt.encode(&claims()).unwrap();

        for i in 0..token.len() {
            let mut bytes = token.as_bytes().to_vec();
            bytes[i] ^= 0x01;

            let Ok(tampered) = String::from_utf8(bytes) else {
                continue;
            };

            assert!(
                jwt.decode(&tampered, NOW).is_err(),
                "byte {} accepted after tampering",
                i
            );
        }
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = codec();
        let mut expired = claims();
        expired.iat = NOW - 3601;
        expired.exp = NOW - 1;

        let token = jwt.encode(&expired).unwrap();

        assert_eq!(jwt.decode(&token, NOW), Err(TokenError::Expired));
    }

    #[test]
    fn token_expiring_now_is_rejected() {
        let jwt = codec();
        let mut claims = claims();
        claims.exp = NOW;

        let token = jwt.encode(&claims).unwrap();

        assert_eq!(jwt.decode(&token, NOW), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = codec().encode(&claims()).unwrap();
        let other = Jwt::new("another-secret-entirely", 3600);

        assert_eq!(other.decode(&token, NOW), Err(TokenError::Signature));
    }

    #[test]
    fn wrong_segment_count_is_rejected() {
        let jwt = codec();

        assert_eq!(jwt.decode("", NOW), Err(TokenError::Malformed));
        assert_eq!(jwt.decode("a.b", NOW), Err(TokenError::Malformed));
        assert_eq!(jwt.decode("a.b.c.d", NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(codec().decode("not.a.valid.token", NOW).is_err());
        assert!(codec().decode("not.a.token", NOW).is_err());
    }

    #[test]
    fn missing_subject_is_rejected() {
        let jwt = codec();
        let payload = format!(r#"{{"iat":{},"exp":{}}}"#, NOW, NOW + 3600);

        let header = URL_SAFE_NO_PAD.encode(HEADER.as_bytes());
        let payload = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        let signing_input = format!("{}.{}", header, payload);
        let signature = jwt.sign(signing_input.as_bytes());
        let token = format!("{}.{}", signing_input, signature);

        assert_eq!(jwt.decode(&token, NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn missing_expiry_is_rejected() {
        let jwt = codec();
        let payload = format!(r#"{{"sub":"u1","iat":{}}}"#, NOW);

        let header = URL_SAFE_NO_PAD.encode(HEADER.as_bytes());
        let payload = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        let signing_input = format!("{}.{}", header, payload);
        let signature = jwt.sign(signing_input.as_bytes());
        let token = format!("{}.{}", signing_input, signature);

        assert_eq!(jwt.decode(&token, NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn optional_claims_default_when_absent() {
        let jwt = codec();
        let payload = format!(r#"{{"sub":"u1","iat":{},"exp":{}}}"#, NOW, NOW + 60);

        let header = URL_SAFE_NO_PAD.encode(HEADER.as_bytes());
        let payload = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        let signing_input = format!("{}.{}", header, payload);
        let signature = jwt.sign(signing_input.as_bytes());
        let token = format!("{}.{}", signing_input, signature);

        let decoded = jwt.decode(&token, NOW).unwrap();

        assert_eq!(decoded.sub, "u1");
        assert!(decoded.authorities.is_empty());
        assert!(decoded.session_id.is_none());
        assert!(decoded.identifier_id.is_none());
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(!constant_time_eq(b"", b"abc"));
        assert!(constant_time_eq(b"", b""));
    }
}
