#![forbid(unsafe_code)]

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use portal_contracts::admin::SessionToken;

pub const SESSION_COOKIE_NAME: &str = "portal_session";

/// Admin session cookie. Carries only the opaque token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub value: String,
    pub max_age_seconds: u64,
    pub secure: bool,
}

impl SessionCookie {
    pub fn new(token: &SessionToken, max_age_seconds: u64, secure: bool) -> Self {
        Self {
            value: token.as_str().to_string(),
            max_age_seconds,
            secure,
        }
    }

    /// Expires the cookie in the browser (logout).
    pub fn clear(secure: bool) -> Self {
        Self {
            value: String::new(),
            max_age_seconds: 0,
            secure,
        }
    }

    pub fn to_header_value(&self) -> String {
        let mut parts = vec![
            format!("{SESSION_COOKIE_NAME}={}", self.value),
            format!("Max-Age={}", self.max_age_seconds),
            "Path=/".to_string(),
            "HttpOnly".to_string(),
            "SameSite=Lax".to_string(),
        ];
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.join("; ")
    }
}

pub fn extract_session_token(headers: &HeaderMap) -> Option<SessionToken> {
    let prefix = format!("{SESSION_COOKIE_NAME}=");
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie_str| cookie_str.split(';'))
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(prefix.as_str()))
        .filter(|value| !value.is_empty())
        .map(SessionToken::new)
}
