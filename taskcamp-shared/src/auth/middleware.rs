/// Request credential extraction and authenticated caller context
///
/// The API authenticates requests with the `accessToken` cookie set at
/// login, falling back to an `Authorization: Bearer <token>` header for
/// non-browser clients. This module provides the header parsing and the
/// [`AuthContext`] that the authentication layer inserts into request
/// extensions for handlers to consume.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use taskcamp_shared::auth::middleware::extract_access_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, HeaderValue::from_static("accessToken=abc123"));
///
/// assert_eq!(extract_access_token(&headers).as_deref(), Some("abc123"));
/// ```
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated caller context
///
/// Added to request extensions after successful access-token validation.
/// Handlers extract it with `Extension<AuthContext>`; its presence is the
/// proof that the authentication stage ran.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates auth context from validated access-token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
        }
    }
}

/// Reads a named cookie out of the `Cookie` header
///
/// Returns the raw value of the first cookie with that name, or `None` when
/// the header is absent or the cookie is not present.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Extracts the access token from a request
///
/// Checks the `accessToken` cookie first, then the `Authorization: Bearer`
/// header. Returns `None` when neither carries a token.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, ACCESS_TOKEN_COOKIE) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Extracts the refresh token from a request's cookies
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, REFRESH_TOKEN_COOKIE)
}
