//! Credential header parsing

use axum::http::HeaderMap;

/// Header carrying the bearer credential, on both the identity service and
/// every protected downstream route
pub const AUTHENTICATION_HEADER: &str = "authentication";

/// Extract the token from the `Authentication` header
///
/// Returns `None` when the header is absent, repeated, not visible ASCII, or
/// empty. An optional `Bearer ` prefix is stripped so every caller agrees on
/// the exact token string.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<&str> {
    let mut values = headers.get_all(AUTHENTICATION_HEADER).iter();
    let value = values.next()?;
    if values.next().is_some() {
        return None;
    }

    let value = value.to_str().ok()?.trim_start();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();

    if token.is_empty() { None } else { Some(token) }
}
