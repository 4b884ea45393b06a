//! Cookie helpers.

use axum::http::{header, HeaderMap};

pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Build a session cookie string.
pub fn build_session_cookie(name: &str, value: &str, days: i64, secure: bool) -> String {
    let max_age = days * 24 * 60 * 60;
    build_cookie(name, value, max_age, secure)
}

/// Short-lived cookie holding the OAuth `state` parameter.
pub fn build_state_cookie(value: &str, secure: bool) -> String {
    build_cookie(OAUTH_STATE_COOKIE, value, 10 * 60, secure)
}

/// Expire a cookie immediately.
pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}

fn build_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        name, value, max_age, secure
    )
}

pub fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie_str in cookie_header.split(';') {
        if let Ok(cookie) = cookie::Cookie::parse(cookie_str.trim()) {
            if cookie.name() == cookie_name {
                return Some(cookie.value().to_string());
            }
        }
    }

    None
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.to_string())
}
