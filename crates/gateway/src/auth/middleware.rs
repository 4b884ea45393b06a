//! Session lookup and the page route guard.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use session::{artifact, SessionManager};

use super::cookies::{build_session_cookie, extract_bearer, extract_cookie};
use crate::error::ApiResult;
use crate::state::AppState;

/// Paths the page guard never inspects.
const UNGUARDED_PREFIXES: &[&str] = &["/api/", "/health", "/assets/", "/favicon.ico"];

pub struct ResolvedSession {
    pub sid: String,
    pub manager: Arc<SessionManager>,
}

/// Find the session manager for the artifact carried by the request.
///
/// The artifact is read from the session cookie, then from an
/// `Authorization: Bearer` header.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<ResolvedSession> {
    let token = extract_cookie(headers, &state.config.cookie_name)
        .or_else(|| extract_bearer(headers))?;

    let (sid, session) = match artifact::decode_session(&state.config, &token) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!("Ignoring invalid session artifact: {}", e);
            return None;
        }
    };

    let manager = state
        .registry
        .get_or_restore(&sid, session, || state.new_manager())
        .await;
    Some(ResolvedSession { sid, manager })
}

/// Re-sign the manager's current session into a cookie.
pub fn session_cookie(state: &AppState, resolved: &ResolvedSession) -> ApiResult<Option<String>> {
    let Some(session) = resolved.manager.current() else {
        return Ok(None);
    };
    let token = artifact::encode_session(&state.config, &resolved.sid, &session)?;
    Ok(Some(build_session_cookie(
        &state.config.cookie_name,
        &token,
        state.config.session_max_age_days,
        state.config.secure_cookies,
    )))
}

/// Middleware applying the route guard to page navigations.
///
/// Only reads the session; refreshing is left to the API handlers.
pub async fn route_guard(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if UNGUARDED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
    {
        return next.run(request).await;
    }

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.to_string());

    let session = match resolve_session(&state, request.headers()).await {
        Some(resolved) => resolved.manager.current(),
        None => None,
    };

    let decision = state.guard.check(&path_and_query, session.as_ref());
    match decision.location() {
        None => next.run(request).await,
        Some(location) => {
            tracing::debug!("Route guard redirecting {} to {}", path_and_query, location);
            Redirect::to(&location).into_response()
        }
    }
}
