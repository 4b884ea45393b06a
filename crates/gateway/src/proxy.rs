//! Pass-through calls to the backend with the session's access token.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};

use crate::auth::{resolve_session, session_cookie};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Forward `ANY /api/backend/*path` to `BACKEND_URL/<path>`.
///
/// The access token is refreshed first if it is stale, and the session cookie
/// is re-issued so the browser carries the refreshed tokens.
pub async fn forward(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let resolved = resolve_session(&state, &headers)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication".to_string()))?;

    let mut url = format!(
        "{}/{}",
        state.config.backend_url,
        path.trim_start_matches('/')
    );
    if let Some(query) = uri.query() {
        url.push('?');
        url.push_str(query);
    }

    let mut request = state.http.request(method.clone(), &url).body(body);
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        request = request.header(header::CONTENT_TYPE, content_type.clone());
    }
    let request = resolved.manager.authorize(request).await?;

    tracing::debug!("Forwarding {} {}", method, url);
    let upstream = request.send().await?;
    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = upstream.bytes().await?;

    let mut response = (status, bytes).into_response();
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    if let Some(cookie) = session_cookie(&state, &resolved)? {
        if let Ok(value) = cookie.parse() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    Ok(response)
}
