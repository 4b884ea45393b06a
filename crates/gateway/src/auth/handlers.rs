//! Authentication HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use session::guard::{ADMIN_HOME, HOME, LOGIN_PATH};
use session::{ErrorKind, SignInProof};
use shared_types::{LoginInitResponse, LoginRequest, SessionView};
use uuid::Uuid;

use super::cookies::{build_state_cookie, clear_cookie, extract_cookie, OAUTH_STATE_COOKIE};
use super::middleware::{resolve_session, session_cookie, ResolvedSession};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Reuse the browser's session if it has one, so a new sign-in replaces it.
async fn resolve_or_new(state: &AppState, headers: &HeaderMap) -> ResolvedSession {
    match resolve_session(state, headers).await {
        Some(resolved) => resolved,
        None => ResolvedSession {
            sid: Uuid::new_v4().to_string(),
            manager: Arc::new(state.new_manager()),
        },
    }
}

/// Sign in with email and password.
pub async fn signin_credentials(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Response> {
    let resolved = resolve_or_new(&state, &headers).await;

    resolved
        .manager
        .sign_in(SignInProof::Credentials {
            email: body.email,
            password: body.password,
        })
        .await?;
    state
        .registry
        .insert(resolved.sid.clone(), resolved.manager.clone())
        .await;
    tracing::debug!("{} live sessions", state.registry.len().await);

    let cookie = session_cookie(&state, &resolved)?.ok_or(ErrorKind::NoSession)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(resolved.manager.view()),
    )
        .into_response())
}

/// Start Google OAuth login flow.
///
/// Returns a URL that the frontend should redirect the user to.
pub async fn google_login(State(state): State<AppState>) -> ApiResult<Response> {
    let provider = state
        .google
        .as_ref()
        .ok_or_else(|| ApiError::not_found("Google sign-in"))?;

    let csrf_state = Uuid::new_v4().to_string();
    let auth_url = provider.authorize_url(&csrf_state);

    Ok((
        [(
            header::SET_COOKIE,
            build_state_cookie(&csrf_state, state.config.secure_cookies),
        )],
        Json(LoginInitResponse { auth_url }),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Handle Google OAuth callback.
///
/// Exchanges the authorization code with Google, checks the profile's domain,
/// exchanges the Google tokens with the backend and sets the session cookie.
/// Failures redirect to the login page with the error kind.
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AuthCallbackParams>,
) -> Response {
    match handle_callback_inner(&state, &headers, params).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Auth callback error: {:?}", e);
            login_error_redirect(ErrorKind::BackendUnavailable)
        }
    }
}

async fn handle_callback_inner(
    state: &AppState,
    headers: &HeaderMap,
    params: AuthCallbackParams,
) -> ApiResult<Response> {
    let provider = state
        .google
        .as_ref()
        .ok_or_else(|| ApiError::not_found("Google sign-in"))?;

    if let Some(error) = params.error {
        tracing::warn!("Google returned an error: {}", error);
        return Ok(login_error_redirect(ErrorKind::InvalidInput));
    }

    let expected_state = extract_cookie(headers, OAUTH_STATE_COOKIE);
    let (Some(code), Some(csrf_state)) = (params.code, params.state) else {
        return Ok(login_error_redirect(ErrorKind::InvalidInput));
    };
    if expected_state.as_deref() != Some(csrf_state.as_str()) {
        tracing::warn!("OAuth state mismatch on callback");
        return Ok(login_error_redirect(ErrorKind::InvalidInput));
    }

    let proof = provider.proof_from_code(&code).await?;

    let resolved = resolve_or_new(state, headers).await;
    let session = match resolved.manager.sign_in(proof).await {
        Ok(session) => session,
        Err(kind) => return Ok(login_error_redirect(kind)),
    };
    state
        .registry
        .insert(resolved.sid.clone(), resolved.manager.clone())
        .await;
    tracing::debug!("{} live sessions", state.registry.len().await);

    let cookie = session_cookie(state, &resolved)?.ok_or(ErrorKind::NoSession)?;
    let home = if session.user.is_admin { ADMIN_HOME } else { HOME };

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, cookie),
            (header::SET_COOKIE, clear_cookie(OAUTH_STATE_COOKIE)),
        ]),
        Redirect::to(home),
    )
        .into_response())
}

fn login_error_redirect(kind: ErrorKind) -> Response {
    Redirect::to(&format!("{}?error={}", LOGIN_PATH, kind.as_str())).into_response()
}

/// Current session for page consumers.
///
/// Refreshes a stale access token first. A failed refresh is reported in the
/// view's `error` rather than dropping the session.
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let Some(resolved) = resolve_session(&state, &headers).await else {
        return Ok(Json(SessionView::anonymous()).into_response());
    };

    if let Err(kind) = resolved.manager.ensure_fresh().await {
        tracing::debug!("Session {} is not usable: {}", resolved.sid, kind);
    }

    let view = resolved.manager.view();
    Ok(match session_cookie(&state, &resolved)? {
        Some(cookie) => ([(header::SET_COOKIE, cookie)], Json(view)).into_response(),
        None => Json(view).into_response(),
    })
}

/// Sign out - drop the session and clear the cookie.
pub async fn signout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(resolved) = resolve_session(&state, &headers).await {
        state.registry.remove(&resolved.sid).await;
        resolved.manager.sign_out();
    }

    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, LOGIN_PATH.to_string()),
            (header::SET_COOKIE, clear_cookie(&state.config.cookie_name)),
        ],
    )
}
