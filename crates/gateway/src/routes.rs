use axum::{
    http::{header, Method, StatusCode},
    middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::auth;
use crate::proxy;
use crate::state::AppState;

pub fn build_router(state: AppState, frontend_dir: Option<&str>, cors: CorsLayer) -> Router {
    let app = Router::new()
        .route("/health", get(health_check))
        // Auth routes
        .route("/api/auth/signin/credentials", post(auth::signin_credentials))
        .route("/api/auth/signin/google", get(auth::google_login))
        .route("/api/auth/callback/google", get(auth::google_callback))
        .route("/api/auth/signout", post(auth::signout))
        .route("/api/auth/session", get(auth::session))
        // Authenticated pass-through to the backend
        .route("/api/backend/*path", any(proxy::forward));

    // Serve static frontend files if the directory exists
    let app = match frontend_dir {
        Some(dir) if std::path::Path::new(dir).exists() => {
            tracing::info!("Serving frontend from {}", dir);
            let index_path = format!("{}/index.html", dir);
            app.fallback_service(ServeDir::new(dir).not_found_service(ServeFile::new(index_path)))
        }
        Some(dir) => {
            tracing::info!("Frontend directory not found at {}, serving API only", dir);
            app
        }
        None => app,
    };

    app.layer(middleware::from_fn_with_state(
        state.clone(),
        auth::route_guard,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Build CORS layer based on environment configuration.
///
/// If allowed origins are given, only those origins are allowed.
/// If not, defaults to permissive CORS (for development only).
pub fn build_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                tracing::warn!(
                    "CORS_ALLOWED_ORIGINS is set but empty, using permissive CORS (not recommended for production)"
                );
                CorsLayer::permissive()
            } else {
                tracing::info!("CORS configured for origins: {:?}", origins);
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                    .allow_credentials(true)
            }
        }
        None => {
            tracing::warn!(
                "CORS_ALLOWED_ORIGINS not set, using permissive CORS (not recommended for production)"
            );
            CorsLayer::permissive()
        }
    }
}
