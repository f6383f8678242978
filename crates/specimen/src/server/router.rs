//! Route table and middleware stack.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Build the application router.
///
/// `max_body_bytes` caps whole request bodies; axum's default 2MB limit is
/// replaced by it so uploads up to the configured size get through.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let media_prefix = state.media_url.trim_end_matches('/').to_string();
    let media = ServeDir::new(state.media.root());

    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/upload/",
            get(handlers::upload_form).post(handlers::upload_submit),
        )
        .route(
            "/login/",
            get(handlers::login_form).post(handlers::login_submit),
        )
        .route("/logout/", get(handlers::logout).post(handlers::logout))
        .route("/health", get(handlers::health))
        .nest_service(&media_prefix, media)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
