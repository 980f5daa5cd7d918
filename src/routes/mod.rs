pub mod assessments;
pub mod coach;
pub mod health;
pub mod matches;
pub mod opportunities;
pub mod practice;

use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::Router;

use crate::middleware::{rate_limit, request_id};
use crate::response::AppError;
use crate::state::AppState;

/// Maximum request body size: 256 KiB.
const MAX_BODY_SIZE: usize = 256 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/assessments", assessments::router())
        .nest("/opportunities", opportunities::router())
        .nest("/matches", matches::router())
        .nest("/practice", practice::router())
        .nest("/coach", coach::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .fallback(fallback_404)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}

async fn fallback_404() -> impl IntoResponse {
    AppError::not_found("Not found")
}
