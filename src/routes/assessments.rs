use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::scoring::{score_assessment, Rubric};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/score", post(score))
}

/// Rubric dimensions outside [0, 25] are clamped, not rejected.
async fn score(JsonBody(rubric): JsonBody<Rubric>) -> Result<impl IntoResponse, AppError> {
    let result = score_assessment(&rubric);
    tracing::debug!(prompt_score = result.prompt_score, "Assessment scored");
    Ok(ok(result))
}
