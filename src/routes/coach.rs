use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_COACH_INPUT_CHARS;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::services::coach::CoachContext;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ask", post(ask))
        .route("/run-prompt", post(run_prompt))
}

fn validate_input(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            &format!("{field} must not be empty"),
        ));
    }
    if value.chars().count() > MAX_COACH_INPUT_CHARS {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            &format!("{field} must be at most {MAX_COACH_INPUT_CHARS} characters"),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CoachReply {
    answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest {
    question: String,
    #[serde(default)]
    context: CoachContext,
}

async fn ask(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AskRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_input("question", &req.question)?;
    let answer = state
        .coach()
        .ask_career_coach(&req.question, &req.context)
        .await?;
    Ok(ok(CoachReply { answer }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunPromptRequest {
    prompt: String,
    #[serde(default)]
    context: Option<String>,
}

async fn run_prompt(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RunPromptRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_input("prompt", &req.prompt)?;
    if let Some(context) = &req.context {
        if context.chars().count() > MAX_COACH_INPUT_CHARS {
            return Err(AppError::bad_request(
                "VALIDATION_ERROR",
                &format!("context must be at most {MAX_COACH_INPUT_CHARS} characters"),
            ));
        }
    }
    let answer = state
        .coach()
        .run_prompt(&req.prompt, req.context.as_deref())
        .await?;
    Ok(ok(CoachReply { answer }))
}
