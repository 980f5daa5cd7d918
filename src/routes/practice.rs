use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::adaptive::elo::PromptRating;
use crate::adaptive::engine::PracticeItemInput;
use crate::constants::DEFAULT_ATTEMPT_PAGE_SIZE;
use crate::extractors::{JsonBody, QueryParams};
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::practice_items::ItemStatus;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(upsert_item))
        .route("/items/:id", get(get_item))
        .route("/items/:id/elo", post(update_item_elo))
        .route("/users/:user_id/skills", get(list_user_skills))
        .route("/users/:user_id/weakest-skill", get(weakest_skill))
        .route(
            "/users/:user_id/skills/:skill_id/rating",
            post(update_skill_rating),
        )
        .route("/users/:user_id/next-item", post(next_item))
        .route(
            "/users/:user_id/attempts",
            get(list_attempts).post(submit_attempt),
        )
        .route("/users/:user_id/prompt-ratings", post(record_prompt_rating))
        .route("/users/:user_id/deck", get(deck))
}

fn require_finite(field: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AppError::bad_request(
            "VALIDATION_ERROR",
            &format!("{field} must be a finite number"),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ListItemsQuery {
    status: Option<ItemStatus>,
}

async fn list_items(
    State(state): State<AppState>,
    QueryParams(q): QueryParams<ListItemsQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.adaptive().list_items(q.status)?))
}

async fn upsert_item(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<PracticeItemInput>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.adaptive().upsert_item(input)?;
    Ok(created(item))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .adaptive()
        .get_item(&id)?
        .ok_or_else(|| AppError::not_found(&format!("Practice item not found: {id}")))?;
    Ok(ok(item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemEloRequest {
    user_rating: f64,
    correct: bool,
}

async fn update_item_elo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<ItemEloRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_finite("userRating", req.user_rating)?;
    let update = state
        .adaptive()
        .update_item_elo(&id, req.user_rating, req.correct)?;
    Ok(ok(update))
}

async fn list_user_skills(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.adaptive().list_user_skills(&user_id)?))
}

/// `data` is null for a learner with no tracked skills.
async fn weakest_skill(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.adaptive().get_weakest_skill(&user_id)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkillRatingRequest {
    item_elo: f64,
    correct: bool,
}

async fn update_skill_rating(
    State(state): State<AppState>,
    Path((user_id, skill_id)): Path<(String, String)>,
    JsonBody(req): JsonBody<SkillRatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_finite("itemElo", req.item_elo)?;
    let update = state
        .adaptive()
        .update_skill_rating(&user_id, &skill_id, req.item_elo, req.correct)?;
    Ok(ok(update))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NextItemRequest {
    #[serde(default)]
    exclude_item_ids: Vec<String>,
    #[serde(default)]
    skill_id: Option<String>,
}

/// `data` is null when no live item fits.
async fn next_item(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    JsonBody(req): JsonBody<NextItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.adaptive().pick_next_item(
        &user_id,
        &req.exclude_item_ids,
        req.skill_id.as_deref(),
    )?;
    Ok(ok(item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAttemptRequest {
    item_id: String,
    correct: bool,
    #[serde(default)]
    time_spent_ms: Option<u64>,
}

async fn submit_attempt(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    JsonBody(req): JsonBody<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.adaptive().submit_attempt(
        &user_id,
        &req.item_id,
        req.correct,
        req.time_spent_ms,
    )?;
    Ok(created(result))
}

#[derive(Debug, Deserialize)]
struct ListAttemptsQuery {
    limit: Option<usize>,
}

async fn list_attempts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    QueryParams(q): QueryParams<ListAttemptsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = q.limit.unwrap_or(DEFAULT_ATTEMPT_PAGE_SIZE).max(1);
    Ok(ok(state.adaptive().list_attempts(&user_id, limit)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptRatingRequest {
    prompt_id: String,
    rating: PromptRating,
    current_difficulty: f64,
}

async fn record_prompt_rating(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    JsonBody(req): JsonBody<PromptRatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.prompt_id.trim().is_empty() {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            "promptId must not be empty",
        ));
    }
    let outcome = state.adaptive().record_prompt_rating(
        &user_id,
        &req.prompt_id,
        req.rating,
        req.current_difficulty,
    )?;
    Ok(created(outcome))
}

#[derive(Debug, Deserialize)]
struct DeckQuery {
    difficulty: Option<f64>,
    limit: Option<usize>,
}

/// Without `difficulty` the deck centres on the learner's weakest skill.
async fn deck(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    QueryParams(q): QueryParams<DeckQuery>,
) -> Result<impl IntoResponse, AppError> {
    let engine = state.adaptive();
    let difficulty = match q.difficulty {
        Some(d) => {
            require_finite("difficulty", d)?;
            d
        }
        None => engine
            .get_weakest_skill(&user_id)?
            .map(|skill| skill.rating)
            .unwrap_or(engine.config().default_rating),
    };
    let items = engine.get_practice_items_for_deck(&user_id, difficulty, q.limit)?;
    Ok(ok(items))
}
