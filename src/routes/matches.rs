use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::matching::live::{get_live_match_preview, PreviousSnapshot};
use crate::matching::{evaluate_matches, MatchCard, MatchPreferences};
use crate::response::{ok, AppError};
use crate::scoring::{score_assessment, Rubric, SkillSignals};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(evaluate))
        .route("/live", post(live_preview))
}

/// A learner snapshot. When `rubric` is present the score and skills are
/// derived from it and any explicit values are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotInput {
    rubric: Option<Rubric>,
    #[serde(default)]
    prompt_score: u32,
    #[serde(default)]
    skills: SkillSignals,
    #[serde(default)]
    completed_projects: u32,
    #[serde(default)]
    completed_project_slugs: Vec<String>,
}

impl SnapshotInput {
    fn resolve(&self) -> Result<(u32, SkillSignals), AppError> {
        if let Some(rubric) = &self.rubric {
            let score = score_assessment(rubric);
            return Ok((score.prompt_score, score.skills));
        }
        validate_levels(self.prompt_score, &self.skills)?;
        Ok((self.prompt_score, self.skills.clone()))
    }
}

fn validate_levels(prompt_score: u32, skills: &SkillSignals) -> Result<(), AppError> {
    if prompt_score > 100 {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            "promptScore must be between 0 and 100",
        ));
    }
    if let Some((key, value)) = skills.iter().find(|(_, v)| **v > 100) {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            &format!("skill {key} is {value}, must be between 0 and 100"),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateRequest {
    #[serde(flatten)]
    snapshot: SnapshotInput,
    #[serde(default)]
    preferences: Option<MatchPreferences>,
    #[serde(default)]
    unlocked_only: bool,
}

async fn evaluate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EvaluateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (prompt_score, skills) = req.snapshot.resolve()?;
    let mut cards: Vec<MatchCard> = evaluate_matches(
        state.catalog(),
        prompt_score,
        &skills,
        req.snapshot.completed_projects,
        &req.snapshot.completed_project_slugs,
        req.preferences.as_ref(),
    );
    if req.unlocked_only {
        cards.retain(|card| card.unlocked);
    }
    Ok(ok(cards))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviousInput {
    prompt_score: u32,
    #[serde(default)]
    skills: SkillSignals,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LivePreviewRequest {
    #[serde(flatten)]
    snapshot: SnapshotInput,
    #[serde(default)]
    previous: Option<PreviousInput>,
}

async fn live_preview(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LivePreviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (prompt_score, skills) = req.snapshot.resolve()?;
    if let Some(previous) = &req.previous {
        validate_levels(previous.prompt_score, &previous.skills)?;
    }

    let preview = get_live_match_preview(
        state.catalog(),
        prompt_score,
        &skills,
        req.snapshot.completed_projects,
        &req.snapshot.completed_project_slugs,
        req.previous.as_ref().map(|p| PreviousSnapshot {
            prompt_score: p.prompt_score,
            skills: &p.skills,
        }),
    );
    Ok(ok(preview))
}
