use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::extractors::QueryParams;
use crate::matching::catalog::Opportunity;
use crate::matching::MatchType;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_opportunities))
        .route("/:id", get(get_opportunity))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListOpportunitiesQuery {
    #[serde(rename = "type")]
    match_type: Option<MatchType>,
    seniority: Option<String>,
}

async fn list_opportunities(
    State(state): State<AppState>,
    QueryParams(q): QueryParams<ListOpportunitiesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let records: Vec<Opportunity> = state
        .catalog()
        .iter()
        .filter(|o| {
            q.match_type
                .map_or(true, |t| MatchType::from_employment_type(&o.employment_type) == t)
        })
        .filter(|o| {
            q.seniority
                .as_deref()
                .map_or(true, |s| o.seniority.eq_ignore_ascii_case(s))
        })
        .cloned()
        .collect();
    Ok(ok(records))
}

async fn get_opportunity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .catalog()
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::not_found(&format!("Opportunity not found: {id}")))?;
    Ok(ok(record))
}
