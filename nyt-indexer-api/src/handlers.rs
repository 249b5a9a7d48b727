//! News aggregation handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;
use nyt_indexer_shared::{CalendarStep, TimeScale};

/// Query parameters of the ranking endpoints.
#[derive(Debug, Deserialize)]
pub struct RankingParams {
    pub section: Option<String>,
    /// `yesterday`, `week_ago` or `month_ago`; anything else disables the
    /// date filter.
    pub time_scale: Option<String>,
}

/// Query parameters of the article count endpoint.
#[derive(Debug, Deserialize)]
pub struct CountParams {
    pub section: Option<String>,
    pub step: Option<String>,
}

/// Buckets encoded as a JSON string.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DataResponse {
    pub data: String,
}

impl DataResponse {
    fn from_buckets(buckets: &[Value]) -> Result<Self, ApiError> {
        let data = serde_json::to_string(buckets)
            .map_err(|e| ApiError::Internal(format!("failed to encode buckets: {}", e)))?;
        Ok(Self { data })
    }
}

pub async fn health() -> &'static str {
    "ok"
}

/// `GET /news/top-journalists`: the 10 bylines with most articles.
pub async fn top_journalists(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<Json<DataResponse>, ApiError> {
    let section = required_section(params.section.as_deref())?;
    let time_scale = params.time_scale.as_deref().and_then(TimeScale::from_param);
    debug!(section = %section, time_scale = ?time_scale, "Top journalists requested");

    let buckets = state
        .analytics
        .top_journalists(section, time_scale, (state.today)())
        .await?;
    Ok(Json(DataResponse::from_buckets(&buckets)?))
}

/// `GET /news/top-persons`: the 5 most mentioned persons.
pub async fn top_persons(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<Json<DataResponse>, ApiError> {
    let section = required_section(params.section.as_deref())?;
    let time_scale = params.time_scale.as_deref().and_then(TimeScale::from_param);

    let buckets = state
        .analytics
        .top_persons(section, time_scale, (state.today)())
        .await?;
    Ok(Json(DataResponse::from_buckets(&buckets)?))
}

/// `GET /news/articles-count`: article counts per calendar step.
pub async fn articles_count(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> Result<Json<DataResponse>, ApiError> {
    let section = required_section(params.section.as_deref())?;
    let step = params
        .step
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("missing step parameter"))?
        .parse::<CalendarStep>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let buckets = state.analytics.articles_count(section, step).await?;
    Ok(Json(DataResponse::from_buckets(&buckets)?))
}

fn required_section(section: Option<&str>) -> Result<&str, ApiError> {
    match section.map(str::trim) {
        Some(section) if !section.is_empty() => Ok(section),
        _ => Err(ApiError::bad_request("missing section parameter")),
    }
}
