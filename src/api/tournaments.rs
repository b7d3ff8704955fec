use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::AppState;
use crate::domain::{TournamentId, TournamentResult};
use crate::error::AppError;
use crate::orchestration::ReconcileReport;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResultsResponse {
    pub tournament_id: i64,
    pub name: String,
    pub status: String,
    pub format: String,
    pub results_finalized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_digest: Option<String>,
    pub results: Vec<ResultDto>,
    pub usage: Vec<UsageDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDto {
    pub pick_id: i64,
    pub user_id: i64,
    pub primary_golfer_id: i64,
    pub backup_golfer_id: i64,
    pub active_golfer_id: i64,
    pub active_role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_earnings: Option<String>,
    pub points: String,
    pub earnings_missing: bool,
    pub primary_disposition: String,
    pub backup_disposition: String,
}

impl From<TournamentResult> for ResultDto {
    fn from(r: TournamentResult) -> Self {
        Self {
            pick_id: r.pick_id.as_i64(),
            user_id: r.user_id.as_i64(),
            primary_golfer_id: r.primary_golfer.as_i64(),
            backup_golfer_id: r.backup_golfer.as_i64(),
            active_golfer_id: r.active_golfer.as_i64(),
            active_role: r.active_role.as_str().to_string(),
            raw_earnings: r.raw_earnings.map(|m| m.to_canonical_string()),
            points: r.points.to_canonical_string(),
            earnings_missing: r.earnings_missing,
            primary_disposition: r.primary_disposition.as_str().to_string(),
            backup_disposition: r.backup_disposition.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageDto {
    pub user_id: i64,
    pub golfer_id: i64,
    pub season: i32,
}

pub async fn get_results(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<TournamentResultsResponse>, AppError> {
    let tournament_id = TournamentId::new(id);
    let tournament = state
        .repo
        .get_tournament(tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {} not found", id)))?;

    let results = state.repo.list_results(tournament_id).await?;
    let usage = state.repo.list_usage_for_tournament(tournament_id).await?;

    Ok(Json(TournamentResultsResponse {
        tournament_id: id,
        name: tournament.name,
        status: tournament.status.as_str().to_string(),
        format: tournament.format.as_str().to_string(),
        results_finalized: tournament.results_finalized,
        results_digest: tournament.results_digest,
        results: results.into_iter().map(ResultDto::from).collect(),
        usage: usage
            .into_iter()
            .map(|u| UsageDto {
                user_id: u.user_id.as_i64(),
                golfer_id: u.golfer_id.as_i64(),
                season: u.season.year(),
            })
            .collect(),
    }))
}

pub async fn post_reconcile(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ReconcileReport>, AppError> {
    let report = state.reconciler.reconcile(TournamentId::new(id)).await?;
    Ok(Json(report))
}
