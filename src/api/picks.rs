use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{GolferId, TournamentId, UserId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPickRequest {
    pub user_id: i64,
    pub primary_golfer_id: i64,
    pub backup_golfer_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickDto {
    pub pick_id: i64,
    pub user_id: i64,
    pub tournament_id: i64,
    pub primary_golfer_id: i64,
    pub backup_golfer_id: i64,
    pub submitted_at_ms: i64,
}

pub async fn post_pick(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<SubmitPickRequest>,
) -> Result<Json<PickDto>, AppError> {
    let pick = state
        .submitter
        .submit(
            UserId::new(body.user_id),
            TournamentId::new(id),
            GolferId::new(body.primary_golfer_id),
            GolferId::new(body.backup_golfer_id),
            chrono::Utc::now(),
        )
        .await?;

    Ok(Json(PickDto {
        pick_id: pick.id.as_i64(),
        user_id: pick.user_id.as_i64(),
        tournament_id: pick.tournament_id.as_i64(),
        primary_golfer_id: pick.primary.as_i64(),
        backup_golfer_id: pick.backup.as_i64(),
        submitted_at_ms: pick.submitted_at.as_ms(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableQuery {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableGolferDto {
    pub golfer_id: i64,
    pub name: String,
}

pub async fn get_available(
    Path(id): Path<i64>,
    Query(params): Query<AvailableQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AvailableGolferDto>>, AppError> {
    let golfers = state
        .submitter
        .available_golfers(UserId::new(params.user_id), TournamentId::new(id))
        .await?;

    Ok(Json(
        golfers
            .into_iter()
            .map(|g| AvailableGolferDto {
                golfer_id: g.id.as_i64(),
                name: g.full_name(),
            })
            .collect(),
    ))
}
