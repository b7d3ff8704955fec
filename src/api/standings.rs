use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Season, UserId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonQuery {
    pub season: Option<i32>,
}

impl SeasonQuery {
    fn resolve(&self, default: Season) -> Result<Season, AppError> {
        match self.season {
            Some(year) if !(1900..=2200).contains(&year) => {
                Err(AppError::BadRequest(format!("invalid season {}", year)))
            }
            Some(year) => Ok(Season::new(year)),
            None => Ok(default),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingDto {
    pub rank: u32,
    pub user_id: i64,
    pub display_name: String,
    pub points: String,
    pub tournaments_scored: u32,
}

pub async fn get_standings(
    Query(params): Query<SeasonQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<StandingDto>>, AppError> {
    let season = params.resolve(state.config.season)?;
    let standings = state.repo.standings(season).await?;

    Ok(Json(
        standings
            .into_iter()
            .map(|s| StandingDto {
                rank: s.rank,
                user_id: s.user_id.as_i64(),
                display_name: s.display_name,
                points: s.points.to_canonical_string(),
                tournaments_scored: s.tournaments_scored,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub user_id: i64,
    pub season: i32,
    pub used: Vec<UsedGolferDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedGolferDto {
    pub golfer_id: i64,
    pub name: String,
    pub tournament_id: i64,
}

pub async fn get_user_usage(
    Path(id): Path<i64>,
    Query(params): Query<SeasonQuery>,
    State(state): State<AppState>,
) -> Result<Json<UsageResponse>, AppError> {
    let season = params.resolve(state.config.season)?;
    let user_id = UserId::new(id);
    if state.repo.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("user {} not found", id)));
    }

    let used = state.repo.list_usage_for_user(user_id, season).await?;

    Ok(Json(UsageResponse {
        user_id: id,
        season: season.year(),
        used: used
            .into_iter()
            .map(|(usage, golfer)| UsedGolferDto {
                golfer_id: golfer.id.as_i64(),
                name: golfer.full_name(),
                tournament_id: usage.tournament_id.as_i64(),
            })
            .collect(),
    }))
}
