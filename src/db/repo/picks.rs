//! Pick reads and per-season golfer usage lookups.

use crate::domain::{GolferId, Pick, Season, TournamentId, UserId};
use sqlx::Row;
use std::collections::BTreeSet;

use super::{pick_from_row, Repository, PICK_COLUMNS};

impl Repository {
    pub async fn get_pick(
        &self,
        user_id: UserId,
        tournament_id: TournamentId,
    ) -> Result<Option<Pick>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM picks WHERE user_id = ? AND tournament_id = ?",
            PICK_COLUMNS
        ))
        .bind(user_id.as_i64())
        .bind(tournament_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| pick_from_row(&r)))
    }

    /// All picks for a tournament, ordered by id.
    pub async fn list_picks(&self, tournament_id: TournamentId) -> Result<Vec<Pick>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM picks WHERE tournament_id = ? ORDER BY id ASC",
            PICK_COLUMNS
        ))
        .bind(tournament_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(pick_from_row).collect())
    }

    /// Golfers the user has used this season, per the usage ledger.
    pub async fn used_golfers(
        &self,
        user_id: UserId,
        season: Season,
    ) -> Result<BTreeSet<GolferId>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT golfer_id FROM season_player_usage WHERE user_id = ? AND season_year = ?",
        )
        .bind(user_id.as_i64())
        .bind(season.year())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| GolferId::new(r.get("golfer_id")))
            .collect())
    }
}
