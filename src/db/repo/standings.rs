//! Results, usage ledger, and season standings reads.

use crate::domain::{
    Golfer, Money, Season, SeasonPlayerUsage, TournamentId, TournamentResult, UserId,
};
use serde::Serialize;
use sqlx::Row;
use std::collections::BTreeMap;
use tracing::warn;

use super::{golfer_from_row, result_from_row, usage_from_row, Repository, RESULT_COLUMNS};

/// One line of the season leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    /// Competition rank: tied users share a rank and the next rank skips.
    pub rank: u32,
    pub user_id: UserId,
    pub display_name: String,
    pub points: Money,
    pub tournaments_scored: u32,
}

impl Repository {
    /// Reconciled results of a tournament, ordered by pick id.
    pub async fn list_results(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<TournamentResult>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tournament_results WHERE tournament_id = ? ORDER BY pick_id ASC",
            RESULT_COLUMNS
        ))
        .bind(tournament_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(result_from_row).collect()
    }

    /// Usage rows of a tournament in ledger order.
    pub async fn list_usage_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<SeasonPlayerUsage>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, golfer_id, season_year, tournament_id
            FROM season_player_usage
            WHERE tournament_id = ?
            ORDER BY user_id ASC, golfer_id ASC
            "#,
        )
        .bind(tournament_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(usage_from_row).collect())
    }

    /// A user's used golfers for a season, in the order they were used.
    pub async fn list_usage_for_user(
        &self,
        user_id: UserId,
        season: Season,
    ) -> Result<Vec<(SeasonPlayerUsage, Golfer)>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT u.user_id, u.golfer_id, u.season_year, u.tournament_id,
                   g.id, g.api_player_id, g.first_name, g.last_name, g.is_amateur
            FROM season_player_usage u
            JOIN golfers g ON g.id = u.golfer_id
            JOIN tournaments t ON t.id = u.tournament_id
            WHERE u.user_id = ? AND u.season_year = ?
            ORDER BY t.start_date ASC, u.golfer_id ASC
            "#,
        )
        .bind(user_id.as_i64())
        .bind(season.year())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (usage_from_row(r), golfer_from_row(r)))
            .collect())
    }

    /// Season standings over `complete` tournaments.
    ///
    /// Points are summed in Rust: SQLite's SUM over TEXT would go through
    /// REAL and lose precision.
    pub async fn standings(&self, season: Season) -> Result<Vec<StandingRow>, sqlx::Error> {
        let users = self.list_users().await?;

        let rows = sqlx::query(
            r#"
            SELECT r.user_id, r.points
            FROM tournament_results r
            JOIN tournaments t ON t.id = r.tournament_id
            WHERE t.season_year = ? AND t.status = 'complete'
            ORDER BY r.tournament_id ASC, r.pick_id ASC
            "#,
        )
        .bind(season.year())
        .fetch_all(&self.pool)
        .await?;

        let mut totals: BTreeMap<UserId, (Money, u32)> = BTreeMap::new();
        for row in rows {
            let user_id = UserId::new(row.get("user_id"));
            let raw: String = row.get("points");
            let points = Money::from_str_canonical(&raw).unwrap_or_else(|e| {
                warn!(user = %user_id, points = %raw, error = %e, "Failed to parse stored points, counting zero");
                Money::zero()
            });
            let entry = totals.entry(user_id).or_insert((Money::zero(), 0));
            entry.0 += points;
            entry.1 += 1;
        }

        let mut standings: Vec<StandingRow> = users
            .into_iter()
            .map(|u| {
                let (points, tournaments_scored) =
                    totals.get(&u.id).copied().unwrap_or((Money::zero(), 0));
                StandingRow {
                    rank: 0,
                    user_id: u.id,
                    display_name: u.display_name,
                    points,
                    tournaments_scored,
                }
            })
            .collect();

        rank_standings(&mut standings);
        Ok(standings)
    }
}

/// Sort by points descending (user id breaks ties for display order) and
/// assign competition ranks.
pub(crate) fn rank_standings(rows: &mut [StandingRow]) {
    rows.sort_by(|a, b| b.points.cmp(&a.points).then(a.user_id.cmp(&b.user_id)));

    let mut previous: Option<Money> = None;
    let mut rank = 0u32;
    for (i, row) in rows.iter_mut().enumerate() {
        if previous != Some(row.points) {
            rank = i as u32 + 1;
            previous = Some(row.points);
        }
        row.rank = rank;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user: i64, points: i64) -> StandingRow {
        StandingRow {
            rank: 0,
            user_id: UserId::new(user),
            display_name: format!("user {}", user),
            points: Money::from_whole(points),
            tournaments_scored: 1,
        }
    }

    #[test]
    fn test_competition_ranking_with_ties() {
        let mut rows = vec![row(1, 100), row(2, 300), row(3, 300), row(4, 50)];
        rank_standings(&mut rows);

        let ranks: Vec<(i64, u32)> = rows.iter().map(|r| (r.user_id.as_i64(), r.rank)).collect();
        assert_eq!(ranks, vec![(2, 1), (3, 1), (1, 3), (4, 4)]);
    }
}
