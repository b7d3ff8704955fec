//! Schedule and tournament status operations for the repository.

use crate::domain::league_time::format_naive;
use crate::domain::{Season, Tournament, TournamentFormat, TournamentId, TournamentStatus};
use crate::engine::schedule::initial_purse;
use chrono::NaiveDateTime;
use sqlx::Row;
use tracing::debug;

use super::{tournament_from_row, Repository, TOURNAMENT_COLUMNS};

/// One schedule entry as imported from the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleUpsert {
    pub api_tourn_id: String,
    pub season: Season,
    pub name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    /// Purse from the feed; zero when not announced.
    pub api_purse: i64,
    pub format: TournamentFormat,
    pub week_number: Option<i32>,
}

impl Repository {
    /// Insert or refresh a schedule entry. Existing rows keep their status,
    /// deadline and finalization flags; their purse only changes when the
    /// feed reports a positive value.
    ///
    /// Returns `true` when a new tournament was created.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn upsert_schedule_entry(&self, entry: &ScheduleUpsert) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            "SELECT id FROM tournaments WHERE api_tourn_id = ? AND season_year = ?",
        )
        .bind(&entry.api_tourn_id)
        .bind(entry.season.year())
        .fetch_optional(&mut *tx)
        .await?;

        let created = match existing {
            Some(row) => {
                let id: i64 = row.get("id");
                sqlx::query(
                    r#"
                    UPDATE tournaments
                    SET name = ?,
                        format = ?,
                        start_date = ?,
                        end_date = ?,
                        week_number = COALESCE(?, week_number),
                        purse = CASE WHEN ? > 0 THEN ? ELSE purse END
                    WHERE id = ?
                    "#,
                )
                .bind(&entry.name)
                .bind(entry.format.as_str())
                .bind(format_naive(entry.start_date))
                .bind(format_naive(entry.end_date))
                .bind(entry.week_number)
                .bind(entry.api_purse)
                .bind(entry.api_purse)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                false
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO tournaments (
                        api_tourn_id, season_year, name, start_date, end_date,
                        purse, format, status, week_number
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, 'upcoming', ?)
                    "#,
                )
                .bind(&entry.api_tourn_id)
                .bind(entry.season.year())
                .bind(&entry.name)
                .bind(format_naive(entry.start_date))
                .bind(format_naive(entry.end_date))
                .bind(initial_purse(&entry.name, entry.api_purse))
                .bind(entry.format.as_str())
                .bind(entry.week_number)
                .execute(&mut *tx)
                .await?;
                true
            }
        };

        tx.commit().await?;
        Ok(created)
    }

    /// Insert a tournament directly (admin seeding and tests).
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_tournament(&self, t: &Tournament) -> Result<TournamentId, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO tournaments (
                api_tourn_id, season_year, name, start_date, end_date, pick_deadline,
                purse, format, status, final_confirmed, results_finalized,
                results_digest, week_number
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&t.api_tourn_id)
        .bind(t.season.year())
        .bind(&t.name)
        .bind(format_naive(t.start_date))
        .bind(format_naive(t.end_date))
        .bind(t.pick_deadline.map(format_naive))
        .bind(t.purse)
        .bind(t.format.as_str())
        .bind(t.status.as_str())
        .bind(t.final_confirmed)
        .bind(t.results_finalized)
        .bind(t.results_digest.as_deref())
        .bind(t.week_number)
        .execute(&self.pool)
        .await?;

        Ok(TournamentId::new(result.last_insert_rowid()))
    }

    pub async fn get_tournament(
        &self,
        id: TournamentId,
    ) -> Result<Option<Tournament>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tournaments WHERE id = ?",
            TOURNAMENT_COLUMNS
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    pub async fn get_tournament_by_api_id(
        &self,
        api_tourn_id: &str,
        season: Season,
    ) -> Result<Option<Tournament>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tournaments WHERE api_tourn_id = ? AND season_year = ?",
            TOURNAMENT_COLUMNS
        ))
        .bind(api_tourn_id)
        .bind(season.year())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    /// All tournaments of a season in schedule order.
    pub async fn list_tournaments(&self, season: Season) -> Result<Vec<Tournament>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tournaments WHERE season_year = ? ORDER BY start_date ASC, id ASC",
            TOURNAMENT_COLUMNS
        ))
        .bind(season.year())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    /// Incomplete tournaments whose play window overlaps `[from, to]`
    /// (league-local naive times).
    pub async fn list_tournaments_overlapping(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Tournament>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM tournaments
            WHERE start_date <= ? AND end_date >= ? AND status != 'complete'
            ORDER BY start_date ASC, id ASC
            "#,
            TOURNAMENT_COLUMNS
        ))
        .bind(format_naive(to))
        .bind(format_naive(from))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    /// Tournaments that ended at or before `now` and whose results have not
    /// been reconciled, most recent first.
    pub async fn list_awaiting_results(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<Tournament>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM tournaments
            WHERE end_date <= ? AND results_finalized = 0
            ORDER BY end_date DESC, id ASC
            "#,
            TOURNAMENT_COLUMNS
        ))
        .bind(format_naive(now))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    /// Tournaments that ended within `[from, to]`, finalized or not, so
    /// upstream corrections can be picked up again.
    pub async fn list_ended_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Tournament>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM tournaments
            WHERE end_date >= ? AND end_date <= ?
            ORDER BY end_date DESC, id ASC
            "#,
            TOURNAMENT_COLUMNS
        ))
        .bind(format_naive(from))
        .bind(format_naive(to))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    /// Tournaments with official results stored but not yet reconciled.
    pub async fn list_pending_reconcile(
        &self,
        season: Season,
    ) -> Result<Vec<Tournament>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM tournaments
            WHERE season_year = ? AND final_confirmed = 1 AND results_finalized = 0
            ORDER BY start_date ASC, id ASC
            "#,
            TOURNAMENT_COLUMNS
        ))
        .bind(season.year())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    /// Move a tournament's status forward. A proposal that would move it
    /// backwards is ignored. Returns the status now stored.
    ///
    /// # Errors
    /// Returns `RowNotFound` if the tournament does not exist.
    pub async fn advance_status(
        &self,
        id: TournamentId,
        proposed: TournamentStatus,
    ) -> Result<TournamentStatus, sqlx::Error> {
        let current = self
            .get_tournament(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?
            .status;

        let next = current.advance(proposed);
        if next != current {
            // Compare-and-set so a concurrent transition is never overwritten.
            let result =
                sqlx::query("UPDATE tournaments SET status = ? WHERE id = ? AND status = ?")
                    .bind(next.as_str())
                    .bind(id.as_i64())
                    .bind(current.as_str())
                    .execute(&self.pool)
                    .await?;
            if result.rows_affected() == 0 {
                debug!(tournament = %id, "Status changed concurrently, re-reading");
                return Ok(self
                    .get_tournament(id)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?
                    .status);
            }
        }
        Ok(next)
    }

    pub async fn set_pick_deadline(
        &self,
        id: TournamentId,
        deadline: Option<NaiveDateTime>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tournaments SET pick_deadline = ? WHERE id = ?")
            .bind(deadline.map(format_naive))
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
