//! The write-locked per-tournament transaction.
//!
//! `Repository::lock_tournament` opens a transaction whose first statement is
//! a no-op UPDATE on the tournament row. That takes SQLite's write lock before
//! anything is read, so every read inside the transaction sees a state no
//! other writer can change until commit or rollback. Dropping a
//! `TournamentTx` without committing rolls it back.

use crate::domain::{
    FieldEntry, Golfer, GolferId, Pick, PickId, Season, SeasonPlayerUsage, TimeMs, Tournament,
    TournamentId, TournamentResult, TournamentStatus, UserId,
};
use crate::engine::UsageDiff;
use sqlx::{Row, Sqlite, Transaction};
use std::collections::BTreeSet;

use super::{
    field_entry_from_row, golfer_from_row, pick_from_row, tournament_from_row, usage_from_row,
    Repository, FIELD_COLUMNS, PICK_COLUMNS, TOURNAMENT_COLUMNS,
};

pub struct TournamentTx {
    tx: Transaction<'static, Sqlite>,
    tournament_id: TournamentId,
}

impl Repository {
    /// Begin a transaction holding the write lock on one tournament.
    ///
    /// Returns `None` (after rolling back) when the tournament does not exist.
    ///
    /// # Errors
    /// Returns an error if the transaction cannot begin or the lock cannot be
    /// taken within the busy timeout.
    pub async fn lock_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<TournamentTx>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("UPDATE tournaments SET status = status WHERE id = ?")
            .bind(tournament_id.as_i64())
            .execute(&mut *tx)
            .await?;

        if locked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        Ok(Some(TournamentTx { tx, tournament_id }))
    }
}

impl TournamentTx {
    pub async fn tournament(&mut self) -> Result<Tournament, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tournaments WHERE id = ?",
            TOURNAMENT_COLUMNS
        ))
        .bind(self.tournament_id.as_i64())
        .fetch_one(&mut *self.tx)
        .await?;

        tournament_from_row(&row)
    }

    pub async fn picks(&mut self) -> Result<Vec<Pick>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM picks WHERE tournament_id = ? ORDER BY id ASC",
            PICK_COLUMNS
        ))
        .bind(self.tournament_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.iter().map(pick_from_row).collect())
    }

    pub async fn field(&mut self) -> Result<Vec<FieldEntry>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tournament_field WHERE tournament_id = ? ORDER BY golfer_id ASC",
            FIELD_COLUMNS
        ))
        .bind(self.tournament_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(field_entry_from_row).collect()
    }

    /// Golfer records for the given ids.
    pub async fn golfers(&mut self, ids: &[GolferId]) -> Result<Vec<Golfer>, sqlx::Error> {
        let mut golfers = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query(
                "SELECT id, api_player_id, first_name, last_name, is_amateur FROM golfers WHERE id = ?",
            )
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
            if let Some(row) = row {
                golfers.push(golfer_from_row(&row));
            }
        }
        Ok(golfers)
    }

    /// Verbatim final earnings text by golfer.
    pub async fn earnings(&mut self) -> Result<Vec<(GolferId, String)>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT golfer_id, earnings_raw FROM golfer_earnings WHERE tournament_id = ? ORDER BY golfer_id ASC",
        )
        .bind(self.tournament_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (GolferId::new(r.get("golfer_id")), r.get("earnings_raw")))
            .collect())
    }

    /// Usage rows currently attributed to this tournament.
    pub async fn usage(&mut self) -> Result<BTreeSet<SeasonPlayerUsage>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT user_id, golfer_id, season_year, tournament_id FROM season_player_usage WHERE tournament_id = ?",
        )
        .bind(self.tournament_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.iter().map(usage_from_row).collect())
    }

    /// Usage rows of the season attributed to any other tournament.
    pub async fn usage_elsewhere(
        &mut self,
        season: Season,
    ) -> Result<Vec<SeasonPlayerUsage>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, golfer_id, season_year, tournament_id
            FROM season_player_usage
            WHERE season_year = ? AND tournament_id != ?
            ORDER BY user_id ASC, golfer_id ASC
            "#,
        )
        .bind(season.year())
        .bind(self.tournament_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.iter().map(usage_from_row).collect())
    }

    /// Golfers the user has used this season.
    pub async fn used_golfers(
        &mut self,
        user_id: UserId,
        season: Season,
    ) -> Result<BTreeSet<GolferId>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT golfer_id FROM season_player_usage WHERE user_id = ? AND season_year = ?",
        )
        .bind(user_id.as_i64())
        .bind(season.year())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .iter()
            .map(|r| GolferId::new(r.get("golfer_id")))
            .collect())
    }

    /// Apply removals before insertions so a key moving between golfers of
    /// the same user never collides with itself.
    pub async fn apply_usage_diff(&mut self, diff: &UsageDiff) -> Result<(), sqlx::Error> {
        for row in &diff.remove {
            sqlx::query(
                r#"
                DELETE FROM season_player_usage
                WHERE user_id = ? AND golfer_id = ? AND season_year = ? AND tournament_id = ?
                "#,
            )
            .bind(row.user_id.as_i64())
            .bind(row.golfer_id.as_i64())
            .bind(row.season.year())
            .bind(row.tournament_id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        }

        for row in &diff.insert {
            sqlx::query(
                r#"
                INSERT INTO season_player_usage (user_id, golfer_id, season_year, tournament_id)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(row.user_id.as_i64())
            .bind(row.golfer_id.as_i64())
            .bind(row.season.year())
            .bind(row.tournament_id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(())
    }

    /// Replace this tournament's results with `results`.
    pub async fn replace_results(
        &mut self,
        results: &[TournamentResult],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM tournament_results WHERE tournament_id = ?")
            .bind(self.tournament_id.as_i64())
            .execute(&mut *self.tx)
            .await?;

        for r in results {
            sqlx::query(
                r#"
                INSERT INTO tournament_results (
                    pick_id, tournament_id, user_id, primary_golfer_id, backup_golfer_id,
                    active_golfer_id, active_role, raw_earnings, points, earnings_missing,
                    primary_disposition, backup_disposition
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(r.pick_id.as_i64())
            .bind(r.tournament_id.as_i64())
            .bind(r.user_id.as_i64())
            .bind(r.primary_golfer.as_i64())
            .bind(r.backup_golfer.as_i64())
            .bind(r.active_golfer.as_i64())
            .bind(r.active_role.as_str())
            .bind(r.raw_earnings.map(|m| m.to_canonical_string()))
            .bind(r.points.to_canonical_string())
            .bind(r.earnings_missing)
            .bind(r.primary_disposition.as_str())
            .bind(r.backup_disposition.as_str())
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(())
    }

    /// Mark the tournament complete and finalized with the given digest.
    pub async fn mark_reconciled(&mut self, digest: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE tournaments
            SET status = ?, results_finalized = 1, results_digest = ?
            WHERE id = ?
            "#,
        )
        .bind(TournamentStatus::Complete.as_str())
        .bind(digest)
        .bind(self.tournament_id.as_i64())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Insert or replace the user's pick for this tournament. The pick keeps
    /// its id across resubmissions.
    pub async fn upsert_pick(
        &mut self,
        user_id: UserId,
        primary: GolferId,
        backup: GolferId,
        submitted_at: TimeMs,
    ) -> Result<Pick, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO picks (user_id, tournament_id, primary_golfer_id, backup_golfer_id, submitted_at_ms)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, tournament_id) DO UPDATE SET
                primary_golfer_id = excluded.primary_golfer_id,
                backup_golfer_id = excluded.backup_golfer_id,
                submitted_at_ms = excluded.submitted_at_ms
            "#,
        )
        .bind(user_id.as_i64())
        .bind(self.tournament_id.as_i64())
        .bind(primary.as_i64())
        .bind(backup.as_i64())
        .bind(submitted_at.as_ms())
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query("SELECT id FROM picks WHERE user_id = ? AND tournament_id = ?")
            .bind(user_id.as_i64())
            .bind(self.tournament_id.as_i64())
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(Pick {
            id: PickId::new(row.get("id")),
            user_id,
            tournament_id: self.tournament_id,
            primary,
            backup,
            submitted_at,
        })
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

