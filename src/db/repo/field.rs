//! Golfer, field entry, live leaderboard, and final earnings operations.

use crate::domain::league_time::format_naive;
use crate::domain::{FieldEntry, Golfer, GolferId, Money, TournamentId};
use chrono::NaiveDateTime;
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use super::{field_entry_from_row, golfer_from_row, Repository, FIELD_COLUMNS};

/// Golfer identity as reported by the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GolferUpsert {
    pub api_player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub is_amateur: bool,
}

/// Live leaderboard state for one golfer. `None` fields keep the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRowUpdate {
    pub api_player_id: String,
    pub withdrawn: bool,
    pub rounds_completed: Option<u8>,
    pub position: Option<String>,
    pub projected_earnings: Option<Money>,
}

/// Final state of one golfer once the event is official.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalResultRow {
    pub api_player_id: String,
    /// Verbatim earnings text; `None` when the feed had no entry.
    pub earnings_raw: Option<String>,
    pub withdrawn: bool,
    pub rounds_completed: Option<u8>,
    pub position: Option<String>,
}

async fn upsert_golfer_tx(
    tx: &mut Transaction<'_, Sqlite>,
    golfer: &GolferUpsert,
) -> Result<GolferId, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO golfers (api_player_id, first_name, last_name, is_amateur)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(api_player_id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            is_amateur = excluded.is_amateur
        "#,
    )
    .bind(&golfer.api_player_id)
    .bind(&golfer.first_name)
    .bind(&golfer.last_name)
    .bind(golfer.is_amateur)
    .execute(&mut **tx)
    .await?;

    let row = sqlx::query("SELECT id FROM golfers WHERE api_player_id = ?")
        .bind(&golfer.api_player_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(GolferId::new(row.get("id")))
}

async fn golfer_id_tx(
    tx: &mut Transaction<'_, Sqlite>,
    api_player_id: &str,
) -> Result<Option<GolferId>, sqlx::Error> {
    let row = sqlx::query("SELECT id FROM golfers WHERE api_player_id = ?")
        .bind(api_player_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.map(|r| GolferId::new(r.get("id"))))
}

fn field_status(withdrawn: bool) -> &'static str {
    if withdrawn {
        "withdrawn"
    } else {
        "active"
    }
}

impl Repository {
    // =========================================================================
    // Golfers
    // =========================================================================

    /// Insert or refresh a golfer by provider id.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn upsert_golfer(&self, golfer: &GolferUpsert) -> Result<GolferId, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let id = upsert_golfer_tx(&mut tx, golfer).await?;
        tx.commit().await?;
        Ok(id)
    }

    pub async fn get_golfer(&self, id: GolferId) -> Result<Option<Golfer>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, api_player_id, first_name, last_name, is_amateur FROM golfers WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| golfer_from_row(&r)))
    }

    // =========================================================================
    // Field
    // =========================================================================

    /// Add golfers to a tournament field (amateurs included, flagged on the
    /// golfer row) and record first-round tee times.
    ///
    /// Returns the number of golfers newly added to the field.
    ///
    /// # Errors
    /// Returns an error if the transaction fails. Nothing is written then.
    pub async fn sync_field(
        &self,
        tournament_id: TournamentId,
        entries: &[(GolferUpsert, Option<NaiveDateTime>)],
    ) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut added = 0usize;

        for (golfer, tee_time) in entries {
            let golfer_id = upsert_golfer_tx(&mut tx, golfer).await?;
            let already_in_field = sqlx::query(
                "SELECT 1 FROM tournament_field WHERE tournament_id = ? AND golfer_id = ?",
            )
            .bind(tournament_id.as_i64())
            .bind(golfer_id.as_i64())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

            sqlx::query(
                r#"
                INSERT INTO tournament_field (tournament_id, golfer_id, tee_time)
                VALUES (?, ?, ?)
                ON CONFLICT(tournament_id, golfer_id) DO UPDATE SET
                    tee_time = COALESCE(excluded.tee_time, tee_time)
                "#,
            )
            .bind(tournament_id.as_i64())
            .bind(golfer_id.as_i64())
            .bind(tee_time.map(format_naive))
            .execute(&mut *tx)
            .await?;

            if !already_in_field {
                added += 1;
            }
        }

        tx.commit().await?;
        debug!(tournament = %tournament_id, added, "Field synced");
        Ok(added)
    }

    /// Apply live leaderboard rows. Golfers unknown to the league are
    /// skipped; known golfers missing from the field are added.
    ///
    /// Returns the number of rows applied.
    pub async fn apply_field_updates(
        &self,
        tournament_id: TournamentId,
        updates: &[FieldRowUpdate],
    ) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut applied = 0usize;

        for update in updates {
            let Some(golfer_id) = golfer_id_tx(&mut tx, &update.api_player_id).await? else {
                continue;
            };
            let wd_rounds = if update.withdrawn {
                Some(update.rounds_completed.unwrap_or(0))
            } else {
                None
            };

            sqlx::query(
                r#"
                INSERT INTO tournament_field (
                    tournament_id, golfer_id, status, wd_rounds_completed,
                    rounds_completed, position, projected_earnings
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(tournament_id, golfer_id) DO UPDATE SET
                    status = excluded.status,
                    wd_rounds_completed = excluded.wd_rounds_completed,
                    rounds_completed = COALESCE(excluded.rounds_completed, rounds_completed),
                    position = COALESCE(excluded.position, position),
                    projected_earnings = COALESCE(excluded.projected_earnings, projected_earnings)
                "#,
            )
            .bind(tournament_id.as_i64())
            .bind(golfer_id.as_i64())
            .bind(field_status(update.withdrawn))
            .bind(wd_rounds.map(i64::from))
            .bind(update.rounds_completed.map(i64::from))
            .bind(update.position.as_deref())
            .bind(update.projected_earnings.map(|m| m.to_canonical_string()))
            .execute(&mut *tx)
            .await?;
            applied += 1;
        }

        tx.commit().await?;
        Ok(applied)
    }

    /// Store official final earnings and withdrawal state, then mark the
    /// tournament `final_confirmed`, all in one transaction. Earnings rows
    /// from earlier runs are replaced wholesale.
    ///
    /// Returns the number of golfers with stored earnings.
    pub async fn store_final_results(
        &self,
        tournament_id: TournamentId,
        rows: &[FinalResultRow],
    ) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM golfer_earnings WHERE tournament_id = ?")
            .bind(tournament_id.as_i64())
            .execute(&mut *tx)
            .await?;

        let mut stored = 0usize;
        for row in rows {
            let Some(golfer_id) = golfer_id_tx(&mut tx, &row.api_player_id).await? else {
                debug!(player = %row.api_player_id, "Skipping result for unknown golfer");
                continue;
            };

            if let Some(raw) = &row.earnings_raw {
                sqlx::query(
                    r#"
                    INSERT INTO golfer_earnings (tournament_id, golfer_id, earnings_raw, final_position)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(tournament_id.as_i64())
                .bind(golfer_id.as_i64())
                .bind(raw)
                .bind(row.position.as_deref())
                .execute(&mut *tx)
                .await?;
                stored += 1;
            }

            let wd_rounds = if row.withdrawn {
                Some(i64::from(row.rounds_completed.unwrap_or(0)))
            } else {
                None
            };
            sqlx::query(
                r#"
                UPDATE tournament_field
                SET status = ?,
                    wd_rounds_completed = ?,
                    rounds_completed = COALESCE(?, rounds_completed),
                    position = COALESCE(?, position)
                WHERE tournament_id = ? AND golfer_id = ?
                "#,
            )
            .bind(field_status(row.withdrawn))
            .bind(wd_rounds)
            .bind(row.rounds_completed.map(i64::from))
            .bind(row.position.as_deref())
            .bind(tournament_id.as_i64())
            .bind(golfer_id.as_i64())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE tournaments SET final_confirmed = 1 WHERE id = ?")
            .bind(tournament_id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(stored)
    }

    pub async fn list_field(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<FieldEntry>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tournament_field WHERE tournament_id = ? ORDER BY golfer_id ASC",
            FIELD_COLUMNS
        ))
        .bind(tournament_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(field_entry_from_row).collect()
    }

    /// Field entries joined with their golfers, ordered by surname.
    pub async fn list_field_with_golfers(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<(FieldEntry, Golfer)>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT f.tournament_id, f.golfer_id, f.status, f.wd_rounds_completed,
                   f.rounds_completed, f.position, f.projected_earnings, f.tee_time,
                   g.id, g.api_player_id, g.first_name, g.last_name, g.is_amateur
            FROM tournament_field f
            JOIN golfers g ON g.id = f.golfer_id
            WHERE f.tournament_id = ?
            ORDER BY g.last_name ASC, g.first_name ASC, g.id ASC
            "#,
        )
        .bind(tournament_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| Ok((field_entry_from_row(r)?, golfer_from_row(r))))
            .collect()
    }
}
