//! Repository layer for database operations.
//!
//! Methods are organized across submodules by domain:
//! - `tournaments.rs` - Schedule and tournament status operations
//! - `field.rs` - Golfers, field entries, live leaderboard, final earnings
//! - `picks.rs` - Pick reads and the season's used golfers
//! - `locked.rs` - `TournamentTx`, the write-locked per-tournament transaction
//! - `standings.rs` - Results, usage, and standings reads

mod field;
mod locked;
mod picks;
mod standings;
mod tournaments;

pub use field::{FieldRowUpdate, FinalResultRow, GolferUpsert};
pub use locked::TournamentTx;
pub use standings::StandingRow;
pub use tournaments::ScheduleUpsert;

use crate::domain::league_time::parse_naive;
use crate::domain::{
    Disposition, FieldEntry, Golfer, GolferId, Money, Pick, PickId, PickRole, Season,
    SeasonPlayerUsage, TimeMs, Tournament, TournamentFormat, TournamentId, TournamentResult,
    TournamentStatus, UserId, Withdrawal,
};
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

/// A league member.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: UserId,
    pub display_name: String,
    pub email: Option<String>,
}

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Connectivity check for the readiness endpoint.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // User operations
    // =========================================================================

    /// Create a league member.
    ///
    /// # Errors
    /// Returns an error if the insert fails (e.g. duplicate email).
    pub async fn insert_user(
        &self,
        display_name: &str,
        email: Option<&str>,
    ) -> Result<UserId, sqlx::Error> {
        let result = sqlx::query("INSERT INTO users (display_name, email) VALUES (?, ?)")
            .bind(display_name)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(UserId::new(result.last_insert_rowid()))
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<UserRow>, sqlx::Error> {
        let row = sqlx::query("SELECT id, display_name, email FROM users WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>, sqlx::Error> {
        let rows = sqlx::query("SELECT id, display_name, email FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }
}

// =============================================================================
// Row decoding shared by the submodules
// =============================================================================

pub(crate) const TOURNAMENT_COLUMNS: &str = "id, api_tourn_id, season_year, name, start_date, \
     end_date, pick_deadline, purse, format, status, final_confirmed, results_finalized, \
     results_digest, week_number";

pub(crate) const PICK_COLUMNS: &str =
    "id, user_id, tournament_id, primary_golfer_id, backup_golfer_id, submitted_at_ms";

pub(crate) const FIELD_COLUMNS: &str = "tournament_id, golfer_id, status, wd_rounds_completed, \
     rounds_completed, position, projected_earnings, tee_time";

pub(crate) const RESULT_COLUMNS: &str = "pick_id, tournament_id, user_id, primary_golfer_id, \
     backup_golfer_id, active_golfer_id, active_role, raw_earnings, points, earnings_missing, \
     primary_disposition, backup_disposition";

/// Parse an enum-like text column, surfacing failures as decode errors.
fn decode_column<T>(column: &str, raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.into(),
    })
}

fn decode_naive(column: &str, raw: &str) -> Result<NaiveDateTime, sqlx::Error> {
    parse_naive(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn decode_rounds(value: Option<i64>) -> Option<u8> {
    value.and_then(|v| u8::try_from(v).ok())
}

/// Parse a stored money column, logging and dropping unparseable values.
fn decode_money(column: &str, raw: Option<String>) -> Option<Money> {
    raw.and_then(|s| match Money::from_str_canonical(&s) {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(column = column, value = %s, error = %e, "Failed to parse stored amount, ignoring");
            None
        }
    })
}

pub(crate) fn user_from_row(row: &SqliteRow) -> UserRow {
    UserRow {
        id: UserId::new(row.get("id")),
        display_name: row.get("display_name"),
        email: row.get("email"),
    }
}

pub(crate) fn tournament_from_row(row: &SqliteRow) -> Result<Tournament, sqlx::Error> {
    let format: String = row.get("format");
    let status: String = row.get("status");
    let start: String = row.get("start_date");
    let end: String = row.get("end_date");
    let deadline: Option<String> = row.get("pick_deadline");

    Ok(Tournament {
        id: TournamentId::new(row.get("id")),
        api_tourn_id: row.get("api_tourn_id"),
        season: Season::new(row.get("season_year")),
        name: row.get("name"),
        start_date: decode_naive("start_date", &start)?,
        end_date: decode_naive("end_date", &end)?,
        pick_deadline: deadline
            .map(|d| decode_naive("pick_deadline", &d))
            .transpose()?,
        purse: row.get("purse"),
        format: decode_column::<TournamentFormat>("format", &format)?,
        status: decode_column::<TournamentStatus>("status", &status)?,
        final_confirmed: row.get("final_confirmed"),
        results_finalized: row.get("results_finalized"),
        results_digest: row.get("results_digest"),
        week_number: row.get("week_number"),
    })
}

pub(crate) fn golfer_from_row(row: &SqliteRow) -> Golfer {
    Golfer {
        id: GolferId::new(row.get("id")),
        api_player_id: row.get("api_player_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_amateur: row.get("is_amateur"),
    }
}

pub(crate) fn field_entry_from_row(row: &SqliteRow) -> Result<FieldEntry, sqlx::Error> {
    let status: String = row.get("status");
    let withdrawn = match status.as_str() {
        "active" => false,
        "withdrawn" => true,
        other => {
            return Err(sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: format!("unknown field status: {}", other).into(),
            })
        }
    };
    let tee_time: Option<String> = row.get("tee_time");

    Ok(FieldEntry {
        tournament_id: TournamentId::new(row.get("tournament_id")),
        golfer_id: GolferId::new(row.get("golfer_id")),
        withdrawal: Withdrawal::from_feed(withdrawn, decode_rounds(row.get("wd_rounds_completed"))),
        rounds_completed: decode_rounds(row.get("rounds_completed")),
        position: row.get("position"),
        projected_earnings: decode_money("projected_earnings", row.get("projected_earnings")),
        tee_time: tee_time.map(|t| decode_naive("tee_time", &t)).transpose()?,
    })
}

pub(crate) fn pick_from_row(row: &SqliteRow) -> Pick {
    Pick {
        id: PickId::new(row.get("id")),
        user_id: UserId::new(row.get("user_id")),
        tournament_id: TournamentId::new(row.get("tournament_id")),
        primary: GolferId::new(row.get("primary_golfer_id")),
        backup: GolferId::new(row.get("backup_golfer_id")),
        submitted_at: TimeMs::new(row.get("submitted_at_ms")),
    }
}

pub(crate) fn usage_from_row(row: &SqliteRow) -> SeasonPlayerUsage {
    SeasonPlayerUsage {
        user_id: UserId::new(row.get("user_id")),
        golfer_id: GolferId::new(row.get("golfer_id")),
        season: Season::new(row.get("season_year")),
        tournament_id: TournamentId::new(row.get("tournament_id")),
    }
}

pub(crate) fn result_from_row(row: &SqliteRow) -> Result<TournamentResult, sqlx::Error> {
    let role: String = row.get("active_role");
    let primary: String = row.get("primary_disposition");
    let backup: String = row.get("backup_disposition");
    let points: String = row.get("points");

    Ok(TournamentResult {
        pick_id: PickId::new(row.get("pick_id")),
        tournament_id: TournamentId::new(row.get("tournament_id")),
        user_id: UserId::new(row.get("user_id")),
        primary_golfer: GolferId::new(row.get("primary_golfer_id")),
        backup_golfer: GolferId::new(row.get("backup_golfer_id")),
        active_golfer: GolferId::new(row.get("active_golfer_id")),
        active_role: decode_column::<PickRole>("active_role", &role)?,
        raw_earnings: decode_money("raw_earnings", row.get("raw_earnings")),
        points: Money::from_str_canonical(&points).map_err(|e| sqlx::Error::ColumnDecode {
            index: "points".to_string(),
            source: Box::new(e),
        })?,
        earnings_missing: row.get("earnings_missing"),
        primary_disposition: decode_column::<Disposition>("primary_disposition", &primary)?,
        backup_disposition: decode_column::<Disposition>("backup_disposition", &backup)?,
    })
}
