#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use fairway::db::init_db;
use fairway::db::repo::{FinalResultRow, GolferUpsert};
use fairway::domain::{
    GolferId, Pick, Season, TimeMs, Tournament, TournamentFormat, TournamentId,
    TournamentStatus, UserId,
};
use fairway::Repository;
use std::sync::Arc;
use tempfile::TempDir;

pub const SEASON: i32 = 2026;

pub async fn setup_repo() -> (Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    (Arc::new(Repository::new(pool)), temp_dir)
}

pub fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Upcoming tournament starting Thursday 2026-01-15 plus `week` weeks, with
/// a 07:00 pick deadline on the start date.
pub fn tournament(api_tourn_id: &str, format: TournamentFormat, week: i64) -> Tournament {
    let offset = Duration::weeks(week);
    Tournament {
        id: TournamentId::new(0),
        api_tourn_id: api_tourn_id.to_string(),
        season: Season::new(SEASON),
        name: format!("Event {}", api_tourn_id),
        start_date: naive(2026, 1, 15, 0, 0) + offset,
        end_date: naive(2026, 1, 18, 23, 59) + Duration::seconds(59) + offset,
        pick_deadline: Some(naive(2026, 1, 15, 7, 0) + offset),
        purse: 10_000_000,
        format,
        status: TournamentStatus::Upcoming,
        final_confirmed: false,
        results_finalized: false,
        results_digest: None,
        week_number: Some(week as i32 + 2),
    }
}

pub fn golfer(api_player_id: &str, first_name: &str, last_name: &str) -> GolferUpsert {
    GolferUpsert {
        api_player_id: api_player_id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        is_amateur: false,
    }
}

/// Add golfers to the tournament field and return their local ids in input
/// order.
pub async fn seed_field(
    repo: &Repository,
    tournament_id: TournamentId,
    golfers: &[GolferUpsert],
) -> Vec<GolferId> {
    let entries: Vec<(GolferUpsert, Option<NaiveDateTime>)> =
        golfers.iter().cloned().map(|g| (g, None)).collect();
    repo.sync_field(tournament_id, &entries).await.unwrap();

    let mut ids = Vec::new();
    for g in golfers {
        ids.push(repo.upsert_golfer(g).await.unwrap());
    }
    ids
}

/// Store a pick directly, skipping submission checks.
pub async fn place_pick(
    repo: &Repository,
    user_id: UserId,
    tournament_id: TournamentId,
    primary: GolferId,
    backup: GolferId,
) -> Pick {
    let mut tx = repo.lock_tournament(tournament_id).await.unwrap().unwrap();
    let pick = tx
        .upsert_pick(user_id, primary, backup, TimeMs::new(1_768_000_000_000))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    pick
}

pub fn earned(api_player_id: &str, amount: &str) -> FinalResultRow {
    FinalResultRow {
        api_player_id: api_player_id.to_string(),
        earnings_raw: Some(amount.to_string()),
        withdrawn: false,
        rounds_completed: Some(4),
        position: None,
    }
}

pub fn no_earnings(api_player_id: &str) -> FinalResultRow {
    FinalResultRow {
        api_player_id: api_player_id.to_string(),
        earnings_raw: None,
        withdrawn: false,
        rounds_completed: Some(2),
        position: Some("CUT".to_string()),
    }
}

pub fn withdrew(api_player_id: &str, rounds_completed: u8) -> FinalResultRow {
    FinalResultRow {
        api_player_id: api_player_id.to_string(),
        earnings_raw: None,
        withdrawn: true,
        rounds_completed: Some(rounds_completed),
        position: Some("WD".to_string()),
    }
}

/// Move the tournament underway and store official results.
pub async fn finalize(repo: &Repository, tournament_id: TournamentId, rows: &[FinalResultRow]) {
    repo.advance_status(tournament_id, TournamentStatus::Active)
        .await
        .unwrap();
    repo.store_final_results(tournament_id, rows).await.unwrap();
}
