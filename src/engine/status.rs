//! Tournament status derivation for the ingestion side.
//!
//! Sync may only move a tournament from `upcoming` to `active`. Completion
//! is set by the reconciler once official results are stored.

use crate::domain::TournamentStatus;
use chrono::NaiveDateTime;

/// Data source status indicates official final results.
pub fn is_final_hint(hint: &str) -> bool {
    let hint = hint.to_lowercase();
    hint.contains("complete") || hint.contains("official")
}

/// Data source status indicates play is underway (or finished).
pub fn is_live_hint(hint: &str) -> bool {
    let hint = hint.to_lowercase();
    hint.contains("progress") || hint.contains("live") || is_final_hint(&hint)
}

/// Status proposed by sync, applied forward-only to `current`.
pub fn derive_status(
    current: TournamentStatus,
    hint: Option<&str>,
    start: NaiveDateTime,
    now_local: NaiveDateTime,
) -> TournamentStatus {
    let underway = hint.map(is_live_hint).unwrap_or(false) || now_local >= start;
    let proposed = if underway {
        TournamentStatus::Active
    } else {
        TournamentStatus::Upcoming
    };
    current.advance(proposed)
}
