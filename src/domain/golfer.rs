//! Golfers and their per-tournament field entries.

use crate::domain::{GolferId, Money, TournamentId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Rounds a golfer must complete before a withdrawal stops activating the backup.
pub const BACKUP_CUTOFF_ROUNDS: u8 = 2;

/// A tour player known to the league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Golfer {
    pub id: GolferId,
    /// Data provider player id.
    pub api_player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub is_amateur: bool,
}

impl Golfer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Withdrawal state of a golfer within one tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Withdrawal {
    Active,
    Withdrawn { rounds_completed: u8 },
}

impl Withdrawal {
    /// Build from the feed's `{withdrawn, through_round}` pair. A withdrawal
    /// with no round information counts as zero rounds completed.
    pub fn from_feed(withdrawn: bool, rounds_completed: Option<u8>) -> Self {
        if withdrawn {
            Withdrawal::Withdrawn {
                rounds_completed: rounds_completed.unwrap_or(0),
            }
        } else {
            Withdrawal::Active
        }
    }

    pub fn is_withdrawn(&self) -> bool {
        matches!(self, Withdrawal::Withdrawn { .. })
    }

    /// Withdrew strictly before completing Round 2.
    pub fn withdrew_before_cutoff(&self) -> bool {
        matches!(
            self,
            Withdrawal::Withdrawn { rounds_completed } if *rounds_completed < BACKUP_CUTOFF_ROUNDS
        )
    }
}

/// A golfer's presence in a tournament field, with live/final state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub tournament_id: TournamentId,
    pub golfer_id: GolferId,
    pub withdrawal: Withdrawal,
    /// Rounds completed so far (independent of withdrawal).
    pub rounds_completed: Option<u8>,
    pub position: Option<String>,
    /// Live projection only; never used for scoring.
    pub projected_earnings: Option<Money>,
    /// League-local first-round tee time.
    pub tee_time: Option<NaiveDateTime>,
}

impl FieldEntry {
    pub fn new(tournament_id: TournamentId, golfer_id: GolferId) -> Self {
        Self {
            tournament_id,
            golfer_id,
            withdrawal: Withdrawal::Active,
            rounds_completed: None,
            position: None,
            projected_earnings: None,
            tee_time: None,
        }
    }
}
