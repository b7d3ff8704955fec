//! Tournament record, format flag, and forward-only status.

use crate::domain::{Season, TournamentId};
use chrono::NaiveDateTime;
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scoring format of a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    Standard,
    /// Two-player team event; each partner earns half the team prize.
    Team,
    Major,
    /// Played the same week as a full-field event; not part of the league.
    OppositeField,
    /// Season finale with a non-prize-money payout; not part of the league.
    TourChampionship,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::Standard => "standard",
            TournamentFormat::Team => "team",
            TournamentFormat::Major => "major",
            TournamentFormat::OppositeField => "opposite_field",
            TournamentFormat::TourChampionship => "tour_championship",
        }
    }

    /// Whether picks and resolution apply to this tournament at all.
    pub fn is_scored(&self) -> bool {
        self.multiplier().is_some()
    }

    /// Earnings multiplier applied to the active golfer, `None` when the
    /// tournament is excluded from scoring.
    pub fn multiplier(&self) -> Option<RustDecimal> {
        match self {
            TournamentFormat::Standard => Some(RustDecimal::ONE),
            TournamentFormat::Team => Some(RustDecimal::new(5, 1)),
            TournamentFormat::Major => Some(RustDecimal::new(15, 1)),
            TournamentFormat::OppositeField | TournamentFormat::TourChampionship => None,
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(TournamentFormat::Standard),
            "team" => Ok(TournamentFormat::Team),
            "major" => Ok(TournamentFormat::Major),
            "opposite_field" => Ok(TournamentFormat::OppositeField),
            "tour_championship" => Ok(TournamentFormat::TourChampionship),
            other => Err(format!("unknown tournament format: {}", other)),
        }
    }
}

/// Lifecycle status. Ordered: a status may only be replaced by a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Upcoming,
    Active,
    Complete,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Active => "active",
            TournamentStatus::Complete => "complete",
        }
    }

    /// Staying put or moving forward is allowed, never backwards.
    pub fn can_transition_to(&self, next: TournamentStatus) -> bool {
        next >= *self
    }

    /// Apply a proposed transition, keeping the current status if the
    /// proposal would move backwards.
    pub fn advance(self, proposed: TournamentStatus) -> TournamentStatus {
        if self.can_transition_to(proposed) {
            proposed
        } else {
            self
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(TournamentStatus::Upcoming),
            "active" => Ok(TournamentStatus::Active),
            "complete" => Ok(TournamentStatus::Complete),
            other => Err(format!("unknown tournament status: {}", other)),
        }
    }
}

/// A tour event in one league season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    /// Data provider tournament id (unique per season).
    pub api_tourn_id: String,
    pub season: Season,
    pub name: String,
    /// League-local naive start/end.
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    /// League-local naive first tee time; `None` until the field is synced.
    pub pick_deadline: Option<NaiveDateTime>,
    pub purse: i64,
    pub format: TournamentFormat,
    pub status: TournamentStatus,
    /// The data source reported the event complete/official and final
    /// earnings have been stored.
    pub final_confirmed: bool,
    pub results_finalized: bool,
    pub results_digest: Option<String>,
    pub week_number: Option<i32>,
}

impl Tournament {
    pub fn is_scored(&self) -> bool {
        self.format.is_scored()
    }

    /// Ready for reconciliation: underway or complete, with official results.
    pub fn ready_for_reconcile(&self) -> bool {
        self.status >= TournamentStatus::Active && self.final_confirmed
    }
}
