//! Resolved pick outcomes and the season usage ledger rows they produce.

use crate::domain::{GolferId, Money, PickId, PickRole, Season, TournamentId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Post-tournament usage status of one of a pick's golfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Locked for the rest of the season.
    Used,
    /// Never activated; still available.
    Unused,
    /// Activated slot was given up because of an early withdrawal.
    ReturnedToPool,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Used => "used",
            Disposition::Unused => "unused",
            Disposition::ReturnedToPool => "returned_to_pool",
        }
    }

    pub fn is_used(&self) -> bool {
        matches!(self, Disposition::Used)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Disposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "used" => Ok(Disposition::Used),
            "unused" => Ok(Disposition::Unused),
            "returned_to_pool" => Ok(Disposition::ReturnedToPool),
            other => Err(format!("unknown disposition: {}", other)),
        }
    }
}

/// Output of the pick resolver for a single pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub active_golfer: GolferId,
    pub active_role: PickRole,
    /// Earnings of the active golfer before the multiplier; `None` when the
    /// active golfer scored nothing by rule or had no earnings figure.
    pub raw_earnings: Option<Money>,
    pub points: Money,
    /// The active golfer counted for money but had no usable earnings entry.
    pub earnings_missing: bool,
    pub primary_disposition: Disposition,
    pub backup_disposition: Disposition,
}

impl Resolution {
    pub fn disposition(&self, role: PickRole) -> Disposition {
        match role {
            PickRole::Primary => self.primary_disposition,
            PickRole::Backup => self.backup_disposition,
        }
    }
}

/// Persisted, per-pick resolved outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResult {
    pub pick_id: PickId,
    pub tournament_id: TournamentId,
    pub user_id: UserId,
    pub primary_golfer: GolferId,
    pub backup_golfer: GolferId,
    pub active_golfer: GolferId,
    pub active_role: PickRole,
    pub raw_earnings: Option<Money>,
    pub points: Money,
    pub earnings_missing: bool,
    pub primary_disposition: Disposition,
    pub backup_disposition: Disposition,
}

/// One "used" row of the season usage ledger.
///
/// Ordering is (user, golfer, season, tournament) so sets of rows iterate
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonPlayerUsage {
    pub user_id: UserId,
    pub golfer_id: GolferId,
    pub season: Season,
    pub tournament_id: TournamentId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_strings() {
        for d in [
            Disposition::Used,
            Disposition::Unused,
            Disposition::ReturnedToPool,
        ] {
            assert_eq!(d.as_str().parse::<Disposition>().unwrap(), d);
        }
        assert_eq!(
            serde_json::to_string(&Disposition::ReturnedToPool).unwrap(),
            "\"returned_to_pool\""
        );
    }

    #[test]
    fn test_usage_ordering_is_by_user_then_golfer() {
        let a = SeasonPlayerUsage {
            user_id: UserId::new(1),
            golfer_id: GolferId::new(9),
            season: Season::new(2026),
            tournament_id: TournamentId::new(5),
        };
        let b = SeasonPlayerUsage {
            user_id: UserId::new(2),
            golfer_id: GolferId::new(1),
            season: Season::new(2026),
            tournament_id: TournamentId::new(1),
        };
        assert!(a < b);
    }
}
