//! A user's primary + backup selection for one tournament.

use crate::domain::{GolferId, PickId, TimeMs, TournamentId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickRole {
    Primary,
    Backup,
}

impl PickRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickRole::Primary => "primary",
            PickRole::Backup => "backup",
        }
    }
}

impl fmt::Display for PickRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PickRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(PickRole::Primary),
            "backup" => Ok(PickRole::Backup),
            other => Err(format!("unknown pick role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub id: PickId,
    pub user_id: UserId,
    pub tournament_id: TournamentId,
    pub primary: GolferId,
    pub backup: GolferId,
    pub submitted_at: TimeMs,
}

impl Pick {
    pub fn golfer(&self, role: PickRole) -> GolferId {
        match role {
            PickRole::Primary => self.primary,
            PickRole::Backup => self.backup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golfer_by_role() {
        let pick = Pick {
            id: PickId::new(1),
            user_id: UserId::new(1),
            tournament_id: TournamentId::new(1),
            primary: GolferId::new(10),
            backup: GolferId::new(20),
            submitted_at: TimeMs::new(0),
        };
        assert_eq!(pick.golfer(PickRole::Primary), GolferId::new(10));
        assert_eq!(pick.golfer(PickRole::Backup), GolferId::new(20));
    }

    #[test]
    fn test_role_strings() {
        assert_eq!("backup".parse::<PickRole>().unwrap(), PickRole::Backup);
        assert_eq!(PickRole::Primary.to_string(), "primary");
        assert!("alternate".parse::<PickRole>().is_err());
    }
}
