//! Domain ledger for the golf pick 'em league.
//!
//! This module provides:
//! - Identifier newtypes and Season
//! - Lossless prize money via the Money wrapper
//! - Tournament, Golfer/FieldEntry, Pick records and their invariants
//! - Resolution, TournamentResult, and SeasonPlayerUsage rows
//! - League-local time helpers

pub mod golfer;
pub mod league_time;
pub mod money;
pub mod pick;
pub mod primitives;
pub mod resolution;
pub mod tournament;

pub use golfer::{FieldEntry, Golfer, Withdrawal, BACKUP_CUTOFF_ROUNDS};
pub use money::{Money, MoneyError};
pub use pick::{Pick, PickRole};
pub use primitives::{GolferId, PickId, Season, TimeMs, TournamentId, UserId};
pub use resolution::{Disposition, Resolution, SeasonPlayerUsage, TournamentResult};
pub use tournament::{Tournament, TournamentFormat, TournamentStatus};
