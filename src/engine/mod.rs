//! Pure computation: pick resolution, usage ledger diffing, projections,
//! and status/schedule classification. Nothing here touches the database or
//! the network.

pub mod ledger;
pub mod payout;
pub mod resolver;
pub mod schedule;
pub mod status;

pub use ledger::{desired_usage, diff, find_conflicts, results_digest, UsageConflict, UsageDiff};
pub use payout::projected_earnings;
pub use resolver::{classify, resolve_pick, GolferOutcome, ResolutionCase, ResolveError};
pub use schedule::{classify_format, initial_purse};
pub use status::{derive_status, is_final_hint};
