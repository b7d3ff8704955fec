//! Workflows that combine the data source, the repository and the engine.

pub mod locks;
pub mod reconcile;
pub mod submission;
pub mod sync;

pub use locks::TournamentLocks;
pub use reconcile::{
    Inconsistency, MissingEarnings, PendingSummary, ReconcileError, ReconcileReport,
    ResultsReconciler,
};
pub use submission::{PickSubmitter, SubmissionError, Violation};
pub use sync::{RunMode, SyncError, SyncReport, SyncSettings, TournamentSync};
