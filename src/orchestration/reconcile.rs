//! Per-tournament results reconciliation.
//!
//! Resolves every pick of a tournament, replaces its results, and rebuilds
//! its share of the season usage ledger. Everything happens inside one
//! transaction holding the tournament's write lock, so a run either lands
//! completely or not at all.

use crate::db::{Repository, TournamentTx};
use crate::domain::{
    FieldEntry, GolferId, Money, PickId, PickRole, Season, TournamentFormat, TournamentId,
    TournamentResult, TournamentStatus, UserId,
};
use crate::engine::{
    desired_usage, diff, find_conflicts, resolve_pick, results_digest, GolferOutcome,
};
use crate::orchestration::locks::TournamentLocks;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Summary of one successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub tournament_id: TournamentId,
    pub run_id: Uuid,
    pub picks_resolved: usize,
    pub usage_inserted: usize,
    pub usage_removed: usize,
    /// Picks whose active golfer had no usable earnings figure.
    pub missing_earnings: Vec<MissingEarnings>,
    pub digest: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingEarnings {
    pub pick_id: PickId,
    pub golfer_id: GolferId,
}

/// Stored data that contradicts itself; the batch is rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Inconsistency {
    #[error("{pick} in {tournament}: {role} {golfer} has no field entry")]
    MissingFieldEntry {
        tournament: TournamentId,
        pick: PickId,
        golfer: GolferId,
        role: PickRole,
    },
    #[error("{user} already used {golfer} in season {season} at {existing}, cannot record it for {tournament}")]
    UsageConflict {
        user: UserId,
        golfer: GolferId,
        season: Season,
        tournament: TournamentId,
        existing: TournamentId,
    },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{0} not found")]
    NotFound(TournamentId),
    #[error("{tournament} is not ready for reconciliation (status {status}, final_confirmed {final_confirmed})")]
    NotReady {
        tournament: TournamentId,
        status: TournamentStatus,
        final_confirmed: bool,
    },
    #[error("{tournament} is not scored ({format})")]
    Ineligible {
        tournament: TournamentId,
        format: TournamentFormat,
    },
    #[error("data inconsistency: {0}")]
    DataInconsistency(#[from] Inconsistency),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Outcome of reconciling every pending tournament of a season.
#[derive(Debug, Default)]
pub struct PendingSummary {
    pub reconciled: Vec<ReconcileReport>,
    pub failed: Vec<(TournamentId, ReconcileError)>,
}

#[derive(Clone)]
pub struct ResultsReconciler {
    repo: Arc<Repository>,
    locks: TournamentLocks,
}

impl ResultsReconciler {
    pub fn new(repo: Arc<Repository>, locks: TournamentLocks) -> Self {
        Self { repo, locks }
    }

    /// Reconcile one tournament.
    ///
    /// Re-running with unchanged inputs rewrites identical rows and yields
    /// the same digest.
    ///
    /// # Errors
    /// `NotReady` and `Ineligible` leave the database untouched; any other
    /// failure rolls back everything written by this run.
    pub async fn reconcile(
        &self,
        tournament_id: TournamentId,
    ) -> Result<ReconcileReport, ReconcileError> {
        let _guard = self.locks.acquire(tournament_id).await;
        let run_id = Uuid::new_v4();

        let mut tx = self
            .repo
            .lock_tournament(tournament_id)
            .await?
            .ok_or(ReconcileError::NotFound(tournament_id))?;

        match reconcile_locked(&mut tx, run_id).await {
            Ok(report) => {
                tx.commit().await?;
                info!(
                    tournament = %tournament_id,
                    %run_id,
                    picks = report.picks_resolved,
                    usage_inserted = report.usage_inserted,
                    usage_removed = report.usage_removed,
                    missing_earnings = report.missing_earnings.len(),
                    digest = %report.digest,
                    "Tournament reconciled"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(tournament = %tournament_id, error = %rollback_err, "Rollback failed");
                }
                warn!(tournament = %tournament_id, %run_id, error = %e, "Reconciliation aborted");
                Err(e)
            }
        }
    }

    /// Reconcile every tournament of the season with official results that
    /// has not been finalized yet. One tournament failing does not stop the
    /// others.
    ///
    /// # Errors
    /// Returns an error only if the pending list cannot be read.
    pub async fn reconcile_pending(&self, season: Season) -> Result<PendingSummary, sqlx::Error> {
        let pending = self.repo.list_pending_reconcile(season).await?;
        debug!(season = %season, count = pending.len(), "Reconciling pending tournaments");

        let mut summary = PendingSummary::default();
        for tournament in pending {
            if !tournament.is_scored() {
                debug!(tournament = %tournament.id, format = %tournament.format, "Skipping unscored tournament");
                continue;
            }
            match self.reconcile(tournament.id).await {
                Ok(report) => summary.reconciled.push(report),
                Err(e) => summary.failed.push((tournament.id, e)),
            }
        }
        Ok(summary)
    }
}

/// Parse stored earnings text. Unusable figures count as missing.
fn parse_stored_earnings(
    tournament_id: TournamentId,
    golfer_id: GolferId,
    raw: &str,
) -> Option<Money> {
    match Money::parse_earnings(raw) {
        Ok(amount) => Some(amount),
        Err(e) => {
            warn!(tournament = %tournament_id, golfer = %golfer_id, error = %e, "Unusable earnings figure, scoring zero");
            None
        }
    }
}

fn outcome_for(
    field: &HashMap<GolferId, FieldEntry>,
    earnings: &HashMap<GolferId, Option<Money>>,
    tournament: TournamentId,
    pick: PickId,
    golfer: GolferId,
    role: PickRole,
) -> Result<GolferOutcome, Inconsistency> {
    let entry = field.get(&golfer).ok_or(Inconsistency::MissingFieldEntry {
        tournament,
        pick,
        golfer,
        role,
    })?;
    Ok(GolferOutcome::new(
        entry.withdrawal,
        earnings.get(&golfer).copied().flatten(),
    ))
}

async fn reconcile_locked(
    tx: &mut TournamentTx,
    run_id: Uuid,
) -> Result<ReconcileReport, ReconcileError> {
    let tournament = tx.tournament().await?;
    let tournament_id = tournament.id;

    if !tournament.is_scored() {
        return Err(ReconcileError::Ineligible {
            tournament: tournament_id,
            format: tournament.format,
        });
    }
    if !tournament.ready_for_reconcile() {
        return Err(ReconcileError::NotReady {
            tournament: tournament_id,
            status: tournament.status,
            final_confirmed: tournament.final_confirmed,
        });
    }

    let picks = tx.picks().await?;
    let field: HashMap<GolferId, FieldEntry> = tx
        .field()
        .await?
        .into_iter()
        .map(|e| (e.golfer_id, e))
        .collect();
    let earnings: HashMap<GolferId, Option<Money>> = tx
        .earnings()
        .await?
        .into_iter()
        .map(|(golfer_id, raw)| {
            let parsed = parse_stored_earnings(tournament_id, golfer_id, &raw);
            (golfer_id, parsed)
        })
        .collect();

    debug!(
        tournament = %tournament_id,
        %run_id,
        picks = picks.len(),
        field = field.len(),
        earnings = earnings.len(),
        "Loaded reconciliation inputs"
    );

    let mut resolutions = Vec::with_capacity(picks.len());
    for pick in &picks {
        let primary = outcome_for(
            &field,
            &earnings,
            tournament_id,
            pick.id,
            pick.primary,
            PickRole::Primary,
        )?;
        let backup = outcome_for(
            &field,
            &earnings,
            tournament_id,
            pick.id,
            pick.backup,
            PickRole::Backup,
        )?;
        let resolution = resolve_pick(pick, &primary, &backup, tournament.format).map_err(|_| {
            ReconcileError::Ineligible {
                tournament: tournament_id,
                format: tournament.format,
            }
        })?;
        resolutions.push(resolution);
    }

    let mut missing_earnings = Vec::new();
    let results: Vec<TournamentResult> = picks
        .iter()
        .zip(&resolutions)
        .map(|(pick, r)| {
            if r.earnings_missing {
                warn!(tournament = %tournament_id, pick = %pick.id, golfer = %r.active_golfer, "No earnings for active golfer, scoring zero");
                missing_earnings.push(MissingEarnings {
                    pick_id: pick.id,
                    golfer_id: r.active_golfer,
                });
            }
            TournamentResult {
                pick_id: pick.id,
                tournament_id,
                user_id: pick.user_id,
                primary_golfer: pick.primary,
                backup_golfer: pick.backup,
                active_golfer: r.active_golfer,
                active_role: r.active_role,
                raw_earnings: r.raw_earnings,
                points: r.points,
                earnings_missing: r.earnings_missing,
                primary_disposition: r.primary_disposition,
                backup_disposition: r.backup_disposition,
            }
        })
        .collect();

    let desired = desired_usage(tournament.season, picks.iter().zip(&resolutions));
    let elsewhere = tx.usage_elsewhere(tournament.season).await?;
    if let Some(conflict) = find_conflicts(&desired, &elsewhere).into_iter().next() {
        return Err(Inconsistency::UsageConflict {
            user: conflict.desired.user_id,
            golfer: conflict.desired.golfer_id,
            season: conflict.desired.season,
            tournament: tournament_id,
            existing: conflict.existing_tournament,
        }
        .into());
    }

    let current = tx.usage().await?;
    let changes = diff(&current, &desired);
    tx.apply_usage_diff(&changes).await?;
    tx.replace_results(&results).await?;

    let digest = results_digest(&results, &desired);
    tx.mark_reconciled(&digest).await?;

    Ok(ReconcileReport {
        tournament_id,
        run_id,
        picks_resolved: results.len(),
        usage_inserted: changes.insert.len(),
        usage_removed: changes.remove.len(),
        missing_earnings,
        digest,
    })
}
