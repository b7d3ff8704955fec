//! Pick submission and the list of golfers a user may still pick.

use crate::db::Repository;
use crate::domain::league_time::{format_deadline, is_deadline_passed};
use crate::domain::{
    Golfer, GolferId, Pick, PickRole, TimeMs, TournamentFormat, TournamentId, TournamentStatus,
    UserId,
};
use crate::orchestration::locks::TournamentLocks;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// One reason a submission was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("picks closed at {deadline}")]
    DeadlinePassed { deadline: String },
    #[error("tournament is {0}, picks are only taken while it is upcoming")]
    NotUpcoming(TournamentStatus),
    #[error("{0} tournaments do not take picks")]
    Ineligible(TournamentFormat),
    #[error("primary and backup must be different golfers")]
    SameGolfer,
    #[error("{role} {golfer} is not in the field")]
    NotInField { role: PickRole, golfer: GolferId },
    #[error("{role} {golfer} is an amateur")]
    Amateur { role: PickRole, golfer: GolferId },
    #[error("{role} {golfer} has already been used this season")]
    AlreadyUsed { role: PickRole, golfer: GolferId },
}

/// All violations of a rejected submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(pub Vec<Violation>);

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("{0} not found")]
    TournamentNotFound(TournamentId),
    #[error("{0} not found")]
    UserNotFound(UserId),
    #[error("pick rejected: {0}")]
    Rejected(Violations),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl SubmissionError {
    pub fn violations(&self) -> &[Violation] {
        match self {
            SubmissionError::Rejected(v) => &v.0,
            _ => &[],
        }
    }
}

#[derive(Clone)]
pub struct PickSubmitter {
    repo: Arc<Repository>,
    locks: TournamentLocks,
    league_tz: Tz,
}

impl PickSubmitter {
    pub fn new(repo: Arc<Repository>, locks: TournamentLocks, league_tz: Tz) -> Self {
        Self {
            repo,
            locks,
            league_tz,
        }
    }

    /// Validate and store a user's pick, replacing an earlier one for the
    /// same tournament.
    ///
    /// Validation runs inside the transaction that holds the tournament's
    /// write lock, so the checks and the write see the same state.
    ///
    /// # Errors
    /// `Rejected` carries every violation found, not only the first.
    pub async fn submit(
        &self,
        user_id: UserId,
        tournament_id: TournamentId,
        primary: GolferId,
        backup: GolferId,
        now: DateTime<Utc>,
    ) -> Result<Pick, SubmissionError> {
        if self.repo.get_user(user_id).await?.is_none() {
            return Err(SubmissionError::UserNotFound(user_id));
        }

        let _guard = self.locks.acquire(tournament_id).await;
        let mut tx = self
            .repo
            .lock_tournament(tournament_id)
            .await?
            .ok_or(SubmissionError::TournamentNotFound(tournament_id))?;

        let tournament = tx.tournament().await?;
        let mut violations = Vec::new();

        if tournament.status != TournamentStatus::Upcoming {
            violations.push(Violation::NotUpcoming(tournament.status));
        }
        if !tournament.is_scored() {
            violations.push(Violation::Ineligible(tournament.format));
        }
        if is_deadline_passed(tournament.pick_deadline, now, self.league_tz) {
            violations.push(Violation::DeadlinePassed {
                deadline: format_deadline(tournament.pick_deadline, self.league_tz),
            });
        }

        let mut selections = vec![(PickRole::Primary, primary)];
        if primary == backup {
            violations.push(Violation::SameGolfer);
        } else {
            selections.push((PickRole::Backup, backup));
        }

        let in_field: HashSet<GolferId> = tx
            .field()
            .await?
            .into_iter()
            .map(|e| e.golfer_id)
            .collect();
        let golfers: HashMap<GolferId, Golfer> = tx
            .golfers(&[primary, backup])
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();
        let used = tx.used_golfers(user_id, tournament.season).await?;

        for (role, golfer) in selections {
            if !in_field.contains(&golfer) {
                violations.push(Violation::NotInField { role, golfer });
            }
            if golfers.get(&golfer).map(|g| g.is_amateur).unwrap_or(false) {
                violations.push(Violation::Amateur { role, golfer });
            }
            if used.contains(&golfer) {
                violations.push(Violation::AlreadyUsed { role, golfer });
            }
        }

        if !violations.is_empty() {
            tx.rollback().await?;
            debug!(user = %user_id, tournament = %tournament_id, count = violations.len(), "Pick rejected");
            return Err(SubmissionError::Rejected(Violations(violations)));
        }

        let pick = tx
            .upsert_pick(user_id, primary, backup, TimeMs::new(now.timestamp_millis()))
            .await?;
        tx.commit().await?;

        info!(
            user = %user_id,
            tournament = %tournament_id,
            pick = %pick.id,
            primary = %primary,
            backup = %backup,
            "Pick submitted"
        );
        Ok(pick)
    }

    /// Field members the user may still pick: not amateurs, not withdrawn,
    /// and not used this season. Ordered by surname.
    ///
    /// # Errors
    /// Returns `TournamentNotFound` for an unknown tournament.
    pub async fn available_golfers(
        &self,
        user_id: UserId,
        tournament_id: TournamentId,
    ) -> Result<Vec<Golfer>, SubmissionError> {
        let tournament = self
            .repo
            .get_tournament(tournament_id)
            .await?
            .ok_or(SubmissionError::TournamentNotFound(tournament_id))?;
        let used = self.repo.used_golfers(user_id, tournament.season).await?;

        Ok(self
            .repo
            .list_field_with_golfers(tournament_id)
            .await?
            .into_iter()
            .filter(|(entry, golfer)| {
                !golfer.is_amateur && !entry.withdrawal.is_withdrawn() && !used.contains(&golfer.id)
            })
            .map(|(_, golfer)| golfer)
            .collect())
    }
}
