//! Tournament sync: pulls schedule, field, live leaderboard, withdrawals and
//! official results from the data source into local storage.
//!
//! Sync never marks a tournament complete; it stores official results and
//! hands the tournament to the reconciler.

use crate::config::{Config, SyncMode};
use crate::datasource::{DataSourceError, GolfDataSource, Leaderboard, LeaderboardRow};
use crate::db::repo::{FieldRowUpdate, FinalResultRow, GolferUpsert, ScheduleUpsert};
use crate::db::Repository;
use crate::domain::league_time::{fixed_deadline, league_weekday, to_league_local};
use crate::domain::{Season, Tournament, TournamentId, TournamentStatus, BACKUP_CUTOFF_ROUNDS};
use crate::engine::{classify_format, derive_status, is_final_hint, projected_earnings};
use crate::orchestration::reconcile::{ReconcileReport, ResultsReconciler};
use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Upcoming tournaments within this many days get their field synced.
const FIELD_WINDOW_DAYS: i64 = 10;
/// A tournament counts as active from this many hours before its start...
const ACTIVE_LEAD_HOURS: i64 = 12;
/// ...until this many hours after its end.
const ACTIVE_TRAIL_HOURS: i64 = 6;
/// Tournaments that ended within this many days are re-checked for results.
const RECENT_DAYS: i64 = 2;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("data source: {0}")]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Which part of the sync pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    Schedule,
    Field,
    Live,
    /// Live leaderboard plus a withdrawal check, allowed in free mode.
    LiveWithWd,
    Withdrawals,
    /// Results of recently finished tournaments.
    Results,
    /// Results of every finished tournament not yet finalized.
    Earnings,
    All,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Schedule => "schedule",
            RunMode::Field => "field",
            RunMode::Live => "live",
            RunMode::LiveWithWd => "live-with-wd",
            RunMode::Withdrawals => "withdrawals",
            RunMode::Results => "results",
            RunMode::Earnings => "earnings",
            RunMode::All => "all",
        }
    }

    fn includes(&self, step: RunMode) -> bool {
        *self == step || *self == RunMode::All
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "schedule" => Ok(RunMode::Schedule),
            "field" => Ok(RunMode::Field),
            "live" => Ok(RunMode::Live),
            "live-with-wd" => Ok(RunMode::LiveWithWd),
            "withdrawals" => Ok(RunMode::Withdrawals),
            "results" => Ok(RunMode::Results),
            "earnings" => Ok(RunMode::Earnings),
            "all" => Ok(RunMode::All),
            other => Err(format!(
                "unknown sync mode {}, expected schedule, field, live, live-with-wd, withdrawals, results, earnings or all",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub season: Season,
    pub league_tz: Tz,
    pub mode: SyncMode,
    pub fixed_deadline_hour: u32,
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            season: config.season,
            league_tz: config.league_tz,
            mode: config.sync_mode,
            fixed_deadline_hour: config.fixed_deadline_hour,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub tournament_id: TournamentId,
    pub golfers: usize,
    pub added: usize,
    pub deadline: Option<NaiveDateTime>,
    /// The deadline came from tee times rather than the fixed hour.
    pub deadline_from_tee_times: bool,
    pub status: TournamentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSummary {
    pub tournament_id: TournamentId,
    pub updated: usize,
    pub status: TournamentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalNotice {
    pub tournament_id: TournamentId,
    pub api_player_id: String,
    pub name: String,
    pub rounds_completed: u8,
    /// Withdrew before completing Round 2, so a backup may activate.
    pub before_cutoff: bool,
    /// Not marked withdrawn before this check.
    pub newly_withdrawn: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ResultsOutcome {
    /// The leaderboard is not complete/official yet.
    NotFinal { provider_status: String },
    Stored { earnings_stored: usize },
}

/// Everything one `run` did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub mode: RunMode,
    pub skipped: Vec<String>,
    pub schedule: Option<ScheduleSummary>,
    pub fields: Vec<FieldSummary>,
    pub live: Vec<LiveSummary>,
    pub withdrawals: Vec<WithdrawalNotice>,
    pub results: Vec<(TournamentId, ResultsOutcome)>,
    pub reconciled: Vec<ReconcileReport>,
    pub errors: Vec<String>,
}

impl SyncReport {
    fn new(mode: RunMode) -> Self {
        Self {
            mode,
            skipped: Vec::new(),
            schedule: None,
            fields: Vec::new(),
            live: Vec::new(),
            withdrawals: Vec::new(),
            results: Vec::new(),
            reconciled: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn skip(&mut self, reason: &str) {
        info!(mode = %self.mode, reason, "Sync step skipped");
        self.skipped.push(reason.to_string());
    }

    fn fail(&mut self, step: &str, tournament: &Tournament, err: impl fmt::Display) {
        error!(step, tournament = %tournament.id, name = %tournament.name, error = %err, "Sync step failed");
        self.errors
            .push(format!("{} {} ({}): {}", step, tournament.id, tournament.name, err));
    }
}

#[derive(Clone)]
pub struct TournamentSync {
    datasource: Arc<dyn GolfDataSource>,
    repo: Arc<Repository>,
    reconciler: ResultsReconciler,
    settings: SyncSettings,
}

impl TournamentSync {
    pub fn new(
        datasource: Arc<dyn GolfDataSource>,
        repo: Arc<Repository>,
        reconciler: ResultsReconciler,
        settings: SyncSettings,
    ) -> Self {
        Self {
            datasource,
            repo,
            reconciler,
            settings,
        }
    }

    fn now_local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        to_league_local(now, self.settings.league_tz)
    }

    fn is_free(&self) -> bool {
        self.settings.mode == SyncMode::Free
    }

    // =========================================================================
    // Schedule
    // =========================================================================

    /// Import the season schedule. Dates are stored as whole league-local
    /// days: start at 00:00:00, end at 23:59:59.
    pub async fn sync_schedule(&self, year: i32) -> Result<ScheduleSummary, SyncError> {
        let events = self.datasource.fetch_schedule(year).await?;
        let season = Season::new(year);
        let mut summary = ScheduleSummary::default();

        for (index, event) in events.iter().enumerate() {
            let start_date = event.start.date_naive().and_time(NaiveTime::MIN);
            let end_date =
                event.end.date_naive().and_time(NaiveTime::MIN) + Duration::seconds(86_399);
            let format = classify_format(&event.name, event.format.as_deref());

            let created = self
                .repo
                .upsert_schedule_entry(&ScheduleUpsert {
                    api_tourn_id: event.tourn_id.clone(),
                    season,
                    name: event.name.clone(),
                    start_date,
                    end_date,
                    api_purse: event.purse,
                    format,
                    week_number: Some(index as i32 + 1),
                })
                .await?;

            debug!(tourn_id = %event.tourn_id, name = %event.name, %format, created, "Schedule entry synced");
            if created {
                summary.created += 1;
            } else {
                summary.updated += 1;
            }
        }

        info!(year, created = summary.created, updated = summary.updated, "Schedule synced");
        Ok(summary)
    }

    // =========================================================================
    // Field and deadline
    // =========================================================================

    /// Sync the field and first-round tee times, then set the pick deadline
    /// to the earliest tee time (league-local), or the fixed hour on the
    /// start date when no tee time is known.
    pub async fn sync_field(
        &self,
        tournament: &Tournament,
        now: DateTime<Utc>,
    ) -> Result<FieldSummary, SyncError> {
        let board = self.fetch_leaderboard(tournament).await?;
        let tz = self.settings.league_tz;
        let event_tz = board.time_zone.unwrap_or(tz);
        let start_date = tournament.start_date.date();

        let entries: Vec<(GolferUpsert, Option<NaiveDateTime>)> = board
            .rows
            .iter()
            .map(|row| {
                let tee_time = row
                    .tee_time_instant(start_date, event_tz)
                    .map(|instant| to_league_local(instant, tz));
                (golfer_upsert(row), tee_time)
            })
            .collect();
        let added = self.repo.sync_field(tournament.id, &entries).await?;

        let earliest = board
            .earliest_tee_time(start_date, tz)
            .map(|instant| to_league_local(instant, tz));
        let deadline = earliest.or_else(|| {
            fixed_deadline(tournament.start_date, self.settings.fixed_deadline_hour)
        });
        if earliest.is_none() {
            info!(tournament = %tournament.id, ?deadline, "No tee times yet, using fixed deadline");
        }
        self.repo.set_pick_deadline(tournament.id, deadline).await?;

        let status = self.advance_status(tournament, &board, now).await?;

        info!(
            tournament = %tournament.id,
            name = %tournament.name,
            golfers = entries.len(),
            added,
            ?deadline,
            %status,
            "Field synced"
        );
        Ok(FieldSummary {
            tournament_id: tournament.id,
            golfers: entries.len(),
            added,
            deadline,
            deadline_from_tee_times: earliest.is_some(),
            status,
        })
    }

    // =========================================================================
    // Live leaderboard and withdrawals
    // =========================================================================

    /// Refresh positions, rounds, withdrawal state and projected earnings.
    pub async fn sync_live_leaderboard(
        &self,
        tournament: &Tournament,
        now: DateTime<Utc>,
    ) -> Result<LiveSummary, SyncError> {
        let board = self.fetch_leaderboard(tournament).await?;
        let positions: Vec<&str> = board
            .rows
            .iter()
            .filter_map(|r| r.position.as_deref())
            .collect();

        let updates: Vec<FieldRowUpdate> = board
            .rows
            .iter()
            .map(|row| FieldRowUpdate {
                api_player_id: row.player_id.clone(),
                withdrawn: row.is_withdrawn(),
                rounds_completed: Some(row.rounds_completed),
                position: row.position.clone(),
                projected_earnings: row
                    .position
                    .as_deref()
                    .map(|p| projected_earnings(p, tournament.purse, &positions)),
            })
            .collect();

        let updated = self.repo.apply_field_updates(tournament.id, &updates).await?;
        let status = self.advance_status(tournament, &board, now).await?;

        debug!(tournament = %tournament.id, updated, %status, "Live leaderboard synced");
        Ok(LiveSummary {
            tournament_id: tournament.id,
            updated,
            status,
        })
    }

    /// Mark withdrawn golfers of the field and report them.
    pub async fn check_withdrawals(
        &self,
        tournament: &Tournament,
    ) -> Result<Vec<WithdrawalNotice>, SyncError> {
        let board = self.fetch_leaderboard(tournament).await?;
        let field: HashMap<String, bool> = self
            .repo
            .list_field_with_golfers(tournament.id)
            .await?
            .into_iter()
            .map(|(entry, golfer)| (golfer.api_player_id, entry.withdrawal.is_withdrawn()))
            .collect();

        let mut updates = Vec::new();
        let mut notices = Vec::new();
        for row in board.rows.iter().filter(|r| r.is_withdrawn()) {
            let Some(already_withdrawn) = field.get(&row.player_id) else {
                continue;
            };
            let notice = WithdrawalNotice {
                tournament_id: tournament.id,
                api_player_id: row.player_id.clone(),
                name: format!("{} {}", row.first_name, row.last_name),
                rounds_completed: row.rounds_completed,
                before_cutoff: row.rounds_completed < BACKUP_CUTOFF_ROUNDS,
                newly_withdrawn: !already_withdrawn,
            };
            if notice.newly_withdrawn && notice.before_cutoff {
                warn!(tournament = %tournament.id, golfer = %notice.name, rounds = notice.rounds_completed, "Withdrawal before Round 2 complete, backups may activate");
            }
            updates.push(FieldRowUpdate {
                api_player_id: row.player_id.clone(),
                withdrawn: true,
                rounds_completed: Some(row.rounds_completed),
                position: None,
                projected_earnings: None,
            });
            notices.push(notice);
        }

        if !updates.is_empty() {
            self.repo.apply_field_updates(tournament.id, &updates).await?;
        }
        info!(tournament = %tournament.id, withdrawals = notices.len(), "Withdrawals checked");
        Ok(notices)
    }

    // =========================================================================
    // Official results
    // =========================================================================

    /// Store official earnings and final withdrawal state, marking the
    /// tournament `final_confirmed`. Does nothing until the provider
    /// reports the event complete or official.
    pub async fn sync_results(&self, tournament: &Tournament) -> Result<ResultsOutcome, SyncError> {
        let board = self.fetch_leaderboard(tournament).await?;
        if !is_final_hint(&board.status) {
            info!(tournament = %tournament.id, provider_status = %board.status, "Results not official yet");
            return Ok(ResultsOutcome::NotFinal {
                provider_status: board.status,
            });
        }

        let earnings: HashMap<String, Option<String>> = self
            .datasource
            .fetch_earnings(&tournament.api_tourn_id, tournament.season.year())
            .await?
            .into_iter()
            .map(|e| (e.player_id, e.earnings_raw))
            .collect();

        let rows: Vec<FinalResultRow> = board
            .rows
            .iter()
            .map(|row| FinalResultRow {
                api_player_id: row.player_id.clone(),
                earnings_raw: earnings.get(&row.player_id).cloned().flatten(),
                withdrawn: row.is_withdrawn(),
                rounds_completed: Some(row.rounds_completed),
                position: row.position.clone(),
            })
            .collect();

        let unmatched = earnings
            .keys()
            .filter(|id| board.find(id).is_none())
            .count();
        if unmatched > 0 {
            warn!(tournament = %tournament.id, unmatched, "Earnings for players missing from the leaderboard ignored");
        }

        self.repo
            .advance_status(tournament.id, TournamentStatus::Active)
            .await?;
        let earnings_stored = self.repo.store_final_results(tournament.id, &rows).await?;

        info!(tournament = %tournament.id, name = %tournament.name, earnings_stored, "Official results stored");
        Ok(ResultsOutcome::Stored { earnings_stored })
    }

    // =========================================================================
    // Scheduled entry point
    // =========================================================================

    /// Run one scheduled sync pass. Failures of individual tournaments are
    /// logged and collected in the report; the pass carries on.
    ///
    /// # Errors
    /// Returns an error only when a tournament list cannot be read.
    pub async fn run(&self, mode: RunMode, now: DateTime<Utc>) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new(mode);
        let now_local = self.now_local(now);
        let weekday = league_weekday(now, self.settings.league_tz);

        if self.is_free() && mode == RunMode::Withdrawals {
            report.skip("withdrawal checks are disabled in free sync mode");
            return Ok(report);
        }

        if mode.includes(RunMode::Schedule) {
            if weekday != Weekday::Mon {
                report.skip("schedule sync runs on Mondays only");
            } else {
                match self.sync_schedule(self.settings.season.year()).await {
                    Ok(summary) => report.schedule = Some(summary),
                    Err(e) => {
                        error!(error = %e, "Schedule sync failed");
                        report.errors.push(format!("schedule: {}", e));
                    }
                }
            }
        }

        if mode.includes(RunMode::Field) {
            if self.is_free() && !matches!(weekday, Weekday::Tue | Weekday::Wed) {
                report.skip("free sync mode: field sync runs Tuesday and Wednesday only");
            } else {
                let upcoming = self
                    .repo
                    .list_tournaments_overlapping(
                        now_local,
                        now_local + Duration::days(FIELD_WINDOW_DAYS),
                    )
                    .await?;
                for tournament in upcoming.iter().filter(|t| t.is_scored()) {
                    match self.sync_field(tournament, now).await {
                        Ok(summary) => report.fields.push(summary),
                        Err(e) => report.fail("field", tournament, e),
                    }
                }
            }
        }

        let wants_live = mode.includes(RunMode::Live) || mode == RunMode::LiveWithWd;
        let wants_withdrawals = mode == RunMode::LiveWithWd
            || (mode.includes(RunMode::Withdrawals) && !self.is_free());
        if mode == RunMode::All && self.is_free() {
            report.skip("withdrawal checks are disabled in free sync mode");
        }

        if wants_live || wants_withdrawals {
            let active = self.active_tournaments(now_local).await?;
            if active.is_empty() {
                debug!("No active tournaments");
            }
            for tournament in &active {
                if wants_live {
                    match self.sync_live_leaderboard(tournament, now).await {
                        Ok(summary) => report.live.push(summary),
                        Err(e) => report.fail("live", tournament, e),
                    }
                }
                if wants_withdrawals {
                    match self.check_withdrawals(tournament).await {
                        Ok(notices) => report.withdrawals.extend(notices),
                        Err(e) => report.fail("withdrawals", tournament, e),
                    }
                }
            }
        }

        if mode.includes(RunMode::Results) {
            if self.is_free() && !matches!(weekday, Weekday::Sun | Weekday::Mon) {
                report.skip("free sync mode: results sync runs Sunday and Monday only");
            } else {
                let recent = self
                    .repo
                    .list_ended_between(now_local - Duration::days(RECENT_DAYS), now_local)
                    .await?;
                self.finalize(&recent, &mut report).await;
            }
        }

        if mode.includes(RunMode::Earnings) {
            let pending: Vec<Tournament> = self
                .repo
                .list_awaiting_results(now_local)
                .await?
                .into_iter()
                .filter(|t| !report.results.iter().any(|(id, _)| *id == t.id))
                .collect();
            self.finalize(&pending, &mut report).await;
        }

        info!(
            %mode,
            skipped = report.skipped.len(),
            fields = report.fields.len(),
            live = report.live.len(),
            withdrawals = report.withdrawals.len(),
            results = report.results.len(),
            reconciled = report.reconciled.len(),
            errors = report.errors.len(),
            "Sync run finished"
        );
        Ok(report)
    }

    /// Store official results, then reconcile each tournament that has them.
    async fn finalize(&self, tournaments: &[Tournament], report: &mut SyncReport) {
        for tournament in tournaments.iter().filter(|t| t.is_scored()) {
            let outcome = match self.sync_results(tournament).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    report.fail("results", tournament, e);
                    continue;
                }
            };
            let stored = matches!(outcome, ResultsOutcome::Stored { .. });
            report.results.push((tournament.id, outcome));

            if stored {
                match self.reconciler.reconcile(tournament.id).await {
                    Ok(reconciled) => report.reconciled.push(reconciled),
                    Err(e) => report.fail("reconcile", tournament, e),
                }
            }
        }
    }

    async fn active_tournaments(
        &self,
        now_local: NaiveDateTime,
    ) -> Result<Vec<Tournament>, sqlx::Error> {
        Ok(self
            .repo
            .list_tournaments_overlapping(
                now_local - Duration::hours(ACTIVE_TRAIL_HOURS),
                now_local + Duration::hours(ACTIVE_LEAD_HOURS),
            )
            .await?
            .into_iter()
            .filter(|t| t.is_scored())
            .collect())
    }

    async fn fetch_leaderboard(&self, tournament: &Tournament) -> Result<Leaderboard, SyncError> {
        Ok(self
            .datasource
            .fetch_leaderboard(&tournament.api_tourn_id, tournament.season.year())
            .await?)
    }

    async fn advance_status(
        &self,
        tournament: &Tournament,
        board: &Leaderboard,
        now: DateTime<Utc>,
    ) -> Result<TournamentStatus, sqlx::Error> {
        let proposed = derive_status(
            tournament.status,
            Some(board.status.as_str()),
            tournament.start_date,
            self.now_local(now),
        );
        self.repo.advance_status(tournament.id, proposed).await
    }
}

fn golfer_upsert(row: &LeaderboardRow) -> GolferUpsert {
    GolferUpsert {
        api_player_id: row.player_id.clone(),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        is_amateur: row.is_amateur,
    }
}
