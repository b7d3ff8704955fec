//! Data source abstraction for tournament schedules, leaderboards, and
//! final earnings.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;

pub mod mock;
pub mod parse;
pub mod slashgolf;

pub use mock::MockDataSource;
pub use slashgolf::SlashGolfDataSource;

/// One event of the season schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEvent {
    pub tourn_id: String,
    pub name: String,
    /// Provider format flag, e.g. "stroke" or "team".
    pub format: Option<String>,
    /// Zero when the purse has not been announced.
    pub purse: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One golfer's row on a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub is_amateur: bool,
    /// Lowercased provider status ("active", "cut", "wd", ...).
    pub status: String,
    /// Number of entries in the row's `rounds` array.
    pub rounds_completed: u8,
    pub position: Option<String>,
    pub tee_time_timestamp: Option<DateTime<Utc>>,
    pub tee_time: Option<String>,
    pub tee_time_local: Option<String>,
}

impl LeaderboardRow {
    pub fn is_withdrawn(&self) -> bool {
        self.status == "wd"
    }

    /// First-round tee time as an instant. The provider timestamp is
    /// preferred; the tee time strings are read in the event timezone on the
    /// tournament's start date.
    pub fn tee_time_instant(&self, start_date: NaiveDate, event_tz: Tz) -> Option<DateTime<Utc>> {
        self.tee_time_timestamp.or_else(|| {
            [self.tee_time.as_deref(), self.tee_time_local.as_deref()]
                .into_iter()
                .flatten()
                .find_map(|s| parse::parse_tee_time_string(s, start_date, event_tz))
        })
    }
}

/// A tournament leaderboard snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    /// Provider status, e.g. "In Progress", "Complete", "Official".
    pub status: String,
    /// Event timezone when the provider reports a known one.
    pub time_zone: Option<Tz>,
    pub rows: Vec<LeaderboardRow>,
}

impl Leaderboard {
    /// Earliest first-round tee time across the field.
    pub fn earliest_tee_time(
        &self,
        start_date: NaiveDate,
        fallback_tz: Tz,
    ) -> Option<DateTime<Utc>> {
        let tz = self.time_zone.unwrap_or(fallback_tz);
        self.rows
            .iter()
            .filter_map(|row| row.tee_time_instant(start_date, tz))
            .min()
    }

    pub fn find(&self, player_id: &str) -> Option<&LeaderboardRow> {
        self.rows.iter().find(|r| r.player_id == player_id)
    }
}

/// Final prize money for one golfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarningsRow {
    pub player_id: String,
    /// Amount as text, unwrapped from the provider's number encoding but not
    /// otherwise validated. `None` when the entry carries no amount.
    pub earnings_raw: Option<String>,
}

/// Tournament data provider.
///
/// Implementations must handle retry/backoff and rate limiting.
#[async_trait]
pub trait GolfDataSource: Send + Sync + fmt::Debug {
    /// Fetch the season schedule.
    async fn fetch_schedule(&self, year: i32) -> Result<Vec<ScheduleEvent>, DataSourceError>;

    /// Fetch the current leaderboard (field, tee times, status, rounds).
    async fn fetch_leaderboard(
        &self,
        tourn_id: &str,
        year: i32,
    ) -> Result<Leaderboard, DataSourceError>;

    /// Fetch prize money per golfer. Only meaningful once the event is
    /// official.
    async fn fetch_earnings(
        &self,
        tourn_id: &str,
        year: i32,
    ) -> Result<Vec<EarningsRow>, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 5xx server error, 403 bad key)
    HttpError { status: u16, message: String },
    /// Invalid JSON or a response missing required structure
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
    /// Other error
    Other(String),
}

impl DataSourceError {
    /// Worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            DataSourceError::NetworkError(_) | DataSourceError::RateLimited => true,
            DataSourceError::HttpError { status, .. } => *status >= 500,
            DataSourceError::ParseError(_) | DataSourceError::Other(_) => false,
        }
    }
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
