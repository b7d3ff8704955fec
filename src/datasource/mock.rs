//! Mock data source for testing without network calls.

use super::{DataSourceError, EarningsRow, GolfDataSource, Leaderboard, ScheduleEvent};
use async_trait::async_trait;
use chrono::Datelike;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Mock data source that returns predefined test data.
///
/// Tournaments without a configured leaderboard or earnings answer with a
/// 404, the same way the live provider does for unknown ids.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    schedule: Vec<ScheduleEvent>,
    leaderboards: HashMap<String, Leaderboard>,
    earnings: HashMap<String, Vec<EarningsRow>>,
    error: Option<DataSourceError>,
    calls: Arc<AtomicU64>,
}

impl MockDataSource {
    /// Create a new mock data source with empty data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schedule event.
    pub fn with_event(mut self, event: ScheduleEvent) -> Self {
        self.schedule.push(event);
        self
    }

    /// Add multiple schedule events.
    pub fn with_schedule(mut self, events: Vec<ScheduleEvent>) -> Self {
        self.schedule.extend(events);
        self
    }

    /// Set the leaderboard returned for `tourn_id`.
    pub fn with_leaderboard(mut self, tourn_id: &str, leaderboard: Leaderboard) -> Self {
        self.leaderboards.insert(tourn_id.to_string(), leaderboard);
        self
    }

    /// Set the earnings returned for `tourn_id`.
    pub fn with_earnings(mut self, tourn_id: &str, rows: Vec<EarningsRow>) -> Self {
        self.earnings.insert(tourn_id.to_string(), rows);
        self
    }

    /// Make every fetch fail with `error`.
    pub fn with_error(mut self, error: DataSourceError) -> Self {
        self.error = Some(error);
        self
    }

    /// Number of fetches made, across clones.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn record_call(&self) -> Result<(), DataSourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn not_found(tourn_id: &str) -> DataSourceError {
    DataSourceError::HttpError {
        status: 404,
        message: format!("no data for tournament {}", tourn_id),
    }
}

#[async_trait]
impl GolfDataSource for MockDataSource {
    async fn fetch_schedule(&self, year: i32) -> Result<Vec<ScheduleEvent>, DataSourceError> {
        self.record_call()?;
        Ok(self
            .schedule
            .iter()
            .filter(|e| e.start.year() == year || e.end.year() == year)
            .cloned()
            .collect())
    }

    async fn fetch_leaderboard(
        &self,
        tourn_id: &str,
        _year: i32,
    ) -> Result<Leaderboard, DataSourceError> {
        self.record_call()?;
        self.leaderboards
            .get(tourn_id)
            .cloned()
            .ok_or_else(|| not_found(tourn_id))
    }

    async fn fetch_earnings(
        &self,
        tourn_id: &str,
        _year: i32,
    ) -> Result<Vec<EarningsRow>, DataSourceError> {
        self.record_call()?;
        self.earnings
            .get(tourn_id)
            .cloned()
            .ok_or_else(|| not_found(tourn_id))
    }
}
