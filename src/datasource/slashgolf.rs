//! SlashGolf (RapidAPI "live-golf-data") client.

use super::parse::{parse_earnings, parse_leaderboard, parse_schedule};
use super::{DataSourceError, EarningsRow, GolfDataSource, Leaderboard, ScheduleEvent};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://live-golf-data.p.rapidapi.com";
pub const DEFAULT_API_HOST: &str = "live-golf-data.p.rapidapi.com";

/// PGA Tour organisation id.
const ORG_ID: &str = "1";

/// SlashGolf data source authenticated with a RapidAPI key.
#[derive(Debug)]
pub struct SlashGolfDataSource {
    client: Client,
    base_url: String,
    api_host: String,
    api_key: String,
    calls: AtomicU64,
}

impl SlashGolfDataSource {
    pub fn new(base_url: String, api_host: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build configured HTTP client, using defaults");
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_host,
            api_key,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of HTTP requests issued, retries included.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn get_json(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, DataSourceError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("orgId", ORG_ID.to_string()));

        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let attempt = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
            let started = Instant::now();

            let response = self
                .client
                .get(&url)
                .header("X-RapidAPI-Key", &self.api_key)
                .header("X-RapidAPI-Host", &self.api_host)
                .query(&query)
                .send()
                .await
                .map_err(|e| {
                    warn!(endpoint, error = %e, "Request failed");
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            info!(
                target: "api_calls",
                endpoint,
                status = status.as_u16(),
                call = attempt,
                duration_ms = started.elapsed().as_millis() as u64,
                "SlashGolf request"
            );

            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl GolfDataSource for SlashGolfDataSource {
    async fn fetch_schedule(&self, year: i32) -> Result<Vec<ScheduleEvent>, DataSourceError> {
        debug!(year, "Fetching schedule");
        let body = self
            .get_json("schedule", &[("year", year.to_string())])
            .await?;
        parse_schedule(&body)
    }

    async fn fetch_leaderboard(
        &self,
        tourn_id: &str,
        year: i32,
    ) -> Result<Leaderboard, DataSourceError> {
        debug!(tourn_id, year, "Fetching leaderboard");
        let body = self
            .get_json(
                "leaderboard",
                &[("tournId", tourn_id.to_string()), ("year", year.to_string())],
            )
            .await?;
        parse_leaderboard(&body)
    }

    async fn fetch_earnings(
        &self,
        tourn_id: &str,
        year: i32,
    ) -> Result<Vec<EarningsRow>, DataSourceError> {
        debug!(tourn_id, year, "Fetching earnings");
        let body = self
            .get_json(
                "earnings",
                &[("tournId", tourn_id.to_string()), ("year", year.to_string())],
            )
            .await?;
        parse_earnings(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let ds = SlashGolfDataSource::new(
            format!("{}/", DEFAULT_BASE_URL),
            DEFAULT_API_HOST.to_string(),
            "key".to_string(),
        );
        assert_eq!(ds.base_url, DEFAULT_BASE_URL);
        assert_eq!(ds.call_count(), 0);
    }
}
