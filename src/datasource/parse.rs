//! Stateless parsers for the SlashGolf JSON wire format.
//!
//! Numbers may arrive bare, as strings, or Mongo-style wrapped
//! (`{"$numberInt": "…"}`, `{"$numberLong": "…"}`, `{"$numberDouble": "…"}`).
//! Timestamps arrive as `{"$date": {"$numberLong": "<ms>"}}`.

use super::{DataSourceError, EarningsRow, Leaderboard, LeaderboardRow, ScheduleEvent};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::warn;

const WRAPPED_NUMBER_KEYS: [&str; 3] = ["$numberInt", "$numberLong", "$numberDouble"];

/// Unwrap a possibly Mongo-wrapped number to its textual form.
fn number_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => WRAPPED_NUMBER_KEYS
            .iter()
            .find_map(|k| map.get(*k))
            .and_then(number_text),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// Parse an integer field. Fractional values are truncated; missing or
/// unparseable values yield `None`.
pub fn parse_api_number(value: &Value) -> Option<i64> {
    let text = number_text(value)?;
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

/// Earnings amount as text, unwrapped but not validated. Commas and a
/// leading currency sign are stripped; anything else is passed through for
/// the reconciler to judge.
pub fn parse_amount_text(value: &Value) -> Option<String> {
    number_text(value).map(|s| s.trim_start_matches('$').replace(',', ""))
}

/// Parse `{"$date": {"$numberLong": "<ms>"}}`, `{"$date": <ms>}`,
/// `{"$numberLong": "<ms>"}`, or a bare millisecond count.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let ms = match value {
        Value::Object(map) => match map.get("$date") {
            Some(inner) => parse_api_number(inner),
            None => parse_api_number(value),
        },
        Value::Null => None,
        other => parse_api_number(other),
    }?;
    Utc.timestamp_millis_opt(ms).single()
}

/// Parse a tee time string: ISO-8601 (with or without offset) or a local
/// clock time like "7:21am" on `start_date`. Naive values are read in
/// `event_tz`.
pub fn parse_tee_time_string(
    raw: &str,
    start_date: NaiveDate,
    event_tz: Tz,
) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("N/A") {
        return None;
    }

    if raw.contains('T') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw.replace('z', "Z")) {
            return Some(dt.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
            .ok()?;
        return localize(naive, event_tz);
    }

    let time = NaiveTime::parse_from_str(&raw.to_uppercase(), "%I:%M%p")
        .or_else(|_| NaiveTime::parse_from_str(&raw.to_uppercase(), "%I:%M %p"))
        .ok()?;
    localize(start_date.and_time(time), event_tz)
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Event timezone from `timeZone`, `timezone` or `tz`. Unknown names are
/// logged and ignored.
pub fn parse_time_zone(value: &Value) -> Option<Tz> {
    let name = ["timeZone", "timezone", "tz"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())?;

    match name.trim().parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(e) => {
            warn!(time_zone = %name, error = %e, "Unknown event timezone, using league timezone");
            None
        }
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        other => number_text(other),
    })
}

fn bool_field(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Parse the schedule response. Entries missing an id, name or dates are
/// logged and skipped.
pub fn parse_schedule(value: &Value) -> Result<Vec<ScheduleEvent>, DataSourceError> {
    let events = value
        .get("schedule")
        .and_then(Value::as_array)
        .ok_or_else(|| DataSourceError::ParseError("Missing schedule array".to_string()))?;

    let mut parsed = Vec::with_capacity(events.len());
    for event in events {
        match parse_schedule_event(event) {
            Ok(e) => parsed.push(e),
            Err(e) => warn!(error = %e, "Skipping schedule entry"),
        }
    }
    Ok(parsed)
}

fn parse_schedule_event(event: &Value) -> Result<ScheduleEvent, DataSourceError> {
    let tourn_id = str_field(event, "tournId")
        .ok_or_else(|| DataSourceError::ParseError("Missing tournId".to_string()))?;
    let name = str_field(event, "name")
        .ok_or_else(|| DataSourceError::ParseError(format!("Missing name for {}", tourn_id)))?;
    let date = event.get("date");
    let start = date
        .and_then(|d| d.get("start"))
        .and_then(parse_timestamp)
        .ok_or_else(|| {
            DataSourceError::ParseError(format!("Missing start date for {}", tourn_id))
        })?;
    let end = date
        .and_then(|d| d.get("end"))
        .and_then(parse_timestamp)
        .ok_or_else(|| DataSourceError::ParseError(format!("Missing end date for {}", tourn_id)))?;

    Ok(ScheduleEvent {
        tourn_id,
        name,
        format: str_field(event, "format"),
        purse: event.get("purse").and_then(parse_api_number).unwrap_or(0),
        start,
        end,
    })
}

/// Parse a leaderboard response. Rows without a player id are skipped.
pub fn parse_leaderboard(value: &Value) -> Result<Leaderboard, DataSourceError> {
    let rows = value
        .get("leaderboardRows")
        .and_then(Value::as_array)
        .ok_or_else(|| DataSourceError::ParseError("Missing leaderboardRows array".to_string()))?;

    let parsed = rows
        .iter()
        .filter_map(|row| {
            let player_id = str_field(row, "playerId");
            if player_id.is_none() {
                warn!("Skipping leaderboard row without playerId");
            }
            player_id.map(|id| parse_leaderboard_row(id, row))
        })
        .collect();

    Ok(Leaderboard {
        status: str_field(value, "status").unwrap_or_default(),
        time_zone: parse_time_zone(value),
        rows: parsed,
    })
}

fn parse_leaderboard_row(player_id: String, row: &Value) -> LeaderboardRow {
    let rounds = row
        .get("rounds")
        .and_then(Value::as_array)
        .map(|r| r.len())
        .unwrap_or(0);

    LeaderboardRow {
        player_id,
        first_name: str_field(row, "firstName").unwrap_or_default(),
        last_name: str_field(row, "lastName").unwrap_or_default(),
        is_amateur: bool_field(row, "isAmateur"),
        status: str_field(row, "status")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| "active".to_string()),
        rounds_completed: u8::try_from(rounds).unwrap_or(u8::MAX),
        position: str_field(row, "position").filter(|p| !p.trim().is_empty()),
        tee_time_timestamp: row.get("teeTimeTimestamp").and_then(parse_timestamp),
        tee_time: str_field(row, "teeTime"),
        tee_time_local: str_field(row, "teeTimeLocal"),
    }
}

/// Parse an earnings response.
pub fn parse_earnings(value: &Value) -> Result<Vec<EarningsRow>, DataSourceError> {
    let rows = value
        .get("leaderboard")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DataSourceError::ParseError("Missing earnings leaderboard array".to_string())
        })?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            str_field(row, "playerId").map(|player_id| EarningsRow {
                player_id,
                earnings_raw: row.get("earnings").and_then(parse_amount_text),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_api_number_variants() {
        assert_eq!(parse_api_number(&json!({"$numberInt": "20000000"})), Some(20_000_000));
        assert_eq!(
            parse_api_number(&json!({"$numberLong": "1768497660000"})),
            Some(1_768_497_660_000)
        );
        assert_eq!(parse_api_number(&json!({"$numberDouble": "12.75"})), Some(12));
        assert_eq!(parse_api_number(&json!(42)), Some(42));
        assert_eq!(parse_api_number(&json!("17")), Some(17));
        assert_eq!(parse_api_number(&json!(null)), None);
        assert_eq!(parse_api_number(&json!("abc")), None);
    }

    #[test]
    fn test_parse_amount_text_keeps_raw_form() {
        assert_eq!(parse_amount_text(&json!({"$numberInt": "360000"})).as_deref(), Some("360000"));
        assert_eq!(parse_amount_text(&json!("$1,512,000")).as_deref(), Some("1512000"));
        assert_eq!(parse_amount_text(&json!("N/A")).as_deref(), Some("N/A"));
        assert_eq!(parse_amount_text(&json!(null)), None);
    }

    #[test]
    fn test_parse_timestamp_mongo_date() {
        let ts = parse_timestamp(&json!({"$date": {"$numberLong": "1768497660000"}})).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_768_497_660_000);
        assert!(parse_timestamp(&json!({"other": 1})).is_none());
        assert!(parse_timestamp(&json!(null)).is_none());
    }

    #[test]
    fn test_parse_tee_time_strings() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let tz = chrono_tz::Pacific::Honolulu;

        // 07:21 HST is 17:21 UTC.
        let t = parse_tee_time_string("7:21am", start, tz).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 1, 15, 17, 21, 0).unwrap());

        let t = parse_tee_time_string("2026-01-15T12:00:00Z", start, tz).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap());

        let t = parse_tee_time_string("2026-01-15T07:00:00", start, tz).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 1, 15, 17, 0, 0).unwrap());

        assert!(parse_tee_time_string("N/A", start, tz).is_none());
        assert!(parse_tee_time_string("soon", start, tz).is_none());
    }

    #[test]
    fn test_parse_time_zone() {
        assert_eq!(
            parse_time_zone(&json!({"timeZone": "America/New_York"})),
            Some(chrono_tz::America::New_York)
        );
        assert_eq!(parse_time_zone(&json!({"tz": "Mars/Olympus"})), None);
        assert_eq!(parse_time_zone(&json!({})), None);
    }

    #[test]
    fn test_parse_schedule_skips_incomplete_entries() {
        let body = json!({
            "schedule": [
                {
                    "tournId": "006",
                    "name": "Sony Open in Hawaii",
                    "format": "stroke",
                    "purse": {"$numberInt": "9100000"},
                    "date": {
                        "start": {"$date": {"$numberLong": "1768435200000"}},
                        "end": {"$date": {"$numberLong": "1768694400000"}}
                    }
                },
                {"tournId": "999", "name": "No Dates"}
            ]
        });

        let events = parse_schedule(&body).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tourn_id, "006");
        assert_eq!(events[0].purse, 9_100_000);
        assert_eq!(events[0].format.as_deref(), Some("stroke"));
        assert!(parse_schedule(&json!({})).is_err());
    }

    #[test]
    fn test_parse_leaderboard_rows() {
        let body = json!({
            "status": "In Progress",
            "timeZone": "America/Chicago",
            "leaderboardRows": [
                {
                    "playerId": "46046",
                    "firstName": "Scottie",
                    "lastName": "Scheffler",
                    "isAmateur": false,
                    "status": "active",
                    "position": "T2",
                    "rounds": [{}, {}],
                    "teeTimeTimestamp": {"$date": {"$numberLong": "1768497660000"}}
                },
                {
                    "playerId": "50525",
                    "firstName": "Am",
                    "lastName": "Ateur",
                    "isAmateur": true,
                    "status": "WD",
                    "rounds": [{}]
                },
                {"firstName": "No", "lastName": "Id"}
            ]
        });

        let board = parse_leaderboard(&body).unwrap();
        assert_eq!(board.status, "In Progress");
        assert_eq!(board.time_zone, Some(chrono_tz::America::Chicago));
        assert_eq!(board.rows.len(), 2);

        let first = &board.rows[0];
        assert_eq!(first.rounds_completed, 2);
        assert_eq!(first.position.as_deref(), Some("T2"));
        assert!(first.tee_time_timestamp.is_some());
        assert!(!first.is_withdrawn());

        let second = &board.rows[1];
        assert!(second.is_amateur);
        assert!(second.is_withdrawn());
        assert_eq!(second.rounds_completed, 1);
    }

    #[test]
    fn test_parse_earnings() {
        let body = json!({
            "leaderboard": [
                {"playerId": "1", "earnings": {"$numberInt": "1800000"}},
                {"playerId": "2", "earnings": 9000.5},
                {"playerId": "3"}
            ]
        });
        let rows = parse_earnings(&body).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].earnings_raw.as_deref(), Some("1800000"));
        assert_eq!(rows[1].earnings_raw.as_deref(), Some("9000.5"));
        assert_eq!(rows[2].earnings_raw, None);
        assert!(parse_earnings(&json!({"leaderboardRows": []})).is_err());
    }
}
