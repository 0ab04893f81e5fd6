//! Issue clock: deterministic period identifiers from wall-clock time
//!
//! A period id is the UTC minute formatted as `YYYYMMDDHHMM` (12 digits).
//! `format(parse(id)) == id` holds for every valid id; everything here is
//! pure time arithmetic.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

use crate::error::{EngineError, Result};
use crate::types::{Period, PeriodStatus};

const PERIOD_FORMAT: &str = "%Y%m%d%H%M";
pub const PERIOD_ID_LEN: usize = 12;

/// Period id for the minute containing `now`.
pub fn current_period(now: DateTime<Utc>) -> String {
    now.format(PERIOD_FORMAT).to_string()
}

/// Parse a period id back to the minute boundary it encodes.
pub fn parse(id: &str) -> Result<DateTime<Utc>> {
    if id.len() != PERIOD_ID_LEN || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidPeriodFormat(id.to_string()));
    }
    let naive = NaiveDateTime::parse_from_str(id, PERIOD_FORMAT)
        .map_err(|_| EngineError::InvalidPeriodFormat(id.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Id of the period one minute after `id`.
pub fn next_period(id: &str) -> Result<String> {
    Ok(current_period(parse(id)? + Duration::minutes(1)))
}

/// Id of the period one minute before `id`.
pub fn previous_period(id: &str) -> Result<String> {
    Ok(current_period(parse(id)? - Duration::minutes(1)))
}

/// Draw time for a period: its window start plus one minute.
pub fn draw_time(id: &str) -> Result<DateTime<Utc>> {
    Ok(parse(id)? + Duration::minutes(1))
}

/// Materialize the full period record for an id.
pub fn period(id: &str) -> Result<Period> {
    let window_start = parse(id)?;
    let window_end = window_start + Duration::minutes(1);
    Ok(Period {
        id: id.to_string(),
        window_start,
        window_end,
        draw_time: window_end,
        status: PeriodStatus::Pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_parse_round_trip() {
        for id in ["202501010000", "202512312359", "202402290123"] {
            let ts = parse(id).unwrap();
            assert_eq!(current_period(ts), id);
        }
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        assert!(parse("2025010100").is_err());
        assert!(parse("20250101000000").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(parse("2025o1010000").is_err());
        assert!(parse("20250101000x").is_err());
    }

    #[test]
    fn test_parse_rejects_impossible_dates() {
        // Month 13, day 32, hour 25, minute 61
        assert!(parse("202513010000").is_err());
        assert!(parse("202501320000").is_err());
        assert!(parse("202501012500").is_err());
        assert!(parse("202501010061").is_err());
        // Feb 29 in a non-leap year
        assert!(parse("202502290000").is_err());
    }

    #[test]
    fn test_next_previous_period() {
        assert_eq!(next_period("202501010000").unwrap(), "202501010001");
        assert_eq!(previous_period("202501010001").unwrap(), "202501010000");
        // Across a day boundary
        assert_eq!(next_period("202501312359").unwrap(), "202502010000");
        assert_eq!(previous_period("202502010000").unwrap(), "202501312359");
    }

    #[test]
    fn test_current_period_truncates_to_minute() {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 9, 41, 57).unwrap();
        assert_eq!(current_period(now), "202503150941");
    }

    #[test]
    fn test_period_window() {
        let p = period("202501010000").unwrap();
        assert_eq!(p.draw_time - p.window_start, Duration::minutes(1));
        assert_eq!(p.window_end, p.draw_time);
        assert_eq!(p.status, PeriodStatus::Pending);
    }

    #[test]
    fn test_draw_time_is_next_minute() {
        let dt = draw_time("202501010000").unwrap();
        assert_eq!(current_period(dt), "202501010001");
    }
}
