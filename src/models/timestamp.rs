//! ISO-8601 timestamp parsing and day arithmetic.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta};

use super::ModelError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Naive formats accepted after RFC 3339 has been tried.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 date or date-time.
///
/// Accepts `YYYY-MM-DD` (midnight), naive date-times with a `T` or space
/// separator, and RFC 3339 strings with an offset, which are converted to
/// local wall time so they compare against `SystemClock`.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, ModelError> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ModelError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

/// Whole days in `delta`, floored toward negative infinity.
///
/// One hour in the past is day -1, not day 0.
pub fn floor_days(delta: TimeDelta) -> i64 {
    delta.num_seconds().div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> NaiveDateTime {
        parse_timestamp("record_date", date).unwrap()
    }

    #[test]
    fn date_only_is_midnight() {
        let dt = at("2023-12-01");
        assert_eq!(dt.to_string(), "2023-12-01 00:00:00");
    }

    #[test]
    fn datetime_with_t_separator() {
        assert_eq!(at("2024-06-01T14:30:00").to_string(), "2024-06-01 14:30:00");
    }

    #[test]
    fn datetime_with_space_and_fraction() {
        assert_eq!(
            at("2024-06-01 14:30:05.250").to_string(),
            "2024-06-01 14:30:05.250"
        );
    }

    #[test]
    fn datetime_without_seconds() {
        assert_eq!(at("2024-06-01T08:15").to_string(), "2024-06-01 08:15:00");
    }

    #[test]
    fn rfc3339_offset_converted_to_local_wall_time() {
        let expected = DateTime::parse_from_rfc3339("2024-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(at("2024-06-01T10:00:00+02:00"), expected);
        assert_eq!(at("2024-06-01T08:00:00Z"), expected);
    }

    #[test]
    fn offset_input_matches_local_now() {
        let now = Local::now();
        let parsed = at(&now.with_timezone(&chrono::Utc).to_rfc3339());
        let drift = (parsed - now.naive_local()).num_seconds().abs();
        assert!(drift <= 1, "drift {drift}s");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = parse_timestamp("follow_up_date", "next tuesday").unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidTimestamp {
                field: "follow_up_date",
                value: "next tuesday".into(),
            }
        );
    }

    #[test]
    fn floor_days_rounds_down_for_past() {
        assert_eq!(floor_days(TimeDelta::hours(-1)), -1);
        assert_eq!(floor_days(TimeDelta::hours(23)), 0);
        assert_eq!(floor_days(TimeDelta::days(5)), 5);
        assert_eq!(floor_days(TimeDelta::days(-2) - TimeDelta::seconds(1)), -3);
    }
}
