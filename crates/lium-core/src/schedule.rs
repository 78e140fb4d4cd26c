//! Parsing of removal schedules: relative durations (`--in 6h`) and
//! wall-clock times in the caller's timezone (`--at "tomorrow 01:00"`).

use crate::errors::{LiumError, Result};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

/// Longest accepted `--in` duration: ten years.
const MAX_DURATION_SECONDS: f64 = 10.0 * 365.0 * 86_400.0;

/// Parse "45m", "6h", "2d" or "1.5h" into a positive duration of at most
/// ten years.
pub fn parse_duration(spec: &str) -> Option<Duration> {
    let spec = spec.trim().to_lowercase();
    let unit = spec.chars().last()?;
    let amount: f64 = spec[..spec.len() - unit.len_utf8()].trim().parse().ok()?;
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }

    let seconds = match unit {
        'm' => amount * 60.0,
        'h' => amount * 3600.0,
        'd' => amount * 86_400.0,
        _ => return None,
    };
    if seconds > MAX_DURATION_SECONDS {
        return None;
    }
    Duration::try_seconds(seconds.round() as i64)
}

/// Parse "today HH:MM", "tomorrow HH:MM", "YYYY-MM-DD HH:MM" or "YYYY-MM-DD"
/// in `now`'s timezone. A `today` time that already passed yields `None`.
pub fn parse_time_spec<Tz: TimeZone>(spec: &str, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let spec = spec.trim();
    let lower = spec.to_lowercase();
    let tz = now.timezone();
    let today = now.date_naive();

    let (date, time) = if let Some(rest) = lower.strip_prefix("today ") {
        (today, parse_hh_mm(rest)?)
    } else if let Some(rest) = lower.strip_prefix("tomorrow ") {
        (today.succ_opt()?, parse_hh_mm(rest)?)
    } else if let Some((date, time)) = spec.split_once(' ') {
        (
            NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?,
            parse_hh_mm(time)?,
        )
    } else {
        (
            NaiveDate::parse_from_str(spec, "%Y-%m-%d").ok()?,
            NaiveTime::from_hms_opt(0, 0, 0)?,
        )
    };

    let local = match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => return None,
    };

    let result = local.with_timezone(&Utc);
    if lower.starts_with("today ") && result <= now.with_timezone(&Utc) {
        return None;
    }
    Some(result)
}

fn parse_hh_mm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Resolve the `--in` / `--at` pair of a removal request.
///
/// Returns `Ok(None)` when neither is given.
pub fn termination_time<Tz: TimeZone>(
    in_duration: Option<&str>,
    at_time: Option<&str>,
    now: &DateTime<Tz>,
) -> Result<Option<DateTime<Utc>>> {
    let now_utc = now.with_timezone(&Utc);
    let when = match (in_duration, at_time) {
        (Some(_), Some(_)) => {
            return Err(LiumError::InvalidInput(
                "Use either --in or --at, not both".to_string(),
            ))
        }
        (None, None) => return Ok(None),
        (Some(spec), None) => {
            parse_duration(spec)
                .and_then(|duration| now_utc.checked_add_signed(duration))
                .ok_or_else(|| {
                    LiumError::InvalidInput(format!(
                        "Invalid duration '{}'. Use e.g. 30m, 6h or 2d",
                        spec
                    ))
                })?
        }
        (None, Some(spec)) => parse_time_spec(spec, now).ok_or_else(|| {
            if spec.trim().to_lowercase().starts_with("today ") {
                LiumError::InvalidInput(format!(
                    "Time '{}' has already passed today. Use 'tomorrow HH:MM' or a future time",
                    spec
                ))
            } else {
                LiumError::InvalidInput(format!(
                    "Invalid time format: '{}'. Use 'today HH:MM', 'tomorrow HH:MM', or 'YYYY-MM-DD HH:MM'",
                    spec
                ))
            }
        })?,
    };

    if when <= now_utc {
        return Err(LiumError::InvalidInput(
            "Removal time must be in the future".to_string(),
        ));
    }
    Ok(Some(when))
}
