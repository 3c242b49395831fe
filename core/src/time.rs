use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use anyhow::{anyhow, Result};

/// Splits off the last character, e.g. `30m` -> (`30`, `m`).
fn split_unit(input: &str) -> Option<(&str, &str)> {
    let (idx, _) = input.char_indices().last()?;
    let (num, unit) = input.split_at(idx);
    if num.is_empty() {
        None
    } else {
        Some((num, unit))
    }
}

pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let (num_str, unit) = split_unit(input).ok_or_else(|| anyhow!("Invalid duration: '{}'", input))?;
    let num: i64 = num_str.parse().map_err(|_| anyhow!("Invalid duration number"))?;
    if num <= 0 {
        return Err(anyhow!("Duration must be positive"));
    }

    let duration = match unit.to_lowercase().as_str() {
        "m" => Duration::try_minutes(num),
        "h" => Duration::try_hours(num),
        "d" => Duration::try_days(num),
        _ => return Err(anyhow!("Unknown duration unit: {}", unit)),
    };
    duration.ok_or_else(|| anyhow!("Duration out of range: {}", input))
}

/// Resolves a day relative to `today`.
///
/// Accepts `today`, `tomorrow`, `yesterday` (and `tod`/`tom`/`yes`),
/// `+3d`, `-1w`, a weekday name for its next occurrence, or `YYYY-MM-DD`.
pub fn parse_day(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let lowered = input.trim().to_lowercase();

    match lowered.as_str() {
        "today" | "tod" => return Ok(today),
        "tomorrow" | "tom" => return shift_day(today, Duration::days(1)),
        "yesterday" | "yes" => return shift_day(today, Duration::days(-1)),
        _ => {}
    }

    if lowered.starts_with('+') || lowered.starts_with('-') {
        return parse_relative_day(&lowered, today);
    }

    if let Ok(target) = parse_weekday_str(&lowered) {
        let mut days_needed = target.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64;
        if days_needed <= 0 {
            days_needed += 7;
        }
        return shift_day(today, Duration::days(days_needed));
    }

    NaiveDate::parse_from_str(&lowered, "%Y-%m-%d").map_err(|_| anyhow!("Could not parse date: {}", input))
}

fn shift_day(day: NaiveDate, delta: Duration) -> Result<NaiveDate> {
    day.checked_add_signed(delta)
        .ok_or_else(|| anyhow!("Date out of range: {} {:+} days", day, delta.num_days()))
}

fn parse_relative_day(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let (sign, rest) = input.split_at(1);
    let (num_str, unit) = split_unit(rest).ok_or_else(|| anyhow!("Invalid relative format: {}", input))?;
    let count: i64 = num_str.parse().map_err(|_| anyhow!("Invalid relative format: {}", input))?;
    let count = if sign == "-" { -count } else { count };

    let delta = match unit {
        "d" => Duration::try_days(count),
        "w" => Duration::try_weeks(count),
        _ => return Err(anyhow!("Unknown unit in relative date: {}", unit)),
    }
    .ok_or_else(|| anyhow!("Relative date out of range: {}", input))?;
    shift_day(today, delta)
}

/// Parses `9`, `9:30`, `21:30`, `9:30pm`, `9:30 PM` or `12am`.
pub fn parse_clock_time(input: &str) -> Result<NaiveTime> {
    let compact: String = input.split_whitespace().collect::<Vec<_>>().join("").to_lowercase();

    let (clock, meridiem) = if let Some(rest) = compact.strip_suffix("am") {
        (rest, Some(false))
    } else if let Some(rest) = compact.strip_suffix("pm") {
        (rest, Some(true))
    } else {
        (compact.as_str(), None)
    };

    let (hour_str, minute_str) = clock.split_once(':').unwrap_or((clock, "0"));
    let hour: u32 = hour_str.parse().map_err(|_| anyhow!("Invalid time: {}", input))?;
    let minute: u32 = minute_str.parse().map_err(|_| anyhow!("Invalid time: {}", input))?;

    let hour = match meridiem {
        Some(is_pm) => {
            if hour == 0 || hour > 12 {
                return Err(anyhow!("Invalid 12-hour time: {}", input));
            }
            match (hour, is_pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow!("Invalid time: {}", input))
}

fn parse_weekday_str(s: &str) -> Result<Weekday> {
    match s {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        _ => Err(anyhow!("Invalid weekday")),
    }
}
