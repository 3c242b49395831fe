use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use planit_core::{
    expand_key, parse_args, parse_clock_time, parse_day, parse_duration, resolve_local, ADD_FIELDS,
};

/// A task as typed on the command line, resolved to absolute times.
#[derive(Debug, PartialEq)]
pub struct AddRequest {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Resolves `add` arguments relative to `now`.
///
/// Defaults follow the add dialog: today, starting at the current minute,
/// one hour long. Title and range checks are left to the store.
pub fn resolve_add<Tz: TimeZone>(args: &[String], now: &DateTime<Tz>) -> Result<AddRequest> {
    let parsed = parse_args(args);

    let mut fields = HashMap::new();
    for (key, value) in parsed.fields {
        let full_key = expand_key(&key, ADD_FIELDS)?;
        fields.insert(full_key, value);
    }

    let date = match fields.get("date") {
        Some(d) => parse_day(d, now.date_naive())?,
        None => now.date_naive(),
    };
    let start_clock = match fields.get("start") {
        Some(t) => parse_clock_time(t)?,
        None => NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)
            .ok_or_else(|| anyhow!("Invalid current time"))?,
    };
    let start = on_day(now, date, start_clock)?;

    let end = match (fields.get("end"), fields.get("for")) {
        (Some(_), Some(_)) => bail!("Use either end: or for:, not both"),
        (Some(t), None) => on_day(now, date, parse_clock_time(t)?)?,
        (None, Some(d)) => after(start, parse_duration(d)?)?,
        (None, None) => after(start, Duration::hours(1))?,
    };

    Ok(AddRequest {
        title: parsed.title,
        start,
        end,
    })
}

/// Times skipped by a DST jump resolve the same way rollover anchors do.
fn on_day<Tz: TimeZone>(now: &DateTime<Tz>, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>> {
    Ok(resolve_local(&now.timezone(), date.and_time(time)).with_timezone(&Utc))
}

fn after(start: DateTime<Utc>, duration: Duration) -> Result<DateTime<Utc>> {
    start
        .checked_add_signed(duration)
        .ok_or_else(|| anyhow!("End time out of range"))
}
