use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};

use crate::model::task::Task;

/// Clock time on the current day that rolled-over tasks start at.
pub const DEFAULT_ANCHOR: NaiveTime = match NaiveTime::from_hms_opt(9, 0, 0) {
    Some(t) => t,
    None => NaiveTime::MIN,
};

/// Result of a rollover pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Rollover {
    pub tasks: Vec<Task>,
    pub moved: usize,
}

/// Midnight of `reference`'s date in its own timezone.
pub fn start_of_day<Tz: TimeZone>(reference: &DateTime<Tz>) -> DateTime<Tz> {
    at_local_time(reference, NaiveTime::MIN)
}

/// `time` on `reference`'s date, in the reference's timezone.
pub fn at_local_time<Tz: TimeZone>(reference: &DateTime<Tz>, time: NaiveTime) -> DateTime<Tz> {
    let local = reference.date_naive().and_time(time);
    resolve_local(&reference.timezone(), local)
}

/// Interprets a wall-clock time in `tz`.
///
/// Ambiguous times take the earlier instant. Times skipped by a DST jump
/// use the offset in effect before the jump, which lands them the same
/// distance past the gap (00:30 in a 00:00-01:00 gap becomes 01:30).
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return dt;
    }
    let before = local.checked_sub_signed(Duration::days(1)).unwrap_or(local);
    let offset = tz.offset_from_utc_datetime(&before).fix().local_minus_utc();
    let utc = local
        .checked_sub_signed(Duration::seconds(i64::from(offset)))
        .unwrap_or(local);
    tz.from_utc_datetime(&utc)
}

/// Moves every unfinished task that starts before `reference`'s day onto that
/// day at `anchor`, keeping its duration. Done tasks and tasks on or after
/// the reference day are left as they are, so a second pass on the same day
/// moves nothing.
pub fn roll_over<Tz: TimeZone>(tasks: &[Task], reference: &DateTime<Tz>, anchor: NaiveTime) -> Rollover {
    let day_start = start_of_day(reference).with_timezone(&Utc);
    let new_start = at_local_time(reference, anchor).with_timezone(&Utc);

    let mut moved = 0;
    let tasks = tasks
        .iter()
        .map(|task| {
            if !task.done && task.starts_before(day_start) {
                moved += 1;
                let mut task = task.clone();
                task.reschedule(new_start);
                task
            } else {
                task.clone()
            }
        })
        .collect();

    Rollover { tasks, moved }
}
