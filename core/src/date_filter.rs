//! Day selection and display formatting for task lists.
//!
//! Nothing here normalizes timezones: callers pass timestamps already in the
//! zone the user is looking at, usually `chrono::Local`.

use chrono::{DateTime, Datelike, TimeZone, Timelike};

use crate::model::task::Task;

/// True when both timestamps fall on the same calendar date.
pub fn is_same_day<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

/// Tasks starting on `day`'s date, in list order.
pub fn select_for_day<'a, Tz: TimeZone>(tasks: &'a [Task], day: &DateTime<Tz>) -> Vec<&'a Task> {
    let tz = day.timezone();
    tasks
        .iter()
        .filter(|task| is_same_day(&task.start_time.with_timezone(&tz), day))
        .collect()
}

/// `13:05` -> `1:05 PM`, `00:00` -> `12:00 AM`.
pub fn format_display_time<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    let (is_pm, hour) = timestamp.hour12();
    let suffix = if is_pm { "PM" } else { "AM" };
    format!("{}:{:02} {}", hour, timestamp.minute(), suffix)
}
