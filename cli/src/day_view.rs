use chrono::{DateTime, TimeZone};
use planit_core::{format_display_time, Task};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Task")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Renders the tasks of one day, times shown in `day`'s timezone.
pub fn render_day<Tz: TimeZone>(tasks: &[&Task], day: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let header = format!("Tasks for {}", day.format("%a, %m/%d/%y"));
    if tasks.is_empty() {
        return format!("{}\nNo tasks planned.", header);
    }

    let tz = day.timezone();
    let rows: Vec<DayRow> = tasks
        .iter()
        .map(|task| DayRow {
            id: task.id.short().to_string(),
            time: format!(
                "{} - {}",
                format_display_time(&task.start_time.with_timezone(&tz)),
                format_display_time(&task.end_time.with_timezone(&tz))
            ),
            title: task.title.clone(),
            status: if task.done { "Done".to_string() } else { "Not done".to_string() },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{}\n{}", header, table)
}
