mod add;
mod day_view;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use clap::Parser;
use planit_core::{parse_day, resolve_local, Config, FileKeyValueStore, TaskStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "planit")]
#[command(about = "Plan your day; unfinished tasks roll forward until done", long_about = None)]
struct Cli {
    /// Config file (default: ~/.planit/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding task data, overrides the config file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug, PartialEq)]
enum Commands {
    /// Add a task (usage: add Write report start:9:00 end:10:30 date:tomorrow)
    Add {
        /// Title words plus optional start:, end:, for: and date: fields
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List the tasks of a day (default: today)
    List {
        /// today, tomorrow, yesterday, +2d, fri or YYYY-MM-DD
        #[arg(long, short)]
        date: Option<String>,
    },
    /// Mark a task as done by id or id prefix
    Done { id: String },
    /// Report unfinished tasks moved onto today at startup
    Rollover,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    install_tracing();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let storage = FileKeyValueStore::new(Some(config.data_dir()?))?;
    let mut store = TaskStore::open(storage, config.store_options()?)?;

    let now = Local::now();
    let moved = store.roll_over_incomplete_tasks(&now)?;

    let result = run(&mut store, cli.command, &now, moved);

    if store.is_dirty() {
        if let Err(e) = store.flush() {
            eprintln!("Warning: changes are not saved yet: {}", e);
        }
    }
    result
}

fn run<Tz: TimeZone>(
    store: &mut TaskStore<FileKeyValueStore>,
    command: Option<Commands>,
    now: &DateTime<Tz>,
    moved: usize,
) -> Result<()>
where
    Tz::Offset: std::fmt::Display,
{
    match command.unwrap_or(Commands::List { date: None }) {
        Commands::Add { args } => {
            let request = add::resolve_add(&args, now)?;
            let task = store.add_task(&request.title, request.start, request.end)?;
            println!("Task added: {} (ID: {})", task.title, task.id.short());
        }
        Commands::List { date } => {
            let day = match date {
                Some(d) => {
                    let date = parse_day(&d, now.date_naive())?;
                    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
                    resolve_local(&now.timezone(), noon)
                }
                None => now.clone(),
            };
            let tasks = store.tasks_for_day(&day);
            println!("{}", day_view::render_day(&tasks, &day));
        }
        Commands::Done { id } => {
            let id = store.resolve_id(&id)?;
            if store.mark_as_done(&id)? {
                println!("Marked as done: {}", id.short());
            } else {
                println!("Already done: {}", id.short());
            }
        }
        Commands::Rollover => {
            println!("Rolled over {} unfinished task(s) to today.", moved);
        }
    }
    Ok(())
}

fn install_tracing() {
    // RUST_LOG overrides; stay quiet by default so listings are clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
