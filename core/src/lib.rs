pub mod config;
pub mod date_filter;
pub mod error;
pub mod input;
pub mod model;
pub mod repository;
pub mod service;
pub mod time;
pub mod usecase;

pub use config::Config;
pub use date_filter::{format_display_time, is_same_day, select_for_day};
pub use error::{StoreError, ValidationError};
pub use input::{expand_key, parse_args, ParsedInput, ADD_FIELDS};
pub use model::task::{Task, TaskId};
pub use repository::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use service::task_store::{StoreOptions, TaskStore, WritePolicy, DEFAULT_STORAGE_KEY};
pub use time::{parse_clock_time, parse_day, parse_duration};
pub use usecase::rollover::{resolve_local, roll_over, Rollover};
