#[cfg(test)]
mod tests {
    use crate::date_filter::is_same_day;
    use crate::error::{StoreError, ValidationError};
    use crate::model::task::{Task, TaskId};
    use crate::repository::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
    use crate::service::task_store::{StoreOptions, TaskStore, WritePolicy, DEFAULT_STORAGE_KEY};
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

    fn zone() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn local(d: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
        zone().with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        local(d, h, m).with_timezone(&Utc)
    }

    fn empty_store() -> TaskStore<MemoryKeyValueStore> {
        TaskStore::open(MemoryKeyValueStore::new(), StoreOptions::default()).unwrap()
    }

    fn optimistic() -> StoreOptions {
        StoreOptions {
            write_policy: WritePolicy::Optimistic,
            ..StoreOptions::default()
        }
    }

    fn stored(store: &TaskStore<MemoryKeyValueStore>) -> Vec<Task> {
        let raw = store.storage().raw(DEFAULT_STORAGE_KEY).unwrap();
        serde_json::from_str(raw).unwrap()
    }

    fn seeded(tasks: &[Task]) -> MemoryKeyValueStore {
        MemoryKeyValueStore::with_value(DEFAULT_STORAGE_KEY, &serde_json::to_string(tasks).unwrap())
    }

    #[test]
    fn test_add_task_to_empty_list() {
        let mut store = empty_store();
        let task = store.add_task("Write report", utc(10, 9, 0), utc(10, 10, 0)).unwrap();

        assert_eq!(store.tasks().len(), 1);
        let saved = &store.tasks()[0];
        assert_eq!(saved, &task);
        assert_eq!(saved.title, "Write report");
        assert_eq!(saved.start_time, utc(10, 9, 0));
        assert_eq!(saved.end_time, utc(10, 10, 0));
        assert!(!saved.done);
        assert_eq!(store.storage().writes(), 1);
        assert_eq!(stored(&store), store.tasks());
    }

    #[test]
    fn test_add_task_appends_in_order() {
        let mut store = empty_store();
        store.add_task("first", utc(10, 11, 0), utc(10, 12, 0)).unwrap();
        store.add_task("second", utc(10, 8, 0), utc(10, 9, 0)).unwrap();
        let titles: Vec<&str> = store.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(store.storage().writes(), 2);
    }

    #[test]
    fn test_add_task_rejects_blank_title() {
        let mut store = empty_store();
        for title in ["", "   ", "\t\n"] {
            let err = store.add_task(title, utc(10, 9, 0), utc(10, 10, 0)).unwrap_err();
            assert!(matches!(err, StoreError::Validation(ValidationError::EmptyTitle)));
        }
        assert!(store.tasks().is_empty());
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn test_add_task_rejects_inverted_or_empty_range() {
        let mut store = empty_store();
        let err = store.add_task("Meet", utc(10, 10, 0), utc(10, 10, 0)).unwrap_err();
        assert!(err.is_validation());
        let err = store.add_task("Meet", utc(10, 11, 0), utc(10, 10, 0)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::InvalidTimeRange { .. })
        ));
        assert!(store.tasks().is_empty());
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn test_mark_as_done_flips_only_target() {
        let mut store = empty_store();
        let a = store.add_task("a", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        let b = store.add_task("b", utc(10, 11, 0), utc(10, 12, 0)).unwrap();

        assert!(store.mark_as_done(&a.id).unwrap());

        let done = store.get(&a.id).unwrap();
        assert!(done.done);
        assert_eq!(done.title, a.title);
        assert_eq!(done.start_time, a.start_time);
        assert_eq!(done.end_time, a.end_time);
        assert_eq!(store.get(&b.id).unwrap(), &b);
        assert_eq!(stored(&store), store.tasks());
    }

    #[test]
    fn test_mark_as_done_twice_is_idempotent() {
        let mut store = empty_store();
        let a = store.add_task("a", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        store.mark_as_done(&a.id).unwrap();
        let after_first = store.tasks().to_vec();
        let writes = store.storage().writes();

        assert!(!store.mark_as_done(&a.id).unwrap());
        assert_eq!(store.tasks(), after_first.as_slice());
        assert_eq!(store.storage().writes(), writes);
    }

    #[test]
    fn test_mark_as_done_unknown_id() {
        let mut store = empty_store();
        store.add_task("a", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        let before = store.tasks().to_vec();

        let err = store.mark_as_done(&TaskId::from("missing")).unwrap_err();
        assert!(matches!(err, StoreError::TaskNotFound(ref id) if id.as_str() == "missing"));
        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(store.storage().writes(), 1);
    }

    #[test]
    fn test_rollover_moves_only_unfinished_past_tasks() {
        let yesterday_open = Task::new("open", utc(9, 15, 0), utc(9, 16, 0));
        let mut yesterday_done = Task::new("done", utc(9, 15, 0), utc(9, 16, 0));
        yesterday_done.done = true;
        let today_open = Task::new("today", utc(10, 7, 0), utc(10, 8, 0));
        let mut today_done = Task::new("today done", utc(10, 6, 0), utc(10, 7, 0));
        today_done.done = true;
        let tasks = vec![yesterday_open.clone(), yesterday_done.clone(), today_open.clone(), today_done.clone()];

        let mut store = TaskStore::open(seeded(&tasks), StoreOptions::default()).unwrap();
        let now = local(10, 14, 0);
        assert_eq!(store.roll_over_incomplete_tasks(&now).unwrap(), 1);

        let moved = store.get(&yesterday_open.id).unwrap();
        assert!(is_same_day(&moved.start_time.with_timezone(&zone()), &now));
        assert_eq!(moved.start_time, utc(10, 9, 0));
        assert_eq!(moved.duration(), Duration::hours(1));
        assert_eq!(store.get(&yesterday_done.id).unwrap(), &yesterday_done);
        assert_eq!(store.get(&today_open.id).unwrap(), &today_open);
        assert_eq!(store.get(&today_done.id).unwrap(), &today_done);
        assert_eq!(store.storage().writes(), 1);
        assert_eq!(stored(&store), store.tasks());

        assert_eq!(store.roll_over_incomplete_tasks(&local(10, 20, 0)).unwrap(), 0);
        assert_eq!(store.storage().writes(), 1);
    }

    #[test]
    fn test_rollover_with_nothing_to_move_does_not_write() {
        let mut store = empty_store();
        store.add_task("today", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        assert_eq!(store.roll_over_incomplete_tasks(&local(10, 12, 0)).unwrap(), 0);
        assert_eq!(store.storage().writes(), 1);
    }

    #[test]
    fn test_roll_over_if_new_day() {
        let mut store = empty_store();
        assert_eq!(store.roll_over_if_new_day(&local(10, 8, 0)).unwrap(), 0);

        // Added later the same day with a start on an earlier day: the daily
        // pass already ran, so it waits for tomorrow.
        let stale = store.add_task("stale", utc(8, 9, 0), utc(8, 9, 30)).unwrap();
        assert_eq!(store.roll_over_if_new_day(&local(10, 18, 0)).unwrap(), 0);
        assert_eq!(store.get(&stale.id).unwrap().start_time, utc(8, 9, 0));

        assert_eq!(store.roll_over_if_new_day(&local(11, 7, 0)).unwrap(), 1);
        let moved = store.get(&stale.id).unwrap();
        assert_eq!(moved.start_time, utc(11, 9, 0));
        assert_eq!(moved.duration(), Duration::minutes(30));
    }

    #[test]
    fn test_open_at_rolls_over_on_startup() {
        let old = Task::new("old", utc(1, 13, 0), utc(1, 15, 0));
        let store = TaskStore::open_at(seeded(&[old.clone()]), StoreOptions::default(), &local(10, 6, 0)).unwrap();
        let moved = store.get(&old.id).unwrap();
        assert_eq!(moved.start_time, utc(10, 9, 0));
        assert_eq!(moved.end_time, utc(10, 11, 0));
        assert_eq!(stored(&store), store.tasks());
    }

    #[test]
    fn test_open_missing_or_blank_is_empty() {
        assert!(empty_store().tasks().is_empty());
        let store = TaskStore::open(MemoryKeyValueStore::with_value(DEFAULT_STORAGE_KEY, "  \n"), StoreOptions::default()).unwrap();
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_open_corrupt_data_is_reported_and_untouched() {
        let storage = MemoryKeyValueStore::with_value(DEFAULT_STORAGE_KEY, "{not json");
        let err = TaskStore::open(storage, StoreOptions::default()).err().unwrap();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == DEFAULT_STORAGE_KEY));

        let mut storage = MemoryKeyValueStore::with_value(DEFAULT_STORAGE_KEY, "[]");
        storage.set(DEFAULT_STORAGE_KEY, r#"[{"id":"1"}]"#).unwrap();
        let err = TaskStore::open(storage.clone(), StoreOptions::default()).err().unwrap();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert_eq!(storage.raw(DEFAULT_STORAGE_KEY), Some(r#"[{"id":"1"}]"#));
    }

    #[test]
    fn test_loads_legacy_data() {
        let raw = r#"[
            {"id":"1712345678901","title":"Legacy","startTime":"2024-03-10T14:00:00.000Z","endTime":"2024-03-10T15:00:00.000Z","done":false},
            {"id":"1712345678902","title":"Finished","startTime":"2024-03-10T16:00:00.000Z","endTime":"2024-03-10T16:00:00.000Z","done":true}
        ]"#;
        let store = TaskStore::open(MemoryKeyValueStore::with_value(DEFAULT_STORAGE_KEY, raw), StoreOptions::default()).unwrap();
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[0].id.as_str(), "1712345678901");
        assert_eq!(store.tasks()[0].start_time, Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap());
        assert!(store.tasks()[1].done);
    }

    #[test]
    fn test_round_trip_through_storage() {
        let mut store = empty_store();
        let a = store.add_task("a", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        store.add_task("b", utc(11, 9, 15), utc(11, 9, 45)).unwrap();
        store.mark_as_done(&a.id).unwrap();

        let original = store.tasks().to_vec();
        let reopened = TaskStore::open(store.storage().clone(), StoreOptions::default()).unwrap();
        assert_eq!(reopened.tasks(), original.as_slice());
    }

    #[test]
    fn test_file_storage_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileKeyValueStore::new(Some(dir.path().to_path_buf())).unwrap();
        let mut store = TaskStore::open(files, StoreOptions::default()).unwrap();
        let task = store.add_task("Persisted", utc(10, 9, 0), utc(10, 10, 0)).unwrap();

        let files = FileKeyValueStore::new(Some(dir.path().to_path_buf())).unwrap();
        let reopened = TaskStore::open(files, StoreOptions::default()).unwrap();
        assert_eq!(reopened.tasks(), &[task]);
    }

    #[test]
    fn test_confirmed_write_failure_keeps_memory() {
        let mut store = empty_store();
        let a = store.add_task("a", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        store.storage_mut().set_fail_writes(true);

        let err = store.add_task("b", utc(10, 11, 0), utc(10, 12, 0)).unwrap_err();
        assert!(matches!(err, StoreError::Persist { .. }));
        assert_eq!(store.tasks(), &[a.clone()]);

        assert!(store.mark_as_done(&a.id).is_err());
        assert!(!store.get(&a.id).unwrap().done);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_optimistic_write_failure_then_flush() {
        let mut store = TaskStore::open(MemoryKeyValueStore::new(), optimistic()).unwrap();
        store.storage_mut().set_fail_writes(true);

        let task = store.add_task("offline", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        assert_eq!(store.tasks(), &[task.clone()]);
        assert!(store.is_dirty());
        assert!(store.storage().raw(DEFAULT_STORAGE_KEY).is_none());

        assert!(store.flush().is_err());
        assert!(store.is_dirty());

        store.storage_mut().set_fail_writes(false);
        store.flush().unwrap();
        assert!(!store.is_dirty());
        assert_eq!(stored(&store), vec![task]);
    }

    #[test]
    fn test_load_refuses_to_drop_unsaved_changes() {
        let mut store = TaskStore::open(MemoryKeyValueStore::new(), optimistic()).unwrap();
        store.storage_mut().set_fail_writes(true);
        let task = store.add_task("offline", utc(10, 9, 0), utc(10, 10, 0)).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::UnsavedChanges { .. }));
        assert_eq!(store.tasks(), &[task.clone()]);
        assert!(store.is_dirty());

        store.storage_mut().set_fail_writes(false);
        store.flush().unwrap();
        store.load().unwrap();
        assert_eq!(store.tasks(), &[task]);
    }

    #[test]
    fn test_optimistic_success_is_clean() {
        let mut store = TaskStore::open(MemoryKeyValueStore::new(), optimistic()).unwrap();
        store.add_task("a", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        assert!(!store.is_dirty());
        assert_eq!(stored(&store), store.tasks());
        store.flush().unwrap();
        assert_eq!(store.storage().writes(), 1);
    }

    #[test]
    fn test_custom_storage_key() {
        let options = StoreOptions {
            storage_key: "work".to_string(),
            ..StoreOptions::default()
        };
        let mut store = TaskStore::open(MemoryKeyValueStore::new(), options).unwrap();
        store.add_task("a", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        assert!(store.storage().raw("work").is_some());
        assert!(store.storage().raw(DEFAULT_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_tasks_for_day() {
        let mut store = empty_store();
        store.add_task("mon", utc(11, 9, 0), utc(11, 10, 0)).unwrap();
        store.add_task("sun", utc(10, 9, 0), utc(10, 10, 0)).unwrap();
        let sunday = store.tasks_for_day(&local(10, 0, 0));
        assert_eq!(sunday.len(), 1);
        assert_eq!(sunday[0].title, "sun");
    }

    #[test]
    fn test_resolve_id() {
        let mut tasks = vec![
            Task::new("a", utc(10, 9, 0), utc(10, 10, 0)),
            Task::new("b", utc(10, 9, 0), utc(10, 10, 0)),
            Task::new("c", utc(10, 9, 0), utc(10, 10, 0)),
        ];
        tasks[0].id = TaskId::from("abc1");
        tasks[1].id = TaskId::from("abc2");
        tasks[2].id = TaskId::from("abc");
        let store = TaskStore::open(seeded(&tasks), StoreOptions::default()).unwrap();

        assert_eq!(store.resolve_id("abc").unwrap().as_str(), "abc");
        assert_eq!(store.resolve_id("abc2").unwrap().as_str(), "abc2");
        assert!(matches!(
            store.resolve_id("ab"),
            Err(StoreError::AmbiguousId { matches: 3, .. })
        ));
        assert!(matches!(store.resolve_id("zz"), Err(StoreError::TaskNotFound(_))));
        assert!(matches!(store.resolve_id(""), Err(StoreError::TaskNotFound(_))));
    }
}
