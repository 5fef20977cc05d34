//! Cache-or-fetch, normalise, aggregate.

use chrono::NaiveDate;

use crate::burndown::{burndown, BurndownOptions, BurndownSeries};
use crate::cache::TaskCache;
use crate::error::DashError;
use crate::normalize::normalize_tasks;
use crate::source::TaskSource;
use crate::task::Task;

/// Everything the views need from one pass through the pipeline.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub series: BurndownSeries,
    pub today: NaiveDate,
}

/// Read the list through the cache and normalise it.
pub fn load_tasks<S: TaskSource>(cache: &mut TaskCache<S>) -> Result<Vec<Task>, DashError> {
    let records = cache.get()?;
    let tasks = normalize_tasks(records)?;
    tracing::info!(target: "sdash.pipeline", tasks = tasks.len(), "loaded tasks");
    Ok(tasks)
}

/// Build the snapshot for an already-normalised task list.
pub fn build_snapshot(
    tasks: Vec<Task>,
    opts: &BurndownOptions,
    today: NaiveDate,
) -> Result<Snapshot, DashError> {
    let series = burndown(&tasks, today, opts)?;
    Ok(Snapshot {
        tasks,
        series,
        today,
    })
}

/// Full pass: cache-or-fetch, normalise, aggregate.
pub fn snapshot<S: TaskSource>(
    cache: &mut TaskCache<S>,
    opts: &BurndownOptions,
    today: NaiveDate,
) -> Result<Snapshot, DashError> {
    let tasks = load_tasks(cache)?;
    build_snapshot(tasks, opts, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use serde_json::{json, Value};
    use std::time::Duration;

    struct StaticSource(Vec<Value>);

    impl TaskSource for StaticSource {
        fn fetch_tasks(&self) -> Result<Vec<Value>, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_snapshot_end_to_end() {
        let source = StaticSource(vec![
            json!({"id": "1", "name": "A", "status": {"status": "done"}, "due_date": "2024-01-01"}),
            json!({"id": "2", "name": "B", "status": {"status": "todo"}, "start_date": "2024-01-03"}),
        ]);
        let mut cache = TaskCache::new(source, Duration::from_secs(60));
        let snap = snapshot(&mut cache, &BurndownOptions::default(), d(2024, 6, 1)).unwrap();

        assert_eq!(snap.tasks.len(), 2);
        assert_eq!(snap.series.column("done"), Some(vec![1, 1, 1]));
        assert_eq!(snap.series.column("todo"), Some(vec![0, 0, 1]));
    }

    #[test]
    fn test_bad_record_aborts_snapshot() {
        let source = StaticSource(vec![
            json!({"id": "1", "name": "A", "status": {"status": "done"}}),
            json!({"id": "2", "name": "B", "status": {"status": "todo"}, "due_date": "not-a-date"}),
        ]);
        let mut cache = TaskCache::new(source, Duration::from_secs(60));
        let result = snapshot(&mut cache, &BurndownOptions::default(), d(2024, 6, 1));
        assert!(matches!(result, Err(DashError::DateParse { .. })));
    }
}
