//! Task data structure and related functionality.
//!
//! This module defines the normalised `Task` that every view consumes, along with
//! the effective-date rule used to place a task on the burndown timeline.

use chrono::NaiveDate;
use serde::Serialize;

/// Base of the deep link back to a task in the ClickUp web app.
pub const TASK_URL_BASE: &str = "https://app.clickup.com/t/";

/// A single work item as fetched from the remote list.
///
/// Produced fresh on every fetch and never mutated afterwards. `status` keeps the
/// casing the source system used; comparisons go through [`Task::status_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub status: String,
    pub start: Option<NaiveDate>,
    pub due: Option<NaiveDate>,
    pub url: String,
}

impl Task {
    /// Create a task, deriving its url from the id.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        status: impl Into<String>,
        start: Option<NaiveDate>,
        due: Option<NaiveDate>,
    ) -> Self {
        let id = id.into();
        let url = task_url(&id);
        Task {
            id,
            name: name.into(),
            status: status.into(),
            start,
            due,
            url,
        }
    }

    /// Lower-cased status used for every comparison.
    pub fn status_key(&self) -> String {
        status_key(&self.status)
    }

    /// Due date, else start date, else `today`.
    pub fn effective_date(&self, today: NaiveDate) -> NaiveDate {
        self.due.or(self.start).unwrap_or(today)
    }
}

/// Deep link for a task id.
pub fn task_url(id: &str) -> String {
    format!("{TASK_URL_BASE}{id}")
}

/// Normalise a status label for case-insensitive comparison.
pub fn status_key(label: &str) -> String {
    label.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_url_derived_from_id() {
        let t = Task::new("86abc", "Login screen", "to do", None, None);
        assert_eq!(t.url, "https://app.clickup.com/t/86abc");
    }

    #[test]
    fn test_status_key_is_case_insensitive() {
        let t = Task::new("1", "x", " In Progress", None, None);
        assert_eq!(t.status_key(), "in progress");
        assert_eq!(t.status, " In Progress");
    }

    #[test]
    fn test_effective_date_precedence() {
        let today = d(2024, 5, 1);
        let both = Task::new("1", "a", "todo", Some(d(2024, 1, 3)), Some(d(2024, 1, 9)));
        let start_only = Task::new("2", "b", "todo", Some(d(2024, 1, 3)), None);
        let neither = Task::new("3", "c", "todo", None, None);
        assert_eq!(both.effective_date(today), d(2024, 1, 9));
        assert_eq!(start_only.effective_date(today), d(2024, 1, 3));
        assert_eq!(neither.effective_date(today), today);
    }

    #[test]
    fn test_due_before_start_is_accepted() {
        let t = Task::new("1", "a", "done", Some(d(2024, 2, 10)), Some(d(2024, 2, 1)));
        assert_eq!(t.effective_date(d(2024, 3, 1)), d(2024, 2, 1));
    }
}
