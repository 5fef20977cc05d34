//! Enumerations and field types shared by the CLI, the views and the aggregator.

use clap::ValueEnum;

/// Status labels charted on the burndown by default.
pub const DEFAULT_BUCKETS: [&str; 3] = ["todo", "in progress", "done"];

/// Kanban columns shown by default, in board order.
pub const DEFAULT_COLUMNS: [&str; 4] = ["to do", "in progress", "review", "done"];

/// What to do with a status label that is not a known burndown bucket.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum UnknownStatusPolicy {
    /// Drop silently (debug log only).
    Drop,
    /// Drop and emit a warning per label.
    #[default]
    Warn,
}

/// Whether an empty task list yields an empty series or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptySeriesPolicy {
    #[default]
    Allow,
    Require,
}

/// Sort orders for the timeline table.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum TimelineSort {
    /// Keep the order the source returned.
    #[default]
    Source,
    Start,
    Due,
    Name,
}

impl TimelineSort {
    pub fn label(self) -> &'static str {
        match self {
            TimelineSort::Source => "source",
            TimelineSort::Start => "start",
            TimelineSort::Due => "due",
            TimelineSort::Name => "name",
        }
    }

    /// Next order in the cycle used by the interactive timeline.
    pub fn next(self) -> Self {
        match self {
            TimelineSort::Source => TimelineSort::Start,
            TimelineSort::Start => TimelineSort::Due,
            TimelineSort::Due => TimelineSort::Name,
            TimelineSort::Name => TimelineSort::Source,
        }
    }
}
