//! Cumulative per-status burndown series.
//!
//! Every task is placed on the timeline at its effective date and counts towards
//! its status bucket from that day to the end of the range. The series is a pure
//! function of the task list; nothing here is cached or mutated after return.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::DashError;
use crate::fields::{EmptySeriesPolicy, UnknownStatusPolicy, DEFAULT_BUCKETS};
use crate::task::{status_key, Task};

/// Knobs for [`burndown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurndownOptions {
    /// Lower-cased bucket labels, in column order.
    pub buckets: Vec<String>,
    pub unknown_status: UnknownStatusPolicy,
    pub empty: EmptySeriesPolicy,
}

impl Default for BurndownOptions {
    fn default() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }
}

impl BurndownOptions {
    /// Options charting `buckets`. Labels are case-folded and de-duplicated.
    pub fn with_buckets<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = Vec::new();
        for label in buckets {
            let key = status_key(label.as_ref());
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }
        BurndownOptions {
            buckets: keys,
            unknown_status: UnknownStatusPolicy::default(),
            empty: EmptySeriesPolicy::default(),
        }
    }

    pub fn unknown_status(mut self, policy: UnknownStatusPolicy) -> Self {
        self.unknown_status = policy;
        self
    }

    pub fn empty(mut self, policy: EmptySeriesPolicy) -> Self {
        self.empty = policy;
        self
    }
}

/// Bucket counts as of the end of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurndownRow {
    pub date: NaiveDate,
    /// One count per bucket, in [`BurndownSeries::buckets`] order.
    pub counts: Vec<u64>,
}

/// Day-indexed table of cumulative task counts per status bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BurndownSeries {
    buckets: Vec<String>,
    rows: Vec<BurndownRow>,
    dropped: BTreeMap<String, usize>,
}

impl BurndownSeries {
    fn empty(buckets: Vec<String>) -> Self {
        BurndownSeries {
            buckets,
            rows: Vec::new(),
            dropped: BTreeMap::new(),
        }
    }

    pub fn buckets(&self) -> &[String] {
        &self.buckets
    }

    /// Rows in ascending date order, one per calendar day.
    pub fn rows(&self) -> &[BurndownRow] {
        &self.rows
    }

    /// Status labels that matched no bucket, with how many tasks carried each.
    pub fn dropped(&self) -> &BTreeMap<String, usize> {
        &self.dropped
    }

    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// First and last day of the series.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.rows.first()?.date, self.rows.last()?.date))
    }

    /// The counts of one bucket across all days.
    pub fn column(&self, bucket: &str) -> Option<Vec<u64>> {
        let key = status_key(bucket);
        let idx = self.buckets.iter().position(|b| *b == key)?;
        Some(self.rows.iter().map(|r| r.counts[idx]).collect())
    }

    /// Largest count anywhere in the table.
    pub fn max_count(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|r| r.counts.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Compute the burndown series for `tasks`.
///
/// `today` stands in for the effective date of tasks with neither a due nor a
/// start date. An empty task list gives an empty series, or
/// [`DashError::EmptyDomain`] under [`EmptySeriesPolicy::Require`].
pub fn burndown(
    tasks: &[Task],
    today: NaiveDate,
    opts: &BurndownOptions,
) -> Result<BurndownSeries, DashError> {
    let dates: Vec<NaiveDate> = tasks.iter().map(|t| t.effective_date(today)).collect();
    let (Some(&start), Some(&end)) = (dates.iter().min(), dates.iter().max()) else {
        return match opts.empty {
            EmptySeriesPolicy::Allow => Ok(BurndownSeries::empty(opts.buckets.clone())),
            EmptySeriesPolicy::Require => Err(DashError::EmptyDomain),
        };
    };

    let mut arrivals: Vec<(NaiveDate, usize)> = Vec::with_capacity(tasks.len());
    let mut dropped: BTreeMap<String, usize> = BTreeMap::new();
    for (task, &date) in tasks.iter().zip(&dates) {
        let key = task.status_key();
        match opts.buckets.iter().position(|b| *b == key) {
            Some(bucket) => arrivals.push((date, bucket)),
            None => *dropped.entry(key).or_insert(0) += 1,
        }
    }
    report_dropped(&dropped, opts.unknown_status);
    arrivals.sort_unstable();

    // Single sweep: add each task on the first day it is reached, then snapshot.
    let mut totals = vec![0u64; opts.buckets.len()];
    let mut pending = arrivals.into_iter().peekable();
    let rows: Vec<BurndownRow> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| {
            while let Some((_, bucket)) = pending.next_if(|(date, _)| *date <= day) {
                totals[bucket] += 1;
            }
            BurndownRow {
                date: day,
                counts: totals.clone(),
            }
        })
        .collect();

    tracing::debug!(
        target: "sdash.burndown",
        tasks = tasks.len(),
        days = rows.len(),
        %start,
        %end,
        dropped = dropped.values().sum::<usize>(),
        "computed burndown series"
    );

    Ok(BurndownSeries {
        buckets: opts.buckets.clone(),
        rows,
        dropped,
    })
}

fn report_dropped(dropped: &BTreeMap<String, usize>, policy: UnknownStatusPolicy) {
    for (label, count) in dropped {
        match policy {
            UnknownStatusPolicy::Warn => tracing::warn!(
                target: "sdash.burndown",
                status = %label,
                tasks = count,
                "status is not a burndown bucket; tasks left out of the chart"
            ),
            UnknownStatusPolicy::Drop => tracing::debug!(
                target: "sdash.burndown",
                status = %label,
                tasks = count,
                "dropping unknown status"
            ),
        }
    }
}
