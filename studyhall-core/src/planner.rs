//! Plan generator: distributes pending tasks over a multi-day window.
//!
//! Placement runs in three passes over a fixed set of day buckets:
//! - daily tasks all land on today, cap or no cap;
//! - weekly tasks get evenly spaced targets (or their deadline day) and probe
//!   forward circularly for a day with room;
//! - general tasks, earliest deadline first, take the first day with room
//!   on or before their deadline.
//!
//! When nothing has room the task goes to the least-loaded eligible day and
//! that day overflows. The whole thing is deterministic: no clock reads, no
//! randomness, stable sorts only.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::plan::{DayBucket, DaySummary, Plan};
use crate::task::{Task, TaskLists};
use crate::time::date_key;

pub const DEFAULT_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_MAX_MINUTES_PER_DAY: u32 = 240;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid plan options: {0}")]
    InvalidOptions(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    /// Days in the window, today included.
    pub window_days: u32,
    /// Soft cap on booked minutes per day.
    pub max_minutes_per_day: u32,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            max_minutes_per_day: DEFAULT_MAX_MINUTES_PER_DAY,
        }
    }
}

impl PlanOptions {
    pub fn new(window_days: u32, max_minutes_per_day: u32) -> Self {
        Self {
            window_days,
            max_minutes_per_day,
        }
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.window_days == 0 {
            return Err(PlanError::InvalidOptions(
                "window_days must be at least 1".into(),
            ));
        }
        if self.max_minutes_per_day == 0 {
            return Err(PlanError::InvalidOptions(
                "max_minutes_per_day must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Build the schedule for `today .. today + window_days - 1`.
///
/// Inputs are only read; the plan holds annotated copies. The only error is
/// `PlanError::InvalidOptions`.
pub fn generate_plan(
    daily: &[Task],
    weekly: &[Task],
    general: &[Task],
    options: &PlanOptions,
    today: NaiveDate,
) -> Result<Plan, PlanError> {
    options.validate()?;
    let cap = options.max_minutes_per_day;
    let mut days = init_buckets(today, options.window_days)?;

    // Daily: today, unconditionally.
    for t in daily {
        days[0].push(t, t.predicted_duration());
    }

    place_weekly(&mut days, weekly, cap);
    place_general(&mut days, general, cap);

    Ok(finalize(days, cap))
}

pub fn generate_plan_for(
    lists: &TaskLists,
    options: &PlanOptions,
    today: NaiveDate,
) -> Result<Plan, PlanError> {
    generate_plan(&lists.daily, &lists.weekly, &lists.general, options, today)
}

fn init_buckets(today: NaiveDate, window_days: u32) -> Result<Vec<DayBucket>, PlanError> {
    (0..window_days)
        .map(|i| {
            today
                .checked_add_days(Days::new(u64::from(i)))
                .map(DayBucket::new)
                .ok_or_else(|| {
                    PlanError::InvalidOptions(format!(
                        "window of {window_days} days from {today} runs past the calendar"
                    ))
                })
        })
        .collect()
}

/// Evenly spaced slot for the i-th of n weekly tasks:
/// `round((i + 1) * w / (n + 1)) - 1`, clamped into the window.
/// Rounds halves up.
pub fn weekly_target_index(i: usize, n: usize, window_days: usize) -> usize {
    let num = (i as u64 + 1) * window_days as u64;
    let den = n as u64 + 1;
    let rounded = (2 * num + den) / (2 * den);
    (rounded.saturating_sub(1) as usize).min(window_days.saturating_sub(1))
}

fn place_weekly(days: &mut [DayBucket], weekly: &[Task], cap: u32) {
    let w = days.len();
    let n = weekly.len();

    for (i, t) in weekly.iter().enumerate() {
        let dur = t.predicted_duration();
        let mut target = weekly_target_index(i, n, w);

        if let Some(last) = t
            .deadline
            .and_then(|dl| days.iter().rposition(|d| d.date <= dl))
        {
            target = last;
        }

        let probe = (0..w)
            .map(|offset| (target + offset) % w)
            .find(|&idx| days[idx].fits(dur, cap));
        let idx = match probe {
            Some(idx) => idx,
            None => {
                let idx = least_loaded(days);
                debug!(
                    task_id = %t.id,
                    day = %days[idx].date,
                    minutes = dur,
                    "weekly task forced past cap"
                );
                idx
            }
        };
        days[idx].push(t, dur);
    }
}

fn place_general(days: &mut [DayBucket], general: &[Task], cap: u32) {
    let mut sorted: Vec<&Task> = general.iter().collect();
    // Stable: equal keys keep caller order.
    sorted.sort_by(|a, b| match (a.deadline, b.deadline) {
        (Some(ad), Some(bd)) => ad.cmp(&bd),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    });

    for t in sorted {
        let dur = t.predicted_duration();

        // Buckets are ascending, so the eligible days are a prefix.
        let end = t
            .deadline
            .and_then(|dl| days.iter().rposition(|d| d.date <= dl))
            .map_or(days.len(), |last| last + 1);
        let candidates = &mut days[..end];

        let idx = match candidates.iter().position(|d| d.fits(dur, cap)) {
            Some(idx) => idx,
            None => {
                let idx = least_loaded(candidates);
                debug!(
                    task_id = %t.id,
                    day = %candidates[idx].date,
                    minutes = dur,
                    "general task forced past cap"
                );
                idx
            }
        };
        candidates[idx].push(t, dur);
    }
}

/// Index of the bucket with the fewest booked minutes; earliest wins ties.
fn least_loaded(days: &[DayBucket]) -> usize {
    days.iter()
        .enumerate()
        .min_by_key(|(_, d)| d.minutes_used)
        .map_or(0, |(idx, _)| idx)
}

fn finalize(days: Vec<DayBucket>, cap: u32) -> Plan {
    let mut buckets = BTreeMap::new();
    let mut summary = Vec::with_capacity(days.len());

    for d in days {
        let overflow = d.minutes_used > u64::from(cap);
        buckets.insert(date_key(d.date), d.tasks.clone());
        summary.push(DaySummary {
            date: d.date,
            count: d.tasks.len(),
            minutes: d.minutes_used,
            overflow,
            tasks: d.tasks,
        });
    }

    debug!(
        days = summary.len(),
        tasks = summary.iter().map(|d| d.count).sum::<usize>(),
        overflow_days = summary.iter().filter(|d| d.overflow).count(),
        "plan generated"
    );

    Plan { buckets, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Category;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(2026, 3, 2)
    }

    #[test]
    fn test_weekly_target_index_spread() {
        // 7/4 = 1.75 -> 2, 14/4 = 3.5 -> 4, 21/4 = 5.25 -> 5
        let idx: Vec<_> = (0..3).map(|i| weekly_target_index(i, 3, 7)).collect();
        assert_eq!(idx, vec![1, 3, 4]);
    }

    #[test]
    fn test_weekly_target_index_clamps() {
        // One task in a one-day window: round(1/2) - 1 = 0.
        assert_eq!(weekly_target_index(0, 1, 1), 0);
        // Many tasks in a short window never go negative.
        assert_eq!(weekly_target_index(0, 10, 2), 0);
        assert_eq!(weekly_target_index(9, 10, 2), 1);
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = generate_plan(&[], &[], &[], &PlanOptions::new(0, 240), today()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidOptions(_)));
    }

    #[test]
    fn test_rejects_zero_cap() {
        let err = generate_plan(&[], &[], &[], &PlanOptions::new(7, 0), today()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidOptions(_)));
    }

    #[test]
    fn test_rejects_window_past_calendar_end() {
        let err =
            generate_plan(&[], &[], &[], &PlanOptions::new(10, 240), NaiveDate::MAX).unwrap_err();
        assert!(matches!(err, PlanError::InvalidOptions(_)));
    }

    #[test]
    fn test_daily_ignores_cap() {
        let daily: Vec<Task> = (0..5)
            .map(|i| Task::new(format!("d{i}"), "drill", Category::Daily).with_duration(30.0))
            .collect();
        let plan = generate_plan(&daily, &[], &[], &PlanOptions::new(3, 60), today()).unwrap();
        assert_eq!(plan.summary[0].count, 5);
        assert_eq!(plan.summary[0].minutes, 150);
        assert!(plan.summary[0].overflow);
        assert!(!plan.summary[1].overflow);
    }

    #[test]
    fn test_weekly_deadline_overrides_target() {
        let weekly = vec![
            Task::new("w1", "essay", Category::Weekly).with_deadline(day(2026, 3, 3)),
        ];
        let plan = generate_plan(&[], &weekly, &[], &PlanOptions::default(), today()).unwrap();
        assert_eq!(plan.day_of("w1"), Some(day(2026, 3, 3)));
    }

    #[test]
    fn test_weekly_deadline_before_window_keeps_target() {
        let weekly = vec![
            Task::new("w1", "late", Category::Weekly).with_deadline(day(2026, 2, 1)),
        ];
        let plan = generate_plan(&[], &weekly, &[], &PlanOptions::default(), today()).unwrap();
        // round(7/2) - 1 = 3
        assert_eq!(plan.day_of("w1"), Some(day(2026, 3, 5)));
    }

    #[test]
    fn test_weekly_probe_wraps_around() {
        // Deadlines pin w1 and w3 to day 1. Once days 1 and 2 are full,
        // the probe for w3 wraps around to day 0.
        let weekly = vec![
            Task::new("w1", "a", Category::Weekly)
                .with_duration(100.0)
                .with_deadline(day(2026, 3, 3)),
            Task::new("w2", "b", Category::Weekly)
                .with_duration(100.0)
                .with_deadline(day(2026, 3, 4)),
            Task::new("w3", "c", Category::Weekly)
                .with_duration(100.0)
                .with_deadline(day(2026, 3, 3)),
        ];
        let plan = generate_plan(&[], &weekly, &[], &PlanOptions::new(3, 100), today()).unwrap();
        assert_eq!(plan.day_of("w1"), Some(day(2026, 3, 3)));
        assert_eq!(plan.day_of("w2"), Some(day(2026, 3, 4)));
        assert_eq!(plan.day_of("w3"), Some(day(2026, 3, 2)));
        assert!(plan.overflow_days().is_empty());
    }

    #[test]
    fn test_weekly_forced_goes_to_least_loaded() {
        let daily = vec![Task::new("d1", "x", Category::Daily).with_duration(50.0)];
        let weekly = vec![
            Task::new("w1", "a", Category::Weekly).with_duration(80.0),
            Task::new("w2", "b", Category::Weekly).with_duration(80.0),
        ];
        // Window of 2 days, cap 60: nothing fits anywhere.
        // w1 -> least loaded is day 1 (0 min); w2 -> day 0 (50) vs day 1 (80) -> day 0.
        let plan = generate_plan(&daily, &weekly, &[], &PlanOptions::new(2, 60), today()).unwrap();
        assert_eq!(plan.day_of("w1"), Some(day(2026, 3, 3)));
        assert_eq!(plan.day_of("w2"), Some(day(2026, 3, 2)));
        assert_eq!(plan.overflow_days().len(), 2);
    }

    #[test]
    fn test_weekly_forced_tie_takes_earliest_day() {
        // One task in a 3-day window targets round(3/2) - 1 = 1, but it fits
        // nowhere and every day is empty, so the earliest day wins.
        let weekly = vec![Task::new("w1", "a", Category::Weekly).with_duration(100.0)];
        let plan = generate_plan(&[], &weekly, &[], &PlanOptions::new(3, 50), today()).unwrap();
        assert_eq!(plan.day_of("w1"), Some(day(2026, 3, 2)));
    }

    #[test]
    fn test_general_forced_ties_fill_in_date_order() {
        let general: Vec<Task> = (0..3)
            .map(|i| Task::new(format!("g{i}"), "x", Category::General).with_duration(100.0))
            .collect();
        let plan = generate_plan(&[], &[], &general, &PlanOptions::new(3, 50), today()).unwrap();
        assert_eq!(plan.day_of("g0"), Some(day(2026, 3, 2)));
        assert_eq!(plan.day_of("g1"), Some(day(2026, 3, 3)));
        assert_eq!(plan.day_of("g2"), Some(day(2026, 3, 4)));
        assert_eq!(plan.overflow_days().len(), 3);
    }

    #[test]
    fn test_general_sorted_by_deadline_then_created() {
        use chrono::{TimeZone, Utc};
        let early = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

        // Cap fits one task per day, so placement order shows the sort order.
        let general = vec![
            Task::new("nodl-late", "x", Category::General).with_created_at(late),
            Task::new("dl-far", "x", Category::General).with_deadline(day(2026, 3, 8)),
            Task::new("nodl-early", "x", Category::General).with_created_at(early),
            Task::new("dl-near", "x", Category::General).with_deadline(day(2026, 3, 4)),
        ];
        let plan = generate_plan(&[], &[], &general, &PlanOptions::new(4, 45), today()).unwrap();
        assert_eq!(plan.day_of("dl-near"), Some(day(2026, 3, 2)));
        assert_eq!(plan.day_of("dl-far"), Some(day(2026, 3, 3)));
        assert_eq!(plan.day_of("nodl-early"), Some(day(2026, 3, 4)));
        assert_eq!(plan.day_of("nodl-late"), Some(day(2026, 3, 5)));
    }

    #[test]
    fn test_general_identical_keys_keep_input_order() {
        let general = vec![
            Task::new("first", "x", Category::General).with_deadline(day(2026, 3, 5)),
            Task::new("second", "x", Category::General).with_deadline(day(2026, 3, 5)),
        ];
        let plan = generate_plan(&[], &[], &general, &PlanOptions::new(2, 45), today()).unwrap();
        assert_eq!(plan.day_of("first"), Some(day(2026, 3, 2)));
        assert_eq!(plan.day_of("second"), Some(day(2026, 3, 3)));
    }

    #[test]
    fn test_general_forced_stays_within_deadline() {
        // Deadline is day 1; both candidate days are full, day 2 is empty.
        let daily = vec![Task::new("d1", "x", Category::Daily).with_duration(60.0)];
        let general = vec![
            Task::new("g0", "x", Category::General)
                .with_duration(50.0)
                .with_deadline(day(2026, 3, 3)),
            Task::new("g1", "x", Category::General)
                .with_duration(30.0)
                .with_deadline(day(2026, 3, 3)),
        ];
        let plan = generate_plan(&daily, &[], &general, &PlanOptions::new(3, 60), today()).unwrap();
        assert_eq!(plan.day_of("g0"), Some(day(2026, 3, 3)));
        // Day 0 has 60, day 1 has 50: least loaded candidate is day 1.
        assert_eq!(plan.day_of("g1"), Some(day(2026, 3, 3)));
        assert_eq!(plan.summary[2].count, 0);
    }

    #[test]
    fn test_inputs_untouched() {
        let general = vec![Task::new("g", "x", Category::General)];
        let before = general.clone();
        let plan = generate_plan(&[], &[], &general, &PlanOptions::default(), today()).unwrap();
        assert_eq!(general, before);
        assert_eq!(plan.summary[0].tasks[0].predicted_duration, 45);
    }
}
