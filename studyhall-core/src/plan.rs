//! Plan output types: day buckets, per-day summaries and the plan itself.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::task::Task;

/// A task copy placed into a day, annotated with the minutes booked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTask {
    #[serde(flatten)]
    pub task: Task,
    pub predicted_duration: u32,
}

/// One day of the planning window while placement runs.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub minutes_used: u64,
    pub tasks: Vec<PlannedTask>,
}

impl DayBucket {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            minutes_used: 0,
            tasks: Vec::new(),
        }
    }

    pub fn fits(&self, minutes: u32, cap: u32) -> bool {
        self.minutes_used + u64::from(minutes) <= u64::from(cap)
    }

    pub fn push(&mut self, task: &Task, minutes: u32) {
        self.tasks.push(PlannedTask {
            task: task.clone(),
            predicted_duration: minutes,
        });
        self.minutes_used += u64::from(minutes);
    }
}

/// Finalized view of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub count: usize,
    pub minutes: u64,
    pub overflow: bool,
    pub tasks: Vec<PlannedTask>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plan {
    /// "YYYY-MM-DD" -> tasks placed on that day.
    pub buckets: BTreeMap<String, Vec<PlannedTask>>,
    /// One entry per day, ascending.
    pub summary: Vec<DaySummary>,
}

impl Plan {
    pub fn window_days(&self) -> usize {
        self.summary.len()
    }

    pub fn total_tasks(&self) -> usize {
        self.summary.iter().map(|d| d.count).sum()
    }

    pub fn overflow_days(&self) -> Vec<NaiveDate> {
        self.summary
            .iter()
            .filter(|d| d.overflow)
            .map(|d| d.date)
            .collect()
    }

    /// Day a task landed on.
    pub fn day_of(&self, task_id: &str) -> Option<NaiveDate> {
        self.summary
            .iter()
            .find(|d| d.tasks.iter().any(|p| p.task.id == task_id))
            .map(|d| d.date)
    }
}
