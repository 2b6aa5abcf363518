//! Completed and missed task records, plus the overdue sweep.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Category, Task};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Minutes actually spent, if the user said.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// A task whose deadline passed before it was completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteTask {
    pub id: String,
    pub original_task_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub original_created_at: DateTime<Utc>,
    #[serde(default)]
    pub original_deadline: Option<NaiveDate>,
    pub missed_at: DateTime<Utc>,
}

/// Read an optional "minutes spent" answer.
///
/// Takes the leading integer of the trimmed input ("25", "25 min") and keeps it
/// only if it is positive. Anything else means "skip".
pub fn parse_minutes_input(raw: &str) -> Option<u32> {
    let s = raw.trim();
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => None,
    }
}

pub fn complete_task(task: &Task, minutes: Option<u32>, now: DateTime<Utc>) -> CompletedTask {
    CompletedTask {
        id: task.id.clone(),
        title: task.title.clone(),
        category: task.category,
        deadline: task.deadline,
        created_at: task.created_at,
        completed_at: now,
        duration_minutes: minutes.filter(|m| *m > 0),
    }
}

/// Due date strictly before `today`. A task due today is still on time.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.deadline.is_some_and(|dl| dl < today)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sweep {
    pub pending: Vec<Task>,
    pub missed: Vec<IncompleteTask>,
}

/// Split tasks into still-pending and missed, keeping order.
pub fn sweep_overdue(tasks: Vec<Task>, today: NaiveDate, now: DateTime<Utc>) -> Sweep {
    let mut out = Sweep::default();
    for t in tasks {
        if is_overdue(&t, today) {
            out.missed.push(IncompleteTask {
                id: format!("missed-{}", t.id),
                original_task_id: t.id,
                title: t.title,
                category: t.category,
                original_created_at: t.created_at,
                original_deadline: t.deadline,
                missed_at: now,
            });
        } else {
            out.pending.push(t);
        }
    }
    out
}
