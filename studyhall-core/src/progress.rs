//! Progress dashboard numbers: completion rates, misses and streak.

use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::records::{CompletedTask, IncompleteTask};
use crate::task::{Category, Task};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressReport {
    /// 0-100.
    pub daily_percent: u32,
    /// 0-100.
    pub weekly_percent: u32,
    pub missing_daily: usize,
    pub missing_weekly: usize,
    pub completed_by_category: BTreeMap<String, usize>,
    /// Distinct local days with at least one completion.
    pub streak_days: usize,
    pub minutes_logged: u64,
}

pub fn progress_report(
    pending: &[Task],
    completed: &[CompletedTask],
    incomplete: &[IncompleteTask],
    tz: Option<&str>,
) -> Result<ProgressReport> {
    let done = |c: Category| completed.iter().filter(|t| t.category == c).count();
    let open = |c: Category| pending.iter().filter(|t| t.category == c).count();
    let missed = |c: Category| incomplete.iter().filter(|t| t.category == c).count();

    let completed_by_category = Category::ALL
        .iter()
        .map(|c| (c.to_string(), done(*c)))
        .collect();

    let completion_days: BTreeSet<NaiveDate> = match tz {
        Some(name) => {
            let tz: Tz = name
                .parse()
                .map_err(|_| anyhow!("invalid timezone: {name}"))?;
            completed
                .iter()
                .map(|t| t.completed_at.with_timezone(&tz).date_naive())
                .collect()
        }
        None => completed
            .iter()
            .map(|t| t.completed_at.with_timezone(&Local).date_naive())
            .collect(),
    };

    Ok(ProgressReport {
        daily_percent: percent(done(Category::Daily), open(Category::Daily)),
        weekly_percent: percent(done(Category::Weekly), open(Category::Weekly)),
        missing_daily: missed(Category::Daily),
        missing_weekly: missed(Category::Weekly),
        completed_by_category,
        streak_days: completion_days.len(),
        minutes_logged: completed
            .iter()
            .filter_map(|t| t.duration_minutes)
            .map(u64::from)
            .sum(),
    })
}

/// Share of finished work, rounded half up; zero when there is no work.
fn percent(done: usize, open: usize) -> u32 {
    let total = (done + open) as u64;
    if total == 0 {
        return 0;
    }
    ((200 * done as u64 + total) / (2 * total)) as u32
}
