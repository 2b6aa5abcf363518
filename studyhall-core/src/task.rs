//! Task model shared by the planner, the local store and the progress views.
//!
//! Tasks arrive from a loosely typed store, so deserialization is forgiving:
//! unknown or missing categories become `General`, a missing title is empty,
//! and a missing creation time falls back to the Unix epoch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Scheduling category. Determines where the planner puts a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Placed on today only.
    Daily,
    /// Spread across the planning window.
    Weekly,
    /// Placed as early as capacity allows, before its deadline.
    #[default]
    General,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Daily, Category::Weekly, Category::General];

    /// Permissive parse: anything unrecognised is `General`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "daily" => Category::Daily,
            "weekly" => Category::Weekly,
            _ => Category::General,
        }
    }

    /// Effort estimate used when a task carries no usable duration.
    pub fn default_minutes(self) -> u32 {
        match self {
            Category::Daily => 15,
            Category::Weekly => 60,
            Category::General => 45,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Daily => "daily",
            Category::Weekly => "weekly",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().map(Category::parse_lenient).unwrap_or_default())
    }
}

/// Any JSON number is a duration; strings, booleans and the rest are not.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::Value::deserialize(deserializer)?.as_f64())
}

/// A pending task as handed to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    #[serde(default, alias = "task")]
    pub title: String,

    #[serde(default)]
    pub category: Category,

    /// Calendar date the task is due on, if any.
    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    #[serde(default)]
    pub created_at: DateTime<Utc>,

    /// Caller-declared effort in minutes. May be junk (zero, negative, NaN).
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub duration_minutes: Option<f64>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category,
            deadline: None,
            created_at: DateTime::<Utc>::default(),
            duration_minutes: None,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_duration(mut self, minutes: f64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Minutes the planner books for this task.
    ///
    /// A positive declared duration is rounded to the nearest minute (at least 1);
    /// otherwise the category default applies.
    pub fn predicted_duration(&self) -> u32 {
        match self.duration_minutes {
            Some(m) if m.is_finite() && m > 0.0 => {
                let rounded = m.round().min(f64::from(u32::MAX)) as u32;
                rounded.max(1)
            }
            _ => self.category.default_minutes(),
        }
    }
}

/// Pending tasks split by category, each list in caller order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskLists {
    pub daily: Vec<Task>,
    pub weekly: Vec<Task>,
    pub general: Vec<Task>,
}

impl TaskLists {
    pub fn partition(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut lists = Self::default();
        for t in tasks {
            match t.category {
                Category::Daily => lists.daily.push(t),
                Category::Weekly => lists.weekly.push(t),
                Category::General => lists.general.push(t),
            }
        }
        lists
    }

    pub fn len(&self) -> usize {
        self.daily.len() + self.weekly.len() + self.general.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clean up captured text: trim, collapse whitespace, and drop a word that
/// repeats the previous one (case-insensitive). Dictation tends to stutter.
pub fn normalize_title(raw: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for word in raw.split_whitespace() {
        match out.last() {
            Some(prev) if prev.to_lowercase() == word.to_lowercase() => {}
            _ => out.push(word),
        }
    }
    out.join(" ")
}
