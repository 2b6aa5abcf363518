//! studyhall-core: task model and the deterministic study-plan generator.

pub mod export;
pub mod plan;
pub mod planner;
pub mod progress;
pub mod records;
pub mod task;
pub mod time;

pub use plan::{DayBucket, DaySummary, Plan, PlannedTask};
pub use planner::{PlanError, PlanOptions, generate_plan, generate_plan_for};
pub use progress::{ProgressReport, progress_report};
pub use records::{
    CompletedTask, IncompleteTask, Sweep, complete_task, is_overdue, parse_minutes_input,
    sweep_overdue,
};
pub use task::{Category, Task, TaskLists, normalize_title};
pub use time::{date_key, local_today, parse_deadline};
