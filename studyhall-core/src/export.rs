//! Plan exports: pretty JSON and a plain-text "Study Plan" document.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::plan::Plan;
use crate::time::date_key;

pub fn to_json(plan: &Plan) -> Result<String> {
    serde_json::to_string_pretty(plan).context("serialize plan")
}

pub fn json_file_name(window_days: u32, stamp: NaiveDate) -> String {
    format!("plan-{window_days}d-{}.json", date_key(stamp))
}

pub fn text_file_name(stamp: NaiveDate) -> String {
    format!("study-plan-{}.txt", date_key(stamp))
}

/// Human-readable plan: one block per day with its task count and titles.
pub fn render_text(plan: &Plan) -> String {
    let mut s = String::from("Study Plan\n");

    for day in &plan.summary {
        s.push('\n');
        s.push_str(&day.date.format("%a %b %d %Y").to_string());
        if day.overflow {
            s.push_str(&format!("  [over cap: {} min]", day.minutes));
        }
        s.push('\n');
        s.push_str(&format!("Tasks: {}\n", day.count));
        for p in &day.tasks {
            s.push_str(&format!(
                "  • {} ({}, {} min)\n",
                p.task.title, p.task.category, p.predicted_duration
            ));
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{PlanOptions, generate_plan};
    use crate::task::{Category, Task};

    fn sample() -> Plan {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let daily = vec![Task::new("d1", "Vocab drill", Category::Daily)];
        let general = vec![
            Task::new("g1", "Lab report", Category::General).with_duration(90.0),
            Task::new("g2", "Problem set", Category::General).with_duration(90.0),
        ];
        generate_plan(&daily, &[], &general, &PlanOptions::new(2, 100), today).unwrap()
    }

    #[test]
    fn test_render_text_lists_days_and_titles() {
        let text = render_text(&sample());
        assert!(text.starts_with("Study Plan\n"));
        assert!(text.contains("Mon Mar 02 2026"));
        assert!(text.contains("Tue Mar 03 2026"));
        assert!(text.contains("  • Vocab drill (daily, 15 min)\n"));
        assert!(text.contains("  • Lab report (general, 90 min)\n"));
        // g2 cannot fit anywhere and lands on the emptier day 0 (15 vs 90).
        assert!(text.contains("Mon Mar 02 2026  [over cap: 105 min]"));
    }

    #[test]
    fn test_json_shape() {
        let json = to_json(&sample()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["summary"].as_array().unwrap().len(), 2);
        assert_eq!(v["summary"][0]["date"], "2026-03-02");
        assert_eq!(v["summary"][0]["overflow"], true);
        assert_eq!(v["buckets"]["2026-03-03"][0]["title"], "Lab report");

        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_file_names() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(json_file_name(7, d), "plan-7d-2026-03-02.json");
        assert_eq!(text_file_name(d), "study-plan-2026-03-02.txt");
    }
}
