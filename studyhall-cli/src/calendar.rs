use chrono::{Days, NaiveDate};
use studyhall_core::Plan;

pub struct CalendarEvent {
    pub uid: String,
    pub date: NaiveDate,
    pub summary: String,
    pub description: String,
}

/// One all-day event per planned task, in plan order.
pub fn plan_to_events(plan: &Plan) -> Vec<CalendarEvent> {
    let mut events = Vec::new();

    for day in &plan.summary {
        for p in &day.tasks {
            events.push(CalendarEvent {
                uid: format!("studyhall-{}-{}@studyhall", p.task.id, day.date.format("%Y%m%d")),
                date: day.date,
                summary: p.task.title.clone(),
                description: format!(
                    "TaskId: {}\nCategory: {}\nPlanned: {} min\n",
                    p.task.id, p.task.category, p.predicted_duration
                ),
            });
        }
    }

    events
}

/// Emit a minimal ICS calendar of all-day VEVENT blocks.
pub fn events_to_ics(events: &[CalendarEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Studyhall//EN\r\n");

    for e in events {
        let end = e.date.checked_add_days(Days::new(1)).unwrap_or(e.date);

        s.push_str("BEGIN:VEVENT\r\n");
        s.push_str(&format!("UID:{}\r\n", e.uid));
        s.push_str(&format!("DTSTART;VALUE=DATE:{}\r\n", e.date.format("%Y%m%d")));
        s.push_str(&format!("DTEND;VALUE=DATE:{}\r\n", end.format("%Y%m%d")));
        s.push_str(&format!("SUMMARY:{}\r\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\r\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\r\n");
    }

    s.push_str("END:VCALENDAR\r\n");
    s
}

pub fn ics_file_name(stamp: NaiveDate) -> String {
    format!("study-plan-{}.ics", stamp.format("%Y-%m-%d"))
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}
