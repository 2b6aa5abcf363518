use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use studyhall_core::{
    Category, PlanOptions, Task, TaskLists, complete_task, date_key, export, generate_plan_for,
    is_overdue, local_today, normalize_title, parse_deadline, parse_minutes_input,
    progress_report, sweep_overdue,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod calendar;
mod config;
mod state;

use config::Config;
use state::{Store, store_path};

#[derive(Parser, Debug)]
#[command(
    name = "studyhall",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STUDYHALL_BUILD_SHA"), ")"),
    about = "Study task tracker with a deterministic multi-day planner"
)]
struct Cli {
    /// Log filter (overridden by STUDYHALL_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add, list, complete and remove tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Move tasks whose deadline has passed to the incomplete list
    Sweep {
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Generate a day-by-day plan for pending tasks
    Plan {
        /// Days in the planning window, today included
        #[arg(long)]
        window_days: Option<u32>,

        /// Soft cap on planned minutes per day
        #[arg(long)]
        max_minutes: Option<u32>,

        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,

        /// Write plan-<N>d-<date>.json
        #[arg(long)]
        json: bool,

        /// Write study-plan-<date>.txt
        #[arg(long)]
        text: bool,

        /// Write study-plan-<date>.ics
        #[arg(long)]
        ics: bool,

        /// Directory for exports (default: config export.dir, else .)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Completion rates, misses and streak
    Progress,

    /// Manage ~/.studyhall/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Add a pending task
    Add {
        /// Task title
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        /// daily | weekly | general (anything else is general)
        #[arg(long, short, default_value = "general")]
        category: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long, short)]
        deadline: Option<String>,

        /// Effort estimate in minutes
        #[arg(long, short)]
        minutes: Option<f64>,
    },

    /// List pending tasks
    List {
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Mark a task done
    Done {
        /// Task id or unique id prefix
        id: String,

        /// Minutes actually spent
        #[arg(long, short)]
        minutes: Option<u32>,

        /// Never ask for minutes
        #[arg(long)]
        no_prompt: bool,
    },

    /// Delete a pending task
    Rm {
        /// Task id or unique id prefix
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_logging(cli.log_level.as_deref(), &cfg.log_level);

    match cli.command {
        Command::Task { command } => run_task(command, &cfg)?,
        Command::Sweep { today } => {
            let today = resolve_today(today.as_deref(), &cfg)?;
            let moved = sweep(today)?;
            println!("Moved {moved} overdue task(s) to incomplete.");
        }
        Command::Plan {
            window_days,
            max_minutes,
            today,
            json,
            text,
            ics,
            out,
        } => {
            let today = resolve_today(today.as_deref(), &cfg)?;
            let options = PlanOptions::new(
                window_days.unwrap_or(cfg.plan.window_days),
                max_minutes.unwrap_or(cfg.plan.max_minutes_per_day),
            );
            let out_dir = out
                .or_else(|| cfg.export.dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            plan(today, options, Exports { json, text, ics }, &out_dir)?;
        }
        Command::Progress => {
            let store = Store::load(&store_path()?)?;
            let r = progress_report(
                &store.tasks,
                &store.completed,
                &store.incomplete,
                cfg.profile.timezone.as_deref(),
            )?;
            println!("# Progress\n");
            println!("Daily:  {}% complete, {} missed", r.daily_percent, r.missing_daily);
            println!("Weekly: {}% complete, {} missed", r.weekly_percent, r.missing_weekly);
            for (category, n) in &r.completed_by_category {
                println!("Completed {category}: {n}");
            }
            println!("Active days: {}", r.streak_days);
            println!("Minutes logged: {}", r.minutes_logged);
        }
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let s = toml::to_string_pretty(&cfg).context("serialize config")?;
                println!("# {}\n{}", config::config_path()?.display(), s);
            }
        },
    }

    Ok(())
}

fn init_logging(cli_level: Option<&str>, config_level: &str) {
    let filter = EnvFilter::try_from_env("STUDYHALL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(cli_level.unwrap_or(config_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn resolve_today(flag: Option<&str>, cfg: &Config) -> Result<NaiveDate> {
    match flag {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid --today '{s}' (expected YYYY-MM-DD)")),
        None => local_today(cfg.profile.timezone.as_deref(), Utc::now()),
    }
}

fn run_task(command: TaskCommand, cfg: &Config) -> Result<()> {
    let path = store_path()?;
    let mut store = Store::load(&path)?;

    match command {
        TaskCommand::Add {
            title,
            category,
            deadline,
            minutes,
        } => {
            let title = normalize_title(&title.join(" "));
            if title.is_empty() {
                bail!("task title is empty");
            }
            let mut task = Task::new(
                uuid::Uuid::new_v4().to_string(),
                title,
                Category::parse_lenient(&category),
            )
            .with_created_at(Utc::now());
            if let Some(raw) = deadline {
                task = task.with_deadline(parse_deadline(&raw)?);
            }
            if let Some(m) = minutes {
                if !(m.is_finite() && m > 0.0) {
                    bail!("--minutes must be a positive number");
                }
                task = task.with_duration(m);
            }
            info!(id = %task.id, category = %task.category, "task added");
            println!("Added [{}] {} ({})", short_id(&task.id), task.title, task.category);
            store.tasks.push(task);
            store.save(&path)?;
        }

        TaskCommand::List { category } => {
            let filter = category.as_deref().map(Category::parse_lenient);
            let today = local_today(cfg.profile.timezone.as_deref(), Utc::now())?;
            for t in store.tasks.iter().filter(|t| filter.is_none_or(|c| t.category == c)) {
                let due = match t.deadline {
                    Some(d) if d < today => format!(" | due {} (passed)", date_key(d)),
                    Some(d) => format!(" | due {}", date_key(d)),
                    None => String::new(),
                };
                println!(
                    "[{}] {:<7} {} | ~{} min{}",
                    short_id(&t.id),
                    t.category,
                    t.title,
                    t.predicted_duration(),
                    due
                );
            }
        }

        TaskCommand::Done {
            id,
            minutes,
            no_prompt,
        } => {
            let task = store.take(&id)?;
            let minutes = match minutes {
                Some(m) => Some(m).filter(|m| *m > 0),
                None if !no_prompt && io::stdin().is_terminal() => {
                    let raw = prompt(&format!(
                        "Minutes spent on \"{}\"? (optional, Enter to skip)",
                        task.title
                    ))?;
                    parse_minutes_input(&raw)
                }
                None => None,
            };
            let done = complete_task(&task, minutes, Utc::now());
            info!(id = %done.id, minutes = ?done.duration_minutes, "task completed");
            println!("Completed {}", done.title);
            store.completed.push(done);
            store.save(&path)?;
        }

        TaskCommand::Rm { id } => {
            let task = store.take(&id)?;
            println!("Removed {}", task.title);
            store.save(&path)?;
        }
    }

    Ok(())
}

fn sweep(today: NaiveDate) -> Result<usize> {
    let path = store_path()?;
    let mut store = Store::load(&path)?;

    let swept = sweep_overdue(std::mem::take(&mut store.tasks), today, Utc::now());
    let moved = swept.missed.len();
    for m in &swept.missed {
        debug!(task_id = %m.original_task_id, "moved to incomplete");
    }
    store.tasks = swept.pending;
    store.incomplete.extend(swept.missed);

    if moved > 0 {
        store.save(&path)?;
    }
    Ok(moved)
}

struct Exports {
    json: bool,
    text: bool,
    ics: bool,
}

fn plan(today: NaiveDate, options: PlanOptions, exports: Exports, out_dir: &Path) -> Result<()> {
    let store = Store::load(&store_path()?)?;
    if let Some(hint) = overdue_hint(&store.tasks, today) {
        eprintln!("{hint}");
    }
    let lists = TaskLists::partition(store.tasks);

    let plan = generate_plan_for(&lists, &options, today).context("could not generate plan")?;
    print!("{}", export::render_text(&plan));

    let overflow = plan.overflow_days();
    if !overflow.is_empty() {
        println!(
            "\n{} day(s) over the {} min cap: {}",
            overflow.len(),
            options.max_minutes_per_day,
            overflow.iter().map(|d| date_key(*d)).collect::<Vec<_>>().join(", ")
        );
    }

    if exports.json || exports.text || exports.ics {
        fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    }
    if exports.json {
        let p = out_dir.join(export::json_file_name(options.window_days, today));
        write_export(&p, &export::to_json(&plan)?)?;
    }
    if exports.text {
        let p = out_dir.join(export::text_file_name(today));
        write_export(&p, &export::render_text(&plan))?;
    }
    if exports.ics {
        let p = out_dir.join(calendar::ics_file_name(today));
        let ics = calendar::events_to_ics(&calendar::plan_to_events(&plan));
        write_export(&p, &ics)?;
    }

    Ok(())
}

/// Pending tasks already past their deadline still get planned; point at `sweep`.
fn overdue_hint(tasks: &[Task], today: NaiveDate) -> Option<String> {
    let overdue: Vec<&str> = tasks
        .iter()
        .filter(|t| is_overdue(t, today))
        .map(|t| short_id(&t.id))
        .collect();
    if overdue.is_empty() {
        return None;
    }
    Some(format!(
        "note: {} pending task(s) past their deadline ({}); `studyhall sweep` moves them",
        overdue.len(),
        overdue.join(", ")
    ))
}

fn write_export(p: &Path, contents: &str) -> Result<()> {
    fs::write(p, contents).with_context(|| format!("write {}", p.display()))?;
    println!("Wrote {}", p.display());
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
