//! `kairos` CLI — find free time and place work blocks before a deadline.
//!
//! ## Usage
//!
//! ```sh
//! # Free slots between two instants, given a calendar export
//! kairos free --busy calendar.json --from 2026-03-01T09:00 --to 2026-03-01T17:00
//!
//! # Dry-run placement of 3 splittable hours before a deadline
//! kairos plan --busy calendar.json --due 2026-03-02T23:59 --hours 3 --splittable
//!
//! # List assignments from the to-do export named in kairos.toml
//! kairos todo
//!
//! # Schedule assignment 1234 and append the events to the event log
//! kairos schedule --item 1234 --hours 4 --splittable
//! ```
//!
//! Naive timestamps are read in the configured `time_zone`. Logging goes to
//! stderr and is controlled by `RUST_LOG` (default `warn`).

mod config;
mod sources;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use kairos_engine::{plan_blocks, Horizon, ScheduledBlock, Scheduler, WorkRequirement};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::sources::{CalendarFile, EventLog, TodoFile};

#[derive(Parser)]
#[command(
    name = "kairos",
    version,
    about = "Place work blocks into free calendar time before a deadline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./kairos.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the free slots between two instants as JSON
    Free {
        /// Calendar export (Google events list or [{start, end}] array). Replaces
        /// calendar_file and the event log from the config.
        #[arg(short, long)]
        busy: Option<PathBuf>,
        /// Start of the window
        #[arg(long)]
        from: String,
        /// End of the window
        #[arg(long)]
        to: String,
    },
    /// Compute blocks for a requirement without writing anything
    Plan {
        /// Calendar export (defaults to calendar_file plus the event log from the config)
        #[arg(short, long)]
        busy: Option<PathBuf>,
        /// Deadline
        #[arg(long)]
        due: String,
        #[command(flatten)]
        work: WorkArgs,
    },
    /// Schedule a to-do item and write one event per block
    Schedule {
        /// Assignment id from the to-do export
        #[arg(long)]
        item: String,
        #[command(flatten)]
        work: WorkArgs,
        /// Event log to append to (defaults to events_file from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Show the plan without writing events
        #[arg(long)]
        dry_run: bool,
    },
    /// List the items in the to-do export
    Todo,
}

#[derive(clap::Args)]
struct WorkArgs {
    /// Hours of work required (may be fractional)
    #[arg(long)]
    hours: f64,
    /// Allow the work to be split into one-hour blocks
    #[arg(long)]
    splittable: bool,
    /// Reference "now" (defaults to the current time)
    #[arg(long)]
    now: Option<String>,
}

impl WorkArgs {
    fn requirement(&self) -> Result<WorkRequirement> {
        WorkRequirement::from_hours(self.hours, self.splittable).context("Invalid --hours")
    }

    fn now(&self, zone: Tz) -> Result<DateTime<Utc>> {
        match &self.now {
            Some(text) => parse_arg(text, zone, "--now"),
            None => Ok(Utc::now()),
        }
    }
}

/// JSON printed by `kairos plan`.
#[derive(Serialize)]
struct PlanSummary<'a> {
    horizon: &'a Horizon,
    blocks: &'a [ScheduledBlock],
    requested_minutes: i64,
    allocated_minutes: i64,
    shortfall_minutes: i64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref())?;
    let zone = config.zone()?;

    match cli.command {
        Commands::Free { busy, from, to } => {
            let horizon = Horizon::new(
                parse_arg(&from, zone, "--from")?,
                parse_arg(&to, zone, "--to")?,
            );
            let events = busy_source(&config, busy, zone)
                .load()
                .context("Failed to load busy intervals")?;

            let slots = kairos_engine::find_free_slots(&events, &horizon);
            println!("{}", serde_json::to_string_pretty(&slots)?);
        }
        Commands::Plan { busy, due, work } => {
            let requirement = work.requirement()?;
            let horizon = Horizon::new(work.now(zone)?, parse_arg(&due, zone, "--due")?);
            let events = busy_source(&config, busy, zone)
                .load()
                .context("Failed to load busy intervals")?;

            let blocks = plan_blocks(&events, &horizon, &requirement);
            let allocated = kairos_engine::allocator::allocated_duration(&blocks);
            let shortfall = kairos_engine::allocator::shortfall(&requirement, &blocks);

            let summary = PlanSummary {
                horizon: &horizon,
                blocks: &blocks,
                requested_minutes: requirement.total().num_minutes(),
                allocated_minutes: allocated.num_minutes(),
                shortfall_minutes: shortfall.num_minutes(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
            warn_shortfall(requirement.total(), shortfall);
        }
        Commands::Schedule {
            item,
            work,
            output,
            dry_run,
        } => {
            let requirement = work.requirement()?;
            let now = work.now(zone)?;
            let log = EventLog::new(
                output.unwrap_or_else(|| config.events_file.clone()),
                config.calendar_id.clone(),
                zone,
            );
            // Blocks from earlier runs are busy time, like events on a live calendar.
            let calendar =
                CalendarFile::new(&config.calendar_file, zone).with_event_log(log.path());
            let scheduler = Scheduler::new(
                calendar,
                TodoFile::new(&config.todo_file, config.courses.clone()),
                &log,
                zone,
            )
            .with_labels(config.labels.clone());

            if dry_run {
                let plan = scheduler
                    .plan(&item, requirement, now)
                    .with_context(|| format!("Failed to plan item {}", item))?;
                println!(
                    "Plan for {} (due {}): {:.2} hours in {} blocks",
                    plan.item.name,
                    local(plan.horizon.to, zone),
                    hours(plan.allocated()),
                    plan.blocks.len()
                );
                for block in &plan.blocks {
                    println!("  {} to {}", local(block.start, zone), local(block.end, zone));
                }
                warn_shortfall(requirement.total(), plan.shortfall());
                return Ok(());
            }

            let report = scheduler
                .schedule(&item, requirement, now)
                .with_context(|| format!("Failed to schedule item {}", item))?;

            println!(
                "{} (due {}):",
                report.label.summary,
                local(report.plan.horizon.to, zone)
            );
            for outcome in &report.outcomes {
                let span = format!(
                    "{} to {}",
                    local(outcome.block.start, zone),
                    local(outcome.block.end, zone)
                );
                match &outcome.result {
                    Ok(id) => println!("  Scheduled block: {} [{}]", span, id),
                    Err(err) => println!("  Failed block:    {} ({})", span, err),
                }
            }
            println!(
                "{} of {} blocks written",
                report.succeeded().count(),
                report.outcomes.len()
            );
            warn_shortfall(requirement.total(), report.shortfall());

            let failed = report.failed().count();
            if failed > 0 {
                anyhow::bail!(
                    "{} of {} blocks could not be written",
                    failed,
                    report.outcomes.len()
                );
            }
        }
        Commands::Todo => {
            let todo = TodoFile::new(&config.todo_file, config.courses.clone());
            let listings = todo.list().context("Failed to load to-do items")?;
            for listing in listings {
                println!("{}", "-".repeat(20));
                println!(
                    "Course: {}",
                    listing.item.course.as_deref().unwrap_or("(unknown)")
                );
                println!("Title: {}", listing.item.name);
                println!("Id: {}", listing.item.id);
                println!(
                    "Due: {}",
                    listing.item.due_at.as_deref().unwrap_or("(no due date)")
                );
                if let Some(url) = &listing.url {
                    println!("URL: {}", url);
                }
            }
        }
    }

    Ok(())
}

/// `--busy` replaces the configured calendar; otherwise the configured export
/// and the event log are read together.
fn busy_source(config: &Config, busy: Option<PathBuf>, zone: Tz) -> CalendarFile {
    match busy {
        Some(path) => CalendarFile::new(path, zone),
        None => {
            CalendarFile::new(&config.calendar_file, zone).with_event_log(&config.events_file)
        }
    }
}

fn parse_arg(text: &str, zone: Tz, flag: &str) -> Result<DateTime<Utc>> {
    kairos_engine::zone::parse_timestamp(text, zone)
        .with_context(|| format!("Invalid {} value: {}", flag, text))
}

fn local(instant: DateTime<Utc>, zone: Tz) -> String {
    instant
        .with_timezone(&zone)
        .format("%Y-%m-%d %H:%M %Z")
        .to_string()
}

fn warn_shortfall(requested: Duration, shortfall: Duration) {
    if shortfall > Duration::zero() {
        eprintln!(
            "warning: {:.2} of {:.2} hours could not be scheduled before the deadline",
            hours(shortfall),
            hours(requested)
        );
    }
}

fn hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}
