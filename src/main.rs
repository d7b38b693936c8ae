//! executable part of this library: load a TOML config, drive one planning
//! run (or just the post-hoc checker), and write the result to CSV.

use std::error::Error;
use std::fs::File;
use std::io::Write;

use clap::{Parser, Subcommand};
use duty_roster::calendar::HolidayCalendar;
use duty_roster::config::load_config;
use duty_roster::csv::plan_to_csv;
use duty_roster::scheduler::Scheduler;
use duty_roster::{Checker, Violation};

/// Duty Roster - assign people to duty slots across a calendar horizon
#[derive(Parser, Debug)]
#[command(version, about = "Duty Roster - assign people to duty slots across a calendar horizon", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run the scheduler and write the resulting plan to CSV
    Schedule {
        /// file with settings to create the schedule
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        /// filename of csv to generate
        #[arg(short, long, default_value = "schedule.csv")]
        out: String,
    },
    /// only run the post-hoc checker against an already-produced (seeded) plan
    Check {
        /// file with settings, including a `seed_plan` to check
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Schedule { config, out } => run_schedule(&config, &out),
        Command::Check { config } => run_check(&config),
    }
}

fn run_schedule(config_path: &str, out_path: &str) -> Result<(), Box<dyn Error>> {
    let assembled = load_config(config_path)?.assemble()?;
    let calendar = HolidayCalendar::default();

    let mut plan = assembled.seed;
    let mut wishes = assembled.wishes;

    tracing::info!(
        people = assembled.people.len(),
        start = %assembled.start,
        horizon_days = assembled.horizon_days,
        "starting planning run"
    );

    let outcome = Scheduler::default().run(
        &assembled.people,
        &assembled.catalog,
        &assembled.network,
        &mut wishes,
        &mut plan,
        assembled.start,
        assembled.horizon_days,
        &calendar,
    );

    for (date, duty) in &outcome.unfilled {
        tracing::warn!(%date, %duty, "unfilled slot");
    }

    let violations = Checker::new().run(&plan, &assembled.network, &assembled.catalog, &assembled.people);
    report_violations(&violations);

    let mut file = File::create(out_path)?;
    file.write_all(plan_to_csv(&plan, &assembled.catalog)?.as_bytes())?;

    tracing::info!(
        unfilled = outcome.unfilled.len(),
        violations = violations.len(),
        out = out_path,
        "planning run complete"
    );

    Ok(())
}

fn run_check(config_path: &str) -> Result<(), Box<dyn Error>> {
    let assembled = load_config(config_path)?.assemble()?;
    let violations = Checker::new().run(&assembled.seed, &assembled.network, &assembled.catalog, &assembled.people);
    report_violations(&violations);
    tracing::info!(violations = violations.len(), "check complete");
    Ok(())
}

fn report_violations(violations: &[Violation]) {
    for v in violations {
        tracing::warn!(date = %v.date, rule = %v.rule, status = ?v.status, "rule violation");
    }
}
