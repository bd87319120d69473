//! clipcalc command line: evaluate one query, or watch the clipboard.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clipcalc::calculator::{ClipboardSource, Outcome, classify, copy_to_clipboard};
use clipcalc::config::Config;
use clipcalc::display::DisplayLine;
use clipcalc::history::{History, HistoryEntry, HistorySink};
use clipcalc::monitor::Monitor;

#[derive(Parser)]
#[command(name = "clipcalc")]
#[command(author, version, about = "Clipboard calculator for equations, bases, dates and statistics")]
struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a single query
    Eval {
        /// The query; multiple words are joined with spaces
        #[arg(required = true)]
        query: Vec<String>,

        /// Reference time, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`
        #[arg(long, value_name = "TIME")]
        now: Option<String>,

        /// Print the result as inline LaTeX
        #[arg(long)]
        latex: bool,

        /// Print a JSON report
        #[arg(long, conflicts_with = "latex")]
        json: bool,
    },
    /// Watch the clipboard and evaluate whatever looks like a query
    Watch {
        /// Sampling period, overriding the settings file
        #[arg(long, value_name = "MS")]
        interval: Option<u64>,

        /// Copy each result back to the clipboard
        #[arg(long)]
        copy: bool,

        /// Also print each recorded result as LaTeX
        #[arg(long)]
        latex: bool,
    },
}

fn parse_now(text: &str) -> Result<NaiveDateTime> {
    if let Ok(at) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok(at);
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("Invalid --now value '{text}'"))?;
    Ok(date.and_time(Default::default()))
}

fn outcome_kind(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Value { .. } => "value",
        Outcome::Info(_) => "info",
        Outcome::Error(_) => "error",
    }
}

fn eval(config: &Config, query: &str, now: Option<&str>, latex: bool, as_json: bool) -> Result<ExitCode> {
    let now = match now {
        Some(text) => parse_now(text)?,
        None => Local::now().naive_local(),
    };
    let calculator = config.calculator();
    let Some(outcome) = calculator.evaluate(query, now) else {
        bail!("Not a calculator query: '{}'", query.trim());
    };

    if as_json {
        let report = json!({
            "query": query.trim(),
            "domain": classify(query.trim()).to_string(),
            "kind": outcome_kind(&outcome),
            "result": outcome.message(),
            "error_kind": outcome.error().map(|e| format!("{:?}", e.kind())),
            "display": DisplayLine::render(query.trim(), &outcome),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if latex && let Some(entry) = HistoryEntry::from_outcome(query.trim(), &outcome, now) {
        println!("{}", entry.to_latex(&calculator));
    } else {
        println!("{}", DisplayLine::render(query.trim(), &outcome));
    }

    Ok(if outcome.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn watch(config: &Config, interval: Option<u64>, copy: bool, latex: bool) -> Result<ExitCode> {
    let interval = Duration::from_millis(interval.unwrap_or(config.monitoring_interval_ms).max(10));
    let auto_copy = copy || config.auto_copy_result;
    let calculator = config.calculator();
    let mut history = History::new(config.max_history_items);
    let mut copied: Option<String> = None;

    info!("Watching clipboard every {:?}", interval);
    let monitor = Monitor::spawn(calculator.clone(), interval, ClipboardSource::new);

    for evaluation in monitor.receiver().iter() {
        if copied.as_deref() == Some(evaluation.query.as_str()) {
            continue;
        }
        println!("{}", DisplayLine::render(&evaluation.query, &evaluation.outcome));

        let Some(entry) = HistoryEntry::from_outcome(&evaluation.query, &evaluation.outcome, evaluation.at)
        else {
            continue;
        };
        if latex {
            println!("{}", entry.to_latex(&calculator));
        }
        if auto_copy {
            let result = evaluation.outcome.message();
            match copy_to_clipboard(&result) {
                Ok(()) => copied = Some(result),
                Err(e) => warn!("{:#}", e),
            }
        }
        history.record(entry);
    }

    bail!("Clipboard monitoring stopped")
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Eval {
            query,
            now,
            latex,
            json,
        } => eval(&config, &query.join(" "), now.as_deref(), latex, json),
        Command::Watch {
            interval,
            copy,
            latex,
        } => watch(&config, interval, copy, latex),
    }
}
