//! careform-check: validate control documents and try them against records.
//!
//! Development tool around the rule core:
//! - `validate [DIR]` loads every control document and runs the validator,
//!   including the cross-control checks (duplicate ids and event groups)
//! - `evaluate` runs one control against a record and prints what it writes
//! - `replay` streams record snapshots through the debouncer, the way a live
//!   form would, and prints every write

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info, warn};

use careform_core::config::load_dotenv;
use careform_core::Config;
use careform_rules::binding::{BoundControl, Debouncer, FieldSink};
use careform_rules::loader::{load_document, ControlLoader, LoadStatus};
use careform_rules::resolver::FieldResolver;
use careform_rules::validation::validate_controls;

// ── CLI ─────────────────────────────────────────────────────────────

/// Validate and exercise clinical form controls.
#[derive(Parser, Debug)]
#[command(name = "careform-check", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate every control document in a directory.
    Validate {
        /// Controls directory (defaults to CONTROLS_DIR).
        dir: Option<PathBuf>,
    },
    /// Run one control against a record and print the value it writes.
    Evaluate {
        /// Control document (YAML or JSON).
        #[arg(long)]
        control: PathBuf,
        /// Record JSON file.
        #[arg(long)]
        record: PathBuf,
        /// Patient JSON file (an empty patient when omitted).
        #[arg(long)]
        patient: Option<PathBuf>,
        /// Evaluation time, RFC 3339 (defaults to now).
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Feed record snapshots (one JSON object per line) through the debouncer.
    Replay {
        /// Control document (YAML or JSON).
        #[arg(long)]
        control: PathBuf,
        /// JSON Lines file of record snapshots.
        #[arg(long)]
        records: PathBuf,
        /// Patient JSON file (an empty patient when omitted).
        #[arg(long)]
        patient: Option<PathBuf>,
        /// Pause between snapshots in milliseconds.
        #[arg(long, default_value_t = 0)]
        pause_ms: u64,
    },
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    match Cli::parse().command {
        Command::Validate { dir } => validate(dir.unwrap_or_else(|| config.controls.dir.clone())),
        Command::Evaluate {
            control,
            record,
            patient,
            now,
        } => evaluate(&control, &record, patient.as_deref(), now.unwrap_or_else(Utc::now)),
        Command::Replay {
            control,
            records,
            patient,
            pause_ms,
        } => {
            replay(
                &control,
                &records,
                patient.as_deref(),
                config.binding.debounce(),
                Duration::from_millis(pause_ms),
            )
            .await
        }
    }
}

// ── Commands ────────────────────────────────────────────────────────

fn validate(dir: PathBuf) -> Result<()> {
    let loader = ControlLoader::new(dir);
    let results = loader
        .load_all()
        .with_context(|| format!("failed to scan {}", loader.controls_dir().display()))?;

    let mut failed = 0usize;
    for result in &results {
        match &result.status {
            LoadStatus::Loaded { control_id } => {
                println!("ok      {} ({})", result.path.display(), control_id)
            }
            LoadStatus::Skipped { reason } => {
                println!("skipped {} ({})", result.path.display(), reason)
            }
            LoadStatus::Failed { error } => {
                failed += 1;
                println!("FAILED  {}\n        {}", result.path.display(), error)
            }
        }
    }

    let controls = loader.all();
    let report = validate_controls(&controls);
    for warning in &report.warnings {
        println!("warning {}: {}", warning.path, warning.message);
    }
    for err in &report.errors {
        failed += 1;
        match &err.suggestion {
            Some(s) => println!("error   {}: {} ({})", err.path, err.message, s),
            None => println!("error   {}: {}", err.path, err.message),
        }
    }

    info!(loaded = controls.len(), failed, "validation finished");
    if failed > 0 {
        bail!("{failed} problem(s) found in control documents");
    }
    Ok(())
}

fn evaluate(
    control: &Path,
    record: &Path,
    patient: Option<&Path>,
    now: DateTime<Utc>,
) -> Result<()> {
    let doc = load_document(control)
        .with_context(|| format!("failed to load control {}", control.display()))?;
    let bound = BoundControl::from_document(&doc);
    let record = read_json(record)?;
    let patient = read_patient(patient)?;

    let mut updated = record.clone();
    let changed = bound.recompute(&record, Some(&patient), now, &mut updated)?;
    if !changed {
        info!(control_id = %doc.id(), "record already up to date");
    }

    let output = target_value(&bound, &updated);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn replay(
    control: &Path,
    records: &Path,
    patient: Option<&Path>,
    debounce: Duration,
    pause: Duration,
) -> Result<()> {
    let doc = load_document(control)
        .with_context(|| format!("failed to load control {}", control.display()))?;
    let bound = BoundControl::from_document(&doc);
    let patient = read_patient(patient)?;
    let contents = fs::read_to_string(records)
        .with_context(|| format!("failed to read {}", records.display()))?;

    let mut written: Option<Value> = None;
    let debouncer = Debouncer::spawn(debounce, move |record: Value| {
        match settle_snapshot(&bound, record, &patient, &mut written, Utc::now()) {
            Ok(Some(value)) => println!("{} = {value}", bound.target_field()),
            Ok(None) => info!("no change"),
            Err(e) => error!(error = %e, "failed to write computed field"),
        }
    });

    for (number, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(snapshot) => {
                debouncer.push(snapshot);
            }
            Err(e) => warn!(line = number + 1, error = %e, "skipping malformed snapshot"),
        }
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    debouncer.finish().await;
    Ok(())
}

/// Recompute one settled snapshot and return the value written, if any.
///
/// `written` holds the target field's value after the last write. It is
/// carried into snapshots that lack the field, the way a live form keeps it.
fn settle_snapshot(
    bound: &BoundControl,
    mut record: Value,
    patient: &Value,
    written: &mut Option<Value>,
    now: DateTime<Utc>,
) -> careform_core::Result<Option<Value>> {
    let field = bound.target_field();
    if let Some(value) = written.as_ref() {
        if FieldResolver::lookup(&record, field).is_none() {
            record.set_field(field, value.clone())?;
        }
    }

    let mut updated = record.clone();
    if !bound.recompute(&record, Some(patient), now, &mut updated)? {
        return Ok(None);
    }
    let value = target_value(bound, &updated);
    *written = Some(value.clone());
    Ok(Some(value))
}

// ── Helpers ─────────────────────────────────────────────────────────

fn read_json(path: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn read_patient(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) => read_json(path),
        None => Ok(Value::Object(Default::default())),
    }
}

/// Current value of the control's target field.
fn target_value(bound: &BoundControl, record: &Value) -> Value {
    FieldResolver::lookup(record, bound.target_field())
        .cloned()
        .unwrap_or(Value::Null)
}
