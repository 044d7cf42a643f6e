use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use polars::prelude::AnyValue;
use secdash_core::{
    to_csv, AppliedStatus, Dataset, FilterCriteria, FilterMode, Session, SessionKind,
    EXPORT_FILENAME, EXPORT_MIME,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "SEC company dataset explorer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter the company dataset and export the matching rows as CSV.
    Filter(FilterArgs),
    /// Application-tracking reports over the company dataset.
    Track {
        #[command(subcommand)]
        command: TrackCommand,
    },
    /// Save free-form session notes (held in memory only, like the page).
    Notes(NotesArgs),
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Path to the base dataset (tab-separated sub.txt).
    #[arg(long)]
    base: PathBuf,

    /// Optional supplemental dataset to merge (CSV or TSV).
    #[arg(long)]
    supplemental: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FilterFlags {
    /// Business country, e.g. US
    #[arg(long)]
    country: Option<String>,

    /// Business state or province, e.g. CA
    #[arg(long)]
    state: Option<String>,

    /// Business city, e.g. "San Francisco"
    #[arg(long)]
    city: Option<String>,

    /// Industry SIC code, e.g. 2834
    #[arg(long)]
    sic: Option<String>,

    /// Country of incorporation
    #[arg(long = "country-inc")]
    country_inc: Option<String>,

    /// State of incorporation
    #[arg(long = "state-inc")]
    state_inc: Option<String>,

    /// Ignore every filter field and show the full dataset.
    #[arg(long)]
    show_all: bool,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    #[command(flatten)]
    filters: FilterFlags,

    /// Where to write the filtered CSV.
    #[arg(long, default_value = EXPORT_FILENAME)]
    output: PathBuf,

    /// Preview at most this many rows.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Skip writing the CSV artifact.
    #[arg(long)]
    no_export: bool,
}

#[derive(Subcommand, Debug)]
enum TrackCommand {
    /// Applied / not-applied counts for the filtered dataset.
    Summary(TrackArgs),
    /// Cumulative applications over time.
    Timeline(TrackArgs),
    /// Mark rows as applied or not applied and export the updated dataset.
    Mark(MarkArgs),
}

#[derive(Args, Debug)]
struct TrackArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    #[command(flatten)]
    filters: FilterFlags,

    /// Restrict to applied or not-applied rows.
    #[arg(long, value_enum, default_value_t = StatusArg::All)]
    status: StatusArg,

    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct MarkArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// Row ids to update, as shown in previews.
    #[arg(long, value_delimiter = ',', required = true)]
    rows: Vec<u32>,

    /// Mark the rows as applied (the default).
    #[arg(long, conflicts_with = "not_applied")]
    applied: bool,

    /// Clear the applied flag instead of setting it.
    #[arg(long)]
    not_applied: bool,

    /// Application date, YYYY-MM-DD.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Where to write the updated dataset.
    #[arg(long, default_value = EXPORT_FILENAME)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct NotesArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// Notes text to save for the session.
    #[arg(long)]
    text: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum StatusArg {
    All,
    Applied,
    NotApplied,
}

impl From<StatusArg> for AppliedStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::All => AppliedStatus::All,
            StatusArg::Applied => AppliedStatus::Applied,
            StatusArg::NotApplied => AppliedStatus::NotApplied,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Filter(args) => run_filter(args),
        Command::Track { command } => match command {
            TrackCommand::Summary(args) => run_summary(args),
            TrackCommand::Timeline(args) => run_timeline(args),
            TrackCommand::Mark(args) => run_mark(args),
        },
        Command::Notes(args) => run_notes(args),
    }
}

fn open_session(args: &DatasetArgs, kind: SessionKind) -> Result<Session> {
    let mut session = Session::open(&args.base, kind)?;
    if let Some(path) = &args.supplemental {
        let file = fs::File::open(path)
            .with_context(|| format!("failed to open supplemental file {}", path.display()))?;
        session.upload_supplemental(file);
    }
    for notice in session.take_notices() {
        println!("{notice}");
    }
    Ok(session)
}

fn criteria_from(flags: &FilterFlags, status: AppliedStatus) -> (FilterCriteria, FilterMode) {
    let criteria = FilterCriteria {
        country: flags.country.clone(),
        state: flags.state.clone(),
        city: flags.city.clone(),
        sic: flags.sic.clone(),
        country_inc: flags.country_inc.clone(),
        state_inc: flags.state_inc.clone(),
        status,
    };
    let mode = if flags.show_all {
        FilterMode::ShowAll
    } else {
        FilterMode::Apply
    };
    (criteria, mode)
}

fn run_filter(args: FilterArgs) -> Result<()> {
    let session = open_session(&args.dataset, SessionKind::Explorer)?;
    let (criteria, mode) = criteria_from(&args.filters, AppliedStatus::All);

    let filtered = session
        .evaluate(&criteria, mode)
        .context("filters were not applied")?;

    println!("Total Companies in Dataset: {}", session.dataset().height());
    println!("Filtered Companies: {}", filtered.height());
    print_preview(&filtered, args.limit);

    if !args.no_export {
        write_export(&filtered, &args.output)?;
    }
    Ok(())
}

fn run_summary(args: TrackArgs) -> Result<()> {
    let session = open_session(&args.dataset, SessionKind::Tracker)?;
    let (criteria, mode) = criteria_from(&args.filters, args.status.into());

    let filtered = session
        .evaluate(&criteria, mode)
        .context("filters were not applied")?;
    let summary = secdash_core::summarize(&filtered)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Total Companies: {}", summary.total);
        println!("Applied: {}", summary.applied);
        println!("Not Applied: {}", summary.not_applied);
    }
    Ok(())
}

fn run_timeline(args: TrackArgs) -> Result<()> {
    let session = open_session(&args.dataset, SessionKind::Tracker)?;
    let (criteria, mode) = criteria_from(&args.filters, args.status.into());

    let filtered = session
        .evaluate(&criteria, mode)
        .context("filters were not applied")?;
    let points = secdash_core::application_timeline(&filtered)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else if points.is_empty() {
        println!("No dated applications yet.");
    } else {
        let mut table = Table::new();
        table.set_header(["Date", "Cumulative Applications"]);
        for point in &points {
            table.add_row([point.date.to_string(), point.cumulative.to_string()]);
        }
        println!("{table}");
    }
    Ok(())
}

fn run_mark(args: MarkArgs) -> Result<()> {
    let mut session = open_session(&args.dataset, SessionKind::Tracker)?;
    let applied = args.applied || !args.not_applied;

    session
        .mark_rows(&args.rows, applied, args.date)
        .context("row edits were not recorded")?;
    info!(rows = args.rows.len(), applied, "tracking columns updated");

    let summary = session.summary()?;
    println!(
        "Marked {} row(s) as {}.",
        args.rows.len(),
        if applied { "applied" } else { "not applied" }
    );
    println!(
        "Applied: {} / {} companies",
        summary.applied, summary.total
    );

    write_export(session.dataset(), &args.output)
}

fn run_notes(args: NotesArgs) -> Result<()> {
    let mut session = open_session(&args.dataset, SessionKind::Explorer)?;
    session.save_notes(args.text);
    for notice in session.take_notices() {
        println!("{notice}");
    }
    Ok(())
}

fn write_export(ds: &Dataset, output: &PathBuf) -> Result<()> {
    let bytes = to_csv(ds)?;
    fs::write(output, bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {} ({})", output.display(), EXPORT_MIME);
    Ok(())
}

fn print_preview(ds: &Dataset, limit: usize) {
    if ds.is_empty() {
        println!("(no matching rows)");
        return;
    }

    let df = ds.frame();
    let mut table = Table::new();
    table.set_header(df.get_column_names().iter().map(|name| name.to_string()));

    let shown = df.height().min(limit);
    for idx in 0..shown {
        if let Some(row) = df.get(idx) {
            table.add_row(row.iter().map(cell_text));
        }
    }
    println!("{table}");

    if df.height() > shown {
        println!("... {} more row(s)", df.height() - shown);
    }
}

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}
