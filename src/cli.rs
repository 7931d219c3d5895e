// src/cli.rs
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::config::consts::{DEFAULT_LOG_LEVEL, DEFAULT_OUT_DIR, LOG_FILE};
use crate::config::options::{ExportFormat, RunOptions};
use crate::config::settings::Settings;
use crate::progress::Progress;
use crate::record::SourceReport;
use crate::runner::{self, RunSummary};

/// Normalize tire listings from several shops and reconcile them into one dated catalog.
#[derive(Parser, Debug)]
#[command(name = "tire_catalog", version, long_about = None)]
pub struct Args {
    /// Reference inventory export (CSV/TSV). Required.
    #[arg(short, long)]
    pub reference: PathBuf,

    /// GoGulong capture
    #[arg(long)]
    pub gogulong: Option<PathBuf>,

    /// TireManila capture
    #[arg(long)]
    pub tiremanila: Option<PathBuf>,

    /// PartsPro capture
    #[arg(long)]
    pub partspro: Option<PathBuf>,

    /// Output directory for the dated catalog
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    pub out: PathBuf,

    /// csv | tsv | json
    #[arg(short, long, default_value = "csv")]
    pub format: ExportFormat,

    /// Output file name prefix; the date and extension are appended
    #[arg(long)]
    pub stem: Option<String>,

    /// Omit the header row from delimited output
    #[arg(long)]
    pub no_headers: bool,

    /// Append this run's rows to a CSV history file
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Re-normalize every row of the history file after appending
    #[arg(long, requires = "history")]
    pub rebuild_history: bool,

    /// Also write the wide pre-bucket join here
    #[arg(long)]
    pub joined: Option<PathBuf>,

    /// Snapshot date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// JSON settings file (thresholds, scorer, rewrite rules, precedence)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log file; pass an empty value to log to stderr
    #[arg(long, default_value = LOG_FILE)]
    pub log_file: PathBuf,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Print nothing but errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn run_options(&self) -> RunOptions {
        let mut opts = RunOptions::new(self.reference.clone());
        opts.gogulong = self.gogulong.clone();
        opts.tiremanila = self.tiremanila.clone();
        opts.partspro = self.partspro.clone();
        opts.date = self.date;
        opts.history = self.history.clone();
        opts.rebuild_history = self.rebuild_history;
        opts.joined = self.joined.clone();
        opts.export.format = self.format;
        opts.export.out_dir = self.out.clone();
        opts.export.include_headers = !self.no_headers;
        if let Some(stem) = &self.stem {
            opts.export.file_stem = stem.clone();
        }
        opts
    }
}

/// Prints one line per finished source.
struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn begin(&mut self, sources: usize) {
        eprintln!("Reading {sources} sources…");
    }

    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }

    fn source_done(&mut self, report: &SourceReport) {
        eprintln!("  {report}");
    }
}

pub fn run() -> color_eyre::Result<()> {
    let args = Args::parse();

    let log_file = Some(args.log_file.as_path()).filter(|p| !p.as_os_str().is_empty());
    crate::log::init(&args.log_level, log_file)?;

    let settings = Settings::load_or_default(args.config.as_deref())?;
    let opts = args.run_options();

    let mut console = ConsoleProgress;
    let progress: Option<&mut dyn Progress> = if args.quiet { None } else { Some(&mut console) };
    let summary = runner::run(&opts, &settings, progress)?;

    if !args.quiet {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Catalog {}: {} rows", summary.date, summary.rows);
    for (bucket, count) in &summary.bucket_counts {
        println!("  {bucket:<22} {count}");
    }
    if summary.unbucketed > 0 {
        println!("  {} unpriced reference rows left out", summary.unbucketed);
    }
    if let Some(history) = &summary.history {
        println!("{history}");
    }
}
