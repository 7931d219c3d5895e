// src/config/options.rs
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Local, NaiveDate};

use super::consts::*;
use crate::error::CatalogError;
use crate::record::Source;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn ext(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }

    /// Cell separator for the delimited formats.
    pub fn delimiter(&self) -> Option<char> {
        match self {
            ExportFormat::Csv => Some(','),
            ExportFormat::Tsv => Some('\t'),
            ExportFormat::Json => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            "json" => Ok(ExportFormat::Json),
            other => Err(CatalogError::Settings(format!("unknown format `{other}`"))),
        }
    }
}

/// Where and how the dated catalog file is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub out_dir: PathBuf,
    pub file_stem: String,
    pub include_headers: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            file_stem: s!(DEFAULT_FILE_STEM),
            include_headers: true,
        }
    }
}

impl ExportOptions {
    /// `<out_dir>/<stem>_<YYYY-MM-DD>.<ext>`; one file per snapshot date.
    pub fn out_path(&self, date: NaiveDate) -> PathBuf {
        let day = date.format(DATE_FORMAT).to_string();
        self.out_dir.join(join!(&self.file_stem, "_", &day, ".", self.format.ext()))
    }
}

/// Inputs of one catalog run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub reference: PathBuf,
    pub gogulong: Option<PathBuf>,
    pub tiremanila: Option<PathBuf>,
    pub partspro: Option<PathBuf>,
    /// Snapshot date; today (local) when unset.
    pub date: Option<NaiveDate>,
    pub export: ExportOptions,
    /// Append-only CSV that accumulates every run's rows.
    pub history: Option<PathBuf>,
    /// Re-normalize the whole history file after appending.
    pub rebuild_history: bool,
    /// Wide pre-bucket join, written for auditing when set.
    pub joined: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(reference: impl Into<PathBuf>) -> Self {
        Self {
            reference: reference.into(),
            gogulong: None,
            tiremanila: None,
            partspro: None,
            date: None,
            export: ExportOptions::default(),
            history: None,
            rebuild_history: false,
            joined: None,
        }
    }

    pub fn capture_path(&self, source: Source) -> Option<&Path> {
        match source {
            Source::Gulong => Some(self.reference.as_path()),
            Source::GoGulong => self.gogulong.as_deref(),
            Source::TireManila => self.tiremanila.as_deref(),
            Source::PartsPro => self.partspro.as_deref(),
        }
    }

    pub fn set_capture_path(&mut self, source: Source, path: Option<PathBuf>) {
        match source {
            Source::Gulong => {
                if let Some(p) = path {
                    self.reference = p;
                }
            }
            Source::GoGulong => self.gogulong = path,
            Source::TireManila => self.tiremanila = path,
            Source::PartsPro => self.partspro = path,
        }
    }

    pub fn snapshot_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dated_out_path() {
        let mut export = ExportOptions::default();
        export.format = ExportFormat::Tsv;
        export.out_dir = PathBuf::from("snapshots");
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(export.out_path(date), PathBuf::from("snapshots").join("tire_catalog_2024-05-01.tsv"));
    }

    #[test]
    fn format_names() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::Json.delimiter(), None);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn capture_paths() {
        let mut opts = RunOptions::new("gulong.csv");
        opts.set_capture_path(Source::PartsPro, Some(PathBuf::from("pp.csv")));
        assert_eq!(opts.capture_path(Source::PartsPro), Some(Path::new("pp.csv")));
        assert_eq!(opts.capture_path(Source::GoGulong), None);
        assert_eq!(opts.capture_path(Source::Gulong), Some(Path::new("gulong.csv")));
    }

    #[test]
    fn explicit_date_wins() {
        let mut opts = RunOptions::new("gulong.csv");
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        opts.date = Some(date);
        assert_eq!(opts.snapshot_date(), date);
    }
}
