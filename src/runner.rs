// src/runner.rs
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use chrono::NaiveDate;

use crate::{
    config::{options::RunOptions, settings::Settings},
    error::{CatalogError, Result},
    file::{append_history, write_catalog, write_dataset},
    history::{self, HistoryReport},
    normalize::{NameResolver, ReferenceVocabulary},
    progress::{NullProgress, Progress},
    reconcile::{Bucket, Catalog, Reconciler, joined_table},
    record::{Source, SourceReport, SourceTable},
    sources::{self, NormalizeContext},
    store::{load_dataset, separator_for},
};

/// Every source of one run, normalized.
pub struct Snapshot {
    pub reference: SourceTable,
    /// In [`Source::COMPETITORS`] order; absent captures are empty tables.
    pub competitors: Vec<SourceTable>,
    /// Reference first, then competitors in the same order.
    pub reports: Vec<SourceReport>,
}

impl Snapshot {
    pub fn competitor_refs(&self) -> Vec<&SourceTable> {
        self.competitors.iter().collect()
    }
}

/// Summary of what was produced.
pub struct RunSummary {
    pub date: NaiveDate,
    pub reports: Vec<SourceReport>,
    pub bucket_counts: BTreeMap<Bucket, usize>,
    pub rows: usize,
    pub unbucketed: usize,
    pub files_written: Vec<PathBuf>,
    /// Set when the history file was re-normalized after this run.
    pub history: Option<HistoryReport>,
}

/// Load, normalize, reconcile and export one snapshot.
/// `progress` can be None (no UI updates) or Some(&mut impl Progress).
pub fn run(opts: &RunOptions, settings: &Settings, progress: Option<&mut dyn Progress>) -> Result<RunSummary> {
    let mut null = NullProgress;
    let progress: &mut dyn Progress = match progress {
        Some(p) => p,
        None => &mut null,
    };
    let result = run_inner(opts, settings, &mut *progress);
    progress.finish();
    result
}

fn run_inner(opts: &RunOptions, settings: &Settings, progress: &mut dyn Progress) -> Result<RunSummary> {
    let snapshot = load_sources(opts, settings, &mut *progress)?;
    let reconciler = Reconciler::new(settings.competitor_precedence.clone());
    let competitors = snapshot.competitor_refs();
    let mut written = Vec::new();

    if let Some(path) = &opts.joined {
        let joined = reconciler.join(&snapshot.reference, &competitors);
        write_dataset(path, &joined_table(&joined), separator_for(path))?;
        written.push(path.clone());
    }

    let catalog = reconciler.reconcile(&snapshot.reference, &competitors, opts.snapshot_date());
    written.extend(export(&catalog, opts, progress)?);

    let history = match (&opts.history, opts.rebuild_history) {
        (Some(path), true) => {
            let vocab = ReferenceVocabulary::from_table(&snapshot.reference);
            let report = rebuild_history(path, &vocab, settings)?;
            progress.log(&report.to_string());
            Some(report)
        }
        _ => None,
    };

    Ok(RunSummary {
        date: catalog.date(),
        reports: snapshot.reports,
        bucket_counts: catalog.bucket_counts(),
        rows: catalog.len(),
        unbucketed: catalog.unbucketed(),
        files_written: written,
        history,
    })
}

/// Re-normalize a stored history CSV in place against the reference vocabulary.
/// Rows that cannot be rebuilt are dropped and counted.
pub fn rebuild_history(path: &Path, vocab: &ReferenceVocabulary, settings: &Settings) -> Result<HistoryReport> {
    let data = load_dataset(path)?;
    let names = NameResolver::new(&vocab.names, &settings.scorer, settings.name_threshold);
    let (rebuilt, report) = history::renormalize(&data, &vocab.brands, &names)?;
    write_dataset(path, &rebuilt, ',')?;
    logf!("{report}");
    Ok(report)
}

fn export(catalog: &Catalog, opts: &RunOptions, progress: &mut dyn Progress) -> Result<Vec<PathBuf>> {
    let mut written = vec![write_catalog(catalog, &opts.export)?];
    if let Some(history) = &opts.history {
        append_history(history, catalog)?;
        written.push(history.clone());
    }
    for path in &written {
        progress.log(&format!("Wrote {}", path.display()));
    }
    Ok(written)
}

/// Normalize the reference, then every competitor on its own scoped thread.
///
/// The reference capture is required. A competitor without a configured path,
/// or whose file is missing, contributes an empty table.
pub fn load_sources(opts: &RunOptions, settings: &Settings, progress: &mut dyn Progress) -> Result<Snapshot> {
    settings.validate()?;
    progress.begin(Source::ALL.len());

    let data = load_dataset(&opts.reference)?;
    let (reference, reference_report) = sources::reference::normalize(&data)?;
    progress.source_done(&reference_report);

    let vocab = ReferenceVocabulary::from_table(&reference);
    logd!("Vocabulary: {} names, {} brands", vocab.names.len(), vocab.brands.len());
    let rules = settings.rules()?;
    let ctx = NormalizeContext { vocab: &vocab, scorer: &settings.scorer, rules: &rules, settings };

    let mut done: Vec<(Source, Result<(SourceTable, SourceReport)>)> = Vec::with_capacity(Source::COMPETITORS.len());
    thread::scope(|scope| -> Result<()> {
        let (tx, rx) = mpsc::channel();
        let handles: Vec<_> = Source::COMPETITORS
            .into_iter()
            .map(|source| {
                let tx = tx.clone();
                let path = opts.capture_path(source);
                let handle = scope.spawn(move || {
                    let _ = tx.send((source, load_competitor(source, path, &ctx)));
                });
                (source, handle)
            })
            .collect();
        drop(tx);

        for (source, result) in rx {
            if let Ok((_, report)) = &result {
                progress.source_done(report);
            }
            done.push((source, result));
        }

        let mut panicked = None;
        for (source, handle) in handles {
            if handle.join().is_err() {
                loge!("{source} worker panicked");
                panicked.get_or_insert(source);
            }
        }
        match panicked {
            Some(source) => Err(CatalogError::SourceThread(source)),
            None => Ok(()),
        }
    })?;

    done.sort_by_key(|(source, _)| Source::COMPETITORS.iter().position(|s| s == source));
    let mut competitors = Vec::with_capacity(done.len());
    let mut reports = vec![reference_report];
    for (_, result) in done {
        let (table, report) = result?;
        competitors.push(table);
        reports.push(report);
    }

    Ok(Snapshot { reference, competitors, reports })
}

fn load_competitor(
    source: Source,
    path: Option<&Path>,
    ctx: &NormalizeContext<'_>,
) -> Result<(SourceTable, SourceReport)> {
    let Some(path) = path else {
        logd!("{source}: no capture configured");
        return Ok((SourceTable::empty(source), SourceReport::absent(source)));
    };
    if !path.exists() {
        logw!("{source}: capture {} not found; treated as absent", path.display());
        return Ok((SourceTable::empty(source), SourceReport::absent(source)));
    }
    let data = load_dataset(path)?;
    sources::normalize(source, &data, ctx)
}
