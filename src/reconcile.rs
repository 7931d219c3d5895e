// src/reconcile.rs
//! Merge the reference table and the competitor tables into one dated catalog.
//!
//! 1. Full outer join on [`IdentityKey`]. Several rows for one key from the
//!    same source join as a cross product, like a relational outer join.
//! 2. Each joined row falls into at most one [`Bucket`]. Buckets are built
//!    independently and concatenated in declaration order.
//! 3. Rows are stable-sorted by `raw_specs` (blanks last), exact duplicates
//!    dropped (first kept), and the whole catalog is stamped with the run date.
//!
//! Competitor prices are carried side by side; nothing here picks a winner.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::config::consts::{COMPETITOR_PRECEDENCE, DATE_FORMAT};
use crate::error::Result;
use crate::record::{IdentityKey, ProductRecord, Source, SourceTable};
use crate::store::DataSet;

/// Fixed output column order.
pub const CATALOG_COLUMNS: [&str; 12] = [
    "date",
    "raw_specs",
    "sku_name",
    "price_gulong",
    "price_gogulong",
    "price_partspro",
    "price_tiremanila",
    "qty_tiremanila",
    "year",
    "brand",
    "name",
    "correct_specs",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Reference listing with at least one competitor price.
    ReferenceWithCompetitor,
    /// Priced reference listing without competitor prices.
    ReferenceOnly,
    GoGulongOnly,
    TireManilaOnly,
    PartsProOnly,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::ReferenceWithCompetitor,
        Bucket::ReferenceOnly,
        Bucket::GoGulongOnly,
        Bucket::TireManilaOnly,
        Bucket::PartsProOnly,
    ];

    pub fn competitor_only(source: Source) -> Option<Bucket> {
        match source {
            Source::Gulong => None,
            Source::GoGulong => Some(Bucket::GoGulongOnly),
            Source::TireManila => Some(Bucket::TireManilaOnly),
            Source::PartsPro => Some(Bucket::PartsProOnly),
        }
    }

    /// Source whose `sku_name`/`raw_specs` the bucket displays.
    pub fn display_source(self) -> Source {
        match self {
            Bucket::ReferenceWithCompetitor | Bucket::ReferenceOnly => Source::Gulong,
            Bucket::GoGulongOnly => Source::GoGulong,
            Bucket::TireManilaOnly => Source::TireManila,
            Bucket::PartsProOnly => Source::PartsPro,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Bucket::ReferenceWithCompetitor => "reference+competitor",
            Bucket::ReferenceOnly => "reference only",
            Bucket::GoGulongOnly => "gogulong only",
            Bucket::TireManilaOnly => "tiremanila only",
            Bucket::PartsProOnly => "partspro only",
        };
        f.write_str(label)
    }
}

fn slot(source: Source) -> Option<usize> {
    Source::COMPETITORS.iter().position(|s| *s == source)
}

/// One combination of per-source rows sharing an identity key.
#[derive(Clone, Debug)]
pub struct JoinedRow<'t> {
    pub key: IdentityKey,
    pub reference: Option<&'t ProductRecord>,
    /// Indexed like [`Source::COMPETITORS`].
    competitors: [Option<&'t ProductRecord>; 3],
}

impl<'t> JoinedRow<'t> {
    pub fn record(&self, source: Source) -> Option<&'t ProductRecord> {
        match slot(source) {
            Some(i) => self.competitors[i],
            None => self.reference,
        }
    }

    pub fn price(&self, source: Source) -> Option<f64> {
        self.record(source).and_then(|r| r.price)
    }

    pub fn has_competitor_price(&self) -> bool {
        Source::COMPETITORS.iter().any(|s| self.price(*s).is_some())
    }
}

#[derive(Default)]
struct Group<'t> {
    reference: Vec<&'t ProductRecord>,
    competitors: [Vec<&'t ProductRecord>; 3],
}

fn choices<'t>(rows: &[&'t ProductRecord]) -> Vec<Option<&'t ProductRecord>> {
    if rows.is_empty() { vec![None] } else { rows.iter().copied().map(Some).collect() }
}

#[derive(Clone, Debug)]
pub struct Reconciler {
    precedence: Vec<Source>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(COMPETITOR_PRECEDENCE.to_vec())
    }
}

impl Reconciler {
    /// `precedence` orders the competitor-only buckets' claim on unmatched rows.
    /// Competitors it leaves out are appended in column order.
    pub fn new(precedence: Vec<Source>) -> Self {
        let mut order: Vec<Source> = Vec::with_capacity(Source::COMPETITORS.len());
        for s in precedence.into_iter().chain(Source::COMPETITORS) {
            if !s.is_reference() && !order.contains(&s) {
                order.push(s);
            }
        }
        Self { precedence: order }
    }

    pub fn precedence(&self) -> &[Source] {
        &self.precedence
    }

    /// Full outer join on the identity key. Keys keep first-seen order, reference first.
    pub fn join<'t>(&self, reference: &'t SourceTable, competitors: &[&'t SourceTable]) -> Vec<JoinedRow<'t>> {
        let mut groups: IndexMap<IdentityKey, Group<'t>> = IndexMap::new();

        for record in reference.iter() {
            groups.entry(record.key()).or_default().reference.push(record);
        }
        for table in competitors {
            let Some(i) = slot(table.source) else {
                logw!("Reference table passed as a competitor; ignored");
                continue;
            };
            for record in table.iter() {
                groups.entry(record.key()).or_default().competitors[i].push(record);
            }
        }

        let mut joined = Vec::with_capacity(groups.len());
        for (key, group) in groups {
            let mut partial: Vec<(Option<&'t ProductRecord>, [Option<&'t ProductRecord>; 3])> =
                choices(&group.reference).into_iter().map(|r| (r, [None; 3])).collect();

            for (i, rows) in group.competitors.iter().enumerate() {
                let options = choices(rows);
                let mut next = Vec::with_capacity(partial.len() * options.len());
                for (r, c) in &partial {
                    for o in &options {
                        let mut c = *c;
                        c[i] = *o;
                        next.push((*r, c));
                    }
                }
                partial = next;
            }

            joined.extend(
                partial
                    .into_iter()
                    .map(|(reference, competitors)| JoinedRow { key: key.clone(), reference, competitors }),
            );
        }
        joined
    }

    /// The single bucket a joined row belongs to, if any.
    pub fn classify(&self, row: &JoinedRow<'_>) -> Option<Bucket> {
        match row.reference {
            Some(_) if row.has_competitor_price() => Some(Bucket::ReferenceWithCompetitor),
            Some(r) if r.price.is_some() => Some(Bucket::ReferenceOnly),
            Some(_) => None,
            None => self
                .precedence
                .iter()
                .find(|s| row.price(**s).is_some())
                .and_then(|s| Bucket::competitor_only(*s)),
        }
    }

    /// Catalog rows of one bucket, in join order.
    pub fn bucket_rows(&self, bucket: Bucket, joined: &[JoinedRow<'_>]) -> Vec<CatalogRow> {
        joined
            .iter()
            .filter(|row| self.classify(row) == Some(bucket))
            .map(|row| CatalogRow::project(bucket, row))
            .collect()
    }

    pub fn reconcile(&self, reference: &SourceTable, competitors: &[&SourceTable], date: NaiveDate) -> Catalog {
        let joined = self.join(reference, competitors);
        let unbucketed = joined.iter().filter(|row| self.classify(row).is_none()).count();
        if unbucketed > 0 {
            logd!("{unbucketed} joined rows carry no price and were left out");
        }

        let mut rows: Vec<CatalogRow> =
            Bucket::ALL.into_iter().flat_map(|bucket| self.bucket_rows(bucket, &joined)).collect();

        rows.sort_by(|a, b| blanks_last(&a.raw_specs, &b.raw_specs));

        let before = rows.len();
        let mut seen = HashSet::with_capacity(rows.len());
        rows.retain(|row| seen.insert(row.cells()));
        logd!("Dropped {} duplicate catalog rows", before - rows.len());

        let catalog = Catalog { date, rows, joined: joined.len(), unbucketed };
        logf!("Catalog for {}: {} rows from {} joined", catalog.date_string(), catalog.len(), catalog.joined);
        catalog
    }
}

fn blanks_last(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

/// Whole prices print without a fraction: `8500`, `8650.5`.
pub fn fmt_price(p: f64) -> String {
    if p.fract() == 0.0 { format!("{p:.0}") } else { p.to_string() }
}

fn opt_cell<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// One catalog line without its date. Blank display fields are `None`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogRow {
    #[serde(skip)]
    pub bucket: Bucket,
    pub raw_specs: Option<String>,
    pub sku_name: Option<String>,
    pub price_gulong: Option<f64>,
    pub price_gogulong: Option<f64>,
    pub price_partspro: Option<f64>,
    pub price_tiremanila: Option<f64>,
    pub qty_tiremanila: Option<u32>,
    pub year: Option<i32>,
    pub brand: String,
    pub name: String,
    pub correct_specs: String,
}

impl CatalogRow {
    fn project(bucket: Bucket, row: &JoinedRow<'_>) -> Self {
        let display = row.record(bucket.display_source());
        let tm = row.record(Source::TireManila);
        Self {
            bucket,
            raw_specs: display.and_then(|r| non_empty(&r.raw_specs)),
            sku_name: display.and_then(|r| non_empty(&r.sku_name)),
            price_gulong: row.price(Source::Gulong),
            price_gogulong: row.price(Source::GoGulong),
            price_partspro: row.price(Source::PartsPro),
            price_tiremanila: row.price(Source::TireManila),
            qty_tiremanila: tm.and_then(|r| r.extras.qty),
            year: tm.and_then(|r| r.extras.year),
            brand: row.key.brand.clone(),
            name: row.key.name.clone(),
            correct_specs: row.key.correct_specs.clone(),
        }
    }

    /// Every column after `date`, as written to delimited files.
    pub fn cells(&self) -> Vec<String> {
        let price = |p: Option<f64>| p.map(fmt_price).unwrap_or_default();
        vec![
            opt_cell(&self.raw_specs),
            opt_cell(&self.sku_name),
            price(self.price_gulong),
            price(self.price_gogulong),
            price(self.price_partspro),
            price(self.price_tiremanila),
            opt_cell(&self.qty_tiremanila),
            opt_cell(&self.year),
            self.brand.clone(),
            self.name.clone(),
            self.correct_specs.clone(),
        ]
    }
}

#[derive(Serialize)]
struct DatedRow<'a> {
    date: NaiveDate,
    #[serde(flatten)]
    row: &'a CatalogRow,
}

/// The reconciled, dated catalog of one run.
#[derive(Clone, Debug)]
pub struct Catalog {
    date: NaiveDate,
    rows: Vec<CatalogRow>,
    joined: usize,
    unbucketed: usize,
}

impl Catalog {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Joined rows that matched no bucket (reference listings without any price).
    pub fn unbucketed(&self) -> usize {
        self.unbucketed
    }

    pub fn headers() -> Vec<String> {
        CATALOG_COLUMNS.iter().map(|c| s!(*c)).collect()
    }

    /// Rows per bucket after deduplication; every bucket is listed.
    pub fn bucket_counts(&self) -> BTreeMap<Bucket, usize> {
        let mut counts: BTreeMap<Bucket, usize> = Bucket::ALL.into_iter().map(|b| (b, 0)).collect();
        for row in &self.rows {
            *counts.entry(row.bucket).or_default() += 1;
        }
        counts
    }

    pub fn to_dataset(&self) -> DataSet {
        let date = self.date_string();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(CATALOG_COLUMNS.len());
                cells.push(date.clone());
                cells.extend(row.cells());
                cells
            })
            .collect();
        DataSet::new(Self::headers(), rows)
    }

    pub fn to_json(&self) -> Result<String> {
        let rows: Vec<DatedRow<'_>> = self.rows.iter().map(|row| DatedRow { date: self.date, row }).collect();
        Ok(serde_json::to_string_pretty(&rows)?)
    }
}

/// The wide join before bucketing, with each competitor's display columns
/// suffixed (`sku_name_gg`, `raw_specs_tm`, …). For auditing a run.
pub fn joined_table(joined: &[JoinedRow<'_>]) -> DataSet {
    let mut headers = vec![s!("name"), s!("brand"), s!("correct_specs"), s!("sku_name"), s!("raw_specs")];
    headers.push(Source::Gulong.price_column());
    for source in Source::COMPETITORS {
        let suffix = source.suffix().unwrap_or_default();
        headers.push(join!("sku_name", suffix));
        headers.push(join!("raw_specs", suffix));
        headers.push(source.price_column());
    }
    headers.push(s!("qty_tiremanila"));
    headers.push(s!("year"));

    let rows = joined
        .iter()
        .map(|row| {
            let text = |source: Source, f: fn(&ProductRecord) -> &str| {
                row.record(source).map(|r| f(r).to_string()).unwrap_or_default()
            };
            let price = |source: Source| row.price(source).map(fmt_price).unwrap_or_default();

            let mut cells = vec![row.key.name.clone(), row.key.brand.clone(), row.key.correct_specs.clone()];
            cells.push(text(Source::Gulong, |r| r.sku_name.as_str()));
            cells.push(text(Source::Gulong, |r| r.raw_specs.as_str()));
            cells.push(price(Source::Gulong));
            for source in Source::COMPETITORS {
                cells.push(text(source, |r| r.sku_name.as_str()));
                cells.push(text(source, |r| r.raw_specs.as_str()));
                cells.push(price(source));
            }
            let tm = row.record(Source::TireManila);
            cells.push(tm.and_then(|r| r.extras.qty).map(|q| q.to_string()).unwrap_or_default());
            cells.push(tm.and_then(|r| r.extras.year).map(|y| y.to_string()).unwrap_or_default());
            cells
        })
        .collect();

    DataSet::new(headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Extras;

    fn rec(name: &str, specs: &str, price: Option<f64>) -> ProductRecord {
        ProductRecord {
            sku_name: format!("BFGOODRICH {specs} {name}"),
            brand: s!("BFGOODRICH"),
            name: s!(name),
            price,
            raw_specs: s!(specs),
            correct_specs: s!(specs),
            extras: Extras::default(),
        }
    }

    fn table(source: Source, records: Vec<ProductRecord>) -> SourceTable {
        SourceTable::new(source, records)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn precedence_is_completed() {
        let r = Reconciler::new(vec![Source::PartsPro, Source::Gulong, Source::PartsPro]);
        assert_eq!(r.precedence(), &[Source::PartsPro, Source::GoGulong, Source::TireManila]);
    }

    #[test]
    fn many_to_many_is_a_cross_product() {
        let reference = table(Source::Gulong, vec![rec("KO2", "265/70/18", Some(8500.0))]);
        let gg = table(
            Source::GoGulong,
            vec![rec("KO2", "265/70/18", Some(8700.0)), rec("KO2", "265/70/18", Some(8800.0))],
        );
        let tm = table(
            Source::TireManila,
            vec![rec("KO2", "265/70/18", Some(8600.0)), rec("KO2", "265/70/18", Some(8650.0))],
        );
        let joined = Reconciler::default().join(&reference, &[&gg, &tm]);
        assert_eq!(joined.len(), 4);
        assert!(joined.iter().all(|r| r.reference.is_some()));
    }

    #[test]
    fn competitor_only_rows_follow_precedence() {
        let reference = table(Source::Gulong, Vec::new());
        let gg = table(Source::GoGulong, vec![rec("KM3", "285/75/16", Some(12000.0))]);
        let tm = table(Source::TireManila, vec![rec("KM3", "285/75/16", Some(11800.0))]);
        let pp = table(Source::PartsPro, vec![rec("KM3", "285/75/16", None)]);

        let joined = Reconciler::default().join(&reference, &[&gg, &tm, &pp]);
        assert_eq!(joined.len(), 1);
        assert_eq!(Reconciler::default().classify(&joined[0]), Some(Bucket::TireManilaOnly));

        let gg_first = Reconciler::new(vec![Source::GoGulong]);
        assert_eq!(gg_first.classify(&joined[0]), Some(Bucket::GoGulongOnly));
    }

    #[test]
    fn unpriced_reference_is_left_out() {
        let reference = table(Source::Gulong, vec![rec("KO2", "265/70/18", None)]);
        let catalog = Reconciler::default().reconcile(&reference, &[], date());
        assert!(catalog.is_empty());
        assert_eq!(catalog.unbucketed(), 1);
    }

    #[test]
    fn sort_puts_blank_specs_last_and_dedups() {
        let reference = table(
            Source::Gulong,
            vec![
                rec("B", "265/70/18", Some(1.0)),
                rec("A", "", Some(2.0)),
                rec("C", "205/55/16", Some(3.0)),
                rec("C", "205/55/16", Some(3.0)),
            ],
        );
        let catalog = Reconciler::default().reconcile(&reference, &[], date());
        let specs: Vec<_> = catalog.rows().iter().map(|r| r.raw_specs.clone()).collect();
        assert_eq!(specs, vec![Some(s!("205/55/16")), Some(s!("265/70/18")), None]);
        assert_eq!(catalog.bucket_counts()[&Bucket::ReferenceOnly], 3);
    }

    #[test]
    fn dataset_and_json_shapes() {
        let reference = table(Source::Gulong, vec![rec("KO2", "265/70/18", Some(8500.0))]);
        let gg = table(Source::GoGulong, vec![rec("KO2", "265/70/18", Some(8700.5))]);
        let catalog = Reconciler::default().reconcile(&reference, &[&gg], date());

        let data = catalog.to_dataset();
        assert_eq!(data.headers.as_deref(), Some(Catalog::headers().as_slice()));
        assert_eq!(data.rows[0][0], "2024-05-01");
        assert_eq!(data.rows[0][3], "8500");
        assert_eq!(data.rows[0][4], "8700.5");
        assert_eq!(data.rows[0][5], "");

        let json: serde_json::Value = serde_json::from_str(&catalog.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["date"], "2024-05-01");
        assert_eq!(json[0]["price_gogulong"], 8700.5);
        assert!(json[0]["price_partspro"].is_null());
        assert!(json[0].get("bucket").is_none());
    }

    #[test]
    fn joined_table_suffixes_competitor_columns() {
        let reference = table(Source::Gulong, vec![rec("KO2", "265/70/18", Some(8500.0))]);
        let pp = table(Source::PartsPro, vec![rec("KO2", "265/70/18", Some(9100.0))]);
        let joined = Reconciler::default().join(&reference, &[&pp]);
        let data = joined_table(&joined);

        let headers = data.headers.unwrap();
        let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
        assert_eq!(data.rows[0][col("price_partspro")], "9100");
        assert_eq!(data.rows[0][col("sku_name_pp")], "BFGOODRICH 265/70/18 KO2");
        assert_eq!(data.rows[0][col("raw_specs_gg")], "");
    }
}
