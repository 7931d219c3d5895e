// src/sources/mod.rs
//! Source adapters: raw capture [`DataSet`] → normalized [`SourceTable`].
//!
//! Every adapter runs the same pipeline over its rows (size → encodings,
//! name → vocabulary, brand/model split where needed, product code) and
//! differs only in where each field lives in the capture. Structure:
//!
//! - A capture that already carries `name`, `brand` and `correct_specs` is
//!   taken as normalized and loaded by [`load_normalized`].
//! - Otherwise the adapter looks up its raw columns. A missing required
//!   column is fatal for the table: the identity key cannot be built.
//! - Row-level problems never fail the table. The row is skipped and the
//!   reason counted in the [`SourceReport`].

use std::collections::HashMap;

use crate::config::settings::Settings;
use crate::core::sanitize::{clean_price, clean_quantity, clean_year, is_blank};
use crate::error::{CatalogError, Result};
use crate::normalize::{
    Dimensions, NameResolver, ReferenceVocabulary, RewriteRules, Similarity, SkuParts, clean_name, compose_sku,
    parse_dimensions,
};
use crate::record::{Extras, ProductRecord, Skip, Source, SourceReport, SourceTable};
use crate::store::DataSet;

pub mod gogulong;
pub mod partspro;
pub mod reference;
pub mod tiremanila;

/// Read-only state shared by the competitor adapters for one run.
#[derive(Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub vocab: &'a ReferenceVocabulary,
    pub scorer: &'a dyn Similarity,
    pub rules: &'a RewriteRules,
    pub settings: &'a Settings,
}

impl<'a> NormalizeContext<'a> {
    pub fn names(&self) -> NameResolver<'a> {
        NameResolver::new(&self.vocab.names, self.scorer, self.settings.name_threshold)
    }

    pub fn brands(&self) -> NameResolver<'a> {
        NameResolver::new(&self.vocab.brands, self.scorer, self.settings.brand_threshold)
    }
}

/// Normalize one competitor capture. The reference table goes through [`reference::normalize`].
pub fn normalize(source: Source, data: &DataSet, ctx: &NormalizeContext<'_>) -> Result<(SourceTable, SourceReport)> {
    match source {
        Source::Gulong => reference::normalize(data),
        Source::GoGulong => gogulong::normalize(data, ctx),
        Source::TireManila => tiremanila::normalize(data, ctx),
        Source::PartsPro => partspro::normalize(data, ctx),
    }
}

/// Header lookup by case-insensitive name.
pub(crate) struct Columns {
    source: Source,
    index: HashMap<String, usize>,
}

impl Columns {
    /// `None` when the capture has no rows at all (an absent source).
    pub(crate) fn of(source: Source, data: &DataSet) -> Result<Option<Self>> {
        let Some(headers) = data.headers.as_ref() else {
            return if data.rows.is_empty() { Ok(None) } else { Err(CatalogError::MissingHeaders(source)) };
        };
        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            index.entry(h.trim().to_ascii_lowercase()).or_insert(i);
        }
        Ok(Some(Self { source, index }))
    }

    pub(crate) fn get(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_ascii_lowercase()).copied()
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub(crate) fn require(&self, name: &str) -> Result<usize> {
        self.get(name)
            .ok_or_else(|| CatalogError::MissingColumn { table: self.source, column: name.to_string() })
    }

    /// First present of several spellings; the error names the first.
    pub(crate) fn require_any(&self, names: &[&str]) -> Result<usize> {
        names
            .iter()
            .find_map(|n| self.get(n))
            .ok_or_else(|| CatalogError::MissingColumn { table: self.source, column: names[0].to_string() })
    }

    pub(crate) fn is_normalized(&self) -> bool {
        ["name", "brand", "correct_specs"].iter().all(|c| self.has(c))
    }
}

pub(crate) fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map_or("", |c| c.trim())
}

pub(crate) fn opt_cell(row: &[String], idx: Option<usize>) -> Option<&str> {
    idx.map(|i| cell(row, i)).filter(|c| !is_blank(c))
}

/// Run `f` over every row, keeping records and tallying skips.
pub(crate) fn collect_rows<F>(source: Source, rows: &[Vec<String>], mut f: F) -> (SourceTable, SourceReport)
where
    F: FnMut(&[String]) -> std::result::Result<ProductRecord, Skip>,
{
    let mut report = SourceReport::new(source);
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        report.read += 1;
        match f(row).and_then(require_key) {
            Ok(record) => records.push(record),
            Err(skip) => {
                logd!("{source} row {}: skipped ({skip})", i + 1);
                report.count(&skip);
            }
        }
    }

    report.kept = records.len();
    logf!("{report}");
    (SourceTable::new(source, records), report)
}

fn require_key(record: ProductRecord) -> std::result::Result<ProductRecord, Skip> {
    match record.missing_key_part() {
        Some(part) => Err(Skip::MissingKey(part)),
        None => Ok(record),
    }
}

/// Fields a source adapter has worked out for one row.
pub(crate) struct Draft<'a> {
    pub brand: String,
    pub name: String,
    pub dims: Dimensions,
    pub price: Option<f64>,
    pub load: Option<&'a str>,
    pub speed: Option<&'a str>,
}

impl Draft<'_> {
    /// Compose encodings and product code; `sku_name` overrides the composed code.
    pub(crate) fn into_record(self, sku_name: Option<&str>, mut extras: Extras) -> ProductRecord {
        let composed = compose_sku(&SkuParts {
            brand: &self.brand,
            dims: &self.dims,
            name: &self.name,
            load: self.load,
            speed: self.speed,
        });
        extras.load_index = extras.load_index.or_else(|| self.load.map(str::to_string));
        extras.speed_index = extras.speed_index.or_else(|| self.speed.map(str::to_string));

        ProductRecord {
            sku_name: sku_name.map_or(composed, |s| clean_name(s)),
            raw_specs: self.dims.sku_specs(),
            correct_specs: self.dims.match_specs(),
            brand: self.brand,
            name: self.name,
            price: self.price,
            extras,
        }
    }
}

/// Load a capture that already has the normalized schema.
///
/// `correct_specs` is re-encoded when it decodes, so differently formatted
/// join keys still meet; otherwise it is kept as written.
pub(crate) fn load_normalized(source: Source, cols: &Columns, rows: &[Vec<String>]) -> (SourceTable, SourceReport) {
    let name = cols.get("name");
    let brand = cols.get("brand");
    let specs = cols.get("correct_specs");
    let price_column = source.price_column();
    let price = cols.get(&price_column).or_else(|| cols.get("price"));
    let sku = cols.get("sku_name");
    let raw = cols.get("raw_specs");
    let qty = cols.get("qty_tiremanila").or_else(|| cols.get("qty"));
    let year = cols.get("year");
    let load = cols.get("load_index");
    let speed = cols.get("speed_index");

    collect_rows(source, rows, |row| {
        let written = opt_cell(row, specs).unwrap_or_default();
        let (correct_specs, raw_specs) = match parse_dimensions(written) {
            Ok(dims) => (dims.match_specs(), opt_cell(row, raw).map_or_else(|| dims.sku_specs(), str::to_string)),
            Err(_) => (written.to_string(), opt_cell(row, raw).unwrap_or_default().to_string()),
        };

        Ok(ProductRecord {
            sku_name: opt_cell(row, sku).unwrap_or_default().to_string(),
            brand: clean_name(opt_cell(row, brand).unwrap_or_default()),
            name: clean_name(opt_cell(row, name).unwrap_or_default()),
            price: opt_cell(row, price).and_then(clean_price),
            raw_specs,
            correct_specs,
            extras: Extras {
                qty: opt_cell(row, qty).and_then(clean_quantity),
                year: opt_cell(row, year).and_then(clean_year),
                load_index: opt_cell(row, load).map(str::to_string),
                speed_index: opt_cell(row, speed).map(str::to_string),
                ply: None,
            },
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(headers: &[&str], rows: &[&[&str]]) -> DataSet {
        DataSet::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        )
    }

    #[test]
    fn column_lookup_ignores_case() {
        let d = data(&["designName", " Price "], &[]);
        let cols = Columns::of(Source::GoGulong, &d).unwrap().unwrap();
        assert_eq!(cols.get("designname"), Some(0));
        assert_eq!(cols.require_any(&["sellingPrice", "price"]).unwrap(), 1);
        let err = cols.require("tireBrand").unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn { table: Source::GoGulong, .. }));
    }

    #[test]
    fn headerless_capture() {
        assert!(Columns::of(Source::PartsPro, &DataSet::default()).unwrap().is_none());
        let rows_only = DataSet { headers: None, rows: vec![vec![s!("x")]] };
        assert!(matches!(Columns::of(Source::PartsPro, &rows_only), Err(CatalogError::MissingHeaders(_))));
    }

    #[test]
    fn normalized_capture_loads_and_canonicalizes() {
        let d = data(
            &["sku_name", "name", "brand", "price_gogulong", "raw_specs", "correct_specs"],
            &[
                &["BFGOODRICH 265/70/R18 KO2", "KO2", "bfgoodrich", "8,700", "265/70/R18", "265/70/R18"],
                &["X", "", "BFGOODRICH", "1", "", "265/70/18"],
            ],
        );
        let cols = Columns::of(Source::GoGulong, &d).unwrap().unwrap();
        assert!(cols.is_normalized());
        let (table, report) = load_normalized(Source::GoGulong, &cols, &d.rows);

        assert_eq!(table.len(), 1);
        let r = &table.records[0];
        assert_eq!(r.correct_specs, "265/70/18");
        assert_eq!(r.brand, "BFGOODRICH");
        assert_eq!(r.price, Some(8700.0));
        assert_eq!(report.missing_key, 1);
    }
}
