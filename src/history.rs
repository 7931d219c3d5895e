// src/history.rs
//! Re-normalization of the accumulated catalog history.
//!
//! Rows appended by earlier runs carry whatever rules were current at the
//! time. Rebuilding replays today's size encoding, name resolution and
//! product-code assembly over every stored row, so all snapshots share one
//! set of identity keys.

use std::fmt;

use crate::config::consts::HISTORY_NOISE_BRANDS;
use crate::core::sanitize::is_blank;
use crate::error::{CatalogError, Result};
use crate::normalize::{NameResolver, SkuParts, Vocabulary, clean_name, compose_sku, parse_dimensions};
use crate::reconcile::{CATALOG_COLUMNS, Catalog};
use crate::store::DataSet;

// Positions in CATALOG_COLUMNS.
const RAW_SPECS: usize = 1;
const SKU_NAME: usize = 2;
const QTY_TIREMANILA: usize = 7;
const BRAND: usize = 9;
const NAME: usize = 10;
const CORRECT_SPECS: usize = 11;

const REQUIRED: [&str; 4] = ["date", "brand", "name", "raw_specs"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryReport {
    pub read: usize,
    pub kept: usize,
    pub noise_brand: usize,
    pub bad_quantity: usize,
    pub no_sku: usize,
    pub bad_size: usize,
    pub missing_key: usize,
    /// Kept rows whose name matched nothing in the vocabulary.
    pub unresolved: usize,
}

impl HistoryReport {
    fn count(&mut self, dropped: Dropped) {
        match dropped {
            Dropped::NoiseBrand => self.noise_brand += 1,
            Dropped::BadQuantity => self.bad_quantity += 1,
            Dropped::NoSku => self.no_sku += 1,
            Dropped::BadSize => self.bad_size += 1,
            Dropped::MissingKey => self.missing_key += 1,
        }
    }
}

impl fmt::Display for HistoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "history: {} kept of {} ({} noise brand, {} bad quantity, {} no sku, {} bad size, {} missing key; {} unresolved names)",
            self.kept,
            self.read,
            self.noise_brand,
            self.bad_quantity,
            self.no_sku,
            self.bad_size,
            self.missing_key,
            self.unresolved
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dropped {
    NoiseBrand,
    BadQuantity,
    NoSku,
    BadSize,
    MissingKey,
}

/// Where each catalog column sits in the stored file, if anywhere.
struct HistoryColumns([Option<usize>; 12]);

impl HistoryColumns {
    fn of(headers: &[String]) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        if let Some(missing) = REQUIRED.into_iter().find(|c| find(*c).is_none()) {
            return Err(CatalogError::HistoryColumn(s!(missing)));
        }
        Ok(Self(CATALOG_COLUMNS.map(|c| find(c))))
    }

    /// The row's cells in catalog order; absent columns and null spellings become empty.
    fn cells(&self, row: &[String]) -> Vec<String> {
        self.0
            .iter()
            .map(|idx| match idx.and_then(|i| row.get(i)) {
                Some(v) if !is_blank(v) => v.trim().to_string(),
                _ => s!(),
            })
            .collect()
    }
}

/// `BFGOODRICHKO2` → `BFGOODRICH` + `KO2` when a reference brand is a proper
/// prefix of the stored brand. The longest such brand wins.
pub fn unglue_brand(brand: &str, brands: &Vocabulary) -> (String, Option<String>) {
    if brand.is_empty() || brands.contains(brand) {
        return (brand.to_string(), None);
    }
    brands
        .iter()
        .filter(|b| brand.len() > b.len() && brand.starts_with(b))
        .max_by_key(|b| b.len())
        .map(|b| (b.to_string(), Some(brand[b.len()..].trim().to_string())))
        .unwrap_or_else(|| (brand.to_string(), None))
}

/// Replay normalization over every stored row. Output columns follow
/// [`CATALOG_COLUMNS`] whatever order the file used.
pub fn renormalize(data: &DataSet, brands: &Vocabulary, names: &NameResolver<'_>) -> Result<(DataSet, HistoryReport)> {
    let mut report = HistoryReport::default();
    let Some(headers) = data.headers.as_deref() else {
        if data.rows.is_empty() {
            return Ok((DataSet::new(Catalog::headers(), Vec::new()), report));
        }
        return Err(CatalogError::HistoryColumn(s!(REQUIRED[0])));
    };
    let cols = HistoryColumns::of(headers)?;

    let mut rows = Vec::with_capacity(data.rows.len());
    for row in &data.rows {
        report.read += 1;
        match rebuild_row(cols.cells(row), brands, names) {
            Ok((cells, confident)) => {
                if !confident {
                    report.unresolved += 1;
                }
                rows.push(cells);
            }
            Err(dropped) => {
                logd!("history: dropped {dropped:?} row {row:?}");
                report.count(dropped);
            }
        }
    }
    report.kept = rows.len();
    Ok((DataSet::new(Catalog::headers(), rows), report))
}

fn rebuild_row(
    mut cells: Vec<String>,
    brands: &Vocabulary,
    names: &NameResolver<'_>,
) -> std::result::Result<(Vec<String>, bool), Dropped> {
    let stored_brand = clean_name(&cells[BRAND]);
    if HISTORY_NOISE_BRANDS.contains(&stored_brand.as_str()) {
        return Err(Dropped::NoiseBrand);
    }
    let qty = &cells[QTY_TIREMANILA];
    if !qty.is_empty() && !qty.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Dropped::BadQuantity);
    }
    if cells[SKU_NAME].is_empty() {
        return Err(Dropped::NoSku);
    }

    let dims = parse_dimensions(&cells[RAW_SPECS])
        .or_else(|_| parse_dimensions(&cells[CORRECT_SPECS]))
        .map_err(|_| Dropped::BadSize)?;

    let (brand, glued) = unglue_brand(&stored_brand, brands);
    let resolution = names.resolve(glued.as_deref().unwrap_or(&cells[NAME]));
    let confident = resolution.is_confident();
    let name = resolution.into_name();
    if brand.is_empty() || name.is_empty() {
        return Err(Dropped::MissingKey);
    }

    cells[SKU_NAME] = compose_sku(&SkuParts { brand: &brand, dims: &dims, name: &name, load: None, speed: None });
    cells[RAW_SPECS] = dims.sku_specs();
    cells[CORRECT_SPECS] = dims.match_specs();
    cells[BRAND] = brand;
    cells[NAME] = name;
    Ok((cells, confident))
}
