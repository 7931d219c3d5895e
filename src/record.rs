// src/record.rs
//! Normalized per-source product rows and the identity they join on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// The four listing sources. `Gulong` is the authoritative reference inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Gulong,
    GoGulong,
    TireManila,
    PartsPro,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Gulong, Source::GoGulong, Source::TireManila, Source::PartsPro];

    /// Competitors in catalog price-column order.
    pub const COMPETITORS: [Source; 3] = [Source::GoGulong, Source::PartsPro, Source::TireManila];

    pub fn key(self) -> &'static str {
        match self {
            Source::Gulong => "gulong",
            Source::GoGulong => "gogulong",
            Source::TireManila => "tiremanila",
            Source::PartsPro => "partspro",
        }
    }

    pub fn is_reference(self) -> bool {
        self == Source::Gulong
    }

    pub fn price_column(self) -> String {
        join!("price_", self.key())
    }

    /// Qualifier for a competitor's own `sku_name`/`raw_specs` after the join.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Source::Gulong => None,
            Source::GoGulong => Some("_gg"),
            Source::TireManila => Some("_tm"),
            Source::PartsPro => Some("_pp"),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Source {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|src| src.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::Settings(format!("unknown source `{s}`")))
    }
}

/// Cross-source identity: `(name, brand, correct_specs)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub name: String,
    pub brand: String,
    pub correct_specs: String,
}

impl IdentityKey {
    pub fn new(name: impl Into<String>, brand: impl Into<String>, correct_specs: impl Into<String>) -> Self {
        Self { name: name.into(), brand: brand.into(), correct_specs: correct_specs.into() }
    }
}

/// Source-specific fields carried beside the identity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extras {
    pub qty: Option<u32>,
    pub year: Option<i32>,
    pub load_index: Option<String>,
    pub speed_index: Option<String>,
    pub ply: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductRecord {
    pub sku_name: String,
    pub brand: String,
    pub name: String,
    pub price: Option<f64>,
    /// SKU encoding; display only.
    pub raw_specs: String,
    /// MATCH encoding; part of the identity.
    pub correct_specs: String,
    pub extras: Extras,
}

impl ProductRecord {
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(self.name.as_str(), self.brand.as_str(), self.correct_specs.as_str())
    }

    /// First identity component that is blank, if any.
    pub fn missing_key_part(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if self.brand.trim().is_empty() {
            Some("brand")
        } else if self.correct_specs.trim().is_empty() {
            Some("correct_specs")
        } else {
            None
        }
    }
}

/// One source's normalized rows.
#[derive(Clone, Debug)]
pub struct SourceTable {
    pub source: Source,
    pub records: Vec<ProductRecord>,
}

impl SourceTable {
    pub fn new(source: Source, records: Vec<ProductRecord>) -> Self {
        Self { source, records }
    }

    /// A collector that produced nothing.
    pub fn empty(source: Source) -> Self {
        Self { source, records: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.records.iter()
    }
}

/// Why a raw row did not become a record.
#[derive(Clone, Debug, PartialEq)]
pub enum Skip {
    Size(crate::error::DimensionError),
    MissingKey(&'static str),
    Filtered(String),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::Size(e) => write!(f, "size: {e}"),
            Skip::MissingKey(part) => write!(f, "empty {part}"),
            Skip::Filtered(why) => write!(f, "filtered: {why}"),
        }
    }
}

/// Per-source row accounting for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub source: Option<Source>,
    pub read: usize,
    pub kept: usize,
    pub bad_size: usize,
    pub missing_key: usize,
    pub filtered: usize,
    /// No capture was available; the source contributed zero rows.
    pub absent: bool,
}

impl SourceReport {
    pub fn new(source: Source) -> Self {
        Self { source: Some(source), ..Self::default() }
    }

    pub fn absent(source: Source) -> Self {
        Self { absent: true, ..Self::new(source) }
    }

    pub fn skipped(&self) -> usize {
        self.bad_size + self.missing_key + self.filtered
    }

    pub fn count(&mut self, skip: &Skip) {
        match skip {
            Skip::Size(_) => self.bad_size += 1,
            Skip::MissingKey(_) => self.missing_key += 1,
            Skip::Filtered(_) => self.filtered += 1,
        }
    }
}

impl fmt::Display for SourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.source.map_or("?", Source::key);
        if self.absent {
            return write!(f, "{name}: no capture");
        }
        write!(
            f,
            "{name}: {} kept of {} ({} bad size, {} missing key, {} filtered)",
            self.kept, self.read, self.bad_size, self.missing_key, self.filtered
        )
    }
}
