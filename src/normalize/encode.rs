// src/normalize/encode.rs
//! String projections of a dimension triple.
//!
//! - `Sku`: display form, keeps the source's decimals: `265/70/R18`, `31/10.50/R15`, `7.50/R16`.
//! - `Match`: join key, canonical numbers and a fixed shape: `265/70/18`, `31/10.5/15`, `7.5/R/16`.
//!
//! Two numerically equal triples always produce the same `Match` string.

use super::dimension::Dimensions;

/// Placeholder for a missing ratio in both encodings.
pub const NO_RATIO: &str = "R";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecMode {
    Sku,
    Match,
}

pub fn combine_specs(dims: &Dimensions, mode: SpecMode) -> String {
    match mode {
        SpecMode::Sku => match dims.aspect_ratio {
            Some(ar) => format!("{}/{}/R{}", dims.width.as_written(), ar.as_written(), dims.diameter.as_written()),
            None => format!("{}/R{}", dims.width.as_written(), dims.diameter.as_written()),
        },
        SpecMode::Match => {
            let ratio = dims.aspect_ratio.map_or_else(|| NO_RATIO.to_string(), |ar| ar.canonical());
            format!("{}/{}/{}", dims.width.canonical(), ratio, dims.diameter.canonical())
        }
    }
}

impl Dimensions {
    /// `raw_specs` column value.
    pub fn sku_specs(&self) -> String {
        combine_specs(self, SpecMode::Sku)
    }

    /// `correct_specs` column value.
    pub fn match_specs(&self) -> String {
        combine_specs(self, SpecMode::Match)
    }
}
