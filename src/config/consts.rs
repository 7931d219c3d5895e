// src/config/consts.rs
use crate::record::Source;

// Logging
pub const LOG_FILE: &str = ".store/debug.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Export
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_FILE_STEM: &str = "tire_catalog";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Name resolution (0–100 scale)
pub const NAME_THRESHOLD: f64 = 90.0;
pub const BRAND_THRESHOLD: f64 = 90.0;

/// Applied in order by the brand/model splitter.
pub const DEFAULT_REWRITE_RULES: &[(&str, &str)] = &[
    (r"\bBFG\s", "BFGOODRICH "),
    (r"\bDOUBLE COIN\b", "DOUBLECOIN"),
    (r"\b8PR\b", "MICHELIN"),
    (r"\b10PR\b", "MICHELIN"),
];

/// Load-range tokens that older snapshots stored as a brand.
pub const HISTORY_NOISE_BRANDS: &[&str] = &["8PR", "10PR"];

/// Store-brand listings on the parts marketplace, not tires from a maker.
pub const DEFAULT_EXCLUDED_BRANDS: &[&str] = &["PARTSPRO.PH"];

/// Which competitor supplies the display fields of a row no reference listing matched.
pub const COMPETITOR_PRECEDENCE: [Source; 3] = [Source::TireManila, Source::GoGulong, Source::PartsPro];
