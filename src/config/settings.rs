// src/config/settings.rs
//! Tunables read from an optional JSON file. Every field has a compiled default,
//! so a settings file only needs the keys it changes:
//!
//! ```json
//! {
//!   "scorer": "jaro_winkler",
//!   "name_threshold": 88,
//!   "rewrite_rules": [["\\bBFG\\s", "BFGOODRICH "], ["\\bGY\\b", "GOODYEAR"]],
//!   "competitor_precedence": ["gogulong", "tiremanila", "partspro"]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::consts::*;
use crate::error::{CatalogError, Result};
use crate::normalize::{RewriteRules, ScorerKind};
use crate::record::Source;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub scorer: ScorerKind,
    pub name_threshold: f64,
    pub brand_threshold: f64,
    /// `[pattern, replacement]` pairs, applied in order.
    pub rewrite_rules: Vec<(String, String)>,
    pub competitor_precedence: Vec<Source>,
    pub excluded_brands: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scorer: ScorerKind::default(),
            name_threshold: NAME_THRESHOLD,
            brand_threshold: BRAND_THRESHOLD,
            rewrite_rules: DEFAULT_REWRITE_RULES.iter().map(|(p, r)| (s!(*p), s!(*r))).collect(),
            competitor_precedence: COMPETITOR_PRECEDENCE.to_vec(),
            excluded_brands: DEFAULT_EXCLUDED_BRANDS.iter().map(|b| s!(*b)).collect(),
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let settings = Self::from_json(&text)?;
        logd!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// `path` when given, compiled defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (label, value) in [("name_threshold", self.name_threshold), ("brand_threshold", self.brand_threshold)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(CatalogError::Settings(format!("{label} must be within 0..=100, got {value}")));
            }
        }

        let mut seen = HashSet::new();
        for source in &self.competitor_precedence {
            if source.is_reference() {
                return Err(CatalogError::Settings(s!("competitor_precedence cannot list the reference source")));
            }
            if !seen.insert(*source) {
                return Err(CatalogError::Settings(format!("competitor_precedence lists {source} twice")));
            }
        }

        self.rules().map(|_| ())
    }

    pub fn rules(&self) -> Result<RewriteRules> {
        RewriteRules::from_pairs(self.rewrite_rules.iter().map(|(p, r)| (p.as_str(), r.as_str())))
    }

    pub fn is_excluded_brand(&self, brand: &str) -> bool {
        self.excluded_brands.iter().any(|b| b.trim().eq_ignore_ascii_case(brand.trim()))
    }
}
