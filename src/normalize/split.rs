// src/normalize/split.rs
//! Brand/model decomposition for sources that put everything in one title field.

use regex::Regex;

use crate::config::consts::DEFAULT_REWRITE_RULES;
use crate::core::sanitize::{normalize_ws, strip_leading_qualifier};
use crate::error::{CatalogError, Result};

use super::dimension::locate_dimensions;
use super::sku::locate_load_speed;

#[derive(Clone, Debug)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|e| CatalogError::InvalidRule {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { pattern: compiled, replacement: replacement.to_string() })
    }

    fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, self.replacement.as_str()).into_owned()
    }
}

/// Ordered rule table. Each rule sees the output of the ones before it.
#[derive(Clone, Debug)]
pub struct RewriteRules(Vec<RewriteRule>);

impl RewriteRules {
    pub fn from_pairs<I, P, R>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: AsRef<str>,
    {
        pairs
            .into_iter()
            .map(|(p, r)| RewriteRule::new(p.as_ref(), r.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn apply(&self, text: &str) -> String {
        self.0.iter().fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_REWRITE_RULES.iter().copied()).expect("built-in rewrite rules compile")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrandModel {
    pub brand: String,
    pub model: String,
}

impl BrandModel {
    /// No separating token was found; everything landed in `brand`.
    pub fn is_ambiguous(&self) -> bool {
        self.model.is_empty()
    }
}

/// Split `"265/70R17 BFG ALL-TERRAIN T/A KO2"` into `BFGOODRICH` / `ALL-TERRAIN T/A KO2`.
///
/// The size and any load/speed run after it are cut out wherever they sit,
/// then one leading `( … )`/`[ … ]` qualifier is dropped, the rewrite rules run in order, and the first
/// remaining token becomes the brand. Never fails: an unsplittable field
/// comes back with an empty model.
pub fn split_brand_model(field: &str, rules: &RewriteRules) -> BrandModel {
    let upper = field.to_uppercase();
    let mut cuts: Vec<_> = [
        locate_dimensions(&upper).map(|(span, _)| span),
        locate_load_speed(&upper).map(|(span, _)| span),
    ]
    .into_iter()
    .flatten()
    .collect();
    cuts.sort_by_key(|span| span.start);

    let mut kept = String::with_capacity(upper.len());
    let mut at = 0;
    for span in cuts {
        if span.start < at {
            continue;
        }
        kept.push_str(&upper[at..span.start]);
        kept.push(' ');
        at = span.end;
    }
    kept.push_str(&upper[at..]);

    let rest = strip_leading_qualifier(&kept);
    let rewritten = normalize_ws(&rules.apply(rest));

    match rewritten.split_once(' ') {
        Some((brand, model)) => BrandModel { brand: brand.to_string(), model: model.trim().to_string() },
        None => BrandModel { brand: rewritten, model: s!() },
    }
}
