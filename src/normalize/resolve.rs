// src/normalize/resolve.rs
//! Fuzzy resolution of noisy model/brand names against the reference vocabulary.
//!
//! Scoring sits behind [`Similarity`] so the algorithm can change without
//! touching callers. Scores are on a 0–100 scale.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::core::sanitize::normalize_ws;
use crate::record::SourceTable;

pub trait Similarity: Send + Sync {
    /// 0 (unrelated) ..= 100 (same).
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Token-set comparison: shared tokens count fully, leftovers are compared by
/// edit distance. A name whose tokens are a subset of the other's scores 100.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenSetRatio;

#[derive(Clone, Copy, Debug, Default)]
pub struct JaroWinkler;

#[derive(Clone, Copy, Debug, Default)]
pub struct Levenshtein;

fn tokens(s: &str) -> BTreeSet<String> {
    s.to_uppercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn joined<'a>(parts: impl IntoIterator<Item = &'a String>) -> String {
    parts.into_iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

impl Similarity for TokenSetRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        let ta = tokens(a);
        let tb = tokens(b);
        if ta.is_empty() || tb.is_empty() {
            return 0.0;
        }

        let sect = joined(ta.intersection(&tb));
        let with_rest = |rest: String| match (sect.is_empty(), rest.is_empty()) {
            (true, _) => rest,
            (false, true) => sect.clone(),
            (false, false) => format!("{sect} {rest}"),
        };
        let ab = with_rest(joined(ta.difference(&tb)));
        let ba = with_rest(joined(tb.difference(&ta)));

        let mut best = ratio(&ab, &ba);
        if !sect.is_empty() {
            best = best.max(ratio(&sect, &ab)).max(ratio(&sect, &ba));
        }
        best
    }
}

impl Similarity for JaroWinkler {
    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(&a.to_uppercase(), &b.to_uppercase()) * 100.0
    }
}

impl Similarity for Levenshtein {
    fn score(&self, a: &str, b: &str) -> f64 {
        ratio(&a.to_uppercase(), &b.to_uppercase())
    }
}

/// Scorer selected from settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    #[default]
    TokenSetRatio,
    JaroWinkler,
    Levenshtein,
}

impl Similarity for ScorerKind {
    fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            ScorerKind::TokenSetRatio => TokenSetRatio.score(a, b),
            ScorerKind::JaroWinkler => JaroWinkler.score(a, b),
            ScorerKind::Levenshtein => Levenshtein.score(a, b),
        }
    }
}

/// Trim, upper-case, unify dash/quote variants, keep alphanumerics and `- / . + &`,
/// collapse whitespace. Idempotent.
pub fn clean_name(raw: &str) -> String {
    let mapped: String = raw
        .to_uppercase()
        .chars()
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            c if c.is_alphanumeric() || matches!(c, '-' | '/' | '.' | '+' | '&') => c,
            _ => ' ',
        })
        .collect();
    normalize_ws(&mapped)
}

/// Ordered, de-duplicated set of cleaned names.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    entries: IndexSet<String>,
}

impl Vocabulary {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = names
            .into_iter()
            .map(|n| clean_name(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();
        Self { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Names and brands seen in the reference table. Built once per run, then only read.
#[derive(Clone, Debug, Default)]
pub struct ReferenceVocabulary {
    pub names: Vocabulary,
    pub brands: Vocabulary,
}

impl ReferenceVocabulary {
    pub fn from_table(table: &SourceTable) -> Self {
        Self {
            names: Vocabulary::from_names(table.iter().map(|r| r.name.as_str())),
            brands: Vocabulary::from_names(table.iter().map(|r| r.brand.as_str())),
        }
    }
}

/// Outcome of resolving one name.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// Already a vocabulary entry (raw or after cleaning).
    Exact(String),
    Fuzzy { name: String, score: f64 },
    /// Nothing cleared the threshold; the cleaned input.
    Literal(String),
}

impl Resolution {
    pub fn name(&self) -> &str {
        match self {
            Resolution::Exact(n) | Resolution::Literal(n) => n,
            Resolution::Fuzzy { name, .. } => name,
        }
    }

    pub fn into_name(self) -> String {
        match self {
            Resolution::Exact(n) | Resolution::Literal(n) => n,
            Resolution::Fuzzy { name, .. } => name,
        }
    }

    pub fn is_confident(&self) -> bool {
        !matches!(self, Resolution::Literal(_))
    }
}

pub struct NameResolver<'a> {
    vocab: &'a Vocabulary,
    scorer: &'a dyn Similarity,
    threshold: f64,
}

impl<'a> NameResolver<'a> {
    pub fn new(vocab: &'a Vocabulary, scorer: &'a dyn Similarity, threshold: f64) -> Self {
        Self { vocab, scorer, threshold }
    }

    /// Highest-scoring entry at or above the threshold; ties go to the earlier entry.
    pub fn resolve(&self, raw: &str) -> Resolution {
        let trimmed = raw.trim();
        if self.vocab.contains(trimmed) {
            return Resolution::Exact(trimmed.to_string());
        }

        let cleaned = clean_name(raw);
        if cleaned.is_empty() {
            return Resolution::Literal(cleaned);
        }
        if self.vocab.contains(&cleaned) {
            return Resolution::Exact(cleaned);
        }

        let mut best: Option<(&str, f64)> = None;
        for candidate in self.vocab.iter() {
            let score = self.scorer.score(&cleaned, candidate);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((name, score)) if score >= self.threshold => {
                Resolution::Fuzzy { name: name.to_string(), score }
            }
            _ => Resolution::Literal(cleaned),
        }
    }

    pub fn resolve_name(&self, raw: &str) -> String {
        self.resolve(raw).into_name()
    }
}

/// Longest vocabulary entry that appears as a whole-token run inside `text`.
/// Equal lengths go to the earlier entry.
pub fn extract_model<'v>(text: &str, vocab: &'v Vocabulary) -> Option<&'v str> {
    let cleaned = clean_name(text);
    let hay: Vec<&str> = cleaned.split_whitespace().collect();

    let mut best: Option<&'v str> = None;
    for candidate in vocab.iter() {
        let needle: Vec<&str> = candidate.split_whitespace().collect();
        if needle.is_empty() || needle.len() > hay.len() {
            continue;
        }
        let found = hay.windows(needle.len()).any(|w| w == needle.as_slice());
        if found && best.is_none_or(|b| candidate.len() > b.len()) {
            best = Some(candidate);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(names: &[&str]) -> Vocabulary {
        Vocabulary::from_names(names)
    }

    #[test]
    fn clean_name_is_idempotent() {
        let once = clean_name("  all–terrain  t/a ko2!! ");
        assert_eq!(once, "ALL-TERRAIN T/A KO2");
        assert_eq!(clean_name(&once), once);
    }

    #[test]
    fn token_set_subset_is_full_score() {
        assert_eq!(TokenSetRatio.score("KO2", "ALL-TERRAIN T/A KO2"), 100.0);
        assert!(TokenSetRatio.score("KO2", "KM3") < 90.0);
        assert_eq!(TokenSetRatio.score("", "KO2"), 0.0);
    }

    #[test]
    fn canonical_names_resolve_to_themselves() {
        let v = vocab(&["ALL-TERRAIN T/A KO2", "MUD-TERRAIN T/A KM3", "KO2"]);
        let scorer = TokenSetRatio;
        let r = NameResolver::new(&v, &scorer, 90.0);
        for name in v.iter() {
            assert_eq!(r.resolve(name), Resolution::Exact(name.to_string()));
        }
    }

    #[test]
    fn close_spelling_resolves_fuzzily() {
        let v = vocab(&["ALL-TERRAIN T/A KO2", "MUD-TERRAIN T/A KM3"]);
        let scorer = TokenSetRatio;
        let r = NameResolver::new(&v, &scorer, 90.0);

        let got = r.resolve("all terrain t/a ko3");
        assert_eq!(got.name(), "ALL-TERRAIN T/A KO2");
        assert!(matches!(got, Resolution::Fuzzy { .. }));
    }

    #[test]
    fn unmatched_name_is_cleaned_literal() {
        let v = vocab(&["ALL-TERRAIN T/A KO2"]);
        let scorer = TokenSetRatio;
        let r = NameResolver::new(&v, &scorer, 90.0);
        assert_eq!(r.resolve("  zx-9 special!! "), Resolution::Literal("ZX-9 SPECIAL".into()));
    }

    #[test]
    fn ties_go_to_first_entry() {
        let scorer = TokenSetRatio;

        let v = vocab(&["KO2 X", "KO2 Y"]);
        assert_eq!(NameResolver::new(&v, &scorer, 90.0).resolve_name("KO2"), "KO2 X");

        let v = vocab(&["KO2 Y", "KO2 X"]);
        assert_eq!(NameResolver::new(&v, &scorer, 90.0).resolve_name("KO2"), "KO2 Y");
    }

    #[test]
    fn empty_vocabulary_falls_back() {
        let v = Vocabulary::default();
        let r = NameResolver::new(&v, &JaroWinkler, 90.0);
        assert_eq!(r.resolve("ko2"), Resolution::Literal("KO2".into()));
    }

    #[test]
    fn extract_longest_model() {
        let v = vocab(&["KO2", "ALL-TERRAIN T/A KO2", "KM3"]);
        assert_eq!(
            extract_model("BFGOODRICH ALL-TERRAIN T/A KO2 265/70R17", &v),
            Some("ALL-TERRAIN T/A KO2")
        );
        assert_eq!(extract_model("BFGOODRICH KO2 LT265/70R17", &v), Some("KO2"));
        assert_eq!(extract_model("BFGOODRICH KO23", &v), None);
    }

    #[test]
    fn vocabulary_dedups_in_order() {
        let v = vocab(&["ko2", "KO2", " ", "KM3"]);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec!["KO2", "KM3"]);
    }
}
