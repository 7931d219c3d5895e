// src/normalize/dimension.rs
//! Tire size parsing.
//!
//! Turns free-form size text into a canonical `(width, aspect_ratio, diameter)`
//! triple. Supported notations:
//!
//! ```text
//! 175/65R14   175/65/R14   175/65 R14   LT265/70R17   245/40ZR18
//! 31X10.50R15 31 10.50R15  7.50R16      7.50/R16      8-14.5
//! 265/70/18   7.5/R/16     (positional MATCH form)
//! ```
//!
//! A missing ratio (off-road sizes, or a ratio that is not a number) is `None`.
//! Numbers are fixed-point (`Measure`) so `14.5` never collides with `14`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::DimensionError;

/// Size embedded in longer text. The `size` group spans prefix through diameter.
/// A width never starts right after a digit, `.` or `/`, so the tail of a
/// longer number is not read as a size.
static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:^|[^0-9./])",
        r"(?P<size>(?:LT|P)?",
        r"(?P<w>\d{1,3}(?:\.\d{1,2})?)",
        r"(?:\s*(?:[/X]|\s)\s*(?P<ar>\d{1,2}(?:\.\d{1,2})?)?)?",
        r"\s*/?\s*(?:Z?R|-)\s*",
        r"(?P<d>\d{1,2}(?:\.\d)?))",
    ))
    .expect("size pattern compiles")
});

/// The join-key form, `w/ar/d` or `w/R/d`, with nothing around it.
static POSITIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?P<w>\d+(?:\.\d+)?)\s*/\s*(?P<ar>\d+(?:\.\d+)?|R)\s*/\s*(?P<d>\d+(?:\.\d+)?)\s*$")
        .expect("positional pattern compiles")
});

/// Fixed-point size component: value in hundredths plus the decimals the
/// source wrote. Equality, ordering and hashing look at the value only.
#[derive(Clone, Copy, Debug)]
pub struct Measure {
    hundredths: u32,
    decimals: u8,
}

impl Measure {
    pub fn whole(n: u32) -> Self {
        Self { hundredths: n.saturating_mul(100), decimals: 0 }
    }

    /// `"65"`, `"065"`, `"10.50"`, `"14.5"`. More than two decimals are truncated.
    /// A zero fraction (`"265.0"`) is read as a whole number.
    pub fn parse(text: &str) -> Option<Self> {
        let t = text.trim();
        let (int_part, frac_part) = t.split_once('.').unwrap_or((t, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !digits(int_part) || !digits(frac_part) {
            return None;
        }

        let whole: u32 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
        let frac = &frac_part[..frac_part.len().min(2)];
        let cents: u32 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u32>().ok()? * 10,
            _ => frac.parse().ok()?,
        };
        let hundredths = whole.checked_mul(100)?.checked_add(cents)?;
        let decimals = if cents == 0 { 0 } else { frac.len() as u8 };

        Some(Self { hundredths, decimals })
    }

    pub fn is_zero(&self) -> bool {
        self.hundredths == 0
    }

    /// Shortest form: no padding, no trailing zeros. `10.50` → `"10.5"`.
    pub fn canonical(&self) -> String {
        let whole = self.hundredths / 100;
        match self.hundredths % 100 {
            0 => whole.to_string(),
            c if c % 10 == 0 => format!("{whole}.{}", c / 10),
            c => format!("{whole}.{c:02}"),
        }
    }

    /// Form with the decimals the source used. `10.50` → `"10.50"`.
    pub fn as_written(&self) -> String {
        let whole = self.hundredths / 100;
        let cents = self.hundredths % 100;
        match self.decimals {
            0 => whole.to_string(),
            1 => format!("{whole}.{}", cents / 10),
            _ => format!("{whole}.{cents:02}"),
        }
    }
}

impl PartialEq for Measure {
    fn eq(&self, other: &Self) -> bool {
        self.hundredths == other.hundredths
    }
}

impl Eq for Measure {}

impl Hash for Measure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hundredths.hash(state);
    }
}

impl PartialOrd for Measure {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Measure {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hundredths.cmp(&other.hundredths)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Canonical dimension triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: Measure,
    /// `None` for no-ratio sizes (`7.50R16`) and unreadable ratios.
    pub aspect_ratio: Option<Measure>,
    pub diameter: Measure,
}

impl Dimensions {
    pub fn new(width: Measure, aspect_ratio: Option<Measure>, diameter: Measure) -> Self {
        Self { width, aspect_ratio, diameter }
    }
}

/// Parse a fragment believed to hold a tire size.
pub fn parse_dimensions(text: &str) -> Result<Dimensions, DimensionError> {
    let prepared = text.replace(',', "");

    if let Some(caps) = POSITIONAL_RE.captures(&prepared) {
        return triple_from(&caps);
    }

    match locate_dimensions(&prepared) {
        Some((_, dims)) => Ok(dims),
        None => Err(DimensionError::NoDiameterMarker(text.trim().to_string())),
    }
}

/// First size found inside `text`, with its byte span (including any `LT`/`P` prefix).
pub fn locate_dimensions(text: &str) -> Option<(Range<usize>, Dimensions)> {
    SIZE_RE.captures_iter(text).find_map(|caps| {
        let span = caps.name("size")?.range();
        triple_from(&caps).ok().map(|dims| (span, dims))
    })
}

/// Build a triple from three separate columns (`section_width`, `aspect_ratio`, `rim_size`).
pub fn from_parts(width: &str, aspect_ratio: &str, diameter: &str) -> Result<Dimensions, DimensionError> {
    let w = clean_width(width).ok_or_else(|| DimensionError::InvalidWidth(width.trim().to_string()))?;
    let d = clean_diameter(diameter)
        .ok_or_else(|| DimensionError::InvalidDiameter(diameter.trim().to_string()))?;
    Ok(Dimensions::new(w, clean_aspect_ratio(aspect_ratio), d))
}

pub fn clean_width(text: &str) -> Option<Measure> {
    let t = text.trim().to_ascii_uppercase().replace(',', "");
    let t = t.strip_prefix("LT").or_else(|| t.strip_prefix('P')).unwrap_or(&t);
    Measure::parse(t).filter(|m| !m.is_zero())
}

/// `R`, `-`, blanks and anything non-numeric mean "no ratio".
pub fn clean_aspect_ratio(text: &str) -> Option<Measure> {
    Measure::parse(text).filter(|m| !m.is_zero())
}

/// Tolerates `R17`, `ZR18`, `17C`, `17.0`.
pub fn clean_diameter(text: &str) -> Option<Measure> {
    let t = text.trim().to_ascii_uppercase();
    let t = t.trim_start_matches(['Z', 'R']);
    let mut seen_dot = false;
    let end = t
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                return false;
            }
            !c.is_ascii_digit()
        })
        .map(|(i, _)| i)
        .unwrap_or(t.len());
    Measure::parse(&t[..end]).filter(|m| !m.is_zero())
}

fn triple_from(caps: &Captures<'_>) -> Result<Dimensions, DimensionError> {
    let w_txt = caps.name("w").map_or("", |m| m.as_str());
    let d_txt = caps.name("d").map_or("", |m| m.as_str());

    let width = Measure::parse(w_txt)
        .filter(|m| !m.is_zero())
        .ok_or_else(|| DimensionError::InvalidWidth(w_txt.to_string()))?;
    let diameter = Measure::parse(d_txt)
        .filter(|m| !m.is_zero())
        .ok_or_else(|| DimensionError::InvalidDiameter(d_txt.to_string()))?;
    let ratio = caps.name("ar").and_then(|m| clean_aspect_ratio(m.as_str()));

    Ok(Dimensions::new(width, ratio, diameter))
}
