// src/normalize/sku.rs
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::sanitize::normalize_ws;

use super::dimension::Dimensions;

/// Load index (single or dual) and speed symbol right after the rim size: `R17 121/118S`.
static LOAD_SPEED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)R\s?\d{2}(?:\.\d)?C?\s+(?P<load>\d{2,3}(?:/\d{2,3})?)\s?(?P<speed>[A-Z])\b")
        .expect("load/speed pattern compiles")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadSpeed {
    pub load: String,
    pub speed: String,
}

pub fn extract_load_speed(text: &str) -> Option<LoadSpeed> {
    locate_load_speed(text).map(|(_, ls)| ls)
}

/// Load/speed run with its byte span, from the first load digit through the speed symbol.
pub fn locate_load_speed(text: &str) -> Option<(Range<usize>, LoadSpeed)> {
    let caps = LOAD_SPEED_RE.captures(text)?;
    let (load, speed) = (caps.name("load")?, caps.name("speed")?);
    let ls = LoadSpeed {
        load: load.as_str().to_string(),
        speed: speed.as_str().to_ascii_uppercase(),
    };
    Some((load.start()..speed.end(), ls))
}

/// Inputs of one product code. Unknown parts are empty / `None`.
#[derive(Clone, Copy, Debug)]
pub struct SkuParts<'a> {
    pub brand: &'a str,
    pub dims: &'a Dimensions,
    pub name: &'a str,
    pub load: Option<&'a str>,
    pub speed: Option<&'a str>,
}

/// `BRAND <sku dims> NAME [LOAD+SPEED]`, upper-cased, single-spaced.
/// The suffix is only written when both indices are known.
pub fn compose_sku(parts: &SkuParts<'_>) -> String {
    let suffix = match (parts.load.map(str::trim), parts.speed.map(str::trim)) {
        (Some(l), Some(s)) if !l.is_empty() && !s.is_empty() => join!(l, s),
        _ => s!(),
    };
    let raw = format!("{} {} {} {}", parts.brand, parts.dims.sku_specs(), parts.name, suffix);
    normalize_ws(&raw.to_uppercase())
}
