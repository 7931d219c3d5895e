// src/core/sanitize.rs

/// Collapse runs of whitespace to one space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Empty cells and the null spellings that spreadsheet exports leave behind.
pub fn is_blank(s: &str) -> bool {
    let t = s.trim();
    t.is_empty()
        || t.eq_ignore_ascii_case("nan")
        || t.eq_ignore_ascii_case("none")
        || t.eq_ignore_ascii_case("null")
}

/// Drop one leading `( … )` or `[ … ]` qualifier, e.g. `"(PROMO) BFG KO2"` → `"BFG KO2"`.
/// Unterminated qualifiers are left alone.
pub fn strip_leading_qualifier(s: &str) -> &str {
    let t = s.trim_start();
    let close = match t.chars().next() {
        Some('(') => ')',
        Some('[') => ']',
        _ => return t,
    };
    match t.find(close) {
        Some(end) => t[end + close.len_utf8()..].trim_start(),
        None => t,
    }
}

/// First number in a price cell: `"₱ 8,700.00"` → `8700.0`, `"8500"` → `8500.0`.
pub fn clean_price(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let run: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    run.trim_end_matches('.').parse::<f64>().ok()
}

/// Four-digit years as-is; two-digit years are 20xx.
pub fn clean_year(text: &str) -> Option<i32> {
    let t = text.trim();
    let t = t.strip_suffix(".0").unwrap_or(t);
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let y: i32 = t.parse().ok()?;
    match t.len() {
        2 => Some(2000 + y),
        4 if (1950..=2100).contains(&y) => Some(y),
        _ => None,
    }
}

/// Stock counts; `"10+"` reads as 10, anything else non-numeric is unknown.
pub fn clean_quantity(text: &str) -> Option<u32> {
    let t = text.trim();
    let t = t.strip_suffix(".0").unwrap_or(t);
    t.trim_end_matches('+').parse().ok()
}
