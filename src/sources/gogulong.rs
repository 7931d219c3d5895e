// src/sources/gogulong.rs
use std::sync::LazyLock;

use regex::Regex;

use crate::core::sanitize::clean_price;
use crate::error::{DimensionError, Result};
use crate::normalize::{Dimensions, clean_name, dimension::from_parts, extract_load_speed, locate_dimensions};
use crate::record::{Extras, Skip, Source, SourceReport, SourceTable};
use crate::store::DataSet;

use super::{Columns, Draft, NormalizeContext, cell, collect_rows, load_normalized, opt_cell};

const SOURCE: Source = Source::GoGulong;

static PLY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})\s?PR\b").expect("ply pattern compiles"));

/// Where the size lives in this capture.
enum SizeColumns {
    Info(usize),
    Parts { width: usize, ratio: usize, rim: usize },
}

pub fn normalize(data: &DataSet, ctx: &NormalizeContext<'_>) -> Result<(SourceTable, SourceReport)> {
    let Some(cols) = Columns::of(SOURCE, data)? else {
        return Ok((SourceTable::empty(SOURCE), SourceReport::absent(SOURCE)));
    };
    if cols.is_normalized() {
        return Ok(load_normalized(SOURCE, &cols, &data.rows));
    }

    let design = cols.require_any(&["designName", "tires"])?;
    let brand = cols.require_any(&["tireBrand", "brand"])?;
    let price = cols.require_any(&["sellingPrice", "price"])?;
    let info = cols.get("info");
    let size = match info {
        Some(i) => SizeColumns::Info(i),
        None => SizeColumns::Parts {
            width: cols.require("width")?,
            ratio: cols.require("aspectRatio")?,
            rim: cols.require("rimDiameter")?,
        },
    };

    let names = ctx.names();
    Ok(collect_rows(SOURCE, &data.rows, |row| {
        let dims = size_of(row, &size).map_err(Skip::Size)?;
        let info_text = opt_cell(row, info).unwrap_or_default();
        let ls = extract_load_speed(info_text);

        let draft = Draft {
            brand: clean_name(cell(row, brand)),
            name: names.resolve_name(cell(row, design)),
            dims,
            price: clean_price(cell(row, price)),
            load: ls.as_ref().map(|l| l.load.as_str()),
            speed: ls.as_ref().map(|l| l.speed.as_str()),
        };
        let extras = Extras { ply: ply_rating(info_text), ..Extras::default() };
        Ok(draft.into_record(None, extras))
    }))
}

fn size_of(row: &[String], size: &SizeColumns) -> std::result::Result<Dimensions, DimensionError> {
    match *size {
        SizeColumns::Info(i) => {
            let text = cell(row, i);
            locate_dimensions(text)
                .map(|(_, dims)| dims)
                .ok_or_else(|| DimensionError::NoDiameterMarker(text.to_string()))
        }
        SizeColumns::Parts { width, ratio, rim } => from_parts(cell(row, width), cell(row, ratio), cell(row, rim)),
    }
}

/// `"LT265/70R17 10PR"` → 10.
pub fn ply_rating(info: &str) -> Option<u32> {
    PLY_RE.captures(info).and_then(|c| c[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Settings;
    use crate::normalize::{ReferenceVocabulary, RewriteRules, TokenSetRatio, Vocabulary};

    fn vocab() -> ReferenceVocabulary {
        ReferenceVocabulary {
            names: Vocabulary::from_names(["ALL-TERRAIN T/A KO2", "MUD-TERRAIN T/A KM3"]),
            brands: Vocabulary::from_names(["BFGOODRICH"]),
        }
    }

    fn capture(headers: &[&str], rows: &[&[&str]]) -> DataSet {
        DataSet::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        )
    }

    fn run(data: &DataSet) -> (SourceTable, SourceReport) {
        let vocab = vocab();
        let rules = RewriteRules::default();
        let settings = Settings::default();
        let ctx = NormalizeContext { vocab: &vocab, scorer: &TokenSetRatio, rules: &rules, settings: &settings };
        normalize(data, &ctx).unwrap()
    }

    #[test]
    fn info_text_capture() {
        let data = capture(
            &["designName", "tireBrand", "info", "sellingPrice"],
            &[
                &["All Terrain T/A KO2", "BFGoodrich", "LT265/70R17 121/118S 10PR", "₱ 8,700.00"],
                &["Mystery", "BFGoodrich", "no size here", "₱ 1.00"],
            ],
        );
        let (table, report) = run(&data);
        assert_eq!(report.kept, 1);
        assert_eq!(report.bad_size, 1);

        let r = &table.records[0];
        assert_eq!(r.name, "ALL-TERRAIN T/A KO2");
        assert_eq!(r.correct_specs, "265/70/17");
        assert_eq!(r.price, Some(8700.0));
        assert_eq!(r.extras.ply, Some(10));
        assert_eq!(r.extras.load_index.as_deref(), Some("121/118"));
    }

    #[test]
    fn split_size_columns() {
        let data = capture(
            &["tires", "brand", "width", "aspectRatio", "rimDiameter", "price"],
            &[&["Mud-Terrain T/A KM3", "BFGOODRICH", "31", "10.50", "15", "12000"]],
        );
        let (table, _) = run(&data);
        let r = &table.records[0];
        assert_eq!(r.raw_specs, "31/10.50/R15");
        assert_eq!(r.correct_specs, "31/10.5/15");
        assert_eq!(r.sku_name, "BFGOODRICH 31/10.50/R15 MUD-TERRAIN T/A KM3");
    }

    #[test]
    fn ply() {
        assert_eq!(ply_rating("7.50R16 8PR"), Some(8));
        assert_eq!(ply_rating("265/70R17"), None);
    }
}
