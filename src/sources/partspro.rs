// src/sources/partspro.rs
//! Marketplace listings: a brand line plus a free-text title such as
//! `"BFGOODRICH ALL-TERRAIN T/A KO2 LT265/70R17 121/118S"`.

use crate::core::sanitize::{clean_price, normalize_ws};
use crate::error::{DimensionError, Result};
use crate::normalize::{LoadSpeed, clean_name, extract_load_speed, extract_model, locate_dimensions};
use crate::record::{Extras, Skip, Source, SourceReport, SourceTable};
use crate::store::DataSet;

use super::{Columns, Draft, NormalizeContext, cell, collect_rows, load_normalized};

const SOURCE: Source = Source::PartsPro;

pub fn normalize(data: &DataSet, ctx: &NormalizeContext<'_>) -> Result<(SourceTable, SourceReport)> {
    let Some(cols) = Columns::of(SOURCE, data)? else {
        return Ok((SourceTable::empty(SOURCE), SourceReport::absent(SOURCE)));
    };
    if cols.is_normalized() {
        return Ok(load_normalized(SOURCE, &cols, &data.rows));
    }

    let brand_col = cols.require("brand")?;
    let title_col = cols.require("title")?;
    let price_col = cols.require("price")?;

    let names = ctx.names();
    let brands = ctx.brands();
    Ok(collect_rows(SOURCE, &data.rows, |row| {
        let raw_brand = cell(row, brand_col);
        if ctx.settings.is_excluded_brand(raw_brand) {
            return Err(Skip::Filtered(format!("excluded brand {raw_brand}")));
        }
        let brand = brands.resolve_name(raw_brand);

        let title = clean_name(cell(row, title_col));
        let (span, dims) = locate_dimensions(&title)
            .ok_or_else(|| Skip::Size(DimensionError::NoDiameterMarker(title.clone())))?;
        let ls = extract_load_speed(&title);

        let name = match extract_model(&title, &ctx.vocab.names) {
            Some(known) => known.to_string(),
            None => names.resolve_name(&fallback_model(&title, span, &brand, ls.as_ref())),
        };

        let draft = Draft {
            brand,
            name,
            dims,
            price: clean_price(cell(row, price_col)),
            load: ls.as_ref().map(|l| l.load.as_str()),
            speed: ls.as_ref().map(|l| l.speed.as_str()),
        };
        Ok(draft.into_record(None, Extras::default()))
    }))
}

/// Title minus brand, size and load/speed. Text ahead of the size wins; a title
/// that starts with its size uses what follows.
fn fallback_model(title: &str, size: std::ops::Range<usize>, brand: &str, ls: Option<&LoadSpeed>) -> String {
    let before = title[..size.start].trim();
    let mut rest = if before.is_empty() { title[size.end..].to_string() } else { before.to_string() };

    if let Some(ls) = ls {
        rest = rest.replacen(&join!(&ls.load, &ls.speed), " ", 1);
    }
    let rest = normalize_ws(&rest);
    match rest.strip_prefix(brand) {
        Some(tail) if tail.is_empty() || tail.starts_with(' ') => tail.trim().to_string(),
        _ => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Settings;
    use crate::normalize::{ReferenceVocabulary, RewriteRules, TokenSetRatio, Vocabulary};

    fn run(rows: &[&[&str]]) -> (SourceTable, SourceReport) {
        let data = DataSet::new(
            ["brand", "title", "price"].iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        );
        let vocab = ReferenceVocabulary {
            names: Vocabulary::from_names(["KO2", "ALL-TERRAIN T/A KO2", "PRIMACY 4"]),
            brands: Vocabulary::from_names(["BFGOODRICH", "MICHELIN"]),
        };
        let rules = RewriteRules::default();
        let settings = Settings::default();
        let ctx = NormalizeContext { vocab: &vocab, scorer: &TokenSetRatio, rules: &rules, settings: &settings };
        normalize(&data, &ctx).unwrap()
    }

    #[test]
    fn model_from_vocabulary() {
        let (table, _) = run(&[&["BFGoodrich", "BFGoodrich All-Terrain T/A KO2 LT265/70R17 121/118S", "₱ 9,100.00"]]);
        let r = &table.records[0];
        assert_eq!(r.brand, "BFGOODRICH");
        assert_eq!(r.name, "ALL-TERRAIN T/A KO2");
        assert_eq!(r.correct_specs, "265/70/17");
        assert_eq!(r.sku_name, "BFGOODRICH 265/70/R17 ALL-TERRAIN T/A KO2 121/118S");
        assert_eq!(r.price, Some(9100.0));
    }

    #[test]
    fn unknown_model_falls_back_to_title() {
        let (table, _) = run(&[&["Michelin", "MICHELIN PILOT SPORT 5 225/45R17 94Y", "₱ 11,000"]]);
        let r = &table.records[0];
        assert_eq!(r.brand, "MICHELIN");
        assert_eq!(r.name, "PILOT SPORT 5");
        assert_eq!(r.extras.speed_index.as_deref(), Some("Y"));
    }

    #[test]
    fn store_brand_is_excluded() {
        let (table, report) = run(&[&["PARTSPRO.PH", "TIRE SEALANT 500ML", "₱ 350"]]);
        assert!(table.is_empty());
        assert_eq!(report.filtered, 1);
    }

    #[test]
    fn fallback_after_size() {
        let title = "265/70R17 121/118S BFGOODRICH MUD KING";
        let (span, _) = locate_dimensions(title).unwrap();
        let ls = extract_load_speed(title);
        assert_eq!(fallback_model(title, span, "BFGOODRICH", ls.as_ref()), "MUD KING");
    }
}
