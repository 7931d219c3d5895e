// src/sources/reference.rs
//! The authoritative inventory export. Its names seed the vocabulary, so they
//! are only cleaned, never resolved.

use crate::core::sanitize::{clean_price, is_blank};
use crate::error::Result;
use crate::normalize::{clean_name, dimension::from_parts};
use crate::record::{Extras, Skip, Source, SourceReport, SourceTable};
use crate::store::DataSet;

use super::{Columns, Draft, cell, collect_rows, load_normalized, opt_cell};

const SOURCE: Source = Source::Gulong;

pub fn normalize(data: &DataSet) -> Result<(SourceTable, SourceReport)> {
    let Some(cols) = Columns::of(SOURCE, data)? else {
        return Ok((SourceTable::empty(SOURCE), SourceReport::absent(SOURCE)));
    };
    if cols.is_normalized() {
        return Ok(load_normalized(SOURCE, &cols, &data.rows));
    }

    let pattern = cols.require("pattern")?;
    let make = cols.require("make")?;
    let width = cols.require("section_width")?;
    let ratio = cols.require("aspect_ratio")?;
    let rim = cols.require("rim_size")?;
    let promo = cols.require("promo")?;
    let model = cols.get("model");
    let srp = cols.get("srp");
    let sale_tag = cols.get("sale_tag");
    let activity = cols.get("activity");
    let load = cols.get("load_rating");
    let speed = cols.get("speed_rating");

    Ok(collect_rows(SOURCE, &data.rows, |row| {
        if opt_cell(row, activity).is_some_and(|flag| !is_flag(flag, 1)) {
            return Err(Skip::Filtered(s!("inactive listing")));
        }

        let name = clean_name(cell(row, pattern));
        if name == "-" {
            return Err(Skip::MissingKey("name"));
        }

        let dims = from_parts(cell(row, width), cell(row, ratio), cell(row, rim)).map_err(Skip::Size)?;

        // Off-sale listings carry their list price in `srp`.
        let on_sale = opt_cell(row, sale_tag).is_none_or(|tag| !is_flag(tag, 0));
        let price = match opt_cell(row, srp) {
            Some(list) if !on_sale => clean_price(list),
            _ => clean_price(cell(row, promo)),
        };

        let draft = Draft {
            brand: clean_name(cell(row, make)),
            name,
            dims,
            price,
            load: opt_cell(row, load),
            speed: opt_cell(row, speed),
        };
        Ok(draft.into_record(opt_cell(row, model), Extras::default()))
    }))
}

/// `"1"`, `"1.0"` and `" 1 "` all read as 1.
fn is_flag(text: &str, want: i64) -> bool {
    !is_blank(text) && text.trim().parse::<f64>().is_ok_and(|v| v == want as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    const HEADERS: &[&str] = &[
        "model", "pattern", "make", "section_width", "aspect_ratio", "rim_size", "promo", "srp", "sale_tag",
        "activity", "load_rating", "speed_rating",
    ];

    fn capture(rows: &[&[&str]]) -> DataSet {
        DataSet::new(
            HEADERS.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        )
    }

    #[test]
    fn raw_rows_normalize() {
        let data = capture(&[
            &["", "All-Terrain T/A KO2", "BFGoodrich", "265", "70", "18", "8500", "9000", "1", "1", "116", "S"],
            &["", "Primacy 4", "Michelin", "205", "55", "R16", "6000", "6500", "0", "1", "", ""],
        ]);
        let (table, report) = normalize(&data).unwrap();
        assert_eq!(report.kept, 2);

        let ko2 = &table.records[0];
        assert_eq!(ko2.name, "ALL-TERRAIN T/A KO2");
        assert_eq!(ko2.brand, "BFGOODRICH");
        assert_eq!(ko2.correct_specs, "265/70/18");
        assert_eq!(ko2.raw_specs, "265/70/R18");
        assert_eq!(ko2.price, Some(8500.0));
        assert_eq!(ko2.sku_name, "BFGOODRICH 265/70/R18 ALL-TERRAIN T/A KO2 116S");

        // Not on sale: list price.
        assert_eq!(table.records[1].price, Some(6500.0));
    }

    #[test]
    fn inactive_and_placeholder_rows_are_skipped() {
        let data = capture(&[
            &["", "KO2", "BFGoodrich", "265", "70", "18", "8500", "", "1", "0", "", ""],
            &["", "-", "BFGoodrich", "265", "70", "18", "8500", "", "1", "1", "", ""],
            &["", "KO2", "BFGoodrich", "", "70", "18", "8500", "", "1", "1", "", ""],
        ]);
        let (table, report) = normalize(&data).unwrap();
        assert!(table.is_empty());
        assert_eq!((report.filtered, report.missing_key, report.bad_size), (1, 1, 1));
    }

    #[test]
    fn missing_identity_column_is_fatal() {
        let data = DataSet::new(vec![s!("pattern"), s!("promo")], Vec::new());
        let err = normalize(&data).unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn { table: Source::Gulong, ref column } if column == "make"));
    }

    #[test]
    fn flags() {
        assert!(is_flag("1.0", 1));
        assert!(is_flag(" 0 ", 0));
        assert!(!is_flag("yes", 1));
    }
}
