// src/sources/tiremanila.rs
//! Listings whose title leads with the size: `"265/70R17 BFG ALL-TERRAIN T/A KO2"`.
//! Brand and model come from the splitter; `info` is a multi-line blob of
//! terrain, stock status and manufacturing year.

use crate::core::sanitize::{clean_price, clean_quantity, clean_year};
use crate::error::Result;
use crate::normalize::{clean_name, extract_load_speed, parse_dimensions, split_brand_model};
use crate::record::{Extras, Skip, Source, SourceReport, SourceTable};
use crate::store::DataSet;

use super::{Columns, Draft, NormalizeContext, cell, collect_rows, load_normalized, opt_cell};

const SOURCE: Source = Source::TireManila;

pub fn normalize(data: &DataSet, ctx: &NormalizeContext<'_>) -> Result<(SourceTable, SourceReport)> {
    let Some(cols) = Columns::of(SOURCE, data)? else {
        return Ok((SourceTable::empty(SOURCE), SourceReport::absent(SOURCE)));
    };
    if cols.is_normalized() {
        return Ok(load_normalized(SOURCE, &cols, &data.rows));
    }

    let title = cols.require("name")?;
    let price_col = cols.require("price")?;
    let info = cols.get("info");
    let qty = cols.get("qty");

    let names = ctx.names();
    Ok(collect_rows(SOURCE, &data.rows, |row| {
        let text = cell(row, title);
        let Some(price) = opt_cell(row, Some(price_col)).and_then(clean_price) else {
            return Err(Skip::Filtered(s!("no price")));
        };

        let dims = parse_dimensions(text).map_err(Skip::Size)?;
        let split = split_brand_model(text, ctx.rules);
        if split.is_ambiguous() {
            logd!("{SOURCE}: no model in {text:?}");
        }
        let ls = extract_load_speed(text);

        let draft = Draft {
            brand: clean_name(&split.brand),
            name: if split.model.is_empty() { s!() } else { names.resolve_name(&split.model) },
            dims,
            price: Some(price),
            load: ls.as_ref().map(|l| l.load.as_str()),
            speed: ls.as_ref().map(|l| l.speed.as_str()),
        };
        let extras = Extras {
            qty: opt_cell(row, qty).and_then(clean_quantity),
            year: opt_cell(row, info).and_then(year_from_info),
            ..Extras::default()
        };
        Ok(draft.into_record(None, extras))
    }))
}

/// The one all-digit line of the info blob.
pub fn year_from_info(info: &str) -> Option<i32> {
    info.lines().find_map(clean_year)
}
