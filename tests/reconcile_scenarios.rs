// tests/reconcile_scenarios.rs
use chrono::NaiveDate;

use tire_catalog::reconcile::{Bucket, Reconciler};
use tire_catalog::record::{Extras, ProductRecord, Source, SourceTable};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn record(brand: &str, name: &str, raw: &str, matched: &str, price: Option<f64>) -> ProductRecord {
    ProductRecord {
        sku_name: format!("{brand} {raw} {name}"),
        brand: brand.to_string(),
        name: name.to_string(),
        price,
        raw_specs: raw.to_string(),
        correct_specs: matched.to_string(),
        extras: Extras::default(),
    }
}

fn ko2(price: Option<f64>) -> ProductRecord {
    record("BFGOODRICH", "ALL-TERRAIN T/A KO2", "265/70/R18", "265/70/18", price)
}

#[test]
fn reference_and_competitor_share_one_row() {
    let reference = SourceTable::new(Source::Gulong, vec![ko2(Some(8500.0))]);
    let gg = SourceTable::new(Source::GoGulong, vec![ko2(Some(8700.0))]);

    let catalog = Reconciler::default().reconcile(&reference, &[&gg], date());
    assert_eq!(catalog.len(), 1);

    let row = &catalog.rows()[0];
    assert_eq!(row.bucket, Bucket::ReferenceWithCompetitor);
    assert_eq!(row.price_gulong, Some(8500.0));
    assert_eq!(row.price_gogulong, Some(8700.0));
    assert_eq!(row.price_tiremanila, None);
    assert_eq!(row.sku_name.as_deref(), Some("BFGOODRICH 265/70/R18 ALL-TERRAIN T/A KO2"));
    assert_eq!(row.correct_specs, "265/70/18");
}

#[test]
fn unmatched_competitor_listing_survives() {
    let reference = SourceTable::new(Source::Gulong, vec![ko2(Some(8500.0))]);
    let mut km3 = record("BFGOODRICH", "MUD-TERRAIN T/A KM3", "285/75/R16", "285/75/16", Some(12500.0));
    km3.extras.qty = Some(4);
    km3.extras.year = Some(2023);
    let tm = SourceTable::new(Source::TireManila, vec![km3]);

    let catalog = Reconciler::default().reconcile(&reference, &[&tm], date());
    assert_eq!(catalog.len(), 2);

    let row = catalog.rows().iter().find(|r| r.bucket == Bucket::TireManilaOnly).unwrap();
    assert_eq!(row.price_gulong, None);
    assert_eq!(row.price_tiremanila, Some(12500.0));
    assert_eq!(row.qty_tiremanila, Some(4));
    assert_eq!(row.year, Some(2023));
    assert_eq!(row.raw_specs.as_deref(), Some("285/75/R16"));
}

#[test]
fn competitor_only_display_follows_precedence() {
    let reference = SourceTable::new(Source::Gulong, Vec::new());
    let mut gg_rec = ko2(Some(8700.0));
    gg_rec.sku_name = "GG CODE".to_string();
    let mut tm_rec = ko2(Some(8650.0));
    tm_rec.sku_name = "TM CODE".to_string();
    let gg = SourceTable::new(Source::GoGulong, vec![gg_rec]);
    let tm = SourceTable::new(Source::TireManila, vec![tm_rec]);

    let catalog = Reconciler::default().reconcile(&reference, &[&gg, &tm], date());
    assert_eq!(catalog.len(), 1);
    let row = &catalog.rows()[0];
    assert_eq!(row.bucket, Bucket::TireManilaOnly);
    assert_eq!(row.sku_name.as_deref(), Some("TM CODE"));
    assert_eq!(row.price_gogulong, Some(8700.0));
    assert_eq!(row.price_tiremanila, Some(8650.0));

    let catalog = Reconciler::new(vec![Source::GoGulong]).reconcile(&reference, &[&gg, &tm], date());
    assert_eq!(catalog.rows()[0].sku_name.as_deref(), Some("GG CODE"));
}

#[test]
fn unpriced_reference_joins_priced_competitor() {
    let reference = SourceTable::new(Source::Gulong, vec![ko2(None)]);
    let pp = SourceTable::new(Source::PartsPro, vec![ko2(Some(9100.0))]);

    let catalog = Reconciler::default().reconcile(&reference, &[&pp], date());
    let row = &catalog.rows()[0];
    assert_eq!(row.bucket, Bucket::ReferenceWithCompetitor);
    assert_eq!(row.price_gulong, None);
    assert_eq!(row.price_partspro, Some(9100.0));
}

#[test]
fn blank_and_missing_display_values_dedup_together() {
    let mut a = ko2(Some(8500.0));
    a.sku_name = String::new();
    let mut b = ko2(Some(8500.0));
    b.sku_name = "   ".to_string();
    let reference = SourceTable::new(Source::Gulong, vec![a, b]);

    let catalog = Reconciler::default().reconcile(&reference, &[], date());
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.rows()[0].sku_name, None);
}

#[test]
fn absent_competitor_leaves_its_price_null() {
    let reference = SourceTable::new(Source::Gulong, vec![ko2(Some(8500.0))]);
    let gg = SourceTable::new(Source::GoGulong, vec![ko2(Some(8700.0))]);
    let pp = SourceTable::empty(Source::PartsPro);

    let catalog = Reconciler::default().reconcile(&reference, &[&gg, &pp], date());
    assert!(catalog.rows().iter().all(|r| r.price_partspro.is_none()));

    let data = catalog.to_dataset();
    let col = data.headers.as_ref().unwrap().iter().position(|h| h == "price_partspro").unwrap();
    assert!(data.rows.iter().all(|r| r[col].is_empty()));
}

#[test]
fn same_inputs_same_catalog() {
    let reference = SourceTable::new(
        Source::Gulong,
        vec![
            ko2(Some(8500.0)),
            record("MICHELIN", "PRIMACY 4", "205/55/R16", "205/55/16", Some(6000.0)),
            record("BRIDGESTONE", "DUELER", "", "7.5/R/16", Some(5000.0)),
        ],
    );
    let tm = SourceTable::new(Source::TireManila, vec![ko2(Some(8650.0)), ko2(Some(8600.0))]);

    let first = Reconciler::default().reconcile(&reference, &[&tm], date());
    let second = Reconciler::default().reconcile(&reference, &[&tm], date());
    assert_eq!(first.rows(), second.rows());

    // Two TireManila rows for the one key: a cross product of two.
    assert_eq!(first.bucket_counts()[&Bucket::ReferenceWithCompetitor], 2);
    // Blank raw_specs sorts last.
    assert_eq!(first.rows().last().unwrap().raw_specs, None);
}
