// src/store.rs
use std::fs;
use std::path::Path;

use crate::csv::{parse_rows, split_header};
use crate::error::{CatalogError, Result};

/// A raw capture: optional header row plus data rows, all cells as text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataSet {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl DataSet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers: Some(headers), rows }
    }

    /// First line is the header row.
    pub fn from_text(text: &str, sep: char) -> Self {
        let (headers, rows) = split_header(parse_rows(text, sep));
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// `.tsv` files are tab separated, everything else comma separated.
pub fn separator_for(path: &Path) -> char {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => '\t',
        _ => ',',
    }
}

pub fn load_dataset(path: &Path) -> Result<DataSet> {
    let text = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    let data = DataSet::from_text(&text, separator_for(path));
    logd!("Loaded {} rows from {}", data.len(), path.display());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_is_split_off() {
        let d = DataSet::from_text("name,price\nKO2,8500\n", ',');
        assert_eq!(d.headers, Some(vec![s!("name"), s!("price")]));
        assert_eq!(d.rows, vec![vec![s!("KO2"), s!("8500")]]);
    }

    #[test]
    fn empty_text_has_no_headers() {
        let d = DataSet::from_text("", ',');
        assert!(d.headers.is_none());
        assert!(d.is_empty());
    }

    #[test]
    fn tsv_by_extension() {
        assert_eq!(separator_for(Path::new("a/tiremanila.TSV")), '\t');
        assert_eq!(separator_for(Path::new("a/gulong.csv")), ',');
        assert_eq!(separator_for(Path::new("gulong")), ',');
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_dataset(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
