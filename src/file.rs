// src/file.rs

use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::config::options::ExportOptions;
use crate::csv::{rows_to_string, write_row};
use crate::error::{CatalogError, Result};
use crate::reconcile::Catalog;
use crate::store::DataSet;

/// Write the dated catalog per `export` (format, directory, header policy).
/// Returns the final path written to. An existing file for the same date is replaced.
pub fn write_catalog(catalog: &Catalog, export: &ExportOptions) -> Result<PathBuf> {
    let path = export.out_path(catalog.date());
    ensure_parent(&path)?;

    let contents = match export.format.delimiter() {
        Some(sep) => {
            let data = catalog.to_dataset();
            let headers = data.headers.as_deref().filter(|_| export.include_headers);
            rows_to_string(headers, &data.rows, sep)
        }
        None => catalog.to_json()?,
    };

    fs::write(&path, contents).map_err(|e| CatalogError::io(&path, e))?;
    logf!("Wrote {} rows to {}", catalog.len(), path.display());
    Ok(path)
}

/// Write any dataset as a delimited file, header included.
pub fn write_dataset(path: &Path, data: &DataSet, sep: char) -> Result<()> {
    write_rows_start(path, data.headers.as_deref(), sep)?;
    append_rows(path, &data.rows, sep)
}

/// Append this run's rows to the CSV history, writing the header only when
/// the file is new or empty.
pub fn append_history(path: &Path, catalog: &Catalog) -> Result<()> {
    let fresh = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let data = catalog.to_dataset();
    if fresh {
        write_rows_start(path, data.headers.as_deref(), ',')?;
    }
    append_rows(path, &data.rows, ',')?;
    logd!("Appended {} rows to history {}", data.len(), path.display());
    Ok(())
}

/// Ensure parent dir exists; create/truncate file; optionally write header.
pub fn write_rows_start(path: &Path, headers: Option<&[String]>, sep: char) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| CatalogError::io(path, e))?;
    let mut out = BufWriter::new(file);
    if let Some(h) = headers {
        write_row(&mut out, h, sep).map_err(|e| CatalogError::io(path, e))?;
    }
    out.flush().map_err(|e| CatalogError::io(path, e))?;
    Ok(())
}

/// Append multiple rows to an existing CSV/TSV file (must be created already).
pub fn append_rows(path: &Path, rows: &[Vec<String>], sep: char) -> Result<()> {
    let file = OpenOptions::new().append(true).open(path).map_err(|e| CatalogError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for row in rows {
        write_row(&mut out, row, sep).map_err(|e| CatalogError::io(path, e))?;
    }
    out.flush().map_err(|e| CatalogError::io(path, e))?;
    Ok(())
}

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        let err = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path exists but is not a directory");
        return Err(CatalogError::io(dir, err));
    }
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory(parent),
        _ => Ok(()),
    }
}
