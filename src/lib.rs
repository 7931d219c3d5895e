// src/lib.rs
//! Tire listing normalization and cross-source price reconciliation.

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod csv;
pub mod error;
pub mod file;
pub mod history;
pub mod normalize;
pub mod progress;
pub mod reconcile;
pub mod record;
pub mod runner;
pub mod sources;
pub mod store;

pub use error::{CatalogError, DimensionError, Result};
