// src/progress.rs
use crate::record::SourceReport;

/// Status hooks for a catalog run. Frontends implement what they want to show.
pub trait Progress {
    /// Called once with the number of sources about to be read.
    fn begin(&mut self, _sources: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One source finished normalizing (or was absent).
    fn source_done(&mut self, _report: &SourceReport) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
