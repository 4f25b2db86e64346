//! End-to-end run over the files named by a [`RunConfig`]
//!
//! A run has two stages:
//! 1. [`build_snapshot`]: operation log → operation JSON → B-tree →
//!    snapshot JSON, plus search log → search JSON
//! 2. [`run_search_report`]: snapshot JSON + search JSON → report
//!
//! The stages only talk through files, so the report can be produced from a
//! snapshot left by an earlier run.

use std::io::Write;

use thiserror::Error;

use crate::btree::{BTree, BTreeError};
use crate::config::RunConfig;
use crate::oplog::{self, OpLogError, Operation, OperationResult, Outcome};
use crate::report::{self, ReportError, SearchQuery};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Log error: {0}")]
    Log(#[from] OpLogError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("B-tree error: {0}")]
    BTree(#[from] BTreeError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Counts from the snapshot-building stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub operations: usize,
    pub applied: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Books left in the index
    pub books: usize,
    pub queries: usize,
}

impl BuildSummary {
    fn tally(results: &[OperationResult]) -> Self {
        let mut summary = Self {
            operations: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.outcome {
                Outcome::Applied => summary.applied += 1,
                Outcome::Unchanged => summary.unchanged += 1,
                Outcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Apply the operation log and write the snapshot and search list
pub fn build_snapshot(config: &RunConfig) -> PipelineResult<BuildSummary> {
    let records = oplog::read_records_from_path(&config.operations_csv_path())?;
    let operations = oplog::operations_from_records(&records);

    let operations_json = config.operations_json_path();
    oplog::save_json(&operations_json, &operations)?;
    tracing::info!(
        "Wrote {} operations to {}",
        operations.len(),
        operations_json.display()
    );

    let operations: Vec<Operation> = oplog::load_json(&operations_json)?;
    let mut tree = BTree::new(config.degree)?;
    let results = oplog::execute(&mut tree, &operations);
    let mut summary = BuildSummary::tally(&results);

    let books = tree.flatten();
    summary.books = books.len();
    let snapshot_json = config.snapshot_json_path();
    report::save_snapshot(&snapshot_json, &books)?;
    tracing::info!(
        "Wrote {} books to {} ({} operations applied, {} unchanged, {} failed)",
        summary.books,
        snapshot_json.display(),
        summary.applied,
        summary.unchanged,
        summary.failed
    );

    let search_records = oplog::read_records_from_path(&config.search_csv_path())?;
    let queries = report::queries_from_records(&search_records);
    summary.queries = queries.len();
    let search_json = config.search_json_path();
    oplog::save_json(&search_json, &queries)?;
    tracing::info!(
        "Wrote {} searches to {}",
        queries.len(),
        search_json.display()
    );

    Ok(summary)
}

/// Answer the saved searches against the saved snapshot
///
/// Returns the number of searches that found a book.
pub fn run_search_report<W: Write>(config: &RunConfig, out: &mut W) -> PipelineResult<usize> {
    let books = report::load_snapshot(&config.snapshot_json_path())?;
    let queries: Vec<SearchQuery> = oplog::load_json(&config.search_json_path())?;

    let hits = report::write_report(out, &books, &queries).map_err(ReportError::from)?;
    tracing::debug!("{} of {} searches found a book", hits, queries.len());

    Ok(hits)
}
