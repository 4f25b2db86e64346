//! Search report over a flattened book snapshot
//!
//! The snapshot is the JSON array written from [`BTree::flatten`]. Search
//! queries come from `SEARCH;{"name": ...}` lines of a log, and each one is
//! answered by a case-insensitive match on the book name.
//!
//! [`BTree::flatten`]: crate::btree::BTree::flatten

use std::io::{self, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::book::Book;
use crate::oplog::{self, LogRecord, OpLogError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Log error: {0}")]
    Log(#[from] OpLogError),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// A lookup by book name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
}

/// Collect the SEARCH queries of a log, skipping lines whose payload is invalid
pub fn queries_from_records(records: &[LogRecord]) -> Vec<SearchQuery> {
    records
        .iter()
        .filter(|record| record.command == "SEARCH")
        .filter_map(|record| match record.parse_payload() {
            Ok(query) => Some(query),
            Err(e) => {
                tracing::warn!("Skipping search line: {}", e);
                None
            }
        })
        .collect()
}

/// Read the SEARCH queries of a log
pub fn read_queries<R: Read>(input: R) -> ReportResult<Vec<SearchQuery>> {
    let records = oplog::read_records(input)?;
    Ok(queries_from_records(&records))
}

/// Write the snapshot of a tree
pub fn save_snapshot(path: &Path, books: &[Book]) -> ReportResult<()> {
    oplog::save_json(path, books)?;
    Ok(())
}

/// Load a snapshot written by [`save_snapshot`]
pub fn load_snapshot(path: &Path) -> ReportResult<Vec<Book>> {
    Ok(oplog::load_json(path)?)
}

/// First book whose name matches `name`, ignoring case
pub fn find_by_name<'a>(books: &'a [Book], name: &str) -> Option<&'a Book> {
    let wanted = name.to_lowercase();
    books
        .iter()
        .find(|book| book.name.as_ref().is_some_and(|n| n.to_lowercase() == wanted))
}

/// Print the answer to every query
///
/// Returns the number of queries that found a book.
pub fn write_report<W: Write>(
    out: &mut W,
    books: &[Book],
    queries: &[SearchQuery],
) -> io::Result<usize> {
    let mut hits = 0;

    for query in queries {
        match find_by_name(books, &query.name) {
            Some(book) => {
                hits += 1;
                writeln!(out, "ISBN: {}", book.isbn)?;
                writeln!(out, "Name: {}", book.name_or_default())?;
                writeln!(out, "Author: {}", book.author_or_default())?;
                writeln!(out, "Price: {}", book.price.unwrap_or_default())?;
                writeln!(out, "Quantity: {}", book.quantity.unwrap_or_default())?;
            }
            None => writeln!(out, "No book found with name: {}", query.name)?,
        }
        writeln!(out)?;
    }

    Ok(hits)
}
