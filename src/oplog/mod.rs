//! Operation logs and their JSON interchange form
//!
//! An operation log is a semicolon-delimited text file where every line is a
//! command followed by a JSON payload:
//!
//! ```text
//! INSERT;{"isbn":"978-1","name":"Dune","author":"Herbert","price":"9.99","quantity":"3"}
//! PATCH;{"isbn":"978-1","quantity":"5"}
//! DELETE;{"isbn":"978-1"}
//! ```
//!
//! The log is turned into a list of typed [`Operation`]s, which is written to
//! and read back from a JSON array before being executed against the tree.

mod error;
mod executor;
mod reader;

pub use error::{OpLogError, OpLogResult};
pub use executor::{OperationResult, Outcome, execute};
pub use reader::{LOG_DELIMITER, LogRecord, read_records, read_records_from_path};

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::book::{Book, BookPatch, Isbn};

/// A single mutation of the book index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Command", rename_all = "UPPERCASE")]
pub enum Operation {
    Insert(Book),
    /// Only the ISBN is used; name and author are kept as logged
    Delete {
        #[serde(rename = "ISBN", alias = "isbn", alias = "Isbn")]
        isbn: Isbn,

        #[serde(
            rename = "Name",
            alias = "name",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        name: Option<String>,

        #[serde(
            rename = "Author",
            alias = "author",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        author: Option<String>,
    },
    Patch(BookPatch),
}

/// Payload of a DELETE line; price and quantity are ignored
#[derive(Deserialize)]
struct KeyPayload {
    #[serde(
        rename = "ISBN",
        alias = "isbn",
        alias = "Isbn",
        deserialize_with = "crate::book::lenient_key"
    )]
    isbn: Isbn,

    #[serde(alias = "Name", default)]
    name: Option<String>,

    #[serde(alias = "Author", default)]
    author: Option<String>,
}

impl Operation {
    /// Command name as written in logs
    pub fn command(&self) -> &'static str {
        match self {
            Operation::Insert(_) => "INSERT",
            Operation::Delete { .. } => "DELETE",
            Operation::Patch(_) => "PATCH",
        }
    }

    /// ISBN the operation targets
    pub fn isbn(&self) -> &str {
        match self {
            Operation::Insert(book) => &book.isbn,
            Operation::Delete { isbn, .. } => isbn,
            Operation::Patch(patch) => &patch.isbn,
        }
    }

    /// Build an operation from a log record
    ///
    /// Returns `Ok(None)` for commands that are not mutations (e.g. SEARCH).
    pub fn from_record(record: &LogRecord) -> OpLogResult<Option<Self>> {
        let operation = match record.command.as_str() {
            "INSERT" => Operation::Insert(record.parse_payload()?),
            "DELETE" => {
                let payload: KeyPayload = record.parse_payload()?;
                Operation::Delete {
                    isbn: payload.isbn,
                    name: payload.name,
                    author: payload.author,
                }
            }
            "PATCH" => Operation::Patch(record.parse_payload()?),
            _ => return Ok(None),
        };
        Ok(Some(operation))
    }
}

/// Collect the operations of a log, skipping lines whose payload is invalid
pub fn operations_from_records(records: &[LogRecord]) -> Vec<Operation> {
    records
        .iter()
        .filter_map(|record| match Operation::from_record(record) {
            Ok(operation) => operation,
            Err(e) => {
                tracing::warn!("Skipping log line: {}", e);
                None
            }
        })
        .collect()
}

/// Read the operations of a log
pub fn read_operations<R: Read>(input: R) -> OpLogResult<Vec<Operation>> {
    let records = read_records(input)?;
    Ok(operations_from_records(&records))
}

/// Write a value as pretty-printed JSON
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> OpLogResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

/// Read a JSON document
pub fn load_json<T: DeserializeOwned>(path: &Path) -> OpLogResult<T> {
    let content = fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;
    Ok(value)
}
