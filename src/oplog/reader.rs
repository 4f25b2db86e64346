use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use super::error::{OpLogError, OpLogResult};

/// Field delimiter of the operation log
pub const LOG_DELIMITER: u8 = b';';

/// One `COMMAND;payload` line of an operation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// 1-based line number in the source
    pub line: u64,
    /// Command name, trimmed and upper-cased
    pub command: String,
    /// Raw JSON payload
    pub payload: String,
}

impl LogRecord {
    /// Deserialize the JSON payload, tagging failures with the line number
    pub fn parse_payload<T: serde::de::DeserializeOwned>(&self) -> OpLogResult<T> {
        serde_json::from_str(&self.payload).map_err(|source| OpLogError::Payload {
            line: self.line,
            command: self.command.clone(),
            source,
        })
    }
}

/// Read every non-empty record of an operation log
///
/// Quotes are not interpreted, since payloads are JSON with literal `"`.
/// Fields after the command are re-joined with the delimiter so that a `;`
/// inside a payload survives. Lines that are not valid UTF-8 are skipped.
pub fn read_records<R: Read>(input: R) -> OpLogResult<Vec<LogRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(LOG_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(input);

    let mut records = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Skipping unreadable log line: {}", e);
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let mut fields = record.iter();
        let command = match fields.next() {
            Some(field) => field.trim().trim_start_matches('\u{feff}').to_ascii_uppercase(),
            None => continue,
        };
        if command.is_empty() {
            continue;
        }
        let payload = fields.collect::<Vec<_>>().join(";");

        records.push(LogRecord {
            line,
            command,
            payload,
        });
    }

    Ok(records)
}

/// Read every record of the operation log at `path`
pub fn read_records_from_path(path: &Path) -> OpLogResult<Vec<LogRecord>> {
    let file = std::fs::File::open(path)?;
    read_records(file)
}
