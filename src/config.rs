//! Command-line configuration for a run

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::btree::{DEFAULT_DEGREE, is_valid_degree};

const DEFAULT_DIR: &str = ".";
const DEFAULT_OPERATIONS_CSV: &str = "lab01_books.csv";
const DEFAULT_OPERATIONS_JSON: &str = "lab01_books.json";
const DEFAULT_SNAPSHOT_JSON: &str = "result_lab01_books.json";
const DEFAULT_SEARCH_CSV: &str = "lab01_search.csv";
const DEFAULT_SEARCH_JSON: &str = "lab01_search.json";

/// Build a book index from an operation log and answer name searches
#[derive(Debug, Clone, Parser)]
#[command(name = "bookdb", version, about)]
pub struct RunConfig {
    /// Directory that relative file paths are resolved against
    #[arg(long, default_value = DEFAULT_DIR)]
    pub dir: PathBuf,

    /// Operation log (`COMMAND;{json}` lines)
    #[arg(long, default_value = DEFAULT_OPERATIONS_CSV)]
    pub operations_csv: PathBuf,

    /// Where the parsed operation list is written as JSON
    #[arg(long, default_value = DEFAULT_OPERATIONS_JSON)]
    pub operations_json: PathBuf,

    /// Where the final contents of the index are written as JSON
    #[arg(long, default_value = DEFAULT_SNAPSHOT_JSON)]
    pub snapshot_json: PathBuf,

    /// Search log (`SEARCH;{json}` lines)
    #[arg(long, default_value = DEFAULT_SEARCH_CSV)]
    pub search_csv: PathBuf,

    /// Where the parsed search list is written as JSON
    #[arg(long, default_value = DEFAULT_SEARCH_JSON)]
    pub search_json: PathBuf,

    /// Minimum degree of the B-tree
    #[arg(long, default_value_t = DEFAULT_DEGREE, value_parser = parse_degree)]
    pub degree: usize,

    /// Wait for Enter before printing the search report
    #[arg(long)]
    pub pause: bool,
}

impl RunConfig {
    /// Configuration with every file inside `dir` under its default name
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Resolve a configured path against `dir`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    pub fn operations_csv_path(&self) -> PathBuf {
        self.resolve(&self.operations_csv)
    }

    pub fn operations_json_path(&self) -> PathBuf {
        self.resolve(&self.operations_json)
    }

    pub fn snapshot_json_path(&self) -> PathBuf {
        self.resolve(&self.snapshot_json)
    }

    pub fn search_csv_path(&self) -> PathBuf {
        self.resolve(&self.search_csv)
    }

    pub fn search_json_path(&self) -> PathBuf {
        self.resolve(&self.search_json)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_DIR),
            operations_csv: PathBuf::from(DEFAULT_OPERATIONS_CSV),
            operations_json: PathBuf::from(DEFAULT_OPERATIONS_JSON),
            snapshot_json: PathBuf::from(DEFAULT_SNAPSHOT_JSON),
            search_csv: PathBuf::from(DEFAULT_SEARCH_CSV),
            search_json: PathBuf::from(DEFAULT_SEARCH_JSON),
            degree: DEFAULT_DEGREE,
            pause: false,
        }
    }
}

fn parse_degree(value: &str) -> Result<usize, String> {
    let degree: usize = value
        .parse()
        .map_err(|_| format!("`{}` is not a number", value))?;
    if !is_valid_degree(degree) {
        return Err(format!(
            "degree must be >= 2 and at most {}, got {}",
            usize::MAX / 2,
            degree
        ));
    }
    Ok(degree)
}
