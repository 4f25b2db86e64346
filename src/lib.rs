pub mod book;
pub mod btree;
pub mod config;
pub mod oplog;
pub mod pipeline;
pub mod report;

pub use book::{Book, BookPatch, Isbn};
pub use btree::{BTree, BTreeError, BTreeResult, DEFAULT_DEGREE, is_valid_degree};
pub use config::RunConfig;
pub use oplog::{OpLogError, OpLogResult, Operation, OperationResult, Outcome};
pub use pipeline::{BuildSummary, PipelineError, PipelineResult};
pub use report::{ReportError, ReportResult, SearchQuery};
