pub mod archive;
pub mod batch;
pub mod csv;

pub use archive::{write_json_archive, ArchiveError};
pub use batch::{coverage, BatchResult, CoverageSummary};
pub use csv::{write_csv, CsvError};
