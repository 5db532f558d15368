//! Inventory Report Common Library
//!
//! CLIとビューモデルで共有される型と純粋関数

pub mod types;
pub mod error;
pub mod search;
pub mod summary;
pub mod disposition;

pub use types::{
    BulkScanRecord, ComparisonRow, ExportFormat, ExportRecord, ExportRecordId, Report, ReportId,
    ResultLabel, Status,
};
pub use error::{Error, Result};
pub use search::{filter_rows, row_matches};
pub use summary::{summarize, Summary};
pub use disposition::filename_from_disposition;
