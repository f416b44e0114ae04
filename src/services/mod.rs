//! 业务能力层
//!
//! 每个服务只处理"一件事"，不持有浏览器资源，不关心并发

pub mod backlog;
pub mod exporter;
pub mod extractor;

pub use backlog::count_backlogs;
pub use exporter::{export, ColumnKey, ResultTable};
pub use extractor::RecordExtractor;
