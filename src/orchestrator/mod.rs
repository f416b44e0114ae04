//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量抓取和并发调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 读取任务文件、展开学号
//! - 驱动抓取 → 导出
//! - 维护任务状态和进度
//!
//! ### `dispatcher` - 分片并发调度
//! - 按 worker 数切分学号
//! - 每个分片独占一个浏览器会话
//! - 汇总记录和进度
//!
//! ### `progress` - 进度
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一次任务)
//!     ↓
//! dispatcher (Vec<学号> → 分片)
//!     ↓
//! workflow::FetchFlow (单个学号)
//!     ↓
//! services (提取 / 挂科统计 / 导出)
//!     ↓
//! infrastructure (ChromeSession / xlsx)
//! ```

pub mod batch_processor;
pub mod dispatcher;
pub mod progress;

// 重新导出主要类型
pub use batch_processor::{App, HarvestSummary};
pub use dispatcher::{partition, ChunkReport, Dispatcher};
pub use progress::{HarvestStatus, ProgressSnapshot, ProgressTracker};
