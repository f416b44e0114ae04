//! # Result Harvester
//!
//! 批量抓取学生成绩并导出为 Excel 的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 会话抽象 `Session` / `SessionFactory`，`ChromeLauncher` 启动独立浏览器
//! - `infrastructure/` - `ChromeSession`（chromiumoxide 适配）、xlsx 写入
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `RecordExtractor` - 从结果页读取一条成绩记录
//! - `count_backlogs` - 挂科统计
//! - `ResultTable` / `export` - 组装两级表头并写入 Excel
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个学号"的完整抓取流程
//! - `FetchCtx` - 上下文封装（worker + 学号）
//! - `FetchFlow` - 流程编排（打开 → 输入 → 提交 → 提取 → 重试）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 应用入口，管理任务状态
//! - `orchestrator/dispatcher` - 分片并发，每个分片一个会话
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{ChromeLauncher, Session, SessionFactory};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{HarvestJob, SemesterKey, StudentRecord};
pub use orchestrator::{App, Dispatcher, HarvestStatus, HarvestSummary};
pub use workflow::{FetchCtx, FetchFlow, FetchOutcome};
