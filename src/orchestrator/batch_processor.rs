//! 批量成绩抓取 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整的抓取任务。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：读取任务文件，展开学号列表
//! 2. **并发抓取**：委托 `Dispatcher` 按分片并发抓取
//! 3. **导出**：把抓到的记录写入 Excel
//! 4. **进度**：通过 `ProgressTracker` 暴露状态和进度
//! 5. **全局统计**：输出最终统计信息
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个学号的细节
//! - **会话工厂注入**：`run` 使用 Chrome，`run_with` 可传入任意 `SessionFactory`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::error;

use crate::browser::{ChromeLauncher, SessionFactory};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{load_job, HarvestJob};
use crate::orchestrator::dispatcher::Dispatcher;
use crate::orchestrator::progress::{HarvestStatus, ProgressSnapshot, ProgressTracker};
use crate::services;
use crate::utils::logging;
use crate::workflow::FetchFlow;

/// 一次抓取的汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    pub total: usize,
    pub fetched: usize,
    pub output: PathBuf,
}

impl HarvestSummary {
    pub fn missing(&self) -> usize {
        self.total - self.fetched
    }
}

/// 应用主结构
#[derive(Debug)]
pub struct App {
    config: Config,
    job: HarvestJob,
    roll_numbers: Vec<String>,
    progress: ProgressTracker,
}

impl App {
    /// 初始化应用：读取 `config.job_file` 指定的任务文件
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let job = load_job(Path::new(&config.job_file))
            .await
            .with_context(|| format!("加载任务文件失败: {}", config.job_file))?;

        Ok(Self::with_job(config, job)?)
    }

    /// 使用已构造好的任务
    pub fn with_job(config: Config, job: HarvestJob) -> AppResult<Self> {
        config.validate()?;
        let roll_numbers = job.roll_numbers()?;
        logging::log_job_loaded(&roll_numbers, config.workers);

        let progress = ProgressTracker::new(roll_numbers.len());
        Ok(Self {
            config,
            job,
            roll_numbers,
            progress,
        })
    }

    pub fn roll_numbers(&self) -> &[String] {
        &self.roll_numbers
    }

    /// 订阅进度，可在 `run` 进行期间轮询
    pub fn progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress.subscribe()
    }

    /// 运行应用主逻辑（每个分片启动一个无头 Chrome）
    pub async fn run(&self) -> AppResult<HarvestSummary> {
        self.run_with(ChromeLauncher::from_config(&self.config)).await
    }

    pub async fn run_with<F: SessionFactory>(&self, factory: F) -> AppResult<HarvestSummary> {
        match self.harvest(factory).await {
            Ok(summary) => {
                self.progress.set_status(HarvestStatus::Completed);
                logging::print_final_stats(&summary);
                Ok(summary)
            }
            Err(e) => {
                error!("❌ 抓取任务失败: {}", e);
                self.progress.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn harvest<F: SessionFactory>(&self, factory: F) -> AppResult<HarvestSummary> {
        self.progress.set_status(HarvestStatus::Scraping);

        let dispatcher = Dispatcher::new(factory, FetchFlow::from_config(&self.config));
        let tracker = &self.progress;
        let records = dispatcher
            .dispatch(&self.roll_numbers, self.config.workers, |completed, total| {
                tracker.record_progress(completed, total)
            })
            .await;

        self.progress.set_status(HarvestStatus::Saving);

        let output = PathBuf::from(
            self.job
                .output
                .clone()
                .unwrap_or_else(|| self.config.output_file.clone()),
        );
        services::export(&records, self.job.semesters.as_deref(), &output)?;

        Ok(HarvestSummary {
            total: self.roll_numbers.len(),
            fetched: records.len(),
            output,
        })
    }
}
