//! 抓取进度
//!
//! 进度对象由一次抓取任务持有，通过 watch 通道暴露给调用方轮询

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestStatus {
    Starting,
    Scraping,
    Saving,
    Completed,
    Error,
}

impl fmt::Display for HarvestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HarvestStatus::Starting => "starting",
            HarvestStatus::Scraping => "scraping",
            HarvestStatus::Saving => "saving",
            HarvestStatus::Completed => "completed",
            HarvestStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// 进度快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// 已处理的学号数（无论成功与否）
    pub completed: usize,
    pub total: usize,
    pub status: HarvestStatus,
    /// 出错时的提示信息
    pub message: Option<String>,
}

/// 进度跟踪器
///
/// `completed` 只增不减，且不超过 `total`
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    tx: Arc<watch::Sender<ProgressSnapshot>>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot {
            completed: 0,
            total,
            status: HarvestStatus::Starting,
            message: None,
        });
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tx.borrow().clone()
    }

    pub fn set_status(&self, status: HarvestStatus) {
        self.tx.send_modify(|s| s.status = status);
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|s| {
            s.status = HarvestStatus::Error;
            s.message = Some(message);
        });
    }

    pub fn record_progress(&self, completed: usize, total: usize) {
        self.tx.send_modify(|s| {
            s.total = total;
            s.completed = s.completed.max(completed).min(total);
        });
    }
}
