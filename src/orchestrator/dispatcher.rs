//! 分片并发调度器 - 编排层
//!
//! ## 职责
//!
//! 1. **分片**：把学号列表切成 worker 数量个连续分片
//! 2. **资源管理**：每个分片一个 tokio 任务，独占一个浏览器会话直到分片结束
//! 3. **汇总**：按分片完成顺序收集记录，并回调进度
//!
//! ## 设计特点
//!
//! - 分片内按输入顺序串行（会话复用），分片之间并发
//! - 单个学号失败只影响该学号；会话创建失败只影响本分片
//! - 汇总只在 `dispatch` 内进行，worker 之间没有共享的可变状态

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, error, info, warn};

use crate::browser::{Session, SessionFactory};
use crate::models::record::StudentRecord;
use crate::utils::logging;
use crate::workflow::{FetchCtx, FetchFlow, FetchOutcome};

/// 单个分片的处理结果
#[derive(Debug, Default)]
pub struct ChunkReport {
    pub records: Vec<StudentRecord>,
    pub absent: usize,
    pub failed: usize,
    /// 会话创建失败而未处理的学号数
    pub skipped: usize,
}

/// 分片并发调度器
pub struct Dispatcher<F: SessionFactory> {
    factory: Arc<F>,
    flow: Arc<FetchFlow>,
}

impl<F: SessionFactory> Dispatcher<F> {
    pub fn new(factory: F, flow: FetchFlow) -> Self {
        Self {
            factory: Arc::new(factory),
            flow: Arc::new(flow),
        }
    }

    /// 并发抓取所有学号
    ///
    /// 返回顺序为分片完成顺序，不保证与输入顺序一致。
    /// 每个分片完成后以 (已处理数, 总数) 调用 `on_progress`
    pub async fn dispatch<P>(
        &self,
        roll_numbers: &[String],
        workers: usize,
        mut on_progress: P,
    ) -> Vec<StudentRecord>
    where
        P: FnMut(usize, usize) + Send,
    {
        let total = roll_numbers.len();
        let workers = if workers == 0 {
            warn!("⚠️ worker 数为 0，按 1 处理");
            1
        } else {
            workers
        };

        let chunks = partition(roll_numbers, workers);
        logging::log_dispatch_plan(total, &chunks);

        let mut pending = FuturesUnordered::new();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let worker = index + 1;
            let chunk_len = chunk.len();
            let factory = Arc::clone(&self.factory);
            let flow = Arc::clone(&self.flow);

            let handle = tokio::spawn(run_chunk(factory, flow, worker, chunk));
            pending.push(async move { (worker, chunk_len, handle.await) });
        }

        let mut records = Vec::new();
        let mut completed = 0;

        while let Some((worker, chunk_len, joined)) = pending.next().await {
            match joined {
                Ok(report) => {
                    logging::log_chunk_complete(worker, chunk_len, &report);
                    records.extend(report.records);
                }
                Err(e) => {
                    error!("[Worker {}] ❌ 任务异常退出，本分片结果丢弃: {}", worker, e);
                }
            }

            completed += chunk_len;
            on_progress(completed, total);
            info!("📊 进度: {}/{}", completed, total);
        }

        info!("✓ 抓取完成: 成功 {}/{}", records.len(), total);
        records
    }
}

/// 处理一个分片
///
/// 会话在这里打开、复用并关闭；任务 panic 时会话随栈展开被 drop，浏览器进程一并回收
async fn run_chunk<F: SessionFactory>(
    factory: Arc<F>,
    flow: Arc<FetchFlow>,
    worker: usize,
    chunk: Vec<String>,
) -> ChunkReport {
    let mut report = ChunkReport::default();

    if chunk.is_empty() {
        debug!("[Worker {}] 空分片，直接完成", worker);
        return report;
    }

    let mut session = match factory.open().await {
        Ok(session) => session,
        Err(e) => {
            error!(
                "[Worker {}] ❌ 无法创建浏览器会话，本分片 {} 个学号全部跳过: {}",
                worker,
                chunk.len(),
                e
            );
            report.skipped = chunk.len();
            return report;
        }
    };

    let chunk_len = chunk.len();
    for (index, roll_number) in chunk.into_iter().enumerate() {
        let ctx = FetchCtx::new(roll_number, worker, index + 1, chunk_len);
        match flow.run(&mut session, &ctx).await {
            FetchOutcome::Fetched(record) => report.records.push(record),
            FetchOutcome::Absent { .. } => report.absent += 1,
            FetchOutcome::Exhausted { .. } => report.failed += 1,
        }
    }

    if let Err(e) = session.close().await {
        warn!("[Worker {}] 关闭浏览器会话失败: {}", worker, e);
    }

    report
}

/// 把学号切成 `workers` 个连续分片
///
/// 每片 `len / workers` 个，余数全部并入最后一片；学号少于 worker 数时前面的分片为空
pub fn partition(roll_numbers: &[String], workers: usize) -> Vec<Vec<String>> {
    let workers = workers.max(1);
    let size = roll_numbers.len() / workers;

    (0..workers)
        .map(|i| {
            let start = i * size;
            let end = if i + 1 == workers {
                roll_numbers.len()
            } else {
                start + size
            };
            roll_numbers[start..end].to_vec()
        })
        .collect()
}
