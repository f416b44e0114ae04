/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::batch_processor::HarvestSummary;
use crate::orchestrator::dispatcher::ChunkReport;

/// 初始化日志
///
/// 默认级别 info，可通过 `RUST_LOG` 覆盖
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多浏览器并发抓取模式");
    info!("🌐 查询页: {}", config.portal_url);
    info!("📊 并发 worker 数: {}", config.workers);
    info!("🔁 每个学号最多尝试: {} 次", config.max_attempts);
    info!("{}", "=".repeat(60));
}

/// 记录任务加载信息
pub fn log_job_loaded(roll_numbers: &[String], workers: usize) {
    info!("✓ 共 {} 个待抓取的学号", roll_numbers.len());
    if let (Some(first), Some(last)) = (roll_numbers.first(), roll_numbers.last()) {
        info!("📋 范围: {} … {}", first, last);
    }
    info!("💡 将分成 {} 个分片并发抓取\n", workers.max(1));
}

/// 记录分片计划
pub fn log_dispatch_plan(total: usize, chunks: &[Vec<String>]) {
    info!("\n{}", "=".repeat(60));
    info!("📦 分片计划: {} 个学号 / {} 个分片", total, chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        match (chunk.first(), chunk.last()) {
            (Some(first), Some(last)) => {
                info!("  Worker {}: {} 个 ({}-{})", index + 1, chunk.len(), first, last)
            }
            _ => info!("  Worker {}: 空", index + 1),
        }
    }
    info!("{}", "=".repeat(60));
}

/// 记录分片完成信息
pub fn log_chunk_complete(worker: usize, chunk_len: usize, report: &ChunkReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ Worker {} 完成: 成功 {}/{}，无记录 {}，失败 {}，跳过 {}",
        worker,
        report.records.len(),
        chunk_len,
        report.absent,
        report.failed,
        report.skipped
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &HarvestSummary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部抓取完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.fetched, summary.total);
    info!("❌ 未获取: {}", summary.missing());
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", summary.output.display());
}
