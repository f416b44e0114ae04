//! 单个学号抓取流程 - 流程层
//!
//! 核心职责：定义"一个学号"的完整抓取流程
//!
//! 流程顺序：
//! 1. 打开查询页 → 输入学号 → 选择考试类型 → 提交 → 等待结果
//! 2. 提取成绩记录
//! 3. 超时/驱动错误时从头重试，记录不存在时立即放弃

use std::fmt;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{Session, WaitCondition};
use crate::config::{Config, PortalLayout};
use crate::error::{ExtractError, SessionError};
use crate::models::record::StudentRecord;
use crate::services::RecordExtractor;
use crate::workflow::fetch_ctx::FetchCtx;

/// 抓取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 成功拿到记录
    Fetched(StudentRecord),
    /// 门户确认没有该学号的记录，不再重试
    Absent { attempts: u32 },
    /// 重试次数用尽
    Exhausted { attempts: u32, last_error: String },
}

impl FetchOutcome {
    pub fn into_record(self) -> Option<StudentRecord> {
        match self {
            FetchOutcome::Fetched(record) => Some(record),
            _ => None,
        }
    }
}

/// 抓取阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Navigate,
    FillInput,
    SelectExamType,
    Submit,
    WaitForResult,
    Extract,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchStage::Navigate => "打开查询页",
            FetchStage::FillInput => "输入学号",
            FetchStage::SelectExamType => "选择考试类型",
            FetchStage::Submit => "提交查询",
            FetchStage::WaitForResult => "等待结果",
            FetchStage::Extract => "提取成绩",
        };
        f.write_str(name)
    }
}

/// 单次尝试的失败原因
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("{stage}失败: {source}")]
    Session {
        stage: FetchStage,
        #[source]
        source: SessionError,
    },
    #[error("提取成绩失败: {0}")]
    Extract(#[from] ExtractError),
}

impl AttemptError {
    pub fn is_definitive_absence(&self) -> bool {
        match self {
            AttemptError::Session { source, .. } => source.is_definitive_absence(),
            AttemptError::Extract(e) => e.is_definitive_absence(),
        }
    }
}

/// 重试与节奏控制
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// 每个学号最多尝试次数
    pub max_attempts: u32,
    /// 每一步等待元素的超时
    pub wait_timeout: Duration,
    /// 两次尝试之间的冷却
    pub retry_cooldown: Duration,
    /// 成功后的随机延迟区间
    pub success_delay: (Duration, Duration),
    pub verbose_logging: bool,
}

impl FetchPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts,
            wait_timeout: config.wait_timeout(),
            retry_cooldown: config.retry_cooldown(),
            success_delay: (
                Duration::from_millis(config.success_delay_min_ms),
                Duration::from_millis(config.success_delay_max_ms),
            ),
            verbose_logging: config.verbose_logging,
        }
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 单个学号抓取流程
///
/// - 不持有会话，由调用方（worker）传入并复用
/// - 每次尝试都从打开查询页开始，不合并前一次尝试的部分结果
pub struct FetchFlow {
    layout: PortalLayout,
    extractor: RecordExtractor,
    policy: FetchPolicy,
}

impl FetchFlow {
    pub fn new(layout: PortalLayout, extractor: RecordExtractor, policy: FetchPolicy) -> Self {
        Self {
            layout,
            extractor,
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let layout = PortalLayout::new(config.portal_url.clone());
        let extractor = RecordExtractor::new(layout.clone(), config.table_wait_timeout());
        Self::new(layout, extractor, FetchPolicy::from_config(config))
    }

    pub async fn run<S: Session>(&self, session: &mut S, ctx: &FetchCtx) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            info!("{} 🔍 第 {}/{} 次尝试", ctx, attempt, max_attempts);

            match self.attempt(session, ctx).await {
                Ok(record) => {
                    info!(
                        "{} ✓ 抓取成功: {} (挂科 {})",
                        ctx,
                        record.student_name(),
                        record.backlog_count()
                    );
                    if self.policy.verbose_logging {
                        self.log_record(ctx, &record);
                    }
                    self.pause_after_success().await;
                    return FetchOutcome::Fetched(record);
                }
                Err(e) if e.is_definitive_absence() => {
                    info!("{} 未找到成绩记录，跳过: {}", ctx, e);
                    return FetchOutcome::Absent { attempts: attempt };
                }
                Err(e) => {
                    warn!("{} ⚠️ 第 {} 次尝试失败: {}", ctx, attempt, e);
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        sleep(self.policy.retry_cooldown).await;
                    }
                }
            }
        }

        warn!("{} ❌ 已尝试 {} 次仍失败，放弃该学号", ctx, max_attempts);
        FetchOutcome::Exhausted {
            attempts: max_attempts,
            last_error,
        }
    }

    /// 一次完整尝试
    async fn attempt<S: Session>(&self, session: &mut S, ctx: &FetchCtx) -> Result<StudentRecord, AttemptError> {
        let layout = &self.layout;
        let wait = self.policy.wait_timeout;

        session
            .navigate(&layout.url)
            .await
            .map_err(at(FetchStage::Navigate))?;

        let input = session
            .wait_until(WaitCondition::Present, &layout.roll_input, wait)
            .await
            .map_err(at(FetchStage::FillInput))?;
        session
            .type_text(&input, &ctx.roll_number)
            .await
            .map_err(at(FetchStage::FillInput))?;

        let dropdown = session
            .wait_until(WaitCondition::Clickable, &layout.exam_type_dropdown, wait)
            .await
            .map_err(at(FetchStage::SelectExamType))?;
        session
            .click(&dropdown)
            .await
            .map_err(at(FetchStage::SelectExamType))?;
        let option = session
            .wait_until(WaitCondition::Clickable, &layout.exam_type_option, wait)
            .await
            .map_err(at(FetchStage::SelectExamType))?;
        session
            .click(&option)
            .await
            .map_err(at(FetchStage::SelectExamType))?;

        let button = session
            .wait_until(WaitCondition::Clickable, &layout.submit_button, wait)
            .await
            .map_err(at(FetchStage::Submit))?;
        session
            .click(&button)
            .await
            .map_err(at(FetchStage::Submit))?;

        session
            .wait_until(WaitCondition::Present, &layout.result_container, wait)
            .await
            .map_err(at(FetchStage::WaitForResult))?;

        let record = self.extractor.extract(&*session, &ctx.roll_number).await?;
        Ok(record)
    }

    async fn pause_after_success(&self) {
        let delay = jitter(self.policy.success_delay);
        if !delay.is_zero() {
            debug!("随机等待 {:?}", delay);
            sleep(delay).await;
        }
    }

    fn log_record(&self, ctx: &FetchCtx, record: &StudentRecord) {
        for (key, rows) in record.semesters() {
            info!(
                "{}   {}: {} 门课程, SGPA {}",
                ctx,
                key,
                rows.len(),
                record.sgpa(*key)
            );
        }
    }
}

fn at(stage: FetchStage) -> impl FnOnce(SessionError) -> AttemptError {
    move |source| AttemptError::Session { stage, source }
}

/// 在 [min, max] 内随机取一个时长
fn jitter((min, max): (Duration, Duration)) -> Duration {
    let lo = min.as_millis() as u64;
    let hi = max.as_millis() as u64;
    if hi <= lo {
        return min;
    }
    Duration::from_millis(rand::rng().random_range(lo..=hi))
}
