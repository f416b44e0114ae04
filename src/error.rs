use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器会话错误
    #[error("浏览器错误: {0}")]
    Session(#[from] SessionError),
    /// 成绩页提取错误
    #[error("提取错误: {0}")]
    Extract(#[from] ExtractError),
    /// 导出错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 任务文件错误
    #[error("任务错误: {0}")]
    Job(#[from] JobError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

/// 浏览器会话错误
///
/// 区分"元素确实不存在"和"暂时没等到"，抓取流程据此决定是否重试
#[derive(Debug, Error)]
pub enum SessionError {
    /// 页面已加载，但目标元素不在 DOM 中
    #[error("元素未找到: {locator}")]
    NotFound { locator: String },
    /// 在限定时间内没有等到目标元素
    #[error("等待 {locator} 超时 ({waited:?})")]
    Timeout { locator: String, waited: Duration },
    /// 驱动层错误（CDP 通信失败、元素失效等）
    #[error("浏览器驱动错误: {0}")]
    Driver(String),
    /// 当前驱动不支持该定位方式
    #[error("不支持的定位方式: {0}")]
    Unsupported(String),
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    Launch(String),
}

impl SessionError {
    /// 是否表示"记录不存在"（不应重试）
    pub fn is_definitive_absence(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }
}

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SessionError::Driver(err.to_string())
    }
}

/// 会话操作结果类型
pub type SessionResult<T> = Result<T, SessionError>;

/// 成绩页提取错误
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 必填的固定字段缺失，视为该学号无成绩记录
    #[error("缺少必填字段 {field}: {source}")]
    MissingField {
        field: &'static str,
        #[source]
        source: SessionError,
    },
    /// 读取过程中的会话错误
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ExtractError {
    pub fn is_definitive_absence(&self) -> bool {
        match self {
            ExtractError::MissingField { .. } => true,
            ExtractError::Session(e) => e.is_definitive_absence(),
        }
    }
}

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 没有任何可导出的记录
    #[error("没有可导出的成绩记录")]
    NoRecords,
    /// 写入表格文件失败
    #[error("写入文件失败 ({path}): {reason}")]
    Write { path: String, reason: String },
}

/// 任务文件错误
#[derive(Debug, Error)]
pub enum JobError {
    #[error("无法读取任务文件 {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("无法解析任务文件 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 学号区间不合法
    #[error("学号区间 {from}..{to} 不合法: {reason}")]
    InvalidRange {
        from: String,
        to: String,
        reason: String,
    },
    /// 学期键不合法（应为 sem1、sem2 ...）
    #[error("无效的学期: {0}")]
    InvalidSemester(String),
    /// 任务中没有任何学号
    #[error("任务中没有任何学号")]
    Empty,
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
