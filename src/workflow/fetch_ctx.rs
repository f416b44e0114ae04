//! 抓取上下文
//!
//! 封装"哪个 worker 正在抓第几个学号"这一信息

use std::fmt::Display;

/// 单个学号的抓取上下文
#[derive(Debug, Clone)]
pub struct FetchCtx {
    /// 学号
    pub roll_number: String,

    /// worker 编号（从1开始，仅用于日志显示）
    pub worker: usize,

    /// 在本分片中的位置（从1开始）
    pub position: usize,

    /// 本分片的学号总数
    pub chunk_len: usize,
}

impl FetchCtx {
    pub fn new(roll_number: impl Into<String>, worker: usize, position: usize, chunk_len: usize) -> Self {
        Self {
            roll_number: roll_number.into(),
            worker,
            position,
            chunk_len,
        }
    }
}

impl Display for FetchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Worker {} {}/{} 学号#{}]",
            self.worker, self.position, self.chunk_len, self.roll_number
        )
    }
}
