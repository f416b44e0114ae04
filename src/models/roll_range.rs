use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// 学号区间（首尾学号只有最后两位不同）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRange {
    pub from: String,
    pub to: String,
}

impl RollRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn expand(&self) -> Result<Vec<String>, JobError> {
        expand_range(&self.from, &self.to)
    }
}

/// 展开学号区间
///
/// 前缀取 `from` 去掉最后两位，首尾序号取两端学号的最后两位数字，
/// 生成 `前缀 + 两位补零序号`
pub fn expand_range(from: &str, to: &str) -> Result<Vec<String>, JobError> {
    let invalid = |reason: &str| JobError::InvalidRange {
        from: from.to_string(),
        to: to.to_string(),
        reason: reason.to_string(),
    };

    let (prefix, start) = split_suffix(from).ok_or_else(|| invalid("起始学号格式错误"))?;
    let (_, end) = split_suffix(to).ok_or_else(|| invalid("结束学号格式错误"))?;

    if start > end {
        return Err(invalid("起始学号必须小于等于结束学号"));
    }

    Ok((start..=end).map(|i| format!("{}{:02}", prefix, i)).collect())
}

/// 拆出前缀和最后两位数字
fn split_suffix(roll: &str) -> Option<(&str, u32)> {
    let roll = roll.trim();
    let split_at = roll.char_indices().rev().nth(1).map(|(i, _)| i)?;
    let (prefix, suffix) = roll.split_at(split_at);
    if !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok().map(|n| (prefix, n))
}
