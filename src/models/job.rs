use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::JobError;
use crate::models::record::SemesterKey;
use crate::models::roll_range::RollRange;

/// 一次抓取任务
///
/// 对应 TOML 任务文件：
///
/// ```toml
/// singles = ["22A91A0501"]
/// semesters = ["sem1", "sem2"]
/// output = "results.xlsx"
///
/// [[ranges]]
/// from = "22A91A0501"
/// to = "22A91A0510"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestJob {
    /// 单个学号
    #[serde(default)]
    pub singles: Vec<String>,
    /// 学号区间
    #[serde(default)]
    pub ranges: Vec<RollRange>,
    /// 导出时包含的学期（为空表示全部）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semesters: Option<Vec<SemesterKey>>,
    /// 输出文件路径（覆盖配置中的默认值）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl HarvestJob {
    /// 展开所有学号：先单个学号，再按顺序展开区间，去重保留首次出现
    pub fn roll_numbers(&self) -> Result<Vec<String>, JobError> {
        let mut seen = HashSet::new();
        let mut rolls = Vec::new();

        let singles = self
            .singles
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut expanded = Vec::new();
        for range in &self.ranges {
            expanded.extend(range.expand()?);
        }

        for roll in singles.chain(expanded) {
            if seen.insert(roll.clone()) {
                rolls.push(roll);
            } else {
                warn!("重复的学号已忽略: {}", roll);
            }
        }

        if rolls.is_empty() {
            return Err(JobError::Empty);
        }

        Ok(rolls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_numbers_singles_then_ranges_deduplicated() {
        let job = HarvestJob {
            singles: vec!["22A103".to_string(), " ".to_string()],
            ranges: vec![RollRange::new("22A102", "22A104")],
            ..Default::default()
        };
        assert_eq!(
            job.roll_numbers().unwrap(),
            vec!["22A103", "22A102", "22A104"]
        );
    }

    #[test]
    fn test_empty_job_is_error() {
        assert!(matches!(
            HarvestJob::default().roll_numbers(),
            Err(JobError::Empty)
        ));
    }

    #[test]
    fn test_parse_from_toml() {
        let job: HarvestJob = toml::from_str(
            r#"
            singles = ["22A101"]
            semesters = ["sem1", "sem3"]

            [[ranges]]
            from = "22A105"
            to = "22A106"
            "#,
        )
        .unwrap();
        assert_eq!(job.roll_numbers().unwrap().len(), 3);
        let semesters = job.semesters.unwrap();
        assert_eq!(semesters[1], SemesterKey::new(3).unwrap());
        assert!(job.output.is_none());
    }

    #[test]
    fn test_invalid_semester_rejected() {
        let parsed: Result<HarvestJob, _> = toml::from_str(r#"semesters = ["first"]"#);
        assert!(parsed.is_err());
    }
}
