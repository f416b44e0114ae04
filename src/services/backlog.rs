//! 挂科统计
//!
//! 纯函数，只看每一行的 `Status` / `Grade` 两列

use std::collections::BTreeMap;

use crate::models::record::{CourseRow, SemesterKey};

const FAILING_STATUS_TOKENS: [&str; 3] = ["F", "AB", "RA"];
const FAILING_GRADES: [&str; 2] = ["F", "AB"];

/// 单行是否计为挂科（不及格或缺考）
pub fn is_backlog(row: &CourseRow) -> bool {
    let status = row.get("Status").map(str::to_uppercase);
    let grade = row.get("Grade").map(str::to_uppercase);

    let failed_status = status
        .as_deref()
        .is_some_and(|s| FAILING_STATUS_TOKENS.iter().any(|t| s.contains(t)));
    let failed_grade = grade
        .as_deref()
        .is_some_and(|g| FAILING_GRADES.contains(&g.trim()));

    failed_status || failed_grade
}

/// 统计所有学期的挂科总数
pub fn count_backlogs(semesters: &BTreeMap<SemesterKey, Vec<CourseRow>>) -> u32 {
    semesters
        .values()
        .flatten()
        .filter(|row| is_backlog(row))
        .count() as u32
}
