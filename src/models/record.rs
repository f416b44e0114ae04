use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::services::backlog;

/// 学期键
///
/// 按页面中成绩表出现的顺序编号（第 1 张表 → sem1），按数字大小排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemesterKey(usize);

impl SemesterKey {
    /// 从 1 开始的学期序号创建
    pub fn new(index: usize) -> Option<Self> {
        (index >= 1).then_some(Self(index))
    }

    /// 从 0 开始的位置创建（位置 0 → sem1）
    pub fn from_position(position: usize) -> Self {
        Self(position + 1)
    }

    /// 导出表中的 SGPA 列名，如 `Sem3 SGPA`
    pub fn sgpa_label(self) -> String {
        format!("Sem{} SGPA", self.0)
    }
}

impl fmt::Display for SemesterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sem{}", self.0)
    }
}

impl FromStr for SemesterKey {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .to_ascii_lowercase()
            .strip_prefix("sem")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(SemesterKey::new)
            .ok_or_else(|| JobError::InvalidSemester(s.to_string()))
    }
}

impl TryFrom<String> for SemesterKey {
    type Error = JobError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SemesterKey> for String {
    fn from(key: SemesterKey) -> Self {
        key.to_string()
    }
}

/// 成绩表中的一行
///
/// 列名取自该表的表头行，按表头顺序保存；缺失的单元格不会出现在行中
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseRow {
    cells: Vec<(String, String)>,
}

impl CourseRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个单元格，同名列覆盖旧值
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let header = header.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(h, _)| *h == header) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((header, value)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<H: Into<String>, V: Into<String>> FromIterator<(H, V)> for CourseRow {
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        let mut row = CourseRow::new();
        for (h, v) in iter {
            row.insert(h, v);
        }
        row
    }
}

/// 学生身份信息（页面固定位置读取并推导后的字段）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentIdentity {
    pub roll_number: String,
    pub hall_ticket_number: String,
    pub student_name: String,
    pub program: String,
    pub branch: String,
    pub section: String,
    pub cgpa: String,
}

/// 单个学生的成绩记录
///
/// 构建后不可变；挂科数始终由 `semesters` 重新计算，不接受外部传入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    identity: StudentIdentity,
    semesters: BTreeMap<SemesterKey, Vec<CourseRow>>,
    semester_sgpa: BTreeMap<SemesterKey, String>,
    backlog_count: u32,
}

impl StudentRecord {
    pub fn new(
        identity: StudentIdentity,
        semesters: BTreeMap<SemesterKey, Vec<CourseRow>>,
        semester_sgpa: BTreeMap<SemesterKey, String>,
    ) -> Self {
        let backlog_count = backlog::count_backlogs(&semesters);
        Self {
            identity,
            semesters,
            semester_sgpa,
            backlog_count,
        }
    }

    /// 输入的学号
    pub fn roll_number(&self) -> &str {
        &self.identity.roll_number
    }

    /// 页面上显示的准考证号（可能与输入学号格式不同）
    pub fn hall_ticket_number(&self) -> &str {
        &self.identity.hall_ticket_number
    }

    pub fn student_name(&self) -> &str {
        &self.identity.student_name
    }

    pub fn program(&self) -> &str {
        &self.identity.program
    }

    pub fn branch(&self) -> &str {
        &self.identity.branch
    }

    pub fn section(&self) -> &str {
        &self.identity.section
    }

    pub fn cgpa(&self) -> &str {
        &self.identity.cgpa
    }

    pub fn semesters(&self) -> &BTreeMap<SemesterKey, Vec<CourseRow>> {
        &self.semesters
    }

    pub fn semester(&self, key: SemesterKey) -> &[CourseRow] {
        self.semesters.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 指定学期的 SGPA，未找到时为 "N/A"
    pub fn sgpa(&self, key: SemesterKey) -> &str {
        self.semester_sgpa
            .get(&key)
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn semester_sgpa(&self) -> &BTreeMap<SemesterKey, String> {
        &self.semester_sgpa
    }

    pub fn backlog_count(&self) -> u32 {
        self.backlog_count
    }
}

/// 缺失值占位
pub const NOT_AVAILABLE: &str = "N/A";
