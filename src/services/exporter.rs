//! 表格导出服务 - 业务能力层
//!
//! 把课程集合各不相同的记录折叠成一张两级表头的表：
//! 固定身份列 → 所有记录课程的并集（每门课 Grade/Status/Credits）→ 各学期 SGPA

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use tracing::info;

use crate::error::ExportError;
use crate::infrastructure::write_xlsx;
use crate::models::record::{SemesterKey, StudentRecord};

/// 序号列
pub const INDEX_COLUMN: &str = "S.No";

pub const HALL_TICKET_COLUMN: &str = "Hall Ticket Number";

pub const BACKLOG_COLUMN: &str = "No of Backlogs";

/// 固定身份列（子列为空）
pub const IDENTITY_COLUMNS: [&str; 7] = [
    HALL_TICKET_COLUMN,
    "Student Name",
    "Program",
    "Branch",
    "Section",
    "CGPA",
    BACKLOG_COLUMN,
];

/// 每门课的子列
pub const COURSE_FIELDS: [&str; 3] = ["Grade", "Status", "Credits"];

const COURSE_NAME: &str = "Course Name";
const UNKNOWN_COURSE: &str = "Unknown Course";

/// 两级列名：第一行是字段/课程名，第二行是子字段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub field: String,
    pub detail: String,
}

impl ColumnKey {
    pub fn new(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            detail: detail.into(),
        }
    }

    fn single(field: impl Into<String>) -> Self {
        Self::new(field, "")
    }

    /// 写入时按数字处理的列
    pub fn is_numeric(&self) -> bool {
        self.detail.is_empty() && (self.field == INDEX_COLUMN || self.field == BACKLOG_COLUMN)
    }
}

/// 导出前的内存表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    columns: Vec<ColumnKey>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    /// 构建表格
    ///
    /// - `selected` 为 None 时包含所有记录中出现过的学期
    /// - 行按准考证号最后两位数字升序，序号从 1 开始
    pub fn build(
        records: &[StudentRecord],
        selected: Option<&[SemesterKey]>,
    ) -> Result<Self, ExportError> {
        if records.is_empty() {
            return Err(ExportError::NoRecords);
        }

        let semesters: Vec<SemesterKey> = match selected {
            Some(keys) => {
                let unique: BTreeSet<SemesterKey> = keys.iter().copied().collect();
                unique.into_iter().collect()
            }
            None => records
                .iter()
                .flat_map(|r| r.semesters().keys().copied())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };

        let mut sorted: Vec<&StudentRecord> = records.iter().collect();
        sorted.sort_by(|a, b| compare_hall_tickets(a.hall_ticket_number(), b.hall_ticket_number()));

        let courses = collect_courses(&sorted, &semesters);

        let mut columns = vec![ColumnKey::single(INDEX_COLUMN)];
        columns.extend(IDENTITY_COLUMNS.iter().map(|c| ColumnKey::single(*c)));
        for course in &courses {
            columns.extend(COURSE_FIELDS.iter().map(|f| ColumnKey::new(course.as_str(), *f)));
        }
        columns.extend(semesters.iter().map(|k| ColumnKey::single(k.sgpa_label())));

        let rows = sorted
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let cells = record_cells(record, i + 1, &semesters);
                columns
                    .iter()
                    .map(|c| cells.get(c).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_index(&self, field: &str, detail: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.field == field && c.detail == detail)
    }

    /// 按行号（从 0 开始）和列名取值
    pub fn value(&self, row: usize, field: &str, detail: &str) -> Option<&str> {
        let column = self.column_index(field, detail)?;
        self.rows.get(row).map(|r| r[column].as_str())
    }

    /// 所有课程名（第一级列名，去重后保持顺序）
    pub fn course_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .filter(|c| COURSE_FIELDS.contains(&c.detail.as_str()))
            .map(|c| c.field.as_str())
            .filter(|f| seen.insert(*f))
            .collect()
    }
}

/// 构建表格并写入 Excel 文件
pub fn export(
    records: &[StudentRecord],
    selected: Option<&[SemesterKey]>,
    path: &Path,
) -> Result<ResultTable, ExportError> {
    info!("💾 正在保存 {} 条记录到 {}", records.len(), path.display());

    let table = ResultTable::build(records, selected)?;
    write_xlsx(&table, path)?;

    info!("✓ 结果已保存到 {}", path.display());
    Ok(table)
}

/// 准考证号最后两位的数值，不是数字时返回 None
fn suffix_number(hall_ticket: &str) -> Option<u32> {
    let chars: Vec<char> = hall_ticket.trim().chars().collect();
    if chars.len() < 2 {
        return None;
    }
    chars[chars.len() - 2..]
        .iter()
        .collect::<String>()
        .parse()
        .ok()
}

/// 无法解析的排在最后
fn compare_hall_tickets(a: &str, b: &str) -> Ordering {
    match (suffix_number(a), suffix_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn course_name(row: &crate::models::record::CourseRow) -> &str {
    row.get(COURSE_NAME).unwrap_or(UNKNOWN_COURSE)
}

/// 按首次出现顺序收集选中学期里的所有课程名
fn collect_courses(records: &[&StudentRecord], semesters: &[SemesterKey]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut courses = Vec::new();
    for record in records {
        for key in semesters {
            for row in record.semester(*key) {
                let name = course_name(row);
                if seen.insert(name.to_string()) {
                    courses.push(name.to_string());
                }
            }
        }
    }
    courses
}

fn record_cells(
    record: &StudentRecord,
    row_number: usize,
    semesters: &[SemesterKey],
) -> HashMap<ColumnKey, String> {
    let mut cells = HashMap::new();

    let identity = [
        row_number.to_string(),
        record.hall_ticket_number().to_string(),
        record.student_name().to_string(),
        record.program().to_string(),
        record.branch().to_string(),
        record.section().to_string(),
        record.cgpa().to_string(),
        record.backlog_count().to_string(),
    ];
    let fields = std::iter::once(INDEX_COLUMN).chain(IDENTITY_COLUMNS);
    for (field, value) in fields.zip(identity) {
        cells.insert(ColumnKey::single(field), value);
    }

    for key in semesters {
        for row in record.semester(*key) {
            let name = course_name(row);
            for field in COURSE_FIELDS {
                cells.insert(
                    ColumnKey::new(name, field),
                    row.get(field).unwrap_or_default().to_string(),
                );
            }
        }
        cells.insert(ColumnKey::single(key.sgpa_label()), record.sgpa(*key).to_string());
    }

    cells
}
