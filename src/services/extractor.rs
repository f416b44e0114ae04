//! 成绩页提取服务 - 业务能力层
//!
//! 只负责"从已加载的成绩页读出一条记录"，不关心导航、重试和并发

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::browser::{Locator, Session, WaitCondition};
use crate::config::PortalLayout;
use crate::error::{ExtractError, SessionError, SessionResult};
use crate::models::branch;
use crate::models::record::{
    CourseRow, SemesterKey, StudentIdentity, StudentRecord, NOT_AVAILABLE,
};

/// SGPA 至少补齐到第 8 学期
pub const SGPA_CEILING: usize = 8;

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+)").expect("SGPA 正则无效"));

/// 成绩页提取器
pub struct RecordExtractor {
    layout: PortalLayout,
    table_wait_timeout: Duration,
}

impl RecordExtractor {
    pub fn new(layout: PortalLayout, table_wait_timeout: Duration) -> Self {
        Self {
            layout,
            table_wait_timeout,
        }
    }

    /// 从当前页面提取一条完整记录
    ///
    /// 任一固定字段缺失即返回错误，不会返回部分填充的记录
    pub async fn extract<S: Session>(
        &self,
        session: &S,
        roll_number: &str,
    ) -> Result<StudentRecord, ExtractError> {
        let hall_ticket_number = read_field(session, &self.layout.hall_ticket, "hall_ticket").await?;
        let student_name = read_field(session, &self.layout.student_name, "student_name").await?;
        let raw_program = read_field(session, &self.layout.program, "program").await?;
        let cgpa_block = read_field(session, &self.layout.cgpa, "cgpa").await?;

        let identity = StudentIdentity {
            roll_number: roll_number.to_string(),
            program: branch::program_from(&raw_program),
            branch: branch::branch_from(&raw_program),
            section: branch::section_from(&hall_ticket_number),
            cgpa: parse_cgpa(&cgpa_block),
            hall_ticket_number,
            student_name,
        };

        let tables = self.read_tables(session).await?;
        let table_count = tables.len();
        let semesters: BTreeMap<SemesterKey, Vec<CourseRow>> = tables
            .into_iter()
            .enumerate()
            .map(|(position, rows)| (semester_key_for_table(position), rows))
            .collect();

        let sgpa_texts = self.read_sgpa_texts(session).await;
        let semester_sgpa = assign_sgpa(&sgpa_texts, table_count);

        debug!(
            "{} 提取完成: {} 张成绩表, {} 条 SGPA 文本",
            roll_number,
            table_count,
            sgpa_texts.len()
        );

        Ok(StudentRecord::new(identity, semesters, semester_sgpa))
    }

    /// 按页面顺序读取所有成绩表
    async fn read_tables<S: Session>(&self, session: &S) -> Result<Vec<Vec<CourseRow>>, ExtractError> {
        if let Err(e) = session
            .wait_until(
                WaitCondition::Present,
                &self.layout.result_table,
                self.table_wait_timeout,
            )
            .await
        {
            warn!("未找到成绩表或等待超时: {}", e);
            return Ok(Vec::new());
        }

        let tables = session.find_elements(&self.layout.result_table).await?;
        let mut semesters = Vec::with_capacity(tables.len());

        for (index, table) in tables.iter().enumerate() {
            match self.read_table(session, table).await {
                Ok(rows) => semesters.push(rows),
                Err(e) => {
                    warn!("读取第 {} 张成绩表失败: {}", index + 1, e);
                    semesters.push(Vec::new());
                }
            }
        }

        Ok(semesters)
    }

    /// 读取单张表：表头作为列名，其余行按位置与表头配对
    async fn read_table<S: Session>(&self, session: &S, table: &S::Element) -> SessionResult<Vec<CourseRow>> {
        let mut headers = Vec::new();
        for cell in session.find_within(table, &self.layout.header_cell).await? {
            headers.push(session.read_text(&cell).await?.trim().to_string());
        }

        let rows = session.find_within(table, &self.layout.row).await?;
        let mut course_rows = Vec::new();

        for row in rows.iter().skip(1) {
            let cells = session.find_within(row, &self.layout.data_cell).await?;
            if cells.is_empty() {
                continue;
            }

            let mut course_row = CourseRow::new();
            for (header, cell) in headers.iter().zip(cells.iter()) {
                let value = session.read_text(cell).await?;
                course_row.insert(header.clone(), value.trim());
            }
            course_rows.push(course_row);
        }

        Ok(course_rows)
    }

    /// 按页面顺序读取 SGPA 文本
    ///
    /// 每个元素占一个位置；读取失败的位置留空，之后会被记为 "N/A"
    async fn read_sgpa_texts<S: Session>(&self, session: &S) -> Vec<String> {
        let elements = match session.find_elements(&self.layout.sgpa_text).await {
            Ok(elements) => elements,
            Err(e) => {
                warn!("无法读取 SGPA: {}", e);
                return Vec::new();
            }
        };

        let mut texts = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            match session.read_text(element).await {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!("读取第 {} 个 SGPA 失败: {}", index + 1, e);
                    texts.push(String::new());
                }
            }
        }
        texts
    }
}

/// 读取固定位置的必填字段
async fn read_field<S: Session>(
    session: &S,
    locator: &Locator,
    field: &'static str,
) -> Result<String, ExtractError> {
    let element = session.find_element(locator).await.map_err(|e| match e {
        SessionError::NotFound { .. } => ExtractError::MissingField { field, source: e },
        other => ExtractError::Session(other),
    })?;
    Ok(session.read_text(&element).await?.trim().to_string())
}

/// 成绩表 → 学期键的映射
///
/// 目前按表在页面中的位置分配（第 1 张 → sem1）。
/// 页面从未保证表的顺序就是学期顺序，如果门户改版调整了顺序，映射会整体错位
pub fn semester_key_for_table(position: usize) -> SemesterKey {
    SemesterKey::from_position(position)
}

/// CGPA 文本形如 "CGPA : 8.12"，取第一个冒号右侧
pub fn parse_cgpa(block: &str) -> String {
    match block.split_once(':') {
        Some((_, value)) => value.trim().to_string(),
        None => block.trim().to_string(),
    }
}

/// 按出现顺序把 SGPA 分配给 sem1、sem2 ...
///
/// 没有小数的文本占位为 "N/A"；之后补齐到 max(8, 表数量)
pub fn assign_sgpa(texts: &[String], table_count: usize) -> BTreeMap<SemesterKey, String> {
    let mut sgpa: BTreeMap<SemesterKey, String> = texts
        .iter()
        .enumerate()
        .map(|(position, text)| {
            let value = DECIMAL
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            (SemesterKey::from_position(position), value)
        })
        .collect();

    for position in 0..SGPA_CEILING.max(table_count) {
        sgpa.entry(SemesterKey::from_position(position))
            .or_insert_with(|| NOT_AVAILABLE.to_string());
    }

    sgpa
}
