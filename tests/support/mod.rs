//! 测试用的脚本化会话
//!
//! 按学号预先设定门户的返回，记录导航、打开、关闭次数

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use result_harvester::browser::{Locator, Session, SessionFactory, WaitCondition};
use result_harvester::config::{Config, PortalLayout};
use result_harvester::error::{SessionError, SessionResult};
use result_harvester::services::RecordExtractor;
use result_harvester::workflow::{FetchFlow, FetchPolicy};

pub const PORTAL_URL: &str = "http://portal.test/results";

/// 单张成绩表
#[derive(Debug, Clone)]
pub struct FakeTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FakeTable {
    pub fn new(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn courses(rows: &[(&str, &str, &str, &str)]) -> Self {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|(name, grade, status, credits)| {
                vec![
                    name.to_string(),
                    grade.to_string(),
                    status.to_string(),
                    credits.to_string(),
                ]
            })
            .collect();
        Self {
            headers: ["Course Name", "Grade", "Status", "Credits"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows,
        }
    }
}

/// 一个学号对应的结果页
#[derive(Debug, Clone)]
pub struct PortalPage {
    pub hall_ticket: String,
    pub name: String,
    pub program: String,
    pub cgpa_block: String,
    pub tables: Vec<FakeTable>,
    pub sgpa_texts: Vec<String>,
    /// 这些位置的 SGPA 元素读取文本时报错
    pub unreadable_sgpa: Vec<usize>,
}

impl PortalPage {
    pub fn student(hall_ticket: &str, name: &str) -> Self {
        Self {
            hall_ticket: hall_ticket.to_string(),
            name: name.to_string(),
            program: "B TECH IN COMPUTER SCIENCE AND ENGINEERING".to_string(),
            cgpa_block: "CGPA : 8.12".to_string(),
            tables: vec![FakeTable::courses(&[
                ("Maths", "A", "P", "4"),
                ("Physics", "F", "F", "3"),
            ])],
            sgpa_texts: vec!["SGPA : 7.5".to_string()],
            unreadable_sgpa: Vec::new(),
        }
    }

    pub fn with_tables(mut self, tables: Vec<FakeTable>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_sgpa(mut self, texts: &[&str]) -> Self {
        self.sgpa_texts = texts.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_unreadable_sgpa(mut self, positions: &[usize]) -> Self {
        self.unreadable_sgpa = positions.to_vec();
        self
    }
}

/// 门户对某个学号的表现
#[derive(Debug, Clone)]
pub enum Script {
    /// 正常返回结果页
    Page(PortalPage),
    /// 结果区域永远不出现
    Timeout,
    /// 结果区域出现但没有学生信息（门户查无此人）
    Missing,
    /// 前 `timeouts` 次提交都等不到结果，之后正常返回
    Flaky { timeouts: usize, then: PortalPage },
}

/// 计数器，所有会话共享
#[derive(Debug, Default)]
pub struct FakeStats {
    pub opens: AtomicUsize,
    pub failed_opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub navigations: AtomicUsize,
    submits: Mutex<HashMap<String, usize>>,
    visits: Mutex<Vec<(usize, String)>>,
}

impl FakeStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn failed_opens(&self) -> usize {
        self.failed_opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    /// 某个学号被提交查询的次数
    pub fn submits_for(&self, roll: &str) -> usize {
        self.submits.lock().unwrap().get(roll).copied().unwrap_or(0)
    }

    /// (会话编号, 学号)，按提交顺序
    pub fn visits(&self) -> Vec<(usize, String)> {
        self.visits.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone)]
pub enum FakeElement {
    Control(&'static str),
    Text(String),
    Table(usize),
    Row { table: usize, row: usize },
    Cell(String),
}

#[derive(Debug, Default)]
struct PageState {
    typed: Option<String>,
    shown: Option<String>,
}

pub struct FakeSession {
    id: usize,
    layout: PortalLayout,
    scripts: Arc<HashMap<String, Script>>,
    stats: Arc<FakeStats>,
    state: Mutex<PageState>,
}

impl FakeSession {
    fn shown_page(&self) -> Option<PortalPage> {
        let state = self.state.lock().unwrap();
        let roll = state.shown.as_ref()?;
        match self.scripts.get(roll) {
            Some(Script::Page(page)) => Some(page.clone()),
            Some(Script::Flaky { timeouts, then }) if self.stats.submits_for(roll) > *timeouts => {
                Some(then.clone())
            }
            _ => None,
        }
    }

    fn shown_script(&self) -> Option<Script> {
        let state = self.state.lock().unwrap();
        let roll = state.shown.as_ref()?;
        Some(self.scripts.get(roll).cloned().unwrap_or(Script::Missing))
    }

    fn lookup(&self, locator: &Locator) -> SessionResult<FakeElement> {
        let layout = &self.layout;
        let not_found = || SessionError::NotFound {
            locator: locator.to_string(),
        };

        if locator == &layout.roll_input {
            return Ok(FakeElement::Control("input"));
        }
        if locator == &layout.exam_type_dropdown {
            return Ok(FakeElement::Control("dropdown"));
        }
        if locator == &layout.exam_type_option {
            return Ok(FakeElement::Control("option"));
        }
        if locator == &layout.submit_button {
            return Ok(FakeElement::Control("submit"));
        }
        if locator == &layout.result_container {
            return match self.shown_script() {
                Some(Script::Page(_)) | Some(Script::Missing) => {
                    Ok(FakeElement::Control("container"))
                }
                Some(Script::Flaky { .. }) if self.shown_page().is_some() => {
                    Ok(FakeElement::Control("container"))
                }
                _ => Err(not_found()),
            };
        }

        let page = self.shown_page().ok_or_else(not_found)?;
        let text = if locator == &layout.hall_ticket {
            page.hall_ticket
        } else if locator == &layout.student_name {
            page.name
        } else if locator == &layout.program {
            page.program
        } else if locator == &layout.cgpa {
            page.cgpa_block
        } else if locator == &layout.result_table && !page.tables.is_empty() {
            return Ok(FakeElement::Table(0));
        } else {
            return Err(not_found());
        };
        Ok(FakeElement::Text(text))
    }
}

#[async_trait]
impl Session for FakeSession {
    type Element = FakeElement;

    async fn navigate(&mut self, _url: &str) -> SessionResult<()> {
        self.stats.navigations.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = PageState::default();
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> SessionResult<FakeElement> {
        self.lookup(locator)
    }

    async fn find_elements(&self, locator: &Locator) -> SessionResult<Vec<FakeElement>> {
        let Some(page) = self.shown_page() else {
            return Ok(Vec::new());
        };
        if locator == &self.layout.result_table {
            return Ok((0..page.tables.len()).map(FakeElement::Table).collect());
        }
        if locator == &self.layout.sgpa_text {
            let unreadable = page.unreadable_sgpa;
            return Ok(page
                .sgpa_texts
                .into_iter()
                .enumerate()
                .map(|(i, text)| {
                    if unreadable.contains(&i) {
                        FakeElement::Control("stale")
                    } else {
                        FakeElement::Text(text)
                    }
                })
                .collect());
        }
        Ok(self.lookup(locator).into_iter().collect())
    }

    async fn find_within(
        &self,
        parent: &FakeElement,
        locator: &Locator,
    ) -> SessionResult<Vec<FakeElement>> {
        let Some(page) = self.shown_page() else {
            return Ok(Vec::new());
        };
        let layout = &self.layout;

        let found = match parent {
            FakeElement::Table(t) => {
                let table = &page.tables[*t];
                if locator == &layout.header_cell {
                    table.headers.iter().cloned().map(FakeElement::Cell).collect()
                } else if locator == &layout.row {
                    // 第 0 行是表头行
                    (0..=table.rows.len())
                        .map(|row| FakeElement::Row { table: *t, row })
                        .collect()
                } else {
                    Vec::new()
                }
            }
            FakeElement::Row { table, row } if locator == &layout.data_cell && *row > 0 => page
                .tables[*table]
                .rows[*row - 1]
                .iter()
                .cloned()
                .map(FakeElement::Cell)
                .collect(),
            _ => Vec::new(),
        };
        Ok(found)
    }

    async fn wait_until(
        &self,
        _condition: WaitCondition,
        locator: &Locator,
        timeout: Duration,
    ) -> SessionResult<FakeElement> {
        self.lookup(locator).map_err(|_| SessionError::Timeout {
            locator: locator.to_string(),
            waited: timeout,
        })
    }

    async fn click(&self, element: &FakeElement) -> SessionResult<()> {
        if let FakeElement::Control("submit") = element {
            let mut state = self.state.lock().unwrap();
            let roll = state.typed.clone().unwrap_or_default();
            *self
                .stats
                .submits
                .lock()
                .unwrap()
                .entry(roll.clone())
                .or_default() += 1;
            self.stats.visits.lock().unwrap().push((self.id, roll.clone()));
            state.shown = Some(roll);
        }
        Ok(())
    }

    async fn type_text(&self, _element: &FakeElement, text: &str) -> SessionResult<()> {
        self.state.lock().unwrap().typed = Some(text.to_string());
        Ok(())
    }

    async fn read_text(&self, element: &FakeElement) -> SessionResult<String> {
        match element {
            FakeElement::Text(t) | FakeElement::Cell(t) => Ok(t.clone()),
            other => Err(SessionError::Unsupported(format!("{:?} 没有文本", other))),
        }
    }

    async fn close(self) -> SessionResult<()> {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 会话工厂，可以让前 `fail_first` 次 open 失败
#[derive(Clone)]
pub struct FakeFactory {
    scripts: Arc<HashMap<String, Script>>,
    stats: Arc<FakeStats>,
    fail_first: usize,
    attempts: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(scripts: HashMap<String, Script>) -> Self {
        Self {
            scripts: Arc::new(scripts),
            stats: Arc::new(FakeStats::default()),
            fail_first: 0,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn stats(&self) -> Arc<FakeStats> {
        Arc::clone(&self.stats)
    }

    /// 直接创建一个会话（不计入 open 次数）
    pub fn session(&self) -> FakeSession {
        FakeSession {
            id: 0,
            layout: PortalLayout::new(PORTAL_URL),
            scripts: Arc::clone(&self.scripts),
            stats: Arc::clone(&self.stats),
            state: Mutex::new(PageState::default()),
        }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn open(&self) -> SessionResult<FakeSession> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            self.stats.failed_opens.fetch_add(1, Ordering::SeqCst);
            return Err(SessionError::Launch("浏览器启动失败".to_string()));
        }
        let id = self.stats.opens.fetch_add(1, Ordering::SeqCst) + 1;
        let mut session = self.session();
        session.id = id;
        Ok(session)
    }
}

/// 所有等待和延迟都压到最短的配置
pub fn fast_config() -> Config {
    Config {
        portal_url: PORTAL_URL.to_string(),
        max_attempts: 3,
        wait_timeout_secs: 0,
        table_wait_timeout_secs: 0,
        retry_cooldown_secs: 0,
        success_delay_min_ms: 0,
        success_delay_max_ms: 0,
        ..Config::default()
    }
}

pub fn fast_flow() -> FetchFlow {
    flow_with_cooldown(Duration::ZERO)
}

pub fn flow_with_cooldown(retry_cooldown: Duration) -> FetchFlow {
    let layout = PortalLayout::new(PORTAL_URL);
    let extractor = RecordExtractor::new(layout.clone(), Duration::from_millis(10));
    let policy = FetchPolicy {
        max_attempts: 3,
        wait_timeout: Duration::from_millis(10),
        retry_cooldown,
        success_delay: (Duration::ZERO, Duration::ZERO),
        verbose_logging: false,
    };
    FetchFlow::new(layout, extractor, policy)
}

pub fn scripts(entries: Vec<(&str, Script)>) -> HashMap<String, Script> {
    entries
        .into_iter()
        .map(|(roll, script)| (roll.to_string(), script))
        .collect()
}
