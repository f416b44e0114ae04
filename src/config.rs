use std::str::FromStr;
use std::time::Duration;

use crate::browser::Locator;
use crate::error::{AppError, AppResult};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 并发 worker 数（每个 worker 独占一个浏览器会话）
    pub workers: usize,
    /// 成绩查询页面
    pub portal_url: String,
    /// 任务文件（TOML）
    pub job_file: String,
    /// 导出的 Excel 文件路径
    pub output_file: String,
    /// 是否使用无头浏览器
    pub headless: bool,
    /// 自定义浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 每个学号最多尝试次数
    pub max_attempts: u32,
    /// 单步等待超时（秒）
    pub wait_timeout_secs: u64,
    /// 等待成绩表出现的超时（秒）
    pub table_wait_timeout_secs: u64,
    /// 两次尝试之间的冷却时间（秒）
    pub retry_cooldown_secs: u64,
    /// 成功抓取后的随机延迟下限（毫秒）
    pub success_delay_min_ms: u64,
    /// 成功抓取后的随机延迟上限（毫秒）
    pub success_delay_max_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 3,
            portal_url: "https://aupulse.campx.in/aupulse/ums/results".to_string(),
            job_file: "harvest.toml".to_string(),
            output_file: default_output_file(),
            headless: true,
            chrome_executable: None,
            max_attempts: 3,
            wait_timeout_secs: 15,
            table_wait_timeout_secs: 10,
            retry_cooldown_secs: 5,
            success_delay_min_ms: 1000,
            success_delay_max_ms: 3000,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            workers: env_parse("HARVEST_WORKERS").unwrap_or(default.workers),
            portal_url: std::env::var("PORTAL_URL").unwrap_or(default.portal_url),
            job_file: std::env::var("JOB_FILE").unwrap_or(default.job_file),
            output_file: std::env::var("OUTPUT_FILE").unwrap_or(default.output_file),
            headless: env_parse("HEADLESS").unwrap_or(default.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            max_attempts: env_parse("MAX_ATTEMPTS").unwrap_or(default.max_attempts),
            wait_timeout_secs: env_parse("WAIT_TIMEOUT_SECS").unwrap_or(default.wait_timeout_secs),
            table_wait_timeout_secs: env_parse("TABLE_WAIT_TIMEOUT_SECS").unwrap_or(default.table_wait_timeout_secs),
            retry_cooldown_secs: env_parse("RETRY_COOLDOWN_SECS").unwrap_or(default.retry_cooldown_secs),
            success_delay_min_ms: env_parse("SUCCESS_DELAY_MIN_MS").unwrap_or(default.success_delay_min_ms),
            success_delay_max_ms: env_parse("SUCCESS_DELAY_MAX_MS").unwrap_or(default.success_delay_max_ms),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn table_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.table_wait_timeout_secs)
    }

    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.retry_cooldown_secs)
    }

    /// 检查无法单独从环境变量推断出错的组合
    pub fn validate(&self) -> AppResult<()> {
        if self.portal_url.trim().is_empty() {
            return Err(AppError::Config("PORTAL_URL 不能为空".to_string()));
        }
        if self.success_delay_min_ms > self.success_delay_max_ms {
            return Err(AppError::Config(format!(
                "SUCCESS_DELAY_MIN_MS ({}) 大于 SUCCESS_DELAY_MAX_MS ({})",
                self.success_delay_min_ms, self.success_delay_max_ms
            )));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn default_output_file() -> String {
    format!(
        "student_results_{}.xlsx",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// 成绩门户的页面结构
///
/// 门户没有稳定的 API，这里集中记录所有定位器，页面改版时只需修改这一处
#[derive(Clone, Debug)]
pub struct PortalLayout {
    pub url: String,
    pub roll_input: Locator,
    pub exam_type_dropdown: Locator,
    pub exam_type_option: Locator,
    pub submit_button: Locator,
    pub result_container: Locator,
    pub hall_ticket: Locator,
    pub student_name: Locator,
    pub program: Locator,
    pub cgpa: Locator,
    pub result_table: Locator,
    pub header_cell: Locator,
    pub row: Locator,
    pub data_cell: Locator,
    pub sgpa_text: Locator,
}

impl PortalLayout {
    pub fn new(url: impl Into<String>) -> Self {
        const RESULT: &str = "//*[@id='root']/div[2]/div[2]/div[2]/div/div[2]";
        Self {
            url: url.into(),
            roll_input: Locator::id("rollNo"),
            exam_type_dropdown: Locator::id("examType"),
            exam_type_option: Locator::xpath("//li[@data-value='general']"),
            submit_button: Locator::xpath("//button[text()='Get Result']"),
            result_container: Locator::xpath(RESULT),
            hall_ticket: Locator::xpath(format!("{}/div[1]/div[1]/p", RESULT)),
            student_name: Locator::xpath(format!("{}/div[1]/div[2]/p", RESULT)),
            program: Locator::xpath(format!("{}/div[1]/div[3]/p", RESULT)),
            cgpa: Locator::xpath(format!("{}/div[2]", RESULT)),
            result_table: Locator::class("css-1n196hx"),
            header_cell: Locator::tag("th"),
            row: Locator::tag("tr"),
            data_cell: Locator::tag("td"),
            sgpa_text: Locator::xpath("//div[contains(text(), 'SGPA')]"),
        }
    }
}

impl Default for PortalLayout {
    fn default() -> Self {
        Self::new(Config::default().portal_url)
    }
}
