use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::session::SessionFactory;
use crate::config::Config;
use crate::error::{SessionError, SessionResult};
use crate::infrastructure::ChromeSession;

/// 常见桌面 Chrome 的 UA，避免暴露 HeadlessChrome
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const HIDE_WEBDRIVER_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// 浏览器启动参数
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub user_agent: String,
    pub navigation_timeout: Duration,
    pub poll_interval: Duration,
}

impl LaunchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            headless: config.headless,
            chrome_executable: config.chrome_executable.as_ref().map(PathBuf::from),
            user_agent: DESKTOP_USER_AGENT.to_string(),
            navigation_timeout: config.wait_timeout(),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Chrome 会话工厂
///
/// 每次 `open` 启动一个独立的浏览器进程（独立的临时用户数据目录），
/// worker 之间不共享 cookie 和页面状态
pub struct ChromeLauncher {
    options: LaunchOptions,
}

impl ChromeLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(LaunchOptions::from_config(config))
    }
}

#[async_trait]
impl SessionFactory for ChromeLauncher {
    type Session = ChromeSession;

    async fn open(&self) -> SessionResult<ChromeSession> {
        launch_browser(&self.options, new_profile_dir()?).await
    }
}

/// 创建临时用户数据目录，随会话一起删除
pub fn new_profile_dir() -> SessionResult<TempDir> {
    tempfile::Builder::new()
        .prefix("result-harvester-")
        .tempdir()
        .map_err(|e| SessionError::Launch(format!("无法创建用户数据目录: {}", e)))
}

/// 启动浏览器并打开一个空白页
pub async fn launch_browser(
    options: &LaunchOptions,
    profile_dir: TempDir,
) -> SessionResult<ChromeSession> {
    info!("🚀 启动浏览器...");
    debug!("用户数据目录: {}", profile_dir.path().display());

    let mut builder = BrowserConfig::builder();
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = &options.chrome_executable {
        builder = builder.chrome_executable(path);
    }

    let config = builder
        .no_sandbox()
        .user_data_dir(profile_dir.path())
        .args(vec![
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--ignore-certificate-errors".to_string(),
            "--allow-insecure-localhost".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-agent={}", options.user_agent),
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            SessionError::Launch(e)
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        SessionError::Launch(e.to_string())
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        SessionError::Launch(e.to_string())
    })?;

    if let Err(e) = page.evaluate(HIDE_WEBDRIVER_JS.to_string()).await {
        debug!("隐藏 webdriver 标记失败: {}", e);
    }

    Ok(ChromeSession::new(
        browser,
        page,
        handler_task,
        options.navigation_timeout,
        options.poll_interval,
        profile_dir,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_dirs_are_unique_and_removed_on_drop() {
        let first = new_profile_dir().unwrap();
        let second = new_profile_dir().unwrap();
        let first_path = first.path().to_path_buf();

        assert_ne!(first_path, second.path());
        assert!(first_path.is_dir());
        assert!(first_path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("result-harvester-")));

        drop(first);
        assert!(!first_path.exists());
    }
}
