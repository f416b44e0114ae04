//! Chrome 会话 - 基础设施层
//!
//! 持有浏览器进程和唯一的 page，只暴露 `Session` 定义的能力

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, Page};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::browser::session::{Locator, Session, WaitCondition};
use crate::error::{SessionError, SessionResult};

/// 基于 chromiumoxide 的浏览器会话
///
/// 被 drop 时会终止事件处理任务，浏览器子进程随 `Browser` 一起回收，
/// 用户数据目录在浏览器之后删除
pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
    poll_interval: Duration,
    profile_dir: Option<TempDir>,
}

impl ChromeSession {
    pub fn new(
        browser: Browser,
        page: Page,
        handler_task: JoinHandle<()>,
        navigation_timeout: Duration,
        poll_interval: Duration,
        profile_dir: TempDir,
    ) -> Self {
        Self {
            browser: Mutex::new(browser),
            page,
            handler_task,
            navigation_timeout,
            poll_interval,
            profile_dir: Some(profile_dir),
        }
    }

    /// 查找所有匹配元素，查询成功但没有节点时返回空列表
    async fn locate_all(&self, locator: &Locator) -> Result<Vec<Element>, CdpError> {
        let found = match locator {
            Locator::XPath(xpath) => self.page.find_xpaths(xpath.as_str()).await,
            other => {
                let css = other.to_css().unwrap_or_default();
                self.page.find_elements(css).await
            }
        };
        match found {
            Err(CdpError::NotFound) => Ok(Vec::new()),
            other => other,
        }
    }
}

/// 单个元素的查找结果
///
/// 只有查询成功且没有匹配节点才算 NotFound；其余 CDP 错误都是 Driver，可以重试
fn first_or_not_found<T>(locator: &Locator, found: Result<Vec<T>, CdpError>) -> SessionResult<T> {
    match found {
        Ok(elements) => elements.into_iter().next().ok_or_else(|| SessionError::NotFound {
            locator: locator.to_string(),
        }),
        Err(e) => Err(SessionError::Driver(e.to_string())),
    }
}

#[async_trait]
impl Session for ChromeSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        debug!("导航到: {}", url);
        match timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Driver(format!("导航到 {} 失败: {}", url, e))),
            Err(_) => Err(SessionError::Timeout {
                locator: url.to_string(),
                waited: self.navigation_timeout,
            }),
        }
    }

    async fn find_element(&self, locator: &Locator) -> SessionResult<Element> {
        first_or_not_found(locator, self.locate_all(locator).await)
    }

    async fn find_elements(&self, locator: &Locator) -> SessionResult<Vec<Element>> {
        Ok(self.locate_all(locator).await?)
    }

    async fn find_within(&self, parent: &Element, locator: &Locator) -> SessionResult<Vec<Element>> {
        let css = locator
            .to_css()
            .ok_or_else(|| SessionError::Unsupported(locator.to_string()))?;
        match parent.find_elements(css).await {
            Ok(elements) => Ok(elements),
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn wait_until(
        &self,
        condition: WaitCondition,
        locator: &Locator,
        wait: Duration,
    ) -> SessionResult<Element> {
        let poll = async {
            loop {
                if let Ok(element) = first_or_not_found(locator, self.locate_all(locator).await) {
                    let ready = match condition {
                        WaitCondition::Present => true,
                        WaitCondition::Clickable => element.clickable_point().await.is_ok(),
                    };
                    if ready {
                        return element;
                    }
                }
                sleep(self.poll_interval).await;
            }
        };

        timeout(wait, poll).await.map_err(|_| SessionError::Timeout {
            locator: locator.to_string(),
            waited: wait,
        })
    }

    async fn click(&self, element: &Element) -> SessionResult<()> {
        element.click().await?;
        Ok(())
    }

    async fn type_text(&self, element: &Element, text: &str) -> SessionResult<()> {
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn read_text(&self, element: &Element) -> SessionResult<String> {
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    async fn close(mut self) -> SessionResult<()> {
        if let Err(e) = self.page.clone().close().await {
            debug!("关闭页面失败: {}", e);
        }
        let browser = self.browser.get_mut();
        browser.close().await?;
        if let Err(e) = browser.wait().await {
            warn!("等待浏览器进程退出失败: {}", e);
        }
        if let Some(profile_dir) = self.profile_dir.take() {
            let path = profile_dir.path().display().to_string();
            if let Err(e) = profile_dir.close() {
                warn!("删除用户数据目录 {} 失败: {}", path, e);
            }
        }
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
