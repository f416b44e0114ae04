//! 浏览器会话能力
//!
//! 抓取流程只依赖这里的 trait，不直接接触具体的浏览器驱动。
//! 一个 `Session` 对应一个独立的浏览器页面，由单个 worker 独占使用。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SessionResult;

/// 元素定位方式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Id(String),
    Class(String),
    Tag(String),
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Locator::Id(value.into())
    }

    pub fn class(value: impl Into<String>) -> Self {
        Locator::Class(value.into())
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Locator::Tag(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Locator::XPath(value.into())
    }

    /// 转换为 CSS 选择器，XPath 无法转换时返回 None
    pub fn to_css(&self) -> Option<String> {
        match self {
            Locator::Id(id) => Some(format!("#{}", id)),
            Locator::Class(class) => Some(format!(".{}", class)),
            Locator::Tag(tag) => Some(tag.clone()),
            Locator::Css(css) => Some(css.clone()),
            Locator::XPath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id={}", v),
            Locator::Class(v) => write!(f, "class={}", v),
            Locator::Tag(v) => write!(f, "tag={}", v),
            Locator::Css(v) => write!(f, "css={}", v),
            Locator::XPath(v) => write!(f, "xpath={}", v),
        }
    }
}

/// 等待条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// 元素出现在 DOM 中
    Present,
    /// 元素可点击
    Clickable,
}

/// 浏览器会话
///
/// 所有等待都必须带超时；`close` 消费会话，保证只释放一次
#[async_trait]
pub trait Session: Send + Sync {
    /// 元素句柄
    type Element: Send + Sync;

    async fn navigate(&mut self, url: &str) -> SessionResult<()>;

    /// 查找单个元素，不存在时返回 `SessionError::NotFound`
    async fn find_element(&self, locator: &Locator) -> SessionResult<Self::Element>;

    /// 查找所有匹配元素，可能为空
    async fn find_elements(&self, locator: &Locator) -> SessionResult<Vec<Self::Element>>;

    /// 在父元素内部查找所有匹配元素
    async fn find_within(
        &self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> SessionResult<Vec<Self::Element>>;

    /// 等待元素满足条件，超时返回 `SessionError::Timeout`
    async fn wait_until(
        &self,
        condition: WaitCondition,
        locator: &Locator,
        timeout: Duration,
    ) -> SessionResult<Self::Element>;

    async fn click(&self, element: &Self::Element) -> SessionResult<()>;

    /// 清空输入框后输入文本
    async fn type_text(&self, element: &Self::Element, text: &str) -> SessionResult<()>;

    async fn read_text(&self, element: &Self::Element) -> SessionResult<String>;

    async fn close(self) -> SessionResult<()>
    where
        Self: Sized;
}

/// 会话工厂
///
/// 每次 `open` 都得到一个全新的、互不共享的会话
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session + 'static;

    async fn open(&self) -> SessionResult<Self::Session>;
}
