//! 浏览器层
//!
//! - `session` - 会话能力抽象（`Session` / `SessionFactory`）
//! - `headless` - 基于 chromiumoxide 启动独立浏览器进程

pub mod headless;
pub mod session;

pub use headless::{launch_browser, ChromeLauncher, LaunchOptions};
pub use session::{Locator, Session, SessionFactory, WaitCondition};
