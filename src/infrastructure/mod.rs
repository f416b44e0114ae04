//! 基础设施层
//!
//! 持有稀缺资源（浏览器页面、输出文件），只暴露能力

pub mod chrome_session;
pub mod xlsx_writer;

pub use chrome_session::ChromeSession;
pub use xlsx_writer::write_xlsx;
