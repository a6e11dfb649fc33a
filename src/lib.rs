//! # API Runner Library / API Runner 库
//!
//! This library provides the core functionality for the API Runner tool,
//! a declarative, data-driven HTTP API test executor. Cases are YAML
//! documents with `request`, `expected` and `extract` steps; values
//! extracted by one case parameterize the requests of later cases.
//!
//! 此库为 API Runner 工具提供核心功能，
//! 这是一个声明式、数据驱动的 HTTP API 测试执行器。用例是包含 `request`、`expected`
//! 和 `extract` 步骤的 YAML 文档；一个用例提取的值可以参数化后续用例的请求。
//!
//! ## Modules / 模块
//!
//! - `core` - Execution and assertion engine
//! - `infra` - HTTP session, case file discovery and i18n
//! - `reporting` - Console and HTML reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 执行与断言引擎
//! - `infra` - HTTP 会话、用例文件发现和国际化
//! - `reporting` - 控制台与 HTML 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::execution;
pub use core::models;

/// Returns the best available locale for the system language.
///
/// It attempts to match the full locale (e.g., "zh-CN"), then just the
/// language code (e.g., "en"), and finally falls back to "en".
pub fn detect_locale() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    // Try to match the full locale first (e.g., "zh-CN")
    // Then try to match the language part only (e.g., "en" from "en-US")
    // Finally, fall back to "en"
    if available_locales.contains(&locale.as_str()) {
        locale
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
            .to_string()
    }
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
