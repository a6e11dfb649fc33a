//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for API Runner,
//! including the shared HTTP session, case file discovery and i18n support.
//!
//! 此模块为 API Runner 提供基础设施服务，
//! 包括共享 HTTP 会话、用例文件发现和国际化支持。

pub mod fs;
pub mod http;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
