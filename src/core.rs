//! # Core Module / 核心模块
//!
//! This module contains the execution and assertion engine of API Runner:
//! path resolution, assertion evaluation, response checking, dynamic
//! parameters, the extract store and the case runner.
//!
//! 此模块包含 API Runner 的执行与断言引擎：
//! 路径解析、断言求值、响应校验、动态参数、提取存储以及用例执行器。

pub mod assertion;
pub mod checker;
pub mod config;
pub mod execution;
pub mod extract;
pub mod models;
pub mod params;
pub mod path;
pub mod planner;

// Re-exports
pub use checker::AssertionFailure;
pub use config::RunConfig;
pub use execution::{run_case, run_test_case};
pub use extract::ExtractStore;
pub use models::{CaseResult, TestCase};
