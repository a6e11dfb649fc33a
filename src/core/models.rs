//! # Data Models Module / 数据模型模块
//!
//! This module defines the case document structures (`steps`, `request`,
//! `expected`, `extract`, `metadata`), the captured HTTP response, and the
//! per-case result reported at the end of a run. Field names follow the
//! YAML case document format exactly.
//!
//! 此模块定义用例文档结构（`steps`、`request`、`expected`、`extract`、`metadata`）、
//! 捕获的 HTTP 响应以及运行结束时报告的单个用例结果。字段名与 YAML 用例文档格式完全一致。

use crate::core::assertion::Assertions;
use crate::infra::t;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One declarative test case: an identifier, its ordered steps and reporting labels.
/// 一个声明式测试用例：标识符、有序步骤以及报告标签。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestCase {
    /// Case identifier; taken from the document key when not declared.
    /// 用例标识符；未声明时取自文档键。
    #[serde(default)]
    pub id: String,
    /// The steps to execute / 要执行的步骤
    #[serde(default)]
    pub steps: Steps,
    /// Descriptive labels for reporting, opaque to the engine.
    /// 用于报告的描述性标签，对引擎不透明。
    #[serde(default, alias = "meta")]
    pub metadata: CaseMetadata,
}

impl TestCase {
    /// Builds a case from a (possibly already resolved) document tree.
    /// 从（可能已解析过动态参数的）文档树构建用例。
    pub fn from_document(id: &str, document: Value) -> Result<Self> {
        let mut case: TestCase = serde_json::from_value(document)
            .with_context(|| t!("case.parse_failed", id = id).to_string())?;
        if case.id.is_empty() {
            case.id = id.to_string();
        }
        Ok(case)
    }

    /// The title to show in reports, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.metadata.title.as_deref().unwrap_or(&self.id)
    }
}

/// A case as loaded from disk, before dynamic parameters are resolved.
/// Keeping the raw tree lets `${extract:...}` see values written by earlier cases.
///
/// 从磁盘加载、尚未解析动态参数的用例。保留原始树使 `${extract:...}` 能看到前序用例写入的值。
#[derive(Debug, Clone)]
pub struct CaseDocument {
    pub id: String,
    /// The file the case was read from / 用例来源文件
    pub source: PathBuf,
    pub document: Value,
}

impl CaseDocument {
    /// Parses the unresolved tree; used to validate documents up front.
    pub fn parse(&self) -> Result<TestCase> {
        TestCase::from_document(&self.id, self.document.clone())
    }
}

/// The kinds of step a case may declare, in their fixed execution order.
/// 用例可声明的步骤类型，按固定执行顺序排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Request,
    Expected,
    Extract,
}

impl Step {
    /// Execution order, independent of the order keys appear in the document.
    pub const ORDER: [Step; 3] = [Step::Request, Step::Expected, Step::Extract];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Request => "request",
            Step::Expected => "expected",
            Step::Extract => "extract",
        })
    }
}

/// The `steps` block. Each step is optional.
/// `steps` 块，每个步骤都是可选的。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Steps {
    #[serde(default)]
    pub request: Option<RequestSpec>,
    #[serde(default)]
    pub expected: Option<ExpectedSpec>,
    #[serde(default)]
    pub extract: Option<ExtractSpec>,
}

impl Steps {
    /// Whether the given step is declared in this case.
    pub fn declares(&self, step: Step) -> bool {
        match step {
            Step::Request => self.request.is_some(),
            Step::Expected => self.expected.is_some(),
            Step::Extract => self.extract.is_some(),
        }
    }
}

fn default_method() -> String {
    "GET".to_string()
}

/// The `request` step: an HTTP call relative to the configured base URL.
/// `request` 步骤：相对于配置的基础 URL 的 HTTP 调用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSpec {
    /// HTTP verb, case-insensitive / HTTP 方法，不区分大小写
    #[serde(default = "default_method")]
    pub method: String,
    /// Path appended to the base URL / 追加到基础 URL 的路径
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: Option<IndexMap<String, Value>>,
    /// Query string parameters / 查询字符串参数
    #[serde(default)]
    pub params: Option<IndexMap<String, Value>>,
    /// JSON request body / JSON 请求体
    #[serde(default)]
    pub json: Option<Value>,
    /// Form fields (mapping) or a raw body (string).
    /// 表单字段（映射）或原始请求体（字符串）。
    #[serde(default)]
    pub data: Option<Value>,
    /// Multipart file upload / multipart 文件上传
    #[serde(default)]
    pub files: Option<FileUpload>,
    /// Per-request timeout in seconds / 单次请求超时（秒）
    #[serde(default)]
    pub timeout: Option<f64>,
}

fn default_field_name() -> String {
    "file".to_string()
}

fn default_mime_type() -> String {
    "application/octet-stream".to_string()
}

/// A file streamed as one multipart field.
/// 作为一个 multipart 字段流式上传的文件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpload {
    pub path: PathBuf,
    #[serde(rename = "fieldName", alias = "field_name", default = "default_field_name")]
    pub field_name: String,
    #[serde(rename = "mimeType", alias = "mime_type", default = "default_mime_type")]
    pub mime_type: String,
}

/// The `expected` step.
/// `expected` 步骤。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedSpec {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub response: Option<ResponseExpectation>,
}

/// Expectations on the parsed response body: top-level fields plus the `data` tier.
/// 对解析后响应体的期望：顶层字段以及 `data` 层。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseExpectation {
    #[serde(default)]
    pub data: Option<DataSpec>,
    /// Every other key: required to exist and equal / 其余键：必须存在且相等
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

/// Checks applied to the body's `data` field.
/// 应用于响应体 `data` 字段的检查。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSpec {
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default, rename = "assert")]
    pub assertions: Assertions,
    #[serde(default)]
    pub list_check: IndexMap<String, ListCheck>,
}

/// Checks applied to one homogeneous list inside `data`.
/// 应用于 `data` 中某个同构列表的检查。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCheck {
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub object_required_items: Vec<String>,
    #[serde(default)]
    pub every_item_assert: Assertions,
}

/// The `extract` step: variable name -> path expression into the response body.
/// `extract` 步骤：变量名 -> 响应体中的路径表达式。
pub type ExtractSpec = IndexMap<String, String>;

/// A single label or a list of labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Labels {
    One(String),
    Many(Vec<String>),
}

/// Reporting labels attached to a case.
/// 附加到用例的报告标签。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub epic: Option<String>,
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub story: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub tag: Option<Labels>,
    /// Unrecognized labels are kept for the reporters.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl CaseMetadata {
    pub fn tags(&self) -> Vec<&str> {
        match &self.tag {
            Some(Labels::One(tag)) => vec![tag.as_str()],
            Some(Labels::Many(tags)) => tags.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    /// `epic / feature / story` style classification, skipping absent levels.
    pub fn classification(&self) -> String {
        [&self.epic, &self.feature, &self.story]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// A captured HTTP response: everything the `expected` and `extract` steps need.
/// 捕获的 HTTP 响应：`expected` 与 `extract` 步骤所需的全部内容。
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub elapsed: Duration,
}

impl ApiResponse {
    /// Parses the body as JSON. A malformed body degrades to an empty mapping.
    /// 将响应体解析为 JSON；格式错误时降级为空映射。
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

/// Enumerates the possible reasons for a case failure.
/// 枚举用例失败的可能原因。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum FailureReason {
    /// The `expected` step recorded at least one violation.
    /// `expected` 步骤记录了至少一个违规。
    Assertion,
    /// The case could not be prepared or executed (bad document, unreadable upload, ...).
    /// 用例无法准备或执行（文档错误、上传文件不可读等）。
    Error,
}

/// Represents the final result of a single case execution.
/// 表示单个用例执行的最终结果。
#[derive(Debug, Clone)]
pub enum CaseResult {
    /// All declared expectations held / 所有声明的期望均成立
    Passed {
        case: CaseSummary,
        duration: Duration,
    },
    /// The case failed / 用例失败
    Failed {
        case: CaseSummary,
        /// The aggregated failure report / 汇总的失败报告
        output: String,
        /// Individual violation lines, empty for [`FailureReason::Error`].
        violations: Vec<String>,
        reason: FailureReason,
        duration: Duration,
    },
    /// The case was not run (interrupted or fail-fast).
    /// 用例未运行（被中断或快速失败）。
    Skipped { case: CaseSummary },
}

/// The identity and labels of a case, carried into reports.
#[derive(Debug, Clone, Default)]
pub struct CaseSummary {
    pub id: String,
    pub metadata: CaseMetadata,
}

impl From<&TestCase> for CaseSummary {
    fn from(case: &TestCase) -> Self {
        Self {
            id: case.id.clone(),
            metadata: case.metadata.clone(),
        }
    }
}

impl CaseResult {
    pub fn case(&self) -> &CaseSummary {
        match self {
            CaseResult::Passed { case, .. }
            | CaseResult::Failed { case, .. }
            | CaseResult::Skipped { case } => case,
        }
    }

    pub fn case_name(&self) -> &str {
        &self.case().id
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CaseResult::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CaseResult::Skipped { .. })
    }

    pub fn get_duration(&self) -> Option<Duration> {
        match self {
            CaseResult::Passed { duration, .. } | CaseResult::Failed { duration, .. } => {
                Some(*duration)
            }
            CaseResult::Skipped { .. } => None,
        }
    }

    /// Gets the CSS class for the status cell of the HTML report.
    pub fn get_status_class(&self) -> &'static str {
        match self {
            CaseResult::Passed { .. } => "status-passed",
            CaseResult::Failed { reason: FailureReason::Assertion, .. } => "status-failed",
            CaseResult::Failed { .. } => "status-error",
            CaseResult::Skipped { .. } => "status-skipped",
        }
    }

    /// Gets the localized status text.
    /// 获取本地化的状态文本。
    pub fn get_status_str(&self, locale: &str) -> String {
        match self {
            CaseResult::Passed { .. } => t!("report.status_passed", locale = locale).to_string(),
            CaseResult::Failed { reason: FailureReason::Assertion, .. } => {
                t!("report.status_failed", locale = locale).to_string()
            }
            CaseResult::Failed { .. } => t!("report.status_error", locale = locale).to_string(),
            CaseResult::Skipped { .. } => t!("report.status_skipped", locale = locale).to_string(),
        }
    }
}
