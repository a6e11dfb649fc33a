//! # Assertion Evaluator Module / 断言求值模块
//!
//! Evaluates declarative assertions (`eq`, `contains`, `regex`, `type`,
//! `gt`, `gte`, `lt`, `lte`) against a nested JSON value. Evaluation is
//! exhaustive: every declared check runs and each failure becomes one
//! [`Violation`]. Nothing here returns an error or panics.
//!
//! 针对嵌套 JSON 值执行声明式断言。求值是穷尽的：每个声明的检查都会运行，
//! 每个失败都记录为一个 [`Violation`]。此处不会返回错误，也不会 panic。

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::core::path;

/// The closed set of assertion operators a case document may declare.
/// 用例文档可声明的断言操作符的封闭集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Deep equality / 深度相等
    Eq,
    /// Substring of the string form / 字符串形式的子串
    Contains,
    /// Regular expression anchored at the start / 从开头锚定的正则匹配
    Regex,
    /// Runtime type name / 运行时类型名称
    Type,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Contains => "contains",
            Operator::Regex => "regex",
            Operator::Type => "type",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `path -> expected value` pairs declared under one operator.
/// A `null` block (`eq: ~`) is accepted and skipped.
pub type Checks = Option<IndexMap<String, Value>>;

/// An `assert` block: operator -> checks, in declaration order.
/// 一个 `assert` 块：操作符 -> 检查项，保持声明顺序。
pub type Assertions = IndexMap<Operator, Checks>;

/// One recorded check failure. Violations accumulate; they are never raised individually.
/// 一条记录的检查失败。违规会累积，不会单独抛出。
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// HTTP status mismatch; `actual` is `None` when no response was received.
    StatusCode { expected: u16, actual: Option<u16> },
    /// A field or path that had to exist does not.
    MissingField { path: String },
    /// A top-level response field differs from its declared value.
    FieldMismatch { field: String, expected: Value, actual: Value },
    /// A path referenced by an operator does not resolve.
    PathNotFound { operator: Operator, path: String },
    /// An operator comparison did not hold.
    Comparison { operator: Operator, path: String, expected: Value, actual: Value },
    /// The expectation itself cannot be applied (bad pattern, unknown type name, incomparable values).
    InvalidExpectation { operator: Operator, path: String, reason: String },
    /// A `list_check` target is not a list.
    NotAList { path: String },
    /// A `list_check` length mismatch.
    Length { path: String, expected: usize, actual: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::StatusCode { expected, actual: Some(actual) } => {
                write!(f, "[status_code] expected {expected}, actual {actual}")
            }
            Violation::StatusCode { expected, actual: None } => {
                write!(f, "[status_code] expected {expected}, but no response was received")
            }
            Violation::MissingField { path } => write!(f, "missing field: {path}"),
            Violation::FieldMismatch { field, expected, actual } => write!(
                f,
                "[response] {field}: expected {}, actual {}",
                display_value(expected),
                display_value(actual)
            ),
            Violation::PathNotFound { operator, path } => {
                write!(f, "[{operator}] field does not exist: {path}")
            }
            Violation::Comparison { operator, path, expected, actual } => {
                let relation = match operator {
                    Operator::Eq => "",
                    Operator::Contains => "contains ",
                    Operator::Regex => "matches ",
                    Operator::Type => "type ",
                    Operator::Gt => "> ",
                    Operator::Gte => ">= ",
                    Operator::Lt => "< ",
                    Operator::Lte => "<= ",
                };
                write!(
                    f,
                    "[{operator}] {path}: expected {relation}{}, actual {}",
                    display_value(expected),
                    display_value(actual)
                )
            }
            Violation::InvalidExpectation { operator, path, reason } => {
                write!(f, "[{operator}] {path}: {reason}")
            }
            Violation::NotAList { path } => write!(f, "{path} is not a list"),
            Violation::Length { path, expected, actual } => {
                write!(f, "[length] {path}: expected {expected}, actual {actual}")
            }
        }
    }
}

/// Renders a value for messages and substitutions: strings without quotes,
/// everything else as compact JSON.
/// 渲染值用于消息与替换：字符串不带引号，其余为紧凑 JSON。
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Joins a base path and a relative path with `.`, tolerating an empty base.
pub fn join_path(base: &str, path: &str) -> String {
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{base}.{path}")
    }
}

/// Evaluates every check in `assertions` against `root` and returns the violations
/// in declaration order. `base_path` only prefixes the reported paths.
///
/// 针对 `root` 执行 `assertions` 中的每个检查，并按声明顺序返回违规列表。
/// `base_path` 仅用作报告路径的前缀。
pub fn evaluate(root: &Value, assertions: &Assertions, base_path: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    evaluate_into(root, assertions, base_path, &mut violations);
    violations
}

/// Same as [`evaluate`], appending into an existing violation list.
pub fn evaluate_into(
    root: &Value,
    assertions: &Assertions,
    base_path: &str,
    violations: &mut Vec<Violation>,
) {
    for (operator, checks) in assertions {
        let Some(checks) = checks else {
            continue;
        };
        for (key, expected) in checks {
            let full = join_path(base_path, key);
            match path::resolve(root, key) {
                Ok(actual) => {
                    if let Some(violation) = apply(*operator, &full, actual, expected) {
                        violations.push(violation);
                    }
                }
                Err(_) => violations.push(Violation::PathNotFound {
                    operator: *operator,
                    path: full,
                }),
            }
        }
    }
}

/// Applies a single operator. Returns `None` when the check holds.
/// 执行单个操作符；检查通过时返回 `None`。
pub fn apply(operator: Operator, path: &str, actual: &Value, expected: &Value) -> Option<Violation> {
    let mismatch = || Violation::Comparison {
        operator,
        path: path.to_string(),
        expected: expected.clone(),
        actual: actual.clone(),
    };
    let invalid = |reason: String| Violation::InvalidExpectation {
        operator,
        path: path.to_string(),
        reason,
    };

    match operator {
        Operator::Eq => (!values_equal(actual, expected)).then(mismatch),
        Operator::Contains => {
            let haystack = display_value(actual);
            let needle = display_value(expected);
            (!haystack.contains(&needle)).then(mismatch)
        }
        Operator::Regex => {
            let pattern = display_value(expected);
            match Regex::new(&pattern) {
                Ok(re) => {
                    let matched = re
                        .find(&display_value(actual))
                        .is_some_and(|m| m.start() == 0);
                    (!matched).then(mismatch)
                }
                Err(e) => Some(invalid(format!("invalid pattern {pattern:?}: {e}"))),
            }
        }
        Operator::Type => {
            let name = display_value(expected);
            match ValueType::parse(&name) {
                Some(kind) if kind.matches(actual) => None,
                Some(_) => Some(Violation::Comparison {
                    operator,
                    path: path.to_string(),
                    expected: expected.clone(),
                    actual: Value::String(ValueType::name_of(actual).to_string()),
                }),
                None => Some(invalid(format!("unknown type name {name:?}"))),
            }
        }
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            match compare(actual, expected) {
                Some(ordering) => {
                    let holds = match operator {
                        Operator::Gt => ordering == Ordering::Greater,
                        Operator::Gte => ordering != Ordering::Less,
                        Operator::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    };
                    (!holds).then(mismatch)
                }
                None => Some(invalid(format!(
                    "cannot compare {} with {}",
                    display_value(actual),
                    display_value(expected)
                ))),
            }
        }
    }
}

/// Deep equality where numbers compare by value, so `200` equals `200.0`.
/// 深度相等，数字按数值比较，因此 `200` 等于 `200.0`。
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => a == b,
    }
}

/// Orders two values when they are comparable: numbers numerically, strings
/// lexicographically. Anything else is incomparable.
fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                // One side is negative and the other above i64::MAX.
                _ if a.is_u64() && b.is_i64() => Some(Ordering::Greater),
                _ if a.is_i64() && b.is_u64() => Some(Ordering::Less),
                _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
            },
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Type names accepted by the `type` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    List,
    Mapping,
}

impl ValueType {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "str" | "string" => Some(ValueType::String),
            "int" | "integer" => Some(ValueType::Integer),
            "float" => Some(ValueType::Float),
            "bool" | "boolean" => Some(ValueType::Boolean),
            "list" | "array" => Some(ValueType::List),
            "dict" | "mapping" | "object" => Some(ValueType::Mapping),
            _ => None,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::String, Value::String(_)) => true,
            (ValueType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (ValueType::Float, Value::Number(n)) => n.is_f64(),
            (ValueType::Boolean, Value::Bool(_)) => true,
            (ValueType::List, Value::Array(_)) => true,
            (ValueType::Mapping, Value::Object(_)) => true,
            _ => false,
        }
    }

    fn name_of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_f64() => "float",
            Value::Number(_) => "integer",
            Value::String(_) => "string",
            Value::Array(_) => "list",
            Value::Object(_) => "mapping",
        }
    }
}
