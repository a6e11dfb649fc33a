//! # Response Checker Module / 响应校验模块
//!
//! Runs the four assertion tiers of an `expected` step against a captured
//! response: HTTP status, top-level fields, the `data` object and the
//! homogeneous lists inside it. All violations are collected first; a
//! single [`AssertionFailure`] carrying the whole list is returned at the end.
//!
//! 针对捕获的响应执行 `expected` 步骤的四层断言：HTTP 状态码、顶层字段、`data` 对象
//! 及其中的同构列表。先收集所有违规，最后返回一个携带完整列表的 [`AssertionFailure`]。

use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::core::assertion::{self, Violation, join_path, values_equal};
use crate::core::models::{ApiResponse, DataSpec, ExpectedSpec, ListCheck};
use crate::core::path;

/// The aggregated failure of one `expected` step.
/// 单个 `expected` 步骤的汇总失败。
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render_report(.violations))]
pub struct AssertionFailure {
    pub violations: Vec<Violation>,
}

fn render_report(violations: &[Violation]) -> String {
    let mut report = format!("{} assertion(s) failed:", violations.len());
    for violation in violations {
        report.push_str("\n  - ");
        report.push_str(&violation.to_string());
    }
    report
}

/// Checks `response` against `expected`.
///
/// An absent expectation is a logged no-op. An absent response (transport
/// failure) is checked as an empty body with no status, so every declared
/// field is reported rather than the check aborting.
///
/// 根据 `expected` 校验 `response`。未声明期望时记录日志并跳过；
/// 响应缺失（传输失败）时按空响应体、无状态码处理，报告每个声明的字段。
pub fn check(
    response: Option<&ApiResponse>,
    expected: Option<&ExpectedSpec>,
) -> Result<(), AssertionFailure> {
    let Some(expected) = expected else {
        info!("No expected results declared, skipping assertions");
        return Ok(());
    };

    let violations = collect_violations(response, expected);
    if violations.is_empty() {
        info!("All assertions passed");
        Ok(())
    } else {
        let failure = AssertionFailure { violations };
        error!("{failure}");
        Err(failure)
    }
}

/// Evaluates every tier and returns the violations in evaluation order.
/// 评估所有层并按求值顺序返回违规列表。
pub fn collect_violations(response: Option<&ApiResponse>, expected: &ExpectedSpec) -> Vec<Violation> {
    let mut violations = Vec::new();
    let body = match response {
        Some(response) => response.json(),
        None => {
            warn!("No response available, every expectation is checked against an empty body");
            Value::Object(Default::default())
        }
    };
    debug!("Response body: {body}");

    if let Some(status) = expected.status_code {
        let actual = response.map(|r| r.status);
        if actual != Some(status) {
            violations.push(Violation::StatusCode { expected: status, actual });
        }
    }

    let Some(response_spec) = &expected.response else {
        return violations;
    };

    for (field, expected_value) in &response_spec.fields {
        match body.get(field) {
            None => violations.push(Violation::MissingField { path: field.clone() }),
            Some(actual) if !values_equal(actual, expected_value) => {
                violations.push(Violation::FieldMismatch {
                    field: field.clone(),
                    expected: expected_value.clone(),
                    actual: actual.clone(),
                })
            }
            Some(_) => {}
        }
    }

    if let Some(data_spec) = &response_spec.data {
        match body.get("data") {
            Some(data) => check_data(data, data_spec, &mut violations),
            None => warn!("Response has no `data` field, skipping data checks"),
        }
    }

    violations
}

fn check_data(data: &Value, spec: &DataSpec, violations: &mut Vec<Violation>) {
    for field in spec.required_fields.iter().filter(|f| !f.is_empty()) {
        if !has_key(data, field) {
            violations.push(Violation::MissingField {
                path: join_path("data", field),
            });
        }
    }

    assertion::evaluate_into(data, &spec.assertions, "data", violations);

    for (list_path, list_check) in &spec.list_check {
        check_list(data, list_path, list_check, violations);
    }
}

fn check_list(data: &Value, list_path: &str, spec: &ListCheck, violations: &mut Vec<Violation>) {
    let full = join_path("data", list_path);
    let items = match path::resolve(data, list_path) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            violations.push(Violation::NotAList { path: full });
            return;
        }
        Err(_) => {
            violations.push(Violation::MissingField { path: full });
            return;
        }
    };

    if let Some(length) = spec.length {
        if items.len() != length {
            violations.push(Violation::Length {
                path: full.clone(),
                expected: length,
                actual: items.len(),
            });
        }
    }

    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{full}[{index}]");
        for field in spec.object_required_items.iter().filter(|f| !f.is_empty()) {
            if !has_key(item, field) {
                violations.push(Violation::MissingField {
                    path: join_path(&item_path, field),
                });
            }
        }
        assertion::evaluate_into(item, &spec.every_item_assert, &item_path, violations);
    }
}

/// Membership test: a key of a mapping, or an element of a list.
fn has_key(container: &Value, field: &str) -> bool {
    match container {
        Value::Object(map) => map.contains_key(field),
        Value::Array(items) => items.iter().any(|item| item.as_str() == Some(field)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            status,
            body: body.to_string(),
            ..Default::default()
        }
    }

    fn expected(spec: Value) -> ExpectedSpec {
        serde_json::from_value(spec).unwrap()
    }

    #[test]
    fn matching_status_and_fields_pass() {
        let resp = response(200, json!({"code": 200, "msg": "success"}));
        let spec = expected(json!({
            "status_code": 200,
            "response": {"code": 200, "msg": "success"}
        }));
        assert!(collect_violations(Some(&resp), &spec).is_empty());
        assert!(check(Some(&resp), Some(&spec)).is_ok());
    }

    #[test]
    fn absent_expectation_is_noop() {
        assert!(check(None, None).is_ok());
    }

    #[test]
    fn list_length_and_required_items_both_reported() {
        let resp = response(200, json!({"data": {"items": [{"name": "x"}]}}));
        let spec = expected(json!({
            "response": {"data": {"list_check": {
                "items": {"length": 2, "object_required_items": ["id"]}
            }}}
        }));
        let violations = collect_violations(Some(&resp), &spec);
        assert_eq!(
            violations,
            vec![
                Violation::Length { path: "data.items".into(), expected: 2, actual: 1 },
                Violation::MissingField { path: "data.items[0].id".into() },
            ]
        );
    }

    #[test]
    fn every_item_assert_prefixes_index() {
        let resp = response(200, json!({"data": {"rows": [{"n": 1}, {"n": -1}]}}));
        let spec = expected(json!({
            "response": {"data": {"list_check": {"rows": {"every_item_assert": {"gt": {"n": 0}}}}}}
        }));
        let violations = collect_violations(Some(&resp), &spec);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].to_string().contains("data.rows[1].n"));
    }

    #[test]
    fn data_tier_reports_required_fields_and_assertions() {
        let resp = response(200, json!({"code": 0, "data": {"amount": 50, "currency": "EUR"}}));
        let spec = expected(json!({
            "status_code": 201,
            "response": {
                "code": 200,
                "msg": "ok",
                "data": {
                    "required_fields": ["amount", "owner", ""],
                    "assert": {"gt": {"amount": 100}, "eq": {"currency": "EUR"}},
                    "list_check": {"entries": {"length": 0}, "currency": {"length": 1}}
                }
            }
        }));
        let violations = collect_violations(Some(&resp), &spec);
        assert_eq!(
            violations,
            vec![
                Violation::StatusCode { expected: 201, actual: Some(200) },
                Violation::FieldMismatch { field: "code".into(), expected: json!(200), actual: json!(0) },
                Violation::MissingField { path: "msg".into() },
                Violation::MissingField { path: "data.owner".into() },
                Violation::Comparison {
                    operator: crate::core::assertion::Operator::Gt,
                    path: "data.amount".into(),
                    expected: json!(100),
                    actual: json!(50),
                },
                Violation::MissingField { path: "data.entries".into() },
                Violation::NotAList { path: "data.currency".into() },
            ]
        );
    }

    #[test]
    fn missing_response_reports_every_declared_field() {
        let spec = expected(json!({
            "status_code": 200,
            "response": {"code": 200, "msg": "success", "data": {"required_fields": ["id"]}}
        }));
        let failure = check(None, Some(&spec)).unwrap_err();
        assert_eq!(failure.violations.len(), 3);
        assert_eq!(
            failure.violations[0],
            Violation::StatusCode { expected: 200, actual: None }
        );
    }

    #[test]
    fn aggregated_report_lists_count_and_each_violation() {
        let resp = response(404, json!("not an object"));
        let spec = expected(json!({"status_code": 200, "response": {"code": 200}}));
        let failure = check(Some(&resp), Some(&spec)).unwrap_err();
        let report = failure.to_string();
        assert!(report.starts_with("2 assertion(s) failed:"));
        assert_eq!(report.lines().count(), 3);
        assert!(report.contains("  - [status_code] expected 200, actual 404"));
        assert!(report.contains("  - missing field: code"));
    }
}
