//! # Case Execution Module / 用例执行模块
//!
//! Runs one case's steps in their fixed order, `request` -> `expected` ->
//! `extract`, against the shared session. A transport failure degrades to
//! "no response" and the later steps handle that on their own terms; the
//! only condition that fails a case is the [`AssertionFailure`] raised by
//! the `expected` step (plus I/O errors of the extract store).
//!
//! 按固定顺序 `request` -> `expected` -> `extract` 针对共享会话执行一个用例的步骤。
//! 传输失败会降级为"无响应"，后续步骤自行处理；唯一使用例失败的条件是 `expected`
//! 步骤产生的 [`AssertionFailure`]（以及提取存储的 I/O 错误）。

use anyhow::Result;
use colored::*;
use log::{debug, info, warn};
use std::time::Instant;

use crate::{
    core::{
        checker::{self, AssertionFailure},
        extract::ExtractStore,
        models::{
            ApiResponse, CaseDocument, CaseResult, CaseSummary, ExtractSpec, FailureReason,
            RequestSpec, Step, TestCase,
        },
        params, path,
    },
    infra::{http::Session, t},
};

/// The main entry point for running a single case document.
/// Resolves dynamic parameters against the current store, runs the case
/// and classifies the outcome.
///
/// 运行单个用例文档的主入口。基于当前存储解析动态参数，运行用例并对结果分类。
///
/// # Arguments
/// * `document` - The unresolved case document
/// * `session` - The HTTP session shared by the run
/// * `store` - The run's extract store
///
/// # Returns
/// A `CaseResult` describing the outcome
pub async fn run_test_case(
    document: &CaseDocument,
    session: &Session,
    store: &mut ExtractStore,
) -> CaseResult {
    let start_time = Instant::now();
    let resolved = params::resolve(&document.document, store);
    let case = match TestCase::from_document(&document.id, resolved) {
        Ok(case) => case,
        Err(e) => {
            let output = format!("{e:#}");
            println!("{}", t!("run.case_error", name = &document.id).red());
            return CaseResult::Failed {
                case: CaseSummary {
                    id: document.id.clone(),
                    ..Default::default()
                },
                output,
                violations: Vec::new(),
                reason: FailureReason::Error,
                duration: start_time.elapsed(),
            };
        }
    };

    println!("{}", t!("run.running_case", name = case.display_name()).blue());
    let outcome = run_case(&case, session, store).await;
    let duration = start_time.elapsed();
    let summary = CaseSummary::from(&case);

    match outcome {
        Ok(()) => {
            println!(
                "{}",
                t!("run.case_passed", name = &case.id, duration = format!("{:.2}", duration.as_secs_f64()))
                    .green()
            );
            CaseResult::Passed {
                case: summary,
                duration,
            }
        }
        Err(e) => {
            let (reason, violations) = match e.downcast_ref::<AssertionFailure>() {
                Some(failure) => (
                    FailureReason::Assertion,
                    failure.violations.iter().map(ToString::to_string).collect(),
                ),
                None => (FailureReason::Error, Vec::new()),
            };
            println!(
                "{}",
                t!("run.case_failed", name = &case.id, duration = format!("{:.2}", duration.as_secs_f64()))
                    .red()
            );
            CaseResult::Failed {
                case: summary,
                output: format!("{e:#}"),
                violations,
                reason,
                duration,
            }
        }
    }
}

/// Executes the declared steps of `case` in the order `request`, `expected`, `extract`.
///
/// Returns `Err` carrying an [`AssertionFailure`] when the `expected` step
/// records violations; extraction does not run after a failed check.
///
/// 按 `request`、`expected`、`extract` 的顺序执行 `case` 中声明的步骤。
/// 当 `expected` 步骤记录违规时返回携带 [`AssertionFailure`] 的 `Err`；检查失败后不再执行提取。
pub async fn run_case(case: &TestCase, session: &Session, store: &mut ExtractStore) -> Result<()> {
    let banner = "=".repeat(30);
    info!("{banner} case {} {banner}", case.id);

    let declared: Vec<String> = Step::ORDER
        .iter()
        .filter(|step| case.steps.declares(**step))
        .map(ToString::to_string)
        .collect();
    debug!("Declared steps: [{}]", declared.join(", "));

    let mut response: Option<ApiResponse> = None;
    for step in Step::ORDER {
        match step {
            Step::Request => {
                if let Some(spec) = &case.steps.request {
                    info!("1. Sending request");
                    response = send_request(session, spec).await;
                }
            }
            Step::Expected => {
                if let Some(expected) = &case.steps.expected {
                    info!("2. Checking response");
                    checker::check(response.as_ref(), Some(expected))?;
                }
            }
            Step::Extract => {
                if let Some(spec) = &case.steps.extract {
                    info!("3. Extracting variables");
                    extract_variables(response.as_ref(), spec, store)?;
                }
            }
        }
    }

    info!("{banner} case {} finished {banner}", case.id);
    Ok(())
}

/// Issues the request; any failure is logged and becomes `None`.
/// 发送请求；任何失败都会被记录并转换为 `None`。
async fn send_request(session: &Session, spec: &RequestSpec) -> Option<ApiResponse> {
    info!("{} {}", spec.method.to_ascii_uppercase(), session.url_for(&spec.url));
    debug!("{spec:?}");
    match session.send(spec).await {
        Ok(response) => {
            info!(
                "Response status {} in {:.2?}",
                response.status, response.elapsed
            );
            Some(response)
        }
        Err(e) => {
            warn!("Request failed: {e:#}");
            None
        }
    }
}

/// Resolves every `(name, path)` against the response body and stores the hits.
/// Misses are warnings, never failures.
///
/// 针对响应体解析每个 `(name, path)` 并存储命中的值。未命中仅记录警告，不会失败。
pub fn extract_variables(
    response: Option<&ApiResponse>,
    spec: &ExtractSpec,
    store: &mut ExtractStore,
) -> Result<()> {
    let Some(response) = response else {
        warn!("Cannot extract variables: the request produced no response");
        return Ok(());
    };

    let body = response.json();
    for (name, expression) in spec {
        match path::resolve(&body, expression) {
            Ok(value) => {
                info!("Extracted {name} = {value}");
                store.write(name.as_str(), value.clone())?;
            }
            Err(e) => warn!("Failed to extract {name} with '{expression}': {e}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extraction_writes_hits_and_skips_misses() {
        let response = ApiResponse {
            status: 200,
            body: json!({"data": {"token": "abc123", "user": {"id": 9}}}).to_string(),
            ..Default::default()
        };
        let mut spec = ExtractSpec::new();
        spec.insert("token".into(), "data.token".into());
        spec.insert("uid".into(), "$.data.user.id".into());
        spec.insert("ghost".into(), "data.nothing".into());

        let mut store = ExtractStore::in_memory();
        extract_variables(Some(&response), &spec, &mut store).unwrap();
        assert_eq!(store.get("token"), Some(&json!("abc123")));
        assert_eq!(store.get("uid"), Some(&json!(9)));
        assert_eq!(store.get("ghost"), None);
    }

    #[test]
    fn extraction_without_response_is_skipped() {
        let mut spec = ExtractSpec::new();
        spec.insert("token".into(), "data.token".into());
        let mut store = ExtractStore::in_memory();
        assert!(extract_variables(None, &spec, &mut store).is_ok());
        assert!(store.is_empty());
    }
}
