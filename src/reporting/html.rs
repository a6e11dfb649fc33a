//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders the HTML run report with `maud`: summary counters,
//! one row per case with its reporting labels, and the collapsible
//! violation list of every failed case.
//!
//! 此模块使用 `maud` 渲染 HTML 运行报告：汇总计数、每个用例一行（包含其报告标签），
//! 以及每个失败用例可折叠的违规列表。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

use crate::core::models::CaseResult;
use crate::infra::t;
use crate::reporting::console::get_error_output_from_result;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", sans-serif; margin: 2rem; color: #222; }
h1 { font-weight: 600; }
.summary-container { display: flex; gap: 1.5rem; margin-bottom: 1.5rem; }
.summary-item { display: flex; flex-direction: column; align-items: center; }
.summary-item .count { font-size: 1.8rem; font-weight: 700; }
.passed-text { color: #2e7d32; } .failed-text { color: #c62828; } .skipped-text { color: #757575; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #ddd; padding: 0.5rem; text-align: left; vertical-align: top; }
.status-cell { display: inline-block; padding: 0.1rem 0.5rem; border-radius: 4px; color: #fff; }
.status-passed { background: #2e7d32; } .status-failed { background: #c62828; }
.status-error { background: #6a1b9a; } .status-skipped { background: #9e9e9e; }
.labels span { background: #eceff1; border-radius: 3px; padding: 0 0.3rem; margin-right: 0.3rem; font-size: 0.85em; }
.output-toggle { cursor: pointer; color: #1565c0; font-size: 0.85em; }
.output-content { white-space: pre-wrap; background: #fafafa; padding: 0.75rem; }
"#;

/// Embedded JavaScript for HTML report interactivity / HTML 报告交互性的嵌入式 JavaScript
const HTML_SCRIPT: &str = r#"
function toggleOutput(id) {
  var row = document.getElementById(id);
  row.style.display = row.style.display === 'none' ? 'table-row' : 'none';
}
"#;

/// Generates an HTML report from case results and writes it to `output_path`.
///
/// 从用例结果生成 HTML 报告并写入 `output_path`。
///
/// # Errors / 错误
/// Returns an error if the file cannot be written.
/// 如果无法写入文件，则返回错误。
pub fn generate_html_report(results: &[CaseResult], output_path: &Path, locale: &str) -> Result<()> {
    let markup = render_report(results, locale);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output_path, markup.into_string())
        .with_context(|| t!("html_report.write_failed", path = output_path.display()).to_string())
}

/// Renders the report markup.
pub fn render_report(results: &[CaseResult], locale: &str) -> Markup {
    let passed = results.iter().filter(|r| matches!(r, CaseResult::Passed { .. })).count();
    let failed = results.iter().filter(|r| r.is_failure()).count();
    let skipped = results.iter().filter(|r| r.is_skipped()).count();

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale).to_string()) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale).to_string()) }
                div class="summary-container" {
                    (summary_item(results.len(), "", &t!("html_report.summary.total", locale = locale)))
                    (summary_item(passed, "passed-text", &t!("html_report.summary.passed", locale = locale)))
                    (summary_item(failed, "failed-text", &t!("html_report.summary.failed", locale = locale)))
                    (summary_item(skipped, "skipped-text", &t!("html_report.summary.skipped", locale = locale)))
                }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.table.header.name", locale = locale).to_string()) }
                            th { (t!("html_report.table.header.labels", locale = locale).to_string()) }
                            th { (t!("html_report.table.header.status", locale = locale).to_string()) }
                            th { (t!("html_report.table.header.duration", locale = locale).to_string()) }
                        }
                    }
                    tbody {
                        @for (i, result) in results.iter().enumerate() {
                            (case_rows(i, result, locale))
                        }
                    }
                }
                script { (PreEscaped(HTML_SCRIPT)) }
            }
        }
    }
}

fn summary_item(count: usize, class: &str, label: &str) -> Markup {
    html! {
        div class="summary-item" {
            span class={ "count " (class) } { (count) }
            span class="label" { (label) }
        }
    }
}

fn case_rows(index: usize, result: &CaseResult, locale: &str) -> Markup {
    let case = result.case();
    let meta = &case.metadata;
    let output_id = format!("output-{index}");
    let duration = result
        .get_duration()
        .map(|d| format!("{:.2}s", d.as_secs_f64()))
        .unwrap_or_else(|| "N/A".to_string());

    html! {
        tr {
            td {
                strong { (case.id) }
                @if let Some(title) = &meta.title {
                    br; (title)
                }
                @if let Some(description) = &meta.description {
                    br; small { (description) }
                }
            }
            td class="labels" {
                @let classification = meta.classification();
                @if !classification.is_empty() {
                    div { (classification) }
                }
                @if let Some(severity) = &meta.severity {
                    span { (severity) }
                }
                @for tag in meta.tags() {
                    span { (tag) }
                }
            }
            td {
                div class={ "status-cell " (result.get_status_class()) } { (result.get_status_str(locale)) }
                @if result.is_failure() {
                    div class="output-toggle" onclick={ "toggleOutput('" (output_id) "')" } {
                        (t!("html_report.toggle_output", locale = locale).to_string())
                    }
                }
            }
            td { (duration) }
        }
        @if result.is_failure() {
            tr id=(output_id) style="display:none;" {
                td colspan="4" {
                    pre class="output-content" { (get_error_output_from_result(result, locale)) }
                }
            }
        }
    }
}
