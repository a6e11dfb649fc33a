//! # Console Reporting Module / 控制台报告模块
//!
//! This module handles the display of run reports in the console.
//! It provides functionality for printing colorful, formatted summaries with
//! internationalization support.
//!
//! 此模块处理控制台中运行报告的显示。
//! 它提供打印彩色格式化摘要的功能，支持国际化。

use colored::*;

use crate::core::models::{CaseResult, FailureReason};
use crate::infra::t;

/// Prints a formatted summary of case results to the console.
/// Displays a table with status, case id, classification and duration,
/// using color coding to highlight different statuses.
///
/// 在控制台打印格式化的用例结果摘要。
/// 显示一个包含状态、用例 ID、分类和持续时间的表格，使用颜色编码突出显示不同的状态。
///
/// # Output Format / 输出格式
/// ```text
/// --- Run Summary ---
///   - Passed     | login_ok                       | Shop / Login         |      0.12s
///   - Failed     | list_orders                    | Shop / Orders        |      0.30s
///   - Skipped    | delete_order                   |                      |        N/A
/// ```
pub fn print_summary(results: &[CaseResult], locale: &str) {
    println!("\n{}", t!("summary_banner", locale = locale).bold());

    for result in results {
        let status_str = result.get_status_str(locale);
        let duration_str = result
            .get_duration()
            .map(|d| format!("{:.2}s", d.as_secs_f64()))
            .unwrap_or_else(|| "N/A".to_string());

        let status_colored = match result {
            CaseResult::Passed { .. } => status_str.green(),
            CaseResult::Failed { reason: FailureReason::Assertion, .. } => status_str.red(),
            CaseResult::Failed { .. } => status_str.magenta(),
            CaseResult::Skipped { .. } => status_str.dimmed(),
        };

        println!(
            "  - {:<10} | {:<30} | {:<20} | {:>10}",
            status_colored,
            result.case_name(),
            result.case().metadata.classification(),
            duration_str
        );
    }

    let passed = results.iter().filter(|r| matches!(r, CaseResult::Passed { .. })).count();
    let failed = results.iter().filter(|r| r.is_failure()).count();
    let skipped = results.iter().filter(|r| r.is_skipped()).count();
    println!(
        "\n{}",
        t!(
            "summary_counts",
            locale = locale,
            total = results.len(),
            passed = passed,
            failed = failed,
            skipped = skipped
        )
    );
}

/// Prints every violation of every failed case.
///
/// 打印每个失败用例的所有违规信息。
pub fn print_failure_details(failures: &[&CaseResult], locale: &str) {
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            failures.len(),
            t!("report_header_failure", locale = locale).red(),
            result.case_name().cyan()
        );
        println!("\n{}\n", get_error_output_from_result(result, locale));
        println!("{}", "-".repeat(80));
    }
}

/// Gets the failure output of a result for display.
///
/// 获取结果的失败输出以供显示。
pub fn get_error_output_from_result(result: &CaseResult, locale: &str) -> String {
    match result {
        CaseResult::Failed { violations, .. } if !violations.is_empty() => {
            let mut text = t!("violation_count", locale = locale, count = violations.len()).to_string();
            for violation in violations {
                text.push_str("\n  - ");
                text.push_str(violation);
            }
            text
        }
        CaseResult::Failed { output, .. } => output.clone(),
        _ => t!("no_error_output", locale = locale).to_string(),
    }
}
