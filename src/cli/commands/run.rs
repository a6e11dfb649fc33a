//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command of the API Runner CLI, which
//! executes the YAML case documents against the service under test.
//!
//! 此模块实现了 API Runner CLI 的 `run` 命令，
//! 针对被测服务执行 YAML 用例文档。

use anyhow::Result;
use colored::*;
use indexmap::IndexMap;
use log::{debug, warn};
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::RunConfig,
        execution::run_test_case,
        extract::ExtractStore,
        models::{CaseDocument, CaseResult, CaseSummary},
        params, planner,
    },
    infra::{fs, http::Session, t},
    reporting::{
        console::{print_failure_details, print_summary},
        html::generate_html_report,
    },
};

/// Options of the `run` command, as parsed from the command line.
/// `run` 命令的选项，由命令行解析得到。
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Path to `ApiRunner.toml` / `ApiRunner.toml` 的路径
    pub config: PathBuf,
    /// Overrides `cases_dir` / 覆盖 `cases_dir`
    pub cases: Option<PathBuf>,
    /// Overrides `base_url` / 覆盖 `base_url`
    pub base_url: Option<String>,
    pub filter: Option<String>,
    pub tags: Vec<String>,
    /// Optional path for the HTML report / HTML 报告的可选路径
    pub html: Option<PathBuf>,
    /// Skip the remaining cases after the first failure / 首次失败后跳过剩余用例
    pub fail_fast: bool,
    /// Language given with `--lang`; wins over the config file.
    pub language: Option<String>,
}

/// Executes the run command with the provided options.
///
/// # Returns
/// `Ok(())` when every selected case passed, an error otherwise
pub async fn execute(options: RunOptions) -> Result<()> {
    let config = load_config(&options)?;
    let locale = options
        .language
        .clone()
        .unwrap_or_else(|| config.language.clone());
    rust_i18n::set_locale(&locale);

    let base_url = match &options.base_url {
        Some(url) => url.trim().to_string(),
        None => config.resolved_base_url()?,
    };
    println!("{}", t!("run.base_url", locale = locale, url = &base_url).cyan());

    let session = build_session(&config, &base_url)?;

    let mut store = ExtractStore::create(&config.extract_file)?;
    if let Some(path) = store.path() {
        debug!("Extract store cleared: {}", path.display());
    }

    let cases_dir = options.cases.clone().unwrap_or_else(|| config.cases_dir.clone());
    println!(
        "{}",
        t!("run.loading_cases", locale = locale, path = cases_dir.display())
    );
    let documents = fs::load_cases(&cases_dir)?;

    let filter = planner::CaseFilter {
        text: options.filter.clone(),
        tags: options.tags.clone(),
    };
    let plan = planner::plan_execution(documents, &filter)?;

    if plan.filtered_count > 0 {
        println!(
            "{}",
            t!(
                "run.filtered_cases",
                locale = locale,
                filtered = plan.filtered_count,
                total = plan.cases_to_run.len() + plan.filtered_count
            )
            .cyan()
        );
    }

    if plan.cases_to_run.is_empty() {
        println!("{}", t!("run.no_cases_to_run", locale = locale).green());
        return Ok(());
    }

    let stop_token = setup_signal_handler(&locale);
    let results = run_cases(
        &plan.cases_to_run,
        &session,
        &mut store,
        options.fail_fast,
        stop_token,
    )
    .await;

    print_summary(&results, &locale);

    if let Some(report_path) = &options.html {
        println!(
            "\n{}",
            t!("run.generating_html", locale = locale, path = report_path.display())
        );
        if let Err(e) = generate_html_report(&results, report_path, &locale) {
            eprintln!("{} {:#}", t!("run.html_failed", locale = locale).red(), e);
        }
    }

    let failures: Vec<&CaseResult> = results.iter().filter(|r| r.is_failure()).collect();
    if failures.is_empty() {
        println!("\n{}", t!("run.all_cases_passed", locale = locale).green().bold());
        Ok(())
    } else {
        print_failure_details(&failures, &locale);
        anyhow::bail!(t!("run.cases_failed", locale = locale, count = failures.len()).to_string())
    }
}

/// Loads the configuration file. A missing file at the given path falls
/// back to the defaults, so `--base-url` and `--cases` alone are enough
/// for a run.
fn load_config(options: &RunOptions) -> Result<RunConfig> {
    if options.config.exists() {
        RunConfig::load(&options.config)
    } else {
        warn!(
            "{}",
            t!("run.config_not_found", path = options.config.display())
        );
        Ok(RunConfig::default())
    }
}

/// Builds the shared HTTP session. Default header values may carry dynamic
/// parameters; `${extract:...}` has nothing to see yet at this point.
fn build_session(config: &RunConfig, base_url: &str) -> Result<Session> {
    let scratch = ExtractStore::in_memory();
    let headers: IndexMap<String, String> = config
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), params::resolve_str(value, &scratch)))
        .collect();
    Session::new(base_url, &headers, config.timeout())
}

/// Sets up a signal handler for graceful shutdown.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("run.shutdown_signal", locale = &locale).yellow());
            token_clone.cancel();
        }
    });

    token
}

/// Runs the planned cases one after another, in plan order.
///
/// Once the stop token fires (Ctrl-C, or the first failure under
/// `fail_fast`) every remaining case is reported as skipped. A case already
/// in flight runs to completion, bounded by the transport timeout.
///
/// 按计划顺序逐个运行用例。一旦停止令牌触发（Ctrl-C，或在 `fail_fast` 下首次失败），
/// 其余用例均报告为已跳过。正在执行的用例会运行至结束（受传输超时约束）。
pub async fn run_cases(
    cases: &[CaseDocument],
    session: &Session,
    store: &mut ExtractStore,
    fail_fast: bool,
    stop_token: CancellationToken,
) -> Vec<CaseResult> {
    let mut results = Vec::with_capacity(cases.len());

    for document in cases {
        if stop_token.is_cancelled() {
            results.push(skipped(document));
            continue;
        }

        let result = run_test_case(document, session, store).await;

        if fail_fast && result.is_failure() {
            stop_token.cancel();
        }
        results.push(result);
    }

    results
}

fn skipped(document: &CaseDocument) -> CaseResult {
    let metadata = document
        .parse()
        .map(|case| case.metadata)
        .unwrap_or_default();
    CaseResult::Skipped {
        case: CaseSummary {
            id: document.id.clone(),
            metadata,
        },
    }
}
