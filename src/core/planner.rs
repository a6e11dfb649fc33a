//! # Execution Planner Module / 执行计划模块
//!
//! This module selects the cases of a run. Documents are validated up
//! front and narrowed by id/title filter and tags. The relative order of
//! the selected cases is never changed: a later case may depend on values
//! extracted by an earlier one.
//!
//! 此模块选择一次运行中的用例。文档会预先校验，并按 ID/标题过滤条件和标签筛选。
//! 所选用例的相对顺序不会改变：后面的用例可能依赖前面用例提取的值。

use anyhow::Result;

use crate::core::models::CaseDocument;

/// Narrowing criteria for a run.
/// 一次运行的筛选条件。
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    /// Substring of the case id or title / 用例 ID 或标题的子串
    pub text: Option<String>,
    /// Tags a case must all carry / 用例必须全部携带的标签
    pub tags: Vec<String>,
}

/// Represents the execution plan of a run.
/// 表示一次运行的执行计划。
#[derive(Debug)]
pub struct ExecutionPlan {
    /// The cases to execute, in document order.
    /// 要执行的用例，按文档顺序排列。
    pub cases_to_run: Vec<CaseDocument>,
    /// The number of cases excluded by the filter.
    /// 被过滤条件排除的用例数量。
    pub filtered_count: usize,
}

/// Creates an execution plan from the loaded documents.
///
/// Every document is parsed once so that a malformed case (unknown
/// operator, wrong field type) fails the run before any request is sent.
///
/// 根据加载的文档创建执行计划。每个文档都会预先解析一次，
/// 以便在发送任何请求之前就因格式错误的用例（未知操作符、字段类型错误）而失败。
pub fn plan_execution(cases: Vec<CaseDocument>, filter: &CaseFilter) -> Result<ExecutionPlan> {
    let total = cases.len();
    let mut cases_to_run = Vec::with_capacity(total);

    for document in cases {
        let case = document.parse()?;
        let text_ok = filter.text.as_deref().is_none_or(|needle| {
            case.id.contains(needle)
                || case.metadata.title.as_deref().is_some_and(|t| t.contains(needle))
        });
        let tags = case.metadata.tags();
        let tags_ok = filter.tags.iter().all(|tag| tags.contains(&tag.as_str()));
        if text_ok && tags_ok {
            cases_to_run.push(document);
        }
    }

    Ok(ExecutionPlan {
        filtered_count: total - cases_to_run.len(),
        cases_to_run,
    })
}
