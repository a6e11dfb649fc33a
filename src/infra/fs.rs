//! # File System Operations Module / 文件系统操作模块
//!
//! This module discovers YAML case files and reads them into
//! [`CaseDocument`]s, keeping document order.
//!
//! 此模块发现 YAML 用例文件并将其读取为 [`CaseDocument`]，保持文档顺序。

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::models::CaseDocument;
use crate::infra::t;

/// Lists the `*.yml` / `*.yaml` files of a directory, sorted by file name.
/// A file path is returned as the only entry.
///
/// # Arguments
/// * `path` - A directory of case files, or a single case file
///
/// # Returns
/// The case files to load, in load order
pub fn discover_case_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !is_directory(path) {
        anyhow::bail!(t!("cases_dir_not_found", path = path.display()).to_string());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)
        .with_context(|| t!("cases_dir_not_found", path = path.display()).to_string())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_yaml(p))
        .collect();
    files.sort();
    Ok(files)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// Reads every case of one YAML file.
///
/// A top-level mapping is `case_id -> case`; a top-level sequence yields ids
/// `case_1`, `case_2`, ... An empty file yields no cases.
///
/// 读取一个 YAML 文件中的所有用例。顶层映射为 `用例ID -> 用例`；
/// 顶层序列生成 `case_1`、`case_2` 等 ID；空文件不产生用例。
pub fn read_case_file(path: &Path) -> Result<Vec<CaseDocument>> {
    let content = fs::read_to_string(path)
        .with_context(|| t!("case_file_read_failed", path = path.display()).to_string())?;
    let tree: Value = if content.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| t!("case_file_parse_failed", path = path.display()).to_string())?
    };

    let document = |id: String, document: Value| CaseDocument {
        id,
        source: path.to_path_buf(),
        document,
    };

    match tree {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map.into_iter().map(|(id, doc)| document(id, doc)).collect()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, doc)| document(format!("case_{}", i + 1), doc))
            .collect()),
        _ => anyhow::bail!(t!("case_file_parse_failed", path = path.display()).to_string()),
    }
}

/// Loads every case below `path` in discovery order.
pub fn load_cases(path: &Path) -> Result<Vec<CaseDocument>> {
    let mut cases = Vec::new();
    for file in discover_case_files(path)? {
        cases.extend(read_case_file(&file)?);
    }
    Ok(cases)
}

/// Checks if a path exists and is a directory.
///
/// # Arguments
/// * `path` - Path to check
///
/// # Returns
/// `true` if the path exists and is a directory, `false` otherwise
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}
