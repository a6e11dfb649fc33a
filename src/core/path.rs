//! # Path Resolver Module / 路径解析模块
//!
//! Resolves dot-separated key paths such as `data.items.0.id` against a
//! nested JSON tree. A numeric segment addresses a list index, any other
//! segment addresses a mapping key. Resolution fails closed with a
//! [`PathNotFound`] instead of panicking.
//!
//! 针对嵌套 JSON 树解析以点分隔的键路径，例如 `data.items.0.id`。
//! 数字段表示列表索引，其他段表示映射键。解析失败时返回 [`PathNotFound`]，而不会 panic。

use serde_json::Value;
use thiserror::Error;

/// Raised when a path expression does not address a value in the tree.
/// 当路径表达式无法定位树中的值时返回。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path '{path}' broke at segment '{segment}'")]
pub struct PathNotFound {
    /// The full path expression as written / 原始路径表达式
    pub path: String,
    /// The segment at which traversal stopped / 遍历中断处的路径段
    pub segment: String,
}

/// Splits a path expression into its segments.
///
/// Besides plain `a.b.0` paths, JSONPath-style spellings found in existing
/// case documents are accepted: a leading `$` or `$.` is dropped and
/// `items[0]` is read as `items.0`.
///
/// 将路径表达式拆分为段。除 `a.b.0` 形式外，也接受 JSONPath 风格写法：
/// 忽略开头的 `$` 或 `$.`，并将 `items[0]` 视为 `items.0`。
pub fn segments(path: &str) -> Vec<String> {
    let trimmed = path.trim();
    let trimmed = trimmed
        .strip_prefix("$.")
        .or_else(|| trimmed.strip_prefix('$'))
        .unwrap_or(trimmed);

    let mut out = Vec::new();
    for part in trimmed.split('.') {
        if part.is_empty() {
            continue;
        }
        // `items[0][1]` -> `items`, `0`, `1`
        let mut rest = part;
        if let Some(open) = rest.find('[') {
            let head = &rest[..open];
            if !head.is_empty() {
                out.push(head.to_string());
            }
            rest = &rest[open..];
            while let Some(stripped) = rest.strip_prefix('[') {
                match stripped.find(']') {
                    Some(close) => {
                        out.push(stripped[..close].to_string());
                        rest = &stripped[close + 1..];
                    }
                    None => {
                        out.push(stripped.to_string());
                        rest = "";
                    }
                }
            }
            if !rest.is_empty() {
                out.push(rest.to_string());
            }
        } else {
            out.push(rest.to_string());
        }
    }
    out
}

/// Resolves `path` against `root`, returning a reference into the tree.
///
/// At each segment: a mapping containing the key descends into that key,
/// a list with an in-bounds non-negative index descends into the element,
/// anything else fails. An empty path resolves to `root` itself.
///
/// 针对 `root` 解析 `path`，返回树中值的引用。
pub fn resolve<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathNotFound> {
    let mut current = root;
    for segment in segments(path) {
        let next = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index)),
            _ => None,
        };
        current = next.ok_or_else(|| PathNotFound {
            path: path.to_string(),
            segment: segment.clone(),
        })?;
    }
    Ok(current)
}
