//! # Dynamic Parameter Module / 动态参数模块
//!
//! Rewrites `${...}` placeholder tokens inside every string of a case
//! document. The transform preserves structure: mapping keys are left
//! alone, values and list elements are resolved recursively, non-string
//! scalars pass through unchanged. Each occurrence of a token is rendered
//! independently, so `${random}` twice in one string yields two draws.
//!
//! 重写用例文档中每个字符串里的 `${...}` 占位符。该转换保持结构不变：
//! 映射的键不变，值和列表元素递归解析，非字符串标量原样保留。
//! 每次出现的占位符独立渲染，因此同一字符串中两个 `${random}` 会得到两次独立的随机值。
//!
//! | Token              | Replacement                                   |
//! |--------------------|-----------------------------------------------|
//! | `${timestamp}`     | Unix time, seconds                            |
//! | `${timestamp_ms}`  | Unix time, milliseconds                       |
//! | `${date}`          | `YYYY-MM-DD`                                  |
//! | `${datetime}`      | `YYYY-MM-DD HH:MM:SS`                         |
//! | `${random}`        | 6 characters from `[A-Za-z0-9]`               |
//! | `${random_int}`    | integer in `[100000, 999999]`                 |
//! | `${uuid}`          | version-4 UUID                                |
//! | `${env:NAME}`      | environment variable, empty if unset          |
//! | `${extract:NAME}`  | extract store value, empty if absent          |

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::{Captures, Regex};
use serde_json::Value;
use std::env;

use crate::core::extract::ExtractStore;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("token pattern is a valid regex"));

/// One placeholder of the substitution grammar.
/// 替换语法中的一个占位符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Timestamp,
    TimestampMs,
    Date,
    DateTime,
    Random,
    RandomInt,
    Uuid,
    Env(&'a str),
    Extract(&'a str),
}

impl<'a> Token<'a> {
    /// Parses the text between `${` and `}`. Unknown names yield `None`
    /// and are left in the string verbatim.
    pub fn parse(inner: &'a str) -> Option<Self> {
        if let Some(name) = inner.strip_prefix("env:") {
            return Some(Token::Env(name));
        }
        if let Some(name) = inner.strip_prefix("extract:") {
            return Some(Token::Extract(name));
        }
        match inner {
            "timestamp" => Some(Token::Timestamp),
            "timestamp_ms" => Some(Token::TimestampMs),
            "date" => Some(Token::Date),
            "datetime" => Some(Token::DateTime),
            "random" => Some(Token::Random),
            "random_int" => Some(Token::RandomInt),
            "uuid" => Some(Token::Uuid),
            _ => None,
        }
    }

    /// Produces a fresh replacement for this token.
    /// 为该占位符生成新的替换值。
    pub fn render(&self, store: &ExtractStore) -> String {
        match self {
            Token::Timestamp => Utc::now().timestamp().to_string(),
            Token::TimestampMs => Utc::now().timestamp_millis().to_string(),
            Token::Date => Local::now().format("%Y-%m-%d").to_string(),
            Token::DateTime => Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            Token::Random => rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(6)
                .map(char::from)
                .collect(),
            Token::RandomInt => rand::thread_rng().gen_range(100_000..=999_999).to_string(),
            Token::Uuid => uuid::Uuid::new_v4().to_string(),
            Token::Env(name) => env::var(name).unwrap_or_default(),
            Token::Extract(name) => store.get_string(name).unwrap_or_default(),
        }
    }
}

/// Substitutes every known token in `text`.
/// 替换 `text` 中所有已知的占位符。
pub fn resolve_str(text: &str, store: &ExtractStore) -> String {
    if !text.contains("${") {
        return text.to_string();
    }
    TOKEN_PATTERN
        .replace_all(text, |caps: &Captures| match Token::parse(&caps[1]) {
            Some(token) => token.render(store),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Returns a resolved copy of `value`.
/// 返回 `value` 解析后的副本。
pub fn resolve(value: &Value, store: &ExtractStore) -> Value {
    let mut resolved = value.clone();
    resolve_in_place(&mut resolved, store);
    resolved
}

/// Resolves `value` in place.
/// 原地解析 `value`。
pub fn resolve_in_place(value: &mut Value, store: &ExtractStore) {
    match value {
        Value::String(text) => {
            if text.contains("${") {
                *text = resolve_str(text, store);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| resolve_in_place(item, store)),
        Value::Object(map) => map.values_mut().for_each(|item| resolve_in_place(item, store)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_strings_are_unchanged() {
        let store = ExtractStore::in_memory();
        assert_eq!(resolve_str("hello world", &store), "hello world");
        assert_eq!(resolve_str("cost: $5 {x}", &store), "cost: $5 {x}");
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let store = ExtractStore::in_memory();
        assert_eq!(resolve_str("${nope}-${random_int}x", &store).len(), "${nope}-".len() + 7);
        assert!(resolve_str("${nope}", &store) == "${nope}");
    }

    #[test]
    fn random_int_is_six_digits_in_range() {
        let store = ExtractStore::in_memory();
        for _ in 0..50 {
            let out = resolve_str("${random_int}", &store);
            assert_eq!(out.len(), 6);
            assert!(out.chars().all(|c| c.is_ascii_digit()));
            let n: u32 = out.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn random_is_six_alphanumerics_drawn_per_occurrence() {
        let store = ExtractStore::in_memory();
        let out = resolve_str("${random}-${random}", &store);
        let (a, b) = out.split_once('-').unwrap();
        assert_eq!(a.len(), 6);
        assert_eq!(b.len(), 6);
        assert!(out.chars().filter(|c| *c != '-').all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn time_tokens_have_expected_shapes() {
        let store = ExtractStore::in_memory();
        let date = resolve_str("${date}", &store);
        assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
        let datetime = resolve_str("${datetime}", &store);
        assert!(chrono::NaiveDateTime::parse_from_str(&datetime, "%Y-%m-%d %H:%M:%S").is_ok());
        let secs: i64 = resolve_str("${timestamp}", &store).parse().unwrap();
        let millis: i64 = resolve_str("${timestamp_ms}", &store).parse().unwrap();
        assert!(millis / 1000 >= secs);
    }

    #[test]
    fn uuid_is_version_four() {
        let store = ExtractStore::in_memory();
        let id = uuid::Uuid::parse_str(&resolve_str("${uuid}", &store)).unwrap();
        assert_eq!(id.get_version_num(), 4);
    }

    #[test]
    fn env_lookup_falls_back_to_empty() {
        let store = ExtractStore::in_memory();
        assert_eq!(resolve_str("[${env:API_RUNNER_SURELY_UNSET_VAR}]", &store), "[]");
        let path = env::var("PATH").unwrap_or_default();
        assert_eq!(resolve_str("${env:PATH}", &store), path);
    }

    #[test]
    fn extract_lookup_uses_string_form() {
        let mut store = ExtractStore::in_memory();
        store.write("token", json!("abc123")).unwrap();
        store.write("uid", json!(42)).unwrap();
        assert_eq!(resolve_str("Bearer ${extract:token}", &store), "Bearer abc123");
        assert_eq!(resolve_str("/users/${extract:uid}", &store), "/users/42");
        assert_eq!(resolve_str("${extract:missing}", &store), "");
    }

    #[test]
    fn structure_is_preserved() {
        let mut store = ExtractStore::in_memory();
        store.write("id", json!(7)).unwrap();
        let doc = json!({
            "${extract:id}": "key untouched",
            "list": ["${extract:id}", 1, true, null, {"deep": "x${extract:id}"}],
            "n": 3.5
        });
        let out = resolve(&doc, &store);
        assert_eq!(
            out,
            json!({
                "${extract:id}": "key untouched",
                "list": ["7", 1, true, null, {"deep": "x7"}],
                "n": 3.5
            })
        );
    }
}
