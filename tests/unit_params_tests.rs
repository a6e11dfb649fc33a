//! # Dynamic Parameter Unit Tests / 动态参数单元测试
//!
//! Token grammar, per-occurrence rendering and structure preservation of
//! the `${...}` resolver.
//!
//! `${...}` 解析器的占位符语法、逐次渲染以及结构保持。

use api_runner::core::extract::ExtractStore;
use api_runner::core::params::{Token, resolve, resolve_str};
use regex::Regex;
use serde_json::json;

#[test]
fn random_int_is_six_digits_in_range() {
    let store = ExtractStore::in_memory();
    let digits = Regex::new(r"^\d{6}$").unwrap();
    for _ in 0..200 {
        let value = resolve_str("${random_int}", &store);
        assert!(digits.is_match(&value), "{value}");
        let n: u32 = value.parse().unwrap();
        assert!((100_000..=999_999).contains(&n));
    }
}

#[test]
fn random_is_six_alphanumerics() {
    let store = ExtractStore::in_memory();
    let value = resolve_str("${random}", &store);
    assert_eq!(value.len(), 6);
    assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn each_occurrence_is_rendered_independently() {
    let store = ExtractStore::in_memory();
    let distinct = (0..20)
        .map(|_| resolve_str("${uuid}|${uuid}", &store))
        .filter(|s| {
            let (a, b) = s.split_once('|').unwrap();
            a != b
        })
        .count();
    assert_eq!(distinct, 20);
}

#[test]
fn time_tokens_have_their_formats() {
    let store = ExtractStore::in_memory();
    assert!(Regex::new(r"^\d{10}$").unwrap().is_match(&resolve_str("${timestamp}", &store)));
    assert!(Regex::new(r"^\d{13}$").unwrap().is_match(&resolve_str("${timestamp_ms}", &store)));
    assert!(Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap().is_match(&resolve_str("${date}", &store)));
    assert!(
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$")
            .unwrap()
            .is_match(&resolve_str("${datetime}", &store))
    );
}

#[test]
fn env_and_extract_tokens() {
    // SAFETY: the variable name is unique to this test.
    unsafe { std::env::set_var("API_RUNNER_PARAMS_TEST_TOKEN", "s3cret") };
    let mut store = ExtractStore::in_memory();
    store.write("user_id", json!(42)).unwrap();

    assert_eq!(
        resolve_str("Bearer ${env:API_RUNNER_PARAMS_TEST_TOKEN}", &store),
        "Bearer s3cret"
    );
    assert_eq!(resolve_str("/users/${extract:user_id}", &store), "/users/42");
    assert_eq!(resolve_str("[${env:API_RUNNER_PARAMS_TEST_UNSET}]", &store), "[]");
    assert_eq!(resolve_str("[${extract:missing}]", &store), "[]");
}

#[test]
fn unknown_tokens_are_left_verbatim() {
    let store = ExtractStore::in_memory();
    assert_eq!(resolve_str("${nope} and ${ }", &store), "${nope} and ${ }");
    assert_eq!(Token::parse("nope"), None);
    assert_eq!(Token::parse("env:HOME"), Some(Token::Env("HOME")));
}

#[test]
fn structure_is_preserved() {
    let mut store = ExtractStore::in_memory();
    store.write("name", json!("alice")).unwrap();
    let document = json!({
        "${extract:name}": "${extract:name}",
        "list": ["${extract:name}", 1, true, null],
        "nested": {"deep": "hi ${extract:name}"},
        "count": 3
    });

    let resolved = resolve(&document, &store);
    assert_eq!(
        resolved,
        json!({
            "${extract:name}": "alice",
            "list": ["alice", 1, true, null],
            "nested": {"deep": "hi alice"},
            "count": 3
        })
    );
}
