use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::t;

/// Environment variable consulted when `base_url` is left empty.
/// 当 `base_url` 为空时读取的环境变量。
pub const SERVER_URL_ENV: &str = "SERVER_URL";

/// Represents the run configuration, loaded from `ApiRunner.toml`.
/// It locates the case documents, the extract store file and the service under test.
///
/// 代表从 `ApiRunner.toml` 加载的运行配置。
/// 它定位用例文档、提取存储文件以及被测服务。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// Defaults to "en" if not specified.
    ///
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    /// 如果未指定，则默认为 "en"。
    #[serde(default = "default_language")]
    pub language: String,

    /// Base URL of the service under test. `$VAR` / `${VAR}` are expanded;
    /// an empty value falls back to the `SERVER_URL` environment variable.
    ///
    /// 被测服务的基础 URL。会展开 `$VAR` / `${VAR}`；为空时回退到环境变量 `SERVER_URL`。
    #[serde(default)]
    pub base_url: String,

    /// Directory (or single file) holding the YAML case documents.
    /// 存放 YAML 用例文档的目录（或单个文件）。
    #[serde(default = "default_cases_dir")]
    pub cases_dir: PathBuf,

    /// Backing file of the extract store, truncated at the start of every run.
    /// 提取存储的支撑文件，每次运行开始时清空。
    #[serde(default = "default_extract_file")]
    pub extract_file: PathBuf,

    /// Default transport timeout in seconds; unset means no timeout.
    /// 默认传输超时（秒）；未设置表示不超时。
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Headers sent with every request. Values may use `${...}` dynamic parameters.
    /// 每个请求都会发送的请求头。值可以使用 `${...}` 动态参数。
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            base_url: String::new(),
            cases_dir: default_cases_dir(),
            extract_file: default_extract_file(),
            timeout_secs: None,
            headers: IndexMap::new(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_cases_dir() -> PathBuf {
    PathBuf::from("data/cases")
}

fn default_extract_file() -> PathBuf {
    PathBuf::from("config/extract.yaml")
}

impl RunConfig {
    /// Reads and parses a configuration file. Relative `cases_dir` and
    /// `extract_file` paths are resolved against the file's directory.
    ///
    /// 读取并解析配置文件。相对的 `cases_dir` 与 `extract_file` 路径以配置文件所在目录为基准解析。
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| t!("config_read_failed_path", path = path.display()).to_string())?;
        let mut config: RunConfig =
            toml::from_str(&content).with_context(|| t!("config_parse_failed").to_string())?;

        if let Some(root) = path.parent() {
            config.cases_dir = rebase(root, &config.cases_dir);
            config.extract_file = rebase(root, &config.extract_file);
        }
        Ok(config)
    }

    /// The effective base URL after variable expansion and the `SERVER_URL` fallback.
    /// 变量展开并应用 `SERVER_URL` 回退后的实际基础 URL。
    pub fn resolved_base_url(&self) -> Result<String> {
        let raw = self.base_url.trim();
        let expanded = if raw.is_empty() {
            env::var(SERVER_URL_ENV).unwrap_or_default()
        } else {
            shellexpand::env(raw)
                .with_context(|| t!("config_expand_failed", value = raw).to_string())?
                .into_owned()
        };
        if expanded.trim().is_empty() {
            anyhow::bail!(t!("config_missing_base_url", var = SERVER_URL_ENV).to_string());
        }
        Ok(expanded.trim().to_string())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn rebase(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || root.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
