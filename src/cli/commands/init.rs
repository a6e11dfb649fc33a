//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command of the API Runner CLI. It
//! writes a commented `ApiRunner.toml` and an example case document next
//! to it, prompting for the base URL when attached to a terminal.
//!
//! 此模块实现了 API Runner CLI 的 `init` 命令。它会写入带注释的 `ApiRunner.toml`
//! 以及与之相邻的示例用例文档；连接到终端时会提示输入基础 URL。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::core::config::RunConfig;
use crate::infra::t;

const CONFIG_HEADER: &str = "\
# API Runner configuration / API Runner 配置
#
# base_url:     prefix of every request url; $VAR is expanded, empty falls back to SERVER_URL
# cases_dir:    directory of *.yml / *.yaml case documents
# extract_file: extract store, cleared at the start of every run
# timeout_secs: default transport timeout
# [headers]:    sent with every request, values may use ${env:NAME} and friends
";

/// The example case written next to a fresh configuration.
pub const EXAMPLE_CASE: &str = r#"# Example cases / 示例用例
login:
  metadata:
    title: Sign in with a valid account
    feature: Auth
    tag: smoke
  steps:
    request:
      method: POST
      url: /api/login
      json:
        username: demo
        password: "${env:DEMO_PASSWORD}"
        nonce: "${uuid}"
    expected:
      status_code: 200
      response:
        code: 0
        data:
          required_fields: [token]
          assert:
            type:
              token: str
    extract:
      token: data.token

profile:
  metadata:
    title: Read the signed-in profile
    feature: Auth
  steps:
    request:
      method: GET
      url: /api/profile
      headers:
        Authorization: "Bearer ${extract:token}"
    expected:
      status_code: 200
      response:
        data:
          required_fields: [id, name]
"#;

/// Executes the init command.
///
/// # Arguments
/// * `output` - Path of the configuration file to create
/// * `force` - Overwrite existing files
/// * `non_interactive` - Never prompt, use the defaults
/// * `language` - Language written to the configuration and used for messages
pub fn execute(output: PathBuf, force: bool, non_interactive: bool, language: &str) -> Result<()> {
    let interactive = !non_interactive && std::io::stdin().is_terminal();
    let theme = ColorfulTheme::default();

    if output.exists() && !force {
        if !interactive {
            println!("{}", t!("init.use_force", locale = language).yellow());
            anyhow::bail!(t!("init.file_exists", locale = language, path = output.display()).to_string());
        }
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", locale = language, path = output.display()))
            .default(false)
            .interact()
            .with_context(|| t!("init.confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let mut config = RunConfig {
        language: language.to_string(),
        timeout_secs: Some(30),
        ..Default::default()
    };
    if interactive {
        config.base_url = Input::with_theme(&theme)
            .with_prompt(t!("init.base_url_prompt", locale = language))
            .default("http://127.0.0.1:8000".to_string())
            .interact_text()
            .with_context(|| t!("init.confirmation_failed", locale = language).to_string())?;
    }
    config
        .headers
        .insert("User-Agent".to_string(), format!("api-runner/{}", env!("CARGO_PKG_VERSION")));

    write_config(&output, &config, language)?;

    let root = output.parent().map(Path::to_path_buf).unwrap_or_default();
    let example = root.join(&config.cases_dir).join("example.yml");
    write_example_case(&example, force, language)?;

    println!("{}", t!("init.next_steps", locale = language, path = output.display()));
    Ok(())
}

fn write_config(path: &Path, config: &RunConfig, language: &str) -> Result<()> {
    let body = toml::to_string_pretty(config)
        .with_context(|| t!("init.serialize_failed", locale = language).to_string())?;
    create_parent(path, language)?;
    fs::write(path, format!("{CONFIG_HEADER}\n{body}"))
        .with_context(|| t!("init.write_failed", locale = language, path = path.display()).to_string())?;

    println!(
        "{} {}",
        "✔".green(),
        t!("init.success", locale = language, path = path.display()).bold()
    );
    Ok(())
}

/// Writes the example case unless one is already there.
fn write_example_case(path: &Path, force: bool, language: &str) -> Result<()> {
    if path.exists() && !force {
        println!(
            "{}",
            t!("init.example_kept", locale = language, path = path.display()).yellow()
        );
        return Ok(());
    }
    create_parent(path, language)?;
    fs::write(path, EXAMPLE_CASE)
        .with_context(|| t!("init.write_failed", locale = language, path = path.display()).to_string())?;
    println!(
        "{} {}",
        "✔".green(),
        t!("init.success", locale = language, path = path.display()).bold()
    );
    Ok(())
}

fn create_parent(path: &Path, language: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).with_context(|| {
                t!("init.create_parent_dir_failed", locale = language, path = parent.display()).to_string()
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::fs::read_case_file;

    #[test]
    fn writes_config_and_example() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ApiRunner.toml");
        execute(output.clone(), false, true, "en").unwrap();

        let config = RunConfig::load(&output).unwrap();
        assert!(config.base_url.is_empty());
        assert_eq!(config.cases_dir, dir.path().join("data/cases"));

        let cases = read_case_file(&dir.path().join("data/cases/example.yml")).unwrap();
        let ids: Vec<_> = cases.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["login", "profile"]);
        for case in &cases {
            case.parse().unwrap();
        }
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ApiRunner.toml");
        fs::write(&output, "language = \"en\"\n").unwrap();

        assert!(execute(output.clone(), false, true, "en").is_err());
        assert_eq!(fs::read_to_string(&output).unwrap(), "language = \"en\"\n");

        execute(output.clone(), true, true, "en").unwrap();
        assert!(fs::read_to_string(&output).unwrap().contains("base_url"));
    }
}
