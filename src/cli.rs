// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::{env, path::PathBuf};

use crate::infra::t;

pub mod commands {
    pub mod init;
    pub mod run;
}

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|arg| arg == "--lang")
        .and_then(|pos| args.get(pos + 1).cloned())
}

/// Installs the `env_logger` backend of the `log` facade.
/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .try_init();
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("api-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli_verbose", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value("ApiRunner.toml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("cases")
                        .long("cases")
                        .help(t!("arg_cases", locale = locale).to_string())
                        .value_name("PATH")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("base-url")
                        .long("base-url")
                        .help(t!("arg_base_url", locale = locale).to_string())
                        .value_name("URL")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .help(t!("arg_filter", locale = locale).to_string())
                        .value_name("TEXT")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .help(t!("arg_tag", locale = locale).to_string())
                        .value_name("TAG")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("fail-fast")
                        .long("fail-fast")
                        .help(t!("arg_fail_fast", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg_init_output", locale = locale).to_string())
                        .value_name("PATH")
                        .default_value("ApiRunner.toml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let cli_language = pre_parse_language();
    let language = cli_language.clone().unwrap_or_else(crate::detect_locale);
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();
    init_logging(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let options = commands::run::RunOptions {
                config: run_matches
                    .get_one::<PathBuf>("config")
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from("ApiRunner.toml")),
                cases: run_matches.get_one::<PathBuf>("cases").cloned(),
                base_url: run_matches.get_one::<String>("base-url").cloned(),
                filter: run_matches.get_one::<String>("filter").cloned(),
                tags: run_matches
                    .get_many::<String>("tag")
                    .map(|tags| tags.cloned().collect())
                    .unwrap_or_default(),
                html: run_matches.get_one::<PathBuf>("html").cloned(),
                fail_fast: run_matches.get_flag("fail-fast"),
                language: cli_language,
            };
            commands::run::execute(options).await?;
        }
        Some(("init", init_matches)) => {
            let output = init_matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("ApiRunner.toml"));
            let force = init_matches.get_flag("force");
            let non_interactive = init_matches.get_flag("non-interactive");
            commands::init::execute(output, force, non_interactive, &language)?;
        }
        _ => {
            // No subcommand: print help.
            build_cli(&language).print_help()?;
        }
    }
    Ok(())
}
