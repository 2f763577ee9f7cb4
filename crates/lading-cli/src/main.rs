// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use lading_app::{AppState, TabKind, TableFetcher};
use lading_testkit::{StaticFetcher, demo_tables};
use runtime::FetchRuntime;
use std::env;
use std::path::PathBuf;

const DEMO_SEED: u64 = 7;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `lading --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let start_tab = config.start_tab()?;

    if options.demo {
        if options.check_only {
            return Ok(());
        }
        return launch(StaticFetcher::new(demo_tables(DEMO_SEED)), start_tab);
    }

    let client = lading_fetch::Client::new(
        &config.base_url(),
        config.api_key().as_deref(),
        config.timeout()?,
    )
    .with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/api_key/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        client.ping()?;
        return Ok(());
    }

    launch(client, start_tab)
}

fn launch<F>(fetcher: F, start_tab: TabKind) -> Result<()>
where
    F: TableFetcher + Sync,
{
    let mut state = AppState::default();
    state.active_tab = start_tab;

    let mut runtime = FetchRuntime::new(fetcher);
    lading_tui::run_app(&mut state, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        demo: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("lading");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch against an in-memory demo dataset");
    println!("  --check                  Validate config and ping the data API");
    println!("  --help                   Show this help");
}
