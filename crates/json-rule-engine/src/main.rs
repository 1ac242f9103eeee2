//! JSON 规则引擎命令行入口
//!
//! 按规则过滤 JSON 记录、校验规则、查看评估追踪。

use std::io::{self, Write as _};

use anyhow::{Context, Result};
use clap::Parser;
use json_rules::cli::{Cli, CommandRunner, Commands};
use json_rules::config::EngineConfig;
use json_rules::observability;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref()).context("加载配置失败")?;
    observability::init(&config.observability, cli.log_level.as_deref())?;
    debug!(environment = %config.environment, locale = %config.options.locale, "配置加载完成");

    let runner = CommandRunner::new(config.options.clone());
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Filter {
            rule,
            data,
            options,
        } => {
            runner.run_filter(&rule, data.as_deref(), &options, &mut out)?;
        }
        Commands::Check { rule, options } => {
            runner.run_check(&rule, &options, &mut out)?;
        }
        Commands::Explain {
            rule,
            data,
            options,
        } => {
            runner.run_explain(&rule, &data, &options, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
