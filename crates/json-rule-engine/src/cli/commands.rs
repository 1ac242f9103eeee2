//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// JSON 规则引擎命令行工具
#[derive(Parser, Debug)]
#[command(name = "json-rules")]
#[command(version, about = "JSON 规则评估工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 配置文件路径（TOML）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 日志级别 (trace, debug, info, warn, error)，默认取配置文件
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 比较选项参数，覆盖配置文件中的默认值
#[derive(Args, Debug, Clone, Default)]
pub struct OptionArgs {
    /// 字符串比较忽略大小写
    #[arg(long)]
    pub ignore_case: bool,

    /// 字符串比较忽略重音
    #[arg(long)]
    pub ignore_accents: bool,

    /// 区域设置（如 en-US、de-DE、invariant）
    #[arg(long)]
    pub locale: Option<String>,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 按规则过滤记录，以逐行 JSON 输出匹配的记录
    ///
    /// 输入可以是 JSON 数组，也可以是每行一个 JSON 对象。
    Filter {
        /// 规则文件
        #[arg(short, long)]
        rule: PathBuf,

        /// 数据文件（省略或 "-" 表示标准输入）
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// 解析规则并输出其展示形式与使用的字段
    Check {
        /// 规则文件
        #[arg(short, long)]
        rule: PathBuf,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// 输出每条记录的评估结果与追踪信息（JSON）
    Explain {
        /// 规则文件
        #[arg(short, long)]
        rule: PathBuf,

        /// 数据文件（"-" 表示标准输入）
        #[arg(short, long)]
        data: PathBuf,

        #[command(flatten)]
        options: OptionArgs,
    },
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_filter() {
        let cli = Cli::parse_from(["json-rules", "filter", "--rule", "rule.json"]);
        assert!(cli.config.is_none());
        assert!(cli.log_level.is_none());
        match cli.command {
            Commands::Filter {
                rule,
                data,
                options,
            } => {
                assert_eq!(rule, PathBuf::from("rule.json"));
                assert!(data.is_none());
                assert!(!options.ignore_case);
                assert!(options.locale.is_none());
            }
            _ => panic!("预期 Filter 命令"),
        }

        let cli = Cli::parse_from([
            "json-rules",
            "filter",
            "-r",
            "rule.json",
            "-d",
            "-",
            "--ignore-case",
            "--ignore-accents",
            "--locale",
            "de-DE",
            "-l",
            "debug",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Filter { data, options, .. } => {
                assert_eq!(data, Some(PathBuf::from("-")));
                assert!(options.ignore_case);
                assert!(options.ignore_accents);
                assert_eq!(options.locale.as_deref(), Some("de-DE"));
            }
            _ => panic!("预期 Filter 命令"),
        }
    }

    #[test]
    fn test_cli_parse_check_and_explain() {
        let cli = Cli::parse_from(["json-rules", "--config", "app.toml", "check", "-r", "r.json"]);
        assert_eq!(cli.config, Some(PathBuf::from("app.toml")));
        assert!(matches!(cli.command, Commands::Check { .. }));

        let cli = Cli::parse_from(["json-rules", "explain", "-r", "r.json", "-d", "data.json"]);
        match cli.command {
            Commands::Explain { rule, data, .. } => {
                assert_eq!(rule, PathBuf::from("r.json"));
                assert_eq!(data, PathBuf::from("data.json"));
            }
            _ => panic!("预期 Explain 命令"),
        }
    }

    #[test]
    fn test_explain_requires_data() {
        assert!(Cli::try_parse_from(["json-rules", "explain", "-r", "r.json"]).is_err());
    }
}
