//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `filter` - 按规则过滤 JSON 记录
//! - `check` - 校验规则并输出其展示形式
//! - `explain` - 输出每条记录的评估追踪
//!
//! # 使用示例
//!
//! ```bash
//! # 过滤 JSON 数组或逐行 JSON
//! json-rules filter --rule rule.json --data records.ndjson --ignore-case
//!
//! # 从标准输入读取记录
//! cat records.json | json-rules filter -r rule.json
//!
//! # 校验规则
//! json-rules check -r rule.json
//!
//! # 查看评估过程
//! json-rules explain -r rule.json -d records.json
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands, OptionArgs};
pub use runner::CommandRunner;
