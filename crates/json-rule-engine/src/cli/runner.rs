//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑：读取规则与记录、评估、输出结果。

use std::fs;
use std::io::{self, Read as _, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::OptionArgs;
use crate::executor::JsonEvaluator;
use crate::models::EvaluationResult;
use crate::options::{Locale, RuleOptions};

/// 单条记录的追踪结果
#[derive(Debug, Serialize)]
struct ExplainEntry<'a> {
    index: usize,
    record: &'a Value,
    #[serde(flatten)]
    result: EvaluationResult,
}

/// 命令执行器
///
/// 持有配置文件给出的默认比较选项，命令行参数在其上覆盖。
pub struct CommandRunner {
    defaults: RuleOptions,
}

impl CommandRunner {
    pub fn new(defaults: RuleOptions) -> Self {
        Self { defaults }
    }

    /// 合并命令行选项与默认选项
    pub fn resolve_options(&self, args: &OptionArgs) -> RuleOptions {
        let mut options = self.defaults.clone();
        if let Some(locale) = &args.locale {
            options.locale = Locale::new(locale.as_str());
        }
        options.compare.ignore_case |= args.ignore_case;
        options.compare.ignore_accents |= args.ignore_accents;
        options
    }

    /// 执行 filter 命令，返回匹配的记录数
    pub fn run_filter(
        &self,
        rule: &Path,
        data: Option<&Path>,
        args: &OptionArgs,
        out: &mut impl Write,
    ) -> Result<usize> {
        let evaluator = self.load_evaluator(rule, args)?;
        let records = parse_records(&read_input(data)?)?;
        let matched = write_matches(&evaluator, &records, out)?;
        info!(total = records.len(), matched, "过滤完成");
        Ok(matched)
    }

    /// 执行 check 命令
    pub fn run_check(&self, rule: &Path, args: &OptionArgs, out: &mut impl Write) -> Result<()> {
        let evaluator = self.load_evaluator(rule, args)?;
        write_summary(&evaluator, out)
    }

    /// 执行 explain 命令
    pub fn run_explain(
        &self,
        rule: &Path,
        data: &Path,
        args: &OptionArgs,
        out: &mut impl Write,
    ) -> Result<()> {
        let evaluator = self.load_evaluator(rule, args)?.with_trace();
        let records = parse_records(&read_input(Some(data))?)?;
        write_explanations(&evaluator, &records, out)
    }

    fn load_evaluator(&self, rule: &Path, args: &OptionArgs) -> Result<JsonEvaluator> {
        let text = fs::read_to_string(rule)
            .with_context(|| format!("读取规则文件失败: {}", rule.display()))?;
        let definition: Value = serde_json::from_str(&text)
            .with_context(|| format!("规则文件不是有效的 JSON: {}", rule.display()))?;
        let options = self.resolve_options(args);
        debug!(locale = %options.locale, "加载规则");
        JsonEvaluator::with_options(&definition, options)
            .with_context(|| format!("规则定义无效: {}", rule.display()))
    }
}

/// 读取文件内容，`None` 或 "-" 表示标准输入
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            fs::read_to_string(p).with_context(|| format!("读取数据文件失败: {}", p.display()))
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("读取标准输入失败")?;
            Ok(buf)
        }
    }
}

/// 解析 JSON 数组或逐行 JSON，只保留对象记录
pub fn parse_records(text: &str) -> Result<Vec<Value>> {
    let trimmed = text.trim_start();
    let records: Vec<Value> = if trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed).context("数据不是有效的 JSON 数组")? {
            Value::Array(items) => items,
            _ => bail!("数据不是 JSON 数组"),
        }
    } else {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str::<Value>(line)
                    .with_context(|| format!("第 {} 行不是有效的 JSON", i + 1))
            })
            .collect::<Result<_>>()?
    };

    let total = records.len();
    let objects: Vec<Value> = records.into_iter().filter(Value::is_object).collect();
    if objects.len() < total {
        debug!(skipped = total - objects.len(), "跳过非对象记录");
    }
    Ok(objects)
}

fn write_matches(
    evaluator: &JsonEvaluator,
    records: &[Value],
    out: &mut impl Write,
) -> Result<usize> {
    let mut matched = 0;
    for record in evaluator.filter(records) {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
        matched += 1;
    }
    Ok(matched)
}

fn write_summary(evaluator: &JsonEvaluator, out: &mut impl Write) -> Result<()> {
    let mut fields: Vec<&str> = evaluator
        .required_fields()
        .iter()
        .map(String::as_str)
        .collect();
    fields.sort_unstable();

    writeln!(out, "rule:     {evaluator}")?;
    writeln!(out, "friendly: {}", evaluator.to_friendly_string())?;
    writeln!(out, "fields:   {}", fields.join(", "))?;
    Ok(())
}

fn write_explanations(
    evaluator: &JsonEvaluator,
    records: &[Value],
    out: &mut impl Write,
) -> Result<()> {
    let entries: Vec<ExplainEntry<'_>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| ExplainEntry {
            index,
            record,
            result: evaluator.explain(record),
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &entries)?;
    writeln!(out)?;
    Ok(())
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompareFlags;
    use serde_json::json;

    fn evaluator() -> JsonEvaluator {
        JsonEvaluator::new(&json!({
            "condition": "AND",
            "rules": [
                {"field": "product", "type": "string", "operator": "in", "value": ["hat", "shirt"]},
                {"field": "price", "type": "double", "operator": "less", "value": 20}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_array_and_ndjson() {
        let records = parse_records(r#"[{"a":1}, 2, {"a":3}]"#).unwrap();
        assert_eq!(records, vec![json!({"a": 1}), json!({"a": 3})]);

        let records = parse_records("{\"a\":1}\n\n{\"a\":2}\n").unwrap();
        assert_eq!(records.len(), 2);

        let err = parse_records("{\"a\":1}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("第 2 行"));
    }

    #[test]
    fn test_write_matches_as_ndjson() {
        let records = vec![
            json!({"product": "hat", "price": 10}),
            json!({"product": "shoe", "price": 10}),
            json!({"product": "shirt", "price": 15.5}),
        ];
        let mut out = Vec::new();
        let matched = write_matches(&evaluator(), &records, &mut out).unwrap();
        assert_eq!(matched, 2);
        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines, vec![records[0].clone(), records[2].clone()]);
    }

    #[test]
    fn test_write_summary() {
        let mut out = Vec::new();
        write_summary(&evaluator(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("fields:   price, product"));
        assert!(
            text.contains("friendly: ((`product` In [\"hat\",\"shirt\"]) AND (`price` Less 20))")
        );
    }

    #[test]
    fn test_write_explanations() {
        let records = vec![json!({"product": "hat", "price": 30})];
        let mut out = Vec::new();
        write_explanations(&evaluator().with_trace(), &records, &mut out).unwrap();
        let output: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(output[0]["index"], 0);
        assert_eq!(output[0]["matched"], false);
        assert!(!output[0]["evaluation_trace"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_options_overrides_defaults() {
        let runner = CommandRunner::new(RuleOptions::default().with_locale("de-DE"));
        let options = runner.resolve_options(&OptionArgs {
            ignore_case: true,
            ..Default::default()
        });
        assert_eq!(options.locale.tag(), "de-DE");
        assert_eq!(options.compare, CompareFlags::IGNORE_CASE);

        let options = runner.resolve_options(&OptionArgs {
            locale: Some("invariant".into()),
            ..Default::default()
        });
        assert!(options.locale.is_invariant());
    }
}
