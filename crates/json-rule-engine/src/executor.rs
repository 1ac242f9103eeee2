//! 规则执行器
//!
//! 包装已解析的规则树，提供单条评估、批量过滤以及带追踪信息的评估。

use crate::compiler::RuleParser;
use crate::error::Result;
use crate::models::{Condition, EvaluationResult, FieldRule, Rule};
use crate::operators::ConditionKind;
use crate::options::RuleOptions;
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// JSON 规则评估器
#[derive(Debug, Clone)]
pub struct JsonEvaluator {
    /// 原始规则定义（修改选项时据此重新解析）
    definition: Value,
    root: Rule,
    options: RuleOptions,
    required_fields: HashSet<String>,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl JsonEvaluator {
    /// 使用默认选项构建
    pub fn new(definition: &Value) -> Result<Self> {
        Self::with_options(definition, RuleOptions::default())
    }

    /// 从 JSON 字符串构建
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: Value = serde_json::from_str(json)?;
        Self::new(&definition)
    }

    pub fn with_options(definition: &Value, options: RuleOptions) -> Result<Self> {
        let root = RuleParser::new(options.clone()).parse(definition)?;
        let required_fields = root.fields();
        Ok(Self {
            definition: definition.clone(),
            root,
            options,
            required_fields,
            trace_enabled: false,
        })
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn evaluate(&self, record: &Value) -> bool {
        self.root.evaluate(record, &self.options)
    }

    /// 惰性过滤，保持输入顺序
    pub fn filter<I>(&self, records: I) -> impl Iterator<Item = I::Item>
    where
        I: IntoIterator,
        I::Item: Borrow<Value>,
    {
        records
            .into_iter()
            .filter(move |record| self.evaluate(<I::Item as Borrow<Value>>::borrow(record)))
    }

    /// 过滤 JSON 数组中匹配的对象元素；非数组输入不产生结果
    pub fn filter_array<'a>(&'a self, records: &'a Value) -> impl Iterator<Item = &'a Value> {
        records
            .as_array()
            .into_iter()
            .flatten()
            .filter(|record| record.is_object())
            .filter(move |record| self.evaluate(record))
    }

    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    /// 替换比较选项并按原始定义重新转换比较值，失败时保留原规则树
    pub fn set_options(&mut self, options: RuleOptions) -> Result<()> {
        let root = RuleParser::new(options.clone()).parse(&self.definition)?;
        debug!(
            locale = %options.locale,
            ignore_case = options.compare.ignore_case,
            ignore_accents = options.compare.ignore_accents,
            "比较选项已更新"
        );
        self.root = root;
        self.options = options;
        Ok(())
    }

    pub fn root(&self) -> &Rule {
        &self.root
    }

    /// 规则中使用的所有字段路径
    pub fn required_fields(&self) -> &HashSet<String> {
        &self.required_fields
    }

    pub fn to_friendly_string(&self) -> String {
        self.root.to_friendly_string()
    }

    /// 执行带追踪信息的规则评估
    pub fn explain(&self, record: &Value) -> EvaluationResult {
        let start = Instant::now();
        let mut result = EvaluationResult::new();

        let matched = self.explain_node(&self.root, record, &mut result, "root");
        result.matched = matched;
        result.evaluation_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        debug!(
            matched = result.matched,
            elapsed_us = result.evaluation_time_us,
            "规则评估完成"
        );
        result
    }

    fn explain_node(
        &self,
        node: &Rule,
        record: &Value,
        result: &mut EvaluationResult,
        path: &str,
    ) -> bool {
        match node {
            Rule::Field(rule) => self.explain_field(rule, record, result, path),
            Rule::Condition(condition) => self.explain_condition(condition, record, result, path),
        }
    }

    fn explain_field(
        &self,
        rule: &FieldRule,
        record: &Value,
        result: &mut EvaluationResult,
        path: &str,
    ) -> bool {
        let matched = rule.evaluate(record, &self.options);

        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{}: {} => {}",
                path,
                rule,
                if matched { "MATCHED" } else { "NOT_MATCHED" }
            ));
        }

        if matched {
            result
                .matched_conditions
                .push(format!("{}: {}", path, rule.to_friendly_string()));
        }

        matched
    }

    /// 评估条件节点（短路求值）
    fn explain_condition(
        &self,
        condition: &Condition,
        record: &Value,
        result: &mut EvaluationResult,
        path: &str,
    ) -> bool {
        let kind = condition.kind();
        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{}: 开始评估 {} 组 (共 {} 个子节点)",
                path,
                kind,
                condition.children().len()
            ));
        }

        // AND 遇到 false、OR 遇到 true 立即返回
        let short_circuit_on = kind == ConditionKind::Or;
        let mut matched = !short_circuit_on;
        for (i, child) in condition.children().iter().enumerate() {
            let child_path = format!("{}.rules[{}]", path, i);
            if self.explain_node(child, record, result, &child_path) == short_circuit_on {
                if self.trace_enabled {
                    result
                        .evaluation_trace
                        .push(format!("{}: {} 短路 - 子节点 {}", path, kind, i));
                }
                matched = short_circuit_on;
                break;
            }
        }

        if condition.is_negated() {
            if self.trace_enabled {
                result
                    .evaluation_trace
                    .push(format!("{}: NOT 取反 {} => {}", path, matched, !matched));
            }
            matched = !matched;
        }

        matched
    }
}

impl fmt::Display for JsonEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}
