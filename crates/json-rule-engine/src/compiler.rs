//! 规则解析器
//!
//! 将查询构建器格式的 JSON 规则解析成内存中的执行树。比较值在解析时立即转换，
//! 定义错误一律在此阶段返回，不会产生部分构建的规则树。

use crate::error::{Result, RuleError};
use crate::models::{Condition, FieldRule, Rule};
use crate::operators::{ConditionKind, FieldType, Operator};
use crate::options::RuleOptions;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

const CONDITION: &str = "condition";
const RULES: &str = "rules";
const NOT: &str = "not";
const FIELD: &str = "field";
const TYPE: &str = "type";
const OPERATOR: &str = "operator";
const VALUE: &str = "value";

/// 规则解析器
#[derive(Debug, Clone, Default)]
pub struct RuleParser {
    options: RuleOptions,
}

impl RuleParser {
    pub fn new(options: RuleOptions) -> Self {
        Self { options }
    }

    /// 从 JSON 字符串解析规则
    pub fn parse_str(&self, json: &str) -> Result<Rule> {
        let definition: Value = serde_json::from_str(json)?;
        self.parse(&definition)
    }

    /// 解析规则定义
    #[instrument(skip_all, level = "debug")]
    pub fn parse(&self, definition: &Value) -> Result<Rule> {
        match self.parse_node(definition) {
            Ok(rule) => {
                debug!(nodes = rule.node_count(), "规则解析完成");
                Ok(rule)
            }
            Err(e) => {
                warn!(error = %e, "规则解析失败");
                Err(e)
            }
        }
    }

    fn parse_node(&self, definition: &Value) -> Result<Rule> {
        let object = definition.as_object().ok_or_else(|| RuleError::InvalidShape {
            key: "rule".to_string(),
            expected: "JSON 对象".to_string(),
        })?;

        if let Some(kind) = object.get(CONDITION) {
            self.parse_condition(kind, object).map(Rule::from)
        } else {
            self.parse_field_rule(object).map(Rule::from)
        }
    }

    fn parse_condition(&self, kind: &Value, object: &Map<String, Value>) -> Result<Condition> {
        let kind: ConditionKind = match kind {
            Value::String(s) => s.parse()?,
            other => return Err(RuleError::UnknownConditionKind(other.to_string())),
        };

        let mut condition = Condition::new(kind)
            .negated(object.get(NOT).and_then(Value::as_bool).unwrap_or(false));

        // 非对象的子元素直接跳过
        if let Some(Value::Array(children)) = object.get(RULES) {
            for child in children.iter().filter(|c| c.is_object()) {
                condition.push(self.parse_node(child)?);
            }
        }

        Ok(condition)
    }

    fn parse_field_rule(&self, object: &Map<String, Value>) -> Result<FieldRule> {
        let field = required_str(object, FIELD)?;
        let value_type: FieldType = required_str(object, TYPE)?.parse()?;
        let operator: Operator = required_str(object, OPERATOR)?.parse()?;

        let mut rule = FieldRule::new(field, value_type, operator);
        let value = object.get(VALUE).cloned();
        let rendered = value.as_ref().map(Value::to_string).unwrap_or_default();
        rule.set_value(value, &self.options)
            .map_err(|source| RuleError::ValueCoercion {
                field: field.to_string(),
                value: rendered,
                source,
            })?;

        Ok(rule)
    }
}

/// 使用给定选项解析规则定义
pub fn parse(definition: &Value, options: &RuleOptions) -> Result<Rule> {
    RuleParser::new(options.clone()).parse(definition)
}

fn required_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    match object.get(key) {
        None => Err(RuleError::MissingField(key.to_string())),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(RuleError::InvalidShape {
            key: key.to_string(),
            expected: "字符串".to_string(),
        }),
    }
}
