//! 规则树领域模型
//!
//! 规则树由条件节点（AND/OR 组合）与字段规则（叶子谓词）组成，构建后只读。
//! 比较选项不保存在节点上，而是在每次求值时由调用方传入。

use crate::error::CoercionError;
use crate::evaluator::{FieldContext, OperatorEvaluator, Predicate};
use crate::operators::{ConditionKind, FieldType, Operator, OperatorFamily};
use crate::options::RuleOptions;
use crate::value::{CoercedValue, coerce};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// 规则节点（条件或字段规则）
#[derive(Debug, Clone)]
pub enum Rule {
    Condition(Condition),
    Field(FieldRule),
}

impl Rule {
    pub fn evaluate(&self, record: &Value, options: &RuleOptions) -> bool {
        match self {
            Self::Condition(condition) => condition.evaluate(record, options),
            Self::Field(rule) => rule.evaluate(record, options),
        }
    }

    /// 简洁的展示形式（字段规则不带类型前缀）
    pub fn to_friendly_string(&self) -> String {
        match self {
            Self::Condition(condition) => condition.to_friendly_string(),
            Self::Field(rule) => rule.to_friendly_string(),
        }
    }

    /// 规则中使用的所有字段路径
    pub fn fields(&self) -> HashSet<String> {
        let mut fields = HashSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, fields: &mut HashSet<String>) {
        match self {
            Self::Condition(condition) => {
                for child in &condition.children {
                    child.collect_fields(fields);
                }
            }
            Self::Field(rule) => {
                fields.insert(rule.field.clone());
            }
        }
    }

    /// 节点总数
    pub fn node_count(&self) -> usize {
        match self {
            Self::Condition(condition) => {
                1 + condition.children.iter().map(Rule::node_count).sum::<usize>()
            }
            Self::Field(_) => 1,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condition(condition) => fmt::Display::fmt(condition, f),
            Self::Field(rule) => fmt::Display::fmt(rule, f),
        }
    }
}

impl From<Condition> for Rule {
    fn from(condition: Condition) -> Self {
        Self::Condition(condition)
    }
}

impl From<FieldRule> for Rule {
    fn from(rule: FieldRule) -> Self {
        Self::Field(rule)
    }
}

/// 条件节点
#[derive(Debug, Clone)]
pub struct Condition {
    kind: ConditionKind,
    negate: bool,
    children: Vec<Rule>,
}

impl Condition {
    pub fn new(kind: ConditionKind) -> Self {
        Self {
            kind,
            negate: false,
            children: Vec::new(),
        }
    }

    pub fn and(children: Vec<Rule>) -> Self {
        Self::new(ConditionKind::And).with_children(children)
    }

    pub fn or(children: Vec<Rule>) -> Self {
        Self::new(ConditionKind::Or).with_children(children)
    }

    pub fn with_children(mut self, children: Vec<Rule>) -> Self {
        self.children = children;
        self
    }

    pub fn negated(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    pub fn push(&mut self, rule: impl Into<Rule>) {
        self.children.push(rule.into());
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub fn children(&self) -> &[Rule] {
        &self.children
    }

    /// AND 全部为真（空集为真），OR 任一为真（空集为假），再按 `not` 取反
    pub fn evaluate(&self, record: &Value, options: &RuleOptions) -> bool {
        let matched = match self.kind {
            ConditionKind::And => self.children.iter().all(|r| r.evaluate(record, options)),
            ConditionKind::Or => self.children.iter().any(|r| r.evaluate(record, options)),
        };
        matched != self.negate
    }

    pub fn to_friendly_string(&self) -> String {
        self.render(true)
    }

    fn render(&self, friendly: bool) -> String {
        let children: Vec<String> = self
            .children
            .iter()
            .map(|child| {
                let rendered = if friendly {
                    child.to_friendly_string()
                } else {
                    child.to_string()
                };
                format!("({rendered})")
            })
            .collect();
        let body = format!("({})", children.join(&format!(" {} ", self.kind)));
        if self.negate {
            format!("NOT {body}")
        } else {
            body
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// 字段规则（叶子谓词）
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: String,
    path: Vec<String>,
    value_type: FieldType,
    family: OperatorFamily,
    negate: bool,
    raw_value: Option<Value>,
    operands: Vec<CoercedValue>,
    predicate: Predicate,
}

impl FieldRule {
    pub fn new(field: impl Into<String>, value_type: FieldType, operator: Operator) -> Self {
        let field = field.into();
        let path = field
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        let (family, negate) = operator.resolve();
        Self {
            field,
            path,
            value_type,
            family,
            negate,
            raw_value: None,
            operands: Vec::new(),
            predicate: OperatorEvaluator::predicate(family),
        }
    }

    /// 设置比较值并立即转换：标量得到一个比较值，数组逐元素转换
    ///
    /// 空数组等同于单个无值比较值，与 `null` 的行为一致。
    pub fn set_value(
        &mut self,
        value: Option<Value>,
        options: &RuleOptions,
    ) -> Result<(), CoercionError> {
        let operands = match &value {
            None => Vec::new(),
            Some(Value::Array(items)) if items.is_empty() => vec![None],
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| coerce(item, self.value_type, options))
                .collect::<Result<Vec<_>, _>>()?,
            Some(scalar) => vec![coerce(scalar, self.value_type, options)?],
        };
        self.operands = operands;
        self.raw_value = value;
        Ok(())
    }

    pub fn with_value(
        mut self,
        value: impl Into<Value>,
        options: &RuleOptions,
    ) -> Result<Self, CoercionError> {
        self.set_value(Some(value.into()), options)?;
        Ok(self)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value_type(&self) -> FieldType {
        self.value_type
    }

    /// 对外展示的操作符（取反时已翻转）
    pub fn operator(&self) -> Operator {
        self.family.advertised(self.negate)
    }

    pub fn family(&self) -> OperatorFamily {
        self.family
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub fn raw_value(&self) -> Option<&Value> {
        self.raw_value.as_ref()
    }

    pub fn operands(&self) -> &[CoercedValue] {
        &self.operands
    }

    /// 按点号路径逐级查找嵌套对象，路径中断或遇到非对象时返回 None
    pub fn resolve<'v>(&self, record: &'v Value) -> Option<&'v Value> {
        self.path.iter().try_fold(record, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            _ => None,
        })
    }

    pub fn evaluate(&self, record: &Value, options: &RuleOptions) -> bool {
        let ctx = FieldContext::new(self.value_type, &self.operands, options);
        match self.resolve(record) {
            None => OperatorEvaluator::missing_field(self.family, self.negate, &ctx),
            Some(token) => (self.predicate)(token, &ctx) != self.negate,
        }
    }

    pub fn to_friendly_string(&self) -> String {
        self.render(true)
    }

    fn render(&self, friendly: bool) -> String {
        let mut out = if friendly {
            format!("`{}` {}", self.field, self.operator())
        } else {
            format!("{}(`{}`) {}", self.value_type, self.field, self.operator())
        };
        if let Some(value) = &self.raw_value {
            out.push(' ');
            out.push_str(&value.to_string());
        }
        out
    }
}

impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// 评估结果
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub matched: bool,
    pub matched_conditions: Vec<String>,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_us: u64,
}

impl EvaluationResult {
    pub fn new() -> Self {
        Self {
            matched: false,
            matched_conditions: Vec::new(),
            evaluation_trace: Vec::new(),
            evaluation_time_us: 0,
        }
    }
}

impl Default for EvaluationResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> RuleOptions {
        RuleOptions::default()
    }

    fn field_rule(field: &str, value_type: FieldType, operator: Operator, value: Value) -> Rule {
        FieldRule::new(field, value_type, operator)
            .with_value(value, &options())
            .unwrap()
            .into()
    }

    #[test]
    fn test_empty_conditions() {
        let record = json!({});
        assert!(Condition::and(vec![]).evaluate(&record, &options()));
        assert!(!Condition::or(vec![]).evaluate(&record, &options()));
        assert!(!Condition::and(vec![]).negated(true).evaluate(&record, &options()));
        assert!(Condition::or(vec![]).negated(true).evaluate(&record, &options()));
    }

    #[test]
    fn test_resolve_nested_path() {
        let rule = FieldRule::new("sale.amount", FieldType::Double, Operator::Greater);
        let record = json!({"sale": {"amount": 22.5}, "flat": 1});
        assert_eq!(rule.resolve(&record), Some(&json!(22.5)));

        let through_scalar = FieldRule::new("flat.inner", FieldType::Integer, Operator::Equal);
        assert_eq!(through_scalar.resolve(&record), None);

        let missing = FieldRule::new("sale.date", FieldType::Date, Operator::Equal);
        assert_eq!(missing.resolve(&record), None);
    }

    #[test]
    fn test_resolve_ignores_empty_segments() {
        let rule = FieldRule::new("sale..amount.", FieldType::Double, Operator::Greater);
        assert_eq!(rule.resolve(&json!({"sale": {"amount": 1}})), Some(&json!(1)));
    }

    #[test]
    fn test_present_null_is_not_missing() {
        let rule = field_rule("x", FieldType::Integer, Operator::NotEqual, json!(5));
        // 缺失字段：比较值不是默认值，NotEqual 为真
        assert!(rule.evaluate(&json!({}), &options()));
        // 显式 null：数据无值，Equal 为假，取反后为真
        assert!(rule.evaluate(&json!({"x": null}), &options()));

        let is_null = field_rule("x", FieldType::Integer, Operator::IsNull, json!(null));
        assert!(is_null.evaluate(&json!({"x": null}), &options()));
        assert!(!is_null.evaluate(&json!({"x": 1}), &options()));
    }

    #[test]
    fn test_advertised_operator_flips() {
        let rule = FieldRule::new("a", FieldType::Integer, Operator::LessOrEqual);
        assert_eq!(rule.family(), OperatorFamily::Greater);
        assert!(rule.is_negated());
        assert_eq!(rule.operator(), Operator::LessOrEqual);
    }

    #[test]
    fn test_less_or_equal_is_negated_greater() {
        let rule = field_rule("a", FieldType::Integer, Operator::LessOrEqual, json!(10));
        assert!(rule.evaluate(&json!({"a": 10}), &options()));
        assert!(rule.evaluate(&json!({"a": 3}), &options()));
        assert!(!rule.evaluate(&json!({"a": 11}), &options()));
        // 数据无法解析时 Greater 为假，取反后为真
        assert!(rule.evaluate(&json!({"a": "n/a"}), &options()));
        // 字段缺失时为假
        assert!(!rule.evaluate(&json!({}), &options()));
    }

    #[test]
    fn test_set_value_coerces_arrays_in_order() {
        let mut rule = FieldRule::new("a", FieldType::Integer, Operator::In);
        rule.set_value(Some(json!([3, "4", null])), &options()).unwrap();
        assert_eq!(rule.operands().len(), 3);
        assert_eq!(rule.operands()[1], Some(crate::value::FieldValue::Integer(4)));
        assert_eq!(rule.operands()[2], None);

        let err = rule.set_value(Some(json!(["x"])), &options()).unwrap_err();
        assert!(matches!(err, CoercionError::Invalid { .. }));
    }

    #[test]
    fn test_empty_array_value_acts_like_null() {
        let empty = FieldRule::new("x", FieldType::Integer, Operator::Equal)
            .with_value(json!([]), &options())
            .unwrap();
        let null = FieldRule::new("x", FieldType::Integer, Operator::Equal)
            .with_value(json!(null), &options())
            .unwrap();
        assert_eq!(empty.operands().len(), 1);
        assert!(empty.operands()[0].is_none());
        assert_eq!(empty.raw_value(), Some(&json!([])));

        for record in [json!({}), json!({"x": 0}), json!({"x": 5}), json!({"x": null})] {
            assert_eq!(
                empty.evaluate(&record, &options()),
                null.evaluate(&record, &options()),
                "{record}"
            );
        }
        // 字段缺失时无值比较值按默认值处理，数据存在时与无值比较不相等
        assert!(empty.evaluate(&json!({}), &options()));
        assert!(!empty.evaluate(&json!({"x": 0}), &options()));

        let in_empty = field_rule("x", FieldType::Integer, Operator::In, json!([]));
        assert!(!in_empty.evaluate(&json!({"x": 0}), &options()));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let rule: Rule = Condition::and(vec![
            field_rule("name", FieldType::String, Operator::Contains, json!("joe")),
            Condition::or(vec![field_rule(
                "category",
                FieldType::Integer,
                Operator::In,
                json!([2, 3]),
            )])
            .negated(true)
            .into(),
        ])
        .into();

        assert_eq!(
            rule.to_string(),
            "((String(`name`) Contains \"joe\") AND (NOT ((Integer(`category`) In [2,3]))))"
        );
        assert_eq!(
            rule.to_friendly_string(),
            "((`name` Contains \"joe\") AND (NOT ((`category` In [2,3]))))"
        );
        assert_eq!(rule.to_string(), rule.clone().to_string());
    }

    #[test]
    fn test_field_collection_and_node_count() {
        let rule: Rule = Condition::and(vec![
            field_rule("a", FieldType::Integer, Operator::Equal, json!(1)),
            field_rule("b.c", FieldType::Integer, Operator::Equal, json!(1)),
            field_rule("a", FieldType::Integer, Operator::Less, json!(5)),
        ])
        .into();
        let fields = rule.fields();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains("b.c"));
        assert_eq!(rule.node_count(), 4);
    }

    #[test]
    fn test_unary_operator_renders_without_value() {
        let rule = FieldRule::new("x", FieldType::String, Operator::IsNotNull);
        assert_eq!(rule.to_string(), "String(`x`) IsNotNull");
    }
}
