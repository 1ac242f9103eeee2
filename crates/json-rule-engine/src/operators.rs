//! 规则操作符、条件类型与字段类型定义

use crate::error::RuleError;
use std::fmt;
use std::str::FromStr;

/// 条件操作符
///
/// 固定的 20 个操作符。每个操作符对应一个操作符族加一个取反标记，
/// 参见 [`Operator::resolve`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    In,
    NotIn,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
    Contains,
    NotContains,
    BeginsWith,
    NotBeginsWith,
    EndsWith,
    NotEndsWith,
}

impl Operator {
    pub const ALL: [Operator; 20] = [
        Self::Equal,
        Self::NotEqual,
        Self::In,
        Self::NotIn,
        Self::Less,
        Self::LessOrEqual,
        Self::Greater,
        Self::GreaterOrEqual,
        Self::Between,
        Self::NotBetween,
        Self::IsNull,
        Self::IsNotNull,
        Self::IsEmpty,
        Self::IsNotEmpty,
        Self::Contains,
        Self::NotContains,
        Self::BeginsWith,
        Self::NotBeginsWith,
        Self::EndsWith,
        Self::NotEndsWith,
    ];

    /// 规范名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Less => "Less",
            Self::LessOrEqual => "LessOrEqual",
            Self::Greater => "Greater",
            Self::GreaterOrEqual => "GreaterOrEqual",
            Self::Between => "Between",
            Self::NotBetween => "NotBetween",
            Self::IsNull => "IsNull",
            Self::IsNotNull => "IsNotNull",
            Self::IsEmpty => "IsEmpty",
            Self::IsNotEmpty => "IsNotEmpty",
            Self::Contains => "Contains",
            Self::NotContains => "NotContains",
            Self::BeginsWith => "BeginsWith",
            Self::NotBeginsWith => "NotBeginsWith",
            Self::EndsWith => "EndsWith",
            Self::NotEndsWith => "NotEndsWith",
        }
    }

    /// 拆解为 (操作符族, 是否取反)
    ///
    /// LessOrEqual 是 Greater 的取反，GreaterOrEqual 是 Less 的取反，
    /// 两者没有独立的比较实现。
    pub fn resolve(self) -> (OperatorFamily, bool) {
        use OperatorFamily as F;
        match self {
            Self::Equal => (F::Equal, false),
            Self::NotEqual => (F::Equal, true),
            Self::In => (F::In, false),
            Self::NotIn => (F::In, true),
            Self::Less => (F::Less, false),
            Self::GreaterOrEqual => (F::Less, true),
            Self::Greater => (F::Greater, false),
            Self::LessOrEqual => (F::Greater, true),
            Self::Between => (F::Between, false),
            Self::NotBetween => (F::Between, true),
            Self::IsNull => (F::Null, false),
            Self::IsNotNull => (F::Null, true),
            Self::IsEmpty => (F::Empty, false),
            Self::IsNotEmpty => (F::Empty, true),
            Self::Contains => (F::Contains, false),
            Self::NotContains => (F::Contains, true),
            Self::BeginsWith => (F::BeginsWith, false),
            Self::NotBeginsWith => (F::BeginsWith, true),
            Self::EndsWith => (F::EndsWith, false),
            Self::NotEndsWith => (F::EndsWith, true),
        }
    }
}

/// 去掉所有非 ASCII 字母后转小写，`"not_equal"`、`"Not-Equal"`、`"notEqual"` 等价
pub fn normalize_operator_name(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_operator_name(s);
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| RuleError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 操作符族
///
/// 一个族只实现未取反的谓词，取反在字段规则层统一处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFamily {
    Equal,
    In,
    Less,
    Greater,
    Between,
    Null,
    Empty,
    Contains,
    BeginsWith,
    EndsWith,
}

impl OperatorFamily {
    /// 对外展示的操作符名称（取反时翻转）
    pub fn advertised(self, negate: bool) -> Operator {
        match (self, negate) {
            (Self::Equal, false) => Operator::Equal,
            (Self::Equal, true) => Operator::NotEqual,
            (Self::In, false) => Operator::In,
            (Self::In, true) => Operator::NotIn,
            (Self::Less, false) => Operator::Less,
            (Self::Less, true) => Operator::GreaterOrEqual,
            (Self::Greater, false) => Operator::Greater,
            (Self::Greater, true) => Operator::LessOrEqual,
            (Self::Between, false) => Operator::Between,
            (Self::Between, true) => Operator::NotBetween,
            (Self::Null, false) => Operator::IsNull,
            (Self::Null, true) => Operator::IsNotNull,
            (Self::Empty, false) => Operator::IsEmpty,
            (Self::Empty, true) => Operator::IsNotEmpty,
            (Self::Contains, false) => Operator::Contains,
            (Self::Contains, true) => Operator::NotContains,
            (Self::BeginsWith, false) => Operator::BeginsWith,
            (Self::BeginsWith, true) => Operator::NotBeginsWith,
            (Self::EndsWith, false) => Operator::EndsWith,
            (Self::EndsWith, true) => Operator::NotEndsWith,
        }
    }
}

/// 逻辑操作符（条件类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    And,
    Or,
}

impl FromStr for ConditionKind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("and") {
            Ok(Self::And)
        } else if s.eq_ignore_ascii_case("or") {
            Ok(Self::Or)
        } else {
            Err(RuleError::UnknownConditionKind(s.to_string()))
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// 字段值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Integer,
    Double,
    Boolean,
    DateTime,
    Date,
    Duration,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        Self::String,
        Self::Integer,
        Self::Double,
        Self::Boolean,
        Self::DateTime,
        Self::Date,
        Self::Duration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Double => "Double",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Date => "Date",
            Self::Duration => "Duration",
        }
    }
}

impl FromStr for FieldType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| RuleError::UnknownFieldType(s.to_string()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
