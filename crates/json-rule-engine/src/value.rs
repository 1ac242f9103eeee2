//! 强类型比较值与 JSON 值转换
//!
//! 规则的比较值在解析时严格转换；记录中的数据宽松转换，无法转换时视为无值。

use crate::collation::Collator;
use crate::datetime::{min_date, min_datetime, parse_date, parse_datetime, parse_duration};
use crate::error::CoercionError;
use crate::operators::FieldType;
use crate::options::RuleOptions;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// 七种比较类型之一的值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Duration(TimeDelta),
}

/// 转换结果：`None` 表示无值（null、空白或无法解析的数据）
pub type CoercedValue = Option<FieldValue>;

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::String(_) => FieldType::String,
            Self::Integer(_) => FieldType::Integer,
            Self::Double(_) => FieldType::Double,
            Self::Boolean(_) => FieldType::Boolean,
            Self::DateTime(_) => FieldType::DateTime,
            Self::Date(_) => FieldType::Date,
            Self::Duration(_) => FieldType::Duration,
        }
    }

    /// 类型默认值：`""`、`0`、`0.0`、`false`、最小日期时间、最小日期、零时长
    pub fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::String => Self::String(String::new()),
            FieldType::Integer => Self::Integer(0),
            FieldType::Double => Self::Double(0.0),
            FieldType::Boolean => Self::Boolean(false),
            FieldType::DateTime => Self::DateTime(min_datetime()),
            FieldType::Date => Self::Date(min_date()),
            FieldType::Duration => Self::Duration(TimeDelta::zero()),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default_for(self.field_type())
    }

    /// 同类型值的比较，字符串按比较选项，其余按自然顺序
    pub fn compare(&self, other: &Self, collator: &Collator) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(collator.compare(a, b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Duration(a), Self::Duration(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn equals(&self, other: &Self, collator: &Collator) -> bool {
        self.compare(other, collator) == Some(Ordering::Equal)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Duration(td) => write!(f, "{td}"),
        }
    }
}

/// 将 JSON 值转换为 `field_type` 类型
///
/// JSON null 以及非字符串类型的空白字符串返回 `Ok(None)`。
pub fn coerce(
    token: &Value,
    field_type: FieldType,
    options: &RuleOptions,
) -> Result<CoercedValue, CoercionError> {
    if token.is_null() {
        return Ok(None);
    }
    if field_type != FieldType::String {
        if let Value::String(s) = token {
            if s.trim().is_empty() {
                return Ok(None);
            }
        }
    }

    let value = match field_type {
        FieldType::String => FieldValue::String(to_text(token, field_type)?),
        FieldType::Integer => FieldValue::Integer(to_integer(token)?),
        FieldType::Double => FieldValue::Double(to_double(token)?),
        FieldType::Boolean => FieldValue::Boolean(to_boolean(token)?),
        FieldType::DateTime => {
            FieldValue::DateTime(parse_datetime(&to_text(token, field_type)?, &options.locale)?)
        }
        FieldType::Date => {
            FieldValue::Date(parse_date(&to_text(token, field_type)?, &options.locale)?)
        }
        FieldType::Duration => {
            FieldValue::Duration(parse_duration(&to_text(token, field_type)?, &options.locale)?)
        }
    };
    Ok(Some(value))
}

/// 记录数据的宽松转换：任何转换失败都视为无值
pub fn coerce_lenient(token: &Value, field_type: FieldType, options: &RuleOptions) -> CoercedValue {
    match coerce(token, field_type, options) {
        Ok(value) => value,
        Err(e) => {
            tracing::trace!(error = %e, "数据值无法转换，按无值处理");
            None
        }
    }
}

fn shape_name(token: &Value) -> &'static str {
    match token {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn to_text(token: &Value, kind: FieldType) -> Result<String, CoercionError> {
    match token {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(CoercionError::UnsupportedShape {
            kind,
            shape: shape_name(other),
        }),
    }
}

const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn to_integer(token: &Value) -> Result<i64, CoercionError> {
    let kind = FieldType::Integer;
    match token {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                // i64::MAX as f64 会舍入到 2^63，上界必须是开区间
                Some(f) if f.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(&f) => Ok(f as i64),
                Some(f) if f.fract() == 0.0 => Err(CoercionError::OutOfRange(n.to_string())),
                _ => Err(CoercionError::invalid(kind, n.to_string())),
            }
        }
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| CoercionError::invalid(kind, s.as_str())),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(CoercionError::UnsupportedShape {
            kind,
            shape: shape_name(other),
        }),
    }
}

fn to_double(token: &Value) -> Result<f64, CoercionError> {
    let kind = FieldType::Double;
    match token {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CoercionError::invalid(kind, n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| CoercionError::invalid(kind, s.as_str())),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(CoercionError::UnsupportedShape {
            kind,
            shape: shape_name(other),
        }),
    }
}

fn to_boolean(token: &Value) -> Result<bool, CoercionError> {
    let kind = FieldType::Boolean;
    match token {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if s.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(CoercionError::invalid(kind, s))
            }
        }
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        other => Err(CoercionError::UnsupportedShape {
            kind,
            shape: shape_name(other),
        }),
    }
}
