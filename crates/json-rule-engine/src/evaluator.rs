//! 操作符求值
//!
//! 每个操作符族对应一个未取反的谓词函数，在解析时选定并保存在字段规则上。
//! 字段缺失时的结果由 [`OperatorEvaluator::missing_field`] 单独给出，
//! 该结果已包含取反语义，调用方不再翻转。

use crate::collation::Collator;
use crate::operators::{FieldType, OperatorFamily};
use crate::options::RuleOptions;
use crate::value::{CoercedValue, FieldValue, coerce_lenient};
use serde_json::Value;
use std::cmp::Ordering;

/// 谓词求值所需的上下文
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub field_type: FieldType,
    pub operands: &'a [CoercedValue],
    pub options: &'a RuleOptions,
}

impl<'a> FieldContext<'a> {
    pub fn new(
        field_type: FieldType,
        operands: &'a [CoercedValue],
        options: &'a RuleOptions,
    ) -> Self {
        Self {
            field_type,
            operands,
            options,
        }
    }

    fn collator(&self) -> Collator {
        Collator::new(self.options)
    }

    fn coerce(&self, token: &Value) -> CoercedValue {
        coerce_lenient(token, self.field_type, self.options)
    }

    fn operand(&self, index: usize) -> Option<&'a FieldValue> {
        self.operands.get(index).and_then(Option::as_ref)
    }
}

/// 操作符族的谓词：数据 token 加上下文，返回未取反的结果
pub type Predicate = fn(&Value, &FieldContext<'_>) -> bool;

/// 操作符求值器
pub struct OperatorEvaluator;

impl OperatorEvaluator {
    /// 选定操作符族的谓词
    pub fn predicate(family: OperatorFamily) -> Predicate {
        match family {
            OperatorFamily::Equal => Self::equal,
            OperatorFamily::In => Self::in_list,
            OperatorFamily::Less => Self::less,
            OperatorFamily::Greater => Self::greater,
            OperatorFamily::Between => Self::between,
            OperatorFamily::Null => Self::is_null,
            OperatorFamily::Empty => Self::is_empty,
            OperatorFamily::Contains => Self::contains,
            OperatorFamily::BeginsWith => Self::begins_with,
            OperatorFamily::EndsWith => Self::ends_with,
        }
    }

    /// 记录中不存在该字段时的最终结果
    ///
    /// In、Less、Greater、Between 及其取反形式一律返回 false，
    /// 因此字段缺失时 NotBetween、NotIn 同样为 false。
    pub fn missing_field(family: OperatorFamily, negate: bool, ctx: &FieldContext<'_>) -> bool {
        match family {
            OperatorFamily::Equal => {
                let is_default = ctx.operand(0).is_none_or(FieldValue::is_default);
                is_default != negate
            }
            OperatorFamily::Null | OperatorFamily::Empty => !negate,
            OperatorFamily::Contains | OperatorFamily::BeginsWith | OperatorFamily::EndsWith => {
                negate
            }
            OperatorFamily::In
            | OperatorFamily::Less
            | OperatorFamily::Greater
            | OperatorFamily::Between => false,
        }
    }

    fn equal(token: &Value, ctx: &FieldContext<'_>) -> bool {
        match (ctx.coerce(token), ctx.operand(0)) {
            (Some(data), Some(expected)) => data.equals(expected, &ctx.collator()),
            _ => false,
        }
    }

    fn in_list(token: &Value, ctx: &FieldContext<'_>) -> bool {
        let Some(data) = ctx.coerce(token) else {
            return false;
        };
        let collator = ctx.collator();
        ctx.operands
            .iter()
            .flatten()
            .any(|item| data.equals(item, &collator))
    }

    fn less(token: &Value, ctx: &FieldContext<'_>) -> bool {
        Self::ordering(token, ctx) == Some(Ordering::Less)
    }

    fn greater(token: &Value, ctx: &FieldContext<'_>) -> bool {
        Self::ordering(token, ctx) == Some(Ordering::Greater)
    }

    fn ordering(token: &Value, ctx: &FieldContext<'_>) -> Option<Ordering> {
        let data = ctx.coerce(token)?;
        data.compare(ctx.operand(0)?, &ctx.collator())
    }

    /// 闭区间 [low, high]，不检查 low <= high
    fn between(token: &Value, ctx: &FieldContext<'_>) -> bool {
        let (Some(low), Some(high)) = (ctx.operand(0), ctx.operand(1)) else {
            return false;
        };
        let Some(data) = ctx.coerce(token) else {
            return false;
        };
        let collator = ctx.collator();
        matches!(
            data.compare(low, &collator),
            Some(Ordering::Greater | Ordering::Equal)
        ) && matches!(
            data.compare(high, &collator),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    fn is_null(token: &Value, ctx: &FieldContext<'_>) -> bool {
        ctx.coerce(token).is_none()
    }

    fn is_empty(token: &Value, ctx: &FieldContext<'_>) -> bool {
        match ctx.coerce(token) {
            None => true,
            Some(FieldValue::String(s)) => s.is_empty(),
            Some(value) => value.is_default(),
        }
    }

    /// 数组数据按元素精确匹配；字符串数据按子串匹配；其他类型按相等
    fn contains(token: &Value, ctx: &FieldContext<'_>) -> bool {
        let Some(expected) = ctx.operand(0) else {
            return false;
        };
        let collator = ctx.collator();

        if let Value::Array(items) = token {
            return items.iter().any(|item| {
                ctx.coerce(item)
                    .is_some_and(|value| value.equals(expected, &collator))
            });
        }

        let Some(data) = ctx.coerce(token) else {
            return false;
        };
        match (&data, expected) {
            (FieldValue::String(haystack), FieldValue::String(needle)) => {
                !haystack.is_empty() && !needle.is_empty() && collator.contains(haystack, needle)
            }
            _ => data.equals(expected, &collator),
        }
    }

    fn begins_with(token: &Value, ctx: &FieldContext<'_>) -> bool {
        Self::string_part(token, ctx, Collator::starts_with)
    }

    fn ends_with(token: &Value, ctx: &FieldContext<'_>) -> bool {
        Self::string_part(token, ctx, Collator::ends_with)
    }

    /// 按字符串形式比较前缀/后缀，任一侧为空串时不匹配
    fn string_part(
        token: &Value,
        ctx: &FieldContext<'_>,
        check: fn(&Collator, &str, &str) -> bool,
    ) -> bool {
        let (Some(data), Some(expected)) = (ctx.coerce(token), ctx.operand(0)) else {
            return false;
        };
        let data = data.to_string();
        let expected = expected.to_string();
        if data.is_empty() || expected.is_empty() {
            return false;
        }
        check(&ctx.collator(), &data, &expected)
    }
}
