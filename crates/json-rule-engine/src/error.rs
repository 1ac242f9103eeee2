//! 规则引擎错误类型
//!
//! 只有规则定义本身的问题会以错误返回；记录数据的问题在评估阶段按缺失值处理。

use crate::operators::FieldType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("缺少必填键: '{0}'")]
    MissingField(String),

    #[error("未知的条件类型: {0}")]
    UnknownConditionKind(String),

    #[error("未知的字段类型: {0}")]
    UnknownFieldType(String),

    #[error("未知的操作符: {0}")]
    UnknownOperator(String),

    #[error("键 '{key}' 格式错误: 期望 {expected}")]
    InvalidShape { key: String, expected: String },

    #[error("字段 '{field}' 的比较值 {value} 无法转换: {source}")]
    ValueCoercion {
        field: String,
        value: String,
        #[source]
        source: CoercionError,
    },

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// 值转换错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("'{text}' 不是有效的 {kind} 值")]
    Invalid { kind: FieldType, text: String },

    #[error("{kind} 类型不接受 JSON {shape}")]
    UnsupportedShape {
        kind: FieldType,
        shape: &'static str,
    },

    #[error("时长 '{0}' 含有不支持的年/月分量")]
    UnsupportedDesignator(String),

    #[error("数值 {0} 超出范围")]
    OutOfRange(String),
}

impl CoercionError {
    pub(crate) fn invalid(kind: FieldType, text: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            text: text.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
