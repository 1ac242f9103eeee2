//! JSON 规则引擎
//!
//! 针对半结构化 JSON 记录评估查询构建器格式的布尔规则，支持：
//! - JSON 规则定义解析，比较值在解析时转换
//! - 七种值类型（字符串、整数、浮点、布尔、日期时间、日期、时长）的类型化比较
//! - 区域设置与大小写/重音不敏感的字符串比较
//! - 短路求值与带追踪信息的评估
//!
//! ```
//! use json_rules::JsonEvaluator;
//! use serde_json::json;
//!
//! let evaluator = JsonEvaluator::new(&json!({
//!     "condition": "AND",
//!     "rules": [
//!         {"field": "sale.amount", "type": "double", "operator": "greater", "value": 20}
//!     ]
//! })).unwrap();
//!
//! assert!(evaluator.evaluate(&json!({"sale": {"amount": 22.5}})));
//! assert!(!evaluator.evaluate(&json!({"sale": {"amount": 10}})));
//! ```

pub mod cli;
pub mod collation;
pub mod compiler;
pub mod config;
pub mod datetime;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod models;
pub mod observability;
pub mod operators;
pub mod options;
pub mod value;

pub use compiler::{RuleParser, parse};
pub use error::{CoercionError, Result, RuleError};
pub use executor::JsonEvaluator;
pub use models::{Condition, EvaluationResult, FieldRule, Rule};
pub use operators::{ConditionKind, FieldType, Operator, OperatorFamily};
pub use options::{CompareFlags, Locale, RuleOptions};
pub use value::{CoercedValue, FieldValue};
