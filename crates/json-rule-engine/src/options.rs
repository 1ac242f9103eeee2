//! 比较选项
//!
//! 区域设置加字符串比较标记，作用于所有字符串比较以及日期、时长的区域化解析。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 数字日期中年、月、日的排列顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    MonthDayYear,
    DayMonthYear,
    YearMonthDay,
}

/// 区域设置标识（BCP 47 标签，空标签表示不变区域）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locale {
    tag: String,
}

impl Locale {
    pub fn invariant() -> Self {
        Self::default()
    }

    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if tag.eq_ignore_ascii_case("invariant") {
            return Self::invariant();
        }
        Self { tag }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_invariant(&self) -> bool {
        self.tag.is_empty()
    }

    fn language(&self) -> String {
        self.tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    fn region(&self) -> Option<String> {
        self.tag
            .split(['-', '_'])
            .skip(1)
            .find(|part| part.len() == 2)
            .map(str::to_ascii_uppercase)
    }

    /// 数字日期（如 `6/1/2019`）的字段顺序
    pub fn date_order(&self) -> DateOrder {
        if self.is_invariant() {
            return DateOrder::MonthDayYear;
        }
        match self.language().as_str() {
            "en" => match self.region().as_deref() {
                None | Some("US") | Some("PH") => DateOrder::MonthDayYear,
                _ => DateOrder::DayMonthYear,
            },
            "ja" | "zh" | "ko" | "hu" | "lt" | "sv" | "mn" => DateOrder::YearMonthDay,
            _ => DateOrder::DayMonthYear,
        }
    }

    /// 小数分隔符，用于时长字面量的小数秒部分
    pub fn decimal_separator(&self) -> char {
        if self.is_invariant() {
            return '.';
        }
        match self.language().as_str() {
            "en" | "ja" | "zh" | "ko" | "he" | "th" | "hi" => '.',
            _ => ',',
        }
    }
}

impl From<String> for Locale {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.tag
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invariant() {
            f.write_str("invariant")
        } else {
            f.write_str(&self.tag)
        }
    }
}

/// 字符串比较标记，默认精确比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareFlags {
    pub ignore_case: bool,
    pub ignore_accents: bool,
}

impl CompareFlags {
    pub const NONE: Self = Self {
        ignore_case: false,
        ignore_accents: false,
    };
    pub const IGNORE_CASE: Self = Self {
        ignore_case: true,
        ignore_accents: false,
    };
    pub const IGNORE_CASE_AND_ACCENTS: Self = Self {
        ignore_case: true,
        ignore_accents: true,
    };
}

/// 规则比较选项
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    pub locale: Locale,
    pub compare: CompareFlags,
}

impl RuleOptions {
    pub fn with_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_compare(mut self, compare: CompareFlags) -> Self {
        self.compare = compare;
        self
    }

    pub fn ignore_case(mut self) -> Self {
        self.compare.ignore_case = true;
        self
    }

    pub fn ignore_accents(mut self) -> Self {
        self.compare.ignore_accents = true;
        self
    }
}
