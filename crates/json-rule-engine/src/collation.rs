//! 字符串比较
//!
//! 基于 Unicode 规范分解（NFD）的多级比较：
//! 一级比较基础字符（忽略重音与大小写），二级比较重音，三级比较大小写（小写在前），
//! 所有标记都关闭时再按规范分解后的完整字符串区分。
//! 忽略大小写或忽略重音时跳过对应级别。

use crate::options::{CompareFlags, RuleOptions};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 按比较选项执行字符串比较
#[derive(Debug, Clone, Copy)]
pub struct Collator {
    flags: CompareFlags,
}

impl Collator {
    pub fn new(options: &RuleOptions) -> Self {
        Self {
            flags: options.compare,
        }
    }

    pub fn with_flags(flags: CompareFlags) -> Self {
        Self { flags }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let primary = primary_key(a).cmp(&primary_key(b));
        if primary != Ordering::Equal {
            return primary;
        }

        if !self.flags.ignore_accents {
            let secondary = accent_key(a).cmp(&accent_key(b));
            if secondary != Ordering::Equal {
                return secondary;
            }
        }

        if !self.flags.ignore_case {
            let tertiary = case_key(a, self.flags.ignore_accents)
                .cmp(&case_key(b, self.flags.ignore_accents));
            if tertiary != Ordering::Equal {
                return tertiary;
            }
        }

        if self.flags == CompareFlags::NONE {
            return a.nfd().cmp(b.nfd());
        }

        Ordering::Equal
    }

    pub fn equals(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    /// `needle` 是否为 `haystack` 的子串
    pub fn contains(&self, haystack: &str, needle: &str) -> bool {
        let haystack = self.fold(haystack);
        let needle = self.fold(needle);
        haystack
            .match_indices(needle.as_str())
            .any(|(start, _)| self.ends_on_boundary(&haystack, start + needle.len()))
    }

    pub fn starts_with(&self, haystack: &str, prefix: &str) -> bool {
        let haystack = self.fold(haystack);
        let prefix = self.fold(prefix);
        haystack.starts_with(prefix.as_str()) && self.ends_on_boundary(&haystack, prefix.len())
    }

    pub fn ends_with(&self, haystack: &str, suffix: &str) -> bool {
        self.fold(haystack).ends_with(self.fold(suffix).as_str())
    }

    /// 转换为用于子串匹配的形式
    fn fold(&self, s: &str) -> String {
        let decomposed = s
            .nfd()
            .filter(|c| !(self.flags.ignore_accents && is_combining_mark(*c)));
        if self.flags.ignore_case {
            decomposed.flat_map(char::to_lowercase).collect()
        } else {
            decomposed.collect()
        }
    }

    // 重音敏感时，匹配不能截断一个带组合符号的字符（"e" 不匹配 "é" 的前半部分）
    fn ends_on_boundary(&self, folded: &str, end: usize) -> bool {
        if self.flags.ignore_accents {
            return true;
        }
        folded[end..]
            .chars()
            .next()
            .is_none_or(|c| !is_combining_mark(c))
    }
}

fn primary_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn accent_key(s: &str) -> String {
    s.nfd().flat_map(char::to_lowercase).collect()
}

fn case_key(s: &str, strip_accents: bool) -> Vec<bool> {
    s.nfd()
        .filter(|c| !(strip_accents && is_combining_mark(*c)))
        .map(char::is_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact() -> Collator {
        Collator::with_flags(CompareFlags::NONE)
    }

    fn ignore_case() -> Collator {
        Collator::with_flags(CompareFlags::IGNORE_CASE)
    }

    fn ignore_all() -> Collator {
        Collator::with_flags(CompareFlags::IGNORE_CASE_AND_ACCENTS)
    }

    #[test]
    fn test_exact_equality() {
        assert!(exact().equals("hat", "hat"));
        assert!(!exact().equals("Hat", "hat"));
        // 预组合与分解形式视为相同
        assert!(exact().equals("Jo\u{eb}", "Joe\u{308}"));
    }

    #[test]
    fn test_ignore_case_equality() {
        assert!(ignore_case().equals("Hat", "hAT"));
        assert!(!ignore_case().equals("Joë", "Joe"));
        assert!(ignore_all().equals("Joë", "JOE"));
    }

    #[test]
    fn test_culture_ordering() {
        // 一级差异优先于大小写
        assert_eq!(exact().compare("a", "B"), Ordering::Less);
        assert_eq!(exact().compare("b", "A"), Ordering::Greater);
        // 小写排在大写之前
        assert_eq!(exact().compare("a", "A"), Ordering::Less);
        assert_eq!(exact().compare("e", "é"), Ordering::Less);
        assert_eq!(ignore_all().compare("é", "E"), Ordering::Equal);
    }

    #[test]
    fn test_contains() {
        assert!(!exact().contains("Top plays by Joe Montana", "joe"));
        assert!(ignore_case().contains("Top plays by Joe Montana", "joe"));
        assert!(!ignore_case().contains("Top plays by Joë Montana", "joe"));
        assert!(ignore_all().contains("Top plays by Joë Montana", "joe"));
    }

    #[test]
    fn test_accent_sensitive_match_respects_combining_marks() {
        assert!(!exact().contains("café", "cafe"));
        assert!(exact().contains("café", "café"));
        assert!(!exact().starts_with("école", "e"));
        assert!(ignore_all().starts_with("école", "E"));
    }

    #[test]
    fn test_prefix_and_suffix() {
        assert!(exact().starts_with("hello world", "hello"));
        assert!(!exact().starts_with("hello world", "Hello"));
        assert!(ignore_case().ends_with("hello WORLD", "world"));
        assert!(!exact().ends_with("hello", "world"));
    }
}
