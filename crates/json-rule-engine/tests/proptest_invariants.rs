//! 规则引擎性质测试
//!
//! 使用 proptest 随机生成规则与记录，验证求值不变式。

use json_rules::{CompareFlags, JsonEvaluator, Operator, RuleOptions};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn integer_rule(operator: &str, value: Value) -> JsonEvaluator {
    JsonEvaluator::new(&json!({
        "field": "x", "type": "integer", "operator": operator, "value": value
    }))
    .unwrap()
}

/// 操作符名称的随机拼写变体：随机大小写，单词之间插入空格、下划线或连字符
fn arb_operator_spelling() -> impl Strategy<Value = (Operator, String)> {
    (
        prop::sample::select(Operator::ALL.to_vec()),
        prop::collection::vec(any::<bool>(), 32),
        prop::sample::select(vec!["", " ", "_", "-", "  "]),
    )
        .prop_map(|(operator, upper, separator)| {
            let mut spelling = String::new();
            for (i, c) in operator.name().chars().enumerate() {
                if i > 0 && c.is_ascii_uppercase() {
                    spelling.push_str(separator);
                }
                if upper[i % upper.len()] {
                    spelling.push(c.to_ascii_uppercase());
                } else {
                    spelling.push(c.to_ascii_lowercase());
                }
            }
            (operator, spelling)
        })
}

/// 扁平的随机记录：若干整数和字符串字段
fn arb_record() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(
        prop::sample::select(vec!["a", "b", "c", "x"]),
        prop_oneof![
            any::<i32>().prop_map(|i| json!(i)),
            "[a-zA-Z]{0,6}".prop_map(Value::String),
        ],
        0..4,
    )
    .prop_map(|fields| {
        Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<Map<_, _>>(),
        )
    })
}

/// 随机的两层规则树
fn arb_rule() -> impl Strategy<Value = Value> {
    let leaf = (
        prop::sample::select(vec!["a", "b", "c", "x"]),
        prop::sample::select(vec!["equal", "not_equal", "less", "greater_or_equal", "is_null"]),
        any::<i16>(),
    )
        .prop_map(|(field, operator, value)| {
            json!({"field": field, "type": "integer", "operator": operator, "value": value})
        });

    (
        prop::collection::vec(
            (
                prop::sample::select(vec!["AND", "OR"]),
                any::<bool>(),
                prop::collection::vec(leaf, 0..4),
            ),
            0..3,
        ),
        prop::sample::select(vec!["AND", "OR"]),
    )
        .prop_map(|(groups, kind)| {
            let rules: Vec<Value> = groups
                .into_iter()
                .map(|(kind, not, rules)| json!({"condition": kind, "not": not, "rules": rules}))
                .collect();
            json!({"condition": kind, "rules": rules})
        })
}

// ============================================================================
// 操作符名称规范化
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn operator_spelling_resolves((operator, spelling) in arb_operator_spelling()) {
        let parsed: Operator = spelling.parse().unwrap();
        prop_assert_eq!(parsed, operator, "拼写 {:?}", spelling);
    }
}

// ============================================================================
// 取反等价
// ============================================================================

proptest! {
    #[test]
    fn less_or_equal_is_not_greater(data in any::<i64>(), bound in any::<i64>()) {
        let record = json!({"x": data});
        let less_or_equal = integer_rule("less_or_equal", json!(bound)).evaluate(&record);
        let greater = integer_rule("greater", json!(bound)).evaluate(&record);
        prop_assert_eq!(less_or_equal, !greater);
        prop_assert_eq!(less_or_equal, data <= bound);
    }

    #[test]
    fn greater_or_equal_is_not_less(data in any::<i64>(), bound in any::<i64>()) {
        let record = json!({"x": data});
        let greater_or_equal = integer_rule("greater_or_equal", json!(bound)).evaluate(&record);
        let less = integer_rule("less", json!(bound)).evaluate(&record);
        prop_assert_eq!(greater_or_equal, !less);
        prop_assert_eq!(greater_or_equal, data >= bound);
    }

    #[test]
    fn between_is_inclusive(a in any::<i32>(), b in any::<i32>(), data in any::<i32>()) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let record = json!({"x": data});
        let between = integer_rule("between", json!([low, high])).evaluate(&record);
        let not_between = integer_rule("not_between", json!([low, high])).evaluate(&record);
        prop_assert_eq!(between, low <= data && data <= high);
        prop_assert_eq!(not_between, !between);
    }
}

// ============================================================================
// 确定性
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn evaluation_is_deterministic(rule in arb_rule(), record in arb_record()) {
        let evaluator = JsonEvaluator::new(&rule).unwrap();
        let first = evaluator.evaluate(&record);
        for _ in 0..3 {
            prop_assert_eq!(evaluator.evaluate(&record), first);
        }
        prop_assert_eq!(evaluator.explain(&record).matched, first);
    }

    #[test]
    fn rendering_is_deterministic(rule in arb_rule()) {
        let first = JsonEvaluator::new(&rule).unwrap();
        let second = JsonEvaluator::new(&rule).unwrap();
        prop_assert_eq!(first.to_string(), second.to_string());
        prop_assert_eq!(first.to_friendly_string(), second.to_friendly_string());
    }

    #[test]
    fn options_do_not_change_numeric_rules(rule in arb_rule(), record in arb_record()) {
        let exact = JsonEvaluator::new(&rule).unwrap();
        let relaxed = JsonEvaluator::with_options(
            &rule,
            RuleOptions::default().with_compare(CompareFlags::IGNORE_CASE_AND_ACCENTS),
        )
        .unwrap();
        prop_assert_eq!(exact.evaluate(&record), relaxed.evaluate(&record));
    }

    #[test]
    fn empty_and_matches_everything(record in arb_record()) {
        let and = JsonEvaluator::new(&json!({"condition": "AND", "rules": []})).unwrap();
        let or = JsonEvaluator::new(&json!({"condition": "OR", "rules": []})).unwrap();
        prop_assert!(and.evaluate(&record));
        prop_assert!(!or.evaluate(&record));
    }
}
