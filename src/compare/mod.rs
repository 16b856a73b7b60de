//! Structural deep equality over JSON values.
//!
//! Used to decide whether an incoming request "is the same" as the one that
//! produced a cache entry. Two values are equal when they are the same
//! reference, or both are objects (arrays included) with the same keys whose
//! values are recursively equal, or both are primitives equal by value.
//!
//! Integers compare exactly. When either side is a float both are compared
//! as `f64`, so `1` and `1.0` are equal even though `serde_json` stores them
//! differently, while distinct integers beyond 2^53 stay distinct.

use serde_json::Value;

/// Returns `true` if `a` and `b` are structurally equal.
///
/// Total over any pair of values; never fails.
///
/// # Examples
///
/// ```
/// use reqcache::compare::deep_equal;
/// use serde_json::json;
///
/// assert!(deep_equal(&json!({"a": [1, {"b": null}]}), &json!({"a": [1.0, {"b": null}]})));
/// assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
/// assert!(!deep_equal(&json!(null), &json!({})));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }

    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, lv)| match right.get(key) {
                    Some(rv) => deep_equal(lv, rv),
                    None => false,
                })
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len() && left.iter().zip(right).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Number(left), Value::Number(right)) => {
            if left.is_f64() || right.is_f64() {
                matches!((left.as_f64(), right.as_f64()), (Some(l), Some(r)) if l == r)
            } else {
                left == right
            }
        }
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_reference_is_equal() {
        let v = json!({"deep": {"nested": [1, 2, 3]}});
        assert!(deep_equal(&v, &v));
    }

    #[test]
    fn key_order_is_irrelevant() {
        assert!(deep_equal(
            &json!({"a": 1, "b": {"c": true, "d": "x"}}),
            &json!({"b": {"d": "x", "c": true}, "a": 1}),
        ));
    }

    #[test]
    fn differing_key_sets() {
        assert!(!deep_equal(&json!({"a": 1}), &json!({"b": 1})));
        assert!(!deep_equal(&json!({"a": 1, "b": 2}), &json!({"a": 1})));
    }

    #[test]
    fn null_against_object() {
        assert!(!deep_equal(&json!(null), &json!({"a": 1})));
        assert!(!deep_equal(&json!([]), &json!(null)));
        assert!(deep_equal(&json!(null), &json!(null)));
    }

    #[test]
    fn arrays_compare_positionally() {
        assert!(deep_equal(&json!([1, "two", [3]]), &json!([1, "two", [3]])));
        assert!(!deep_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!deep_equal(&json!([1, 2]), &json!([1, 2, 3])));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(deep_equal(&json!(5), &json!(5.0)));
        assert!(!deep_equal(&json!(5), &json!(6)));
        assert!(!deep_equal(&json!(5), &json!("5")));
        assert!(deep_equal(&json!(-3), &json!(-3.0)));
        assert!(!deep_equal(&json!(0.5), &json!(0)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let a = json!(9_007_199_254_740_993_u64);
        let b = json!(9_007_199_254_740_992_u64);
        assert!(!deep_equal(&a, &b));
        assert!(deep_equal(&a, &json!(9_007_199_254_740_993_u64)));
        assert!(!deep_equal(&json!(i64::MIN), &json!(i64::MIN + 1)));
        assert!(!deep_equal(&json!({"id": a}), &json!({"id": b})));
    }

    #[test]
    fn nested_difference_is_detected() {
        assert!(!deep_equal(
            &json!({"headers": {"authorization": "Bearer a"}}),
            &json!({"headers": {"authorization": "Bearer b"}}),
        ));
    }

    #[test]
    fn array_and_object_are_distinct() {
        assert!(!deep_equal(&json!([]), &json!({})));
        assert!(!deep_equal(&json!({"0": 1}), &json!([1])));
    }
}
