//! Comparator Policy
//!
//! Ordering predicates handed to the engine at construction and used for every
//! sorted query it performs. The engine never falls back to an ordering of its
//! own, so swapping the policy changes sort semantics everywhere at once.

use serde_json::Value;
use std::cmp::Ordering;

/// Pluggable ordering strategy for sorted queries.
pub trait Comparator: Send + Sync {
    /// Total order between two field values.
    fn compare(&self, a: &Value, b: &Value) -> Ordering;

    /// `a < b`, or `a <= b` when `or_equal` is set.
    fn lt(&self, a: &Value, b: &Value, or_equal: bool) -> bool {
        match self.compare(a, b) {
            Ordering::Less => true,
            Ordering::Equal => or_equal,
            Ordering::Greater => false,
        }
    }

    /// `a > b`, or `a >= b` when `or_equal` is set.
    fn gt(&self, a: &Value, b: &Value, or_equal: bool) -> bool {
        match self.compare(a, b) {
            Ordering::Greater => true,
            Ordering::Equal => or_equal,
            Ordering::Less => false,
        }
    }
}

/// Stable cross-type ordering compatible with previously persisted stores.
///
/// Values of different JSON types order by type rank:
/// `null < false < true < number < string < array < object`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyComparator;

impl LegacyComparator {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(false) => 1,
            Value::Bool(true) => 2,
            Value::Number(_) => 3,
            Value::String(_) => 4,
            Value::Array(_) => 5,
            Value::Object(_) => 6,
        }
    }
}

impl Comparator for LegacyComparator {
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.total_cmp(&y)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Array(xs), Value::Array(ys)) => {
                for (x, y) in xs.iter().zip(ys.iter()) {
                    match self.compare(x, y) {
                        Ordering::Equal => continue,
                        ordering => return ordering,
                    }
                }
                xs.len().cmp(&ys.len())
            }
            (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
            _ => Self::rank(a).cmp(&Self::rank(b)),
        }
    }
}
