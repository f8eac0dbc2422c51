//! Comparison operators for filter specs.
//!
//! The [`FilterOp`] enum lists the operators an operator-style filter can
//! carry. Parsing is lenient: an unknown operator name degrades to
//! [`FilterOp::Equals`] instead of failing.

use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Operator of an operator-style filter.
///
/// - **Equality**: `Equals` (strict: same kind and equal value)
/// - **Text**: `Contains`, `StartsWith`, `EndsWith` (case-insensitive)
/// - **Numeric**: `GreaterThan`, `GreaterOrEqual`, `LessThan`, `LessOrEqual`,
///   `Between` (after numeric coercion)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterOp {
    #[default]
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    /// Inclusive range; the operand must be a `[low, high]` pair.
    Between,
}

impl FilterOp {
    /// Parses an operator name.
    ///
    /// Accepts the canonical camel-case names (`greaterOrEqual`) and the
    /// short aliases (`gte`). Matching ignores case. Unknown names fall back
    /// to `Equals`.
    pub fn parse(name: &str) -> FilterOp {
        match name.trim().to_ascii_lowercase().as_str() {
            "equals" | "eq" => FilterOp::Equals,
            "contains" => FilterOp::Contains,
            "startswith" => FilterOp::StartsWith,
            "endswith" => FilterOp::EndsWith,
            "greaterthan" | "gt" => FilterOp::GreaterThan,
            "greaterorequal" | "gte" => FilterOp::GreaterOrEqual,
            "lessthan" | "lt" => FilterOp::LessThan,
            "lessorequal" | "lte" => FilterOp::LessOrEqual,
            "between" => FilterOp::Between,
            other => {
                tracing::debug!(operator = other, "unknown filter operator, using equality");
                FilterOp::Equals
            }
        }
    }

    /// Returns `true` for the case-insensitive text operators.
    pub fn is_text_op(self) -> bool {
        matches!(
            self,
            FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith
        )
    }

    /// Returns `true` for operators that coerce both sides to numbers.
    pub fn is_numeric_op(self) -> bool {
        matches!(
            self,
            FilterOp::GreaterThan
                | FilterOp::GreaterOrEqual
                | FilterOp::LessThan
                | FilterOp::LessOrEqual
                | FilterOp::Between
        )
    }

    /// Evaluates a comparison given an ordering result.
    ///
    /// Used for the numeric operators, where the field value has already
    /// been compared against the operand.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            FilterOp::Equals => ordering == Ordering::Equal,
            FilterOp::GreaterThan => ordering == Ordering::Greater,
            FilterOp::GreaterOrEqual => ordering != Ordering::Less,
            FilterOp::LessThan => ordering == Ordering::Less,
            FilterOp::LessOrEqual => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Returns the canonical name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Equals => "equals",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "startsWith",
            FilterOp::EndsWith => "endsWith",
            FilterOp::GreaterThan => "greaterThan",
            FilterOp::GreaterOrEqual => "greaterOrEqual",
            FilterOp::LessThan => "lessThan",
            FilterOp::LessOrEqual => "lessOrEqual",
            FilterOp::Between => "between",
        }
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for FilterOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FilterOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(FilterOp::parse(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_canonical_names_and_aliases() {
        assert_eq!(FilterOp::parse("startsWith"), FilterOp::StartsWith);
        assert_eq!(FilterOp::parse("greaterOrEqual"), FilterOp::GreaterOrEqual);
        assert_eq!(FilterOp::parse("gte"), FilterOp::GreaterOrEqual);
        assert_eq!(FilterOp::parse("LT"), FilterOp::LessThan);
        assert_eq!(FilterOp::parse("between"), FilterOp::Between);
    }

    #[test]
    fn unknown_operator_degrades_to_equals() {
        assert_eq!(FilterOp::parse("fuzzy"), FilterOp::Equals);
        assert_eq!(FilterOp::parse(""), FilterOp::Equals);
    }

    #[test]
    fn op_eval_ordering() {
        assert!(FilterOp::GreaterThan.eval_ordering(Ordering::Greater));
        assert!(!FilterOp::GreaterThan.eval_ordering(Ordering::Equal));
        assert!(FilterOp::GreaterOrEqual.eval_ordering(Ordering::Equal));
        assert!(!FilterOp::GreaterOrEqual.eval_ordering(Ordering::Less));
        assert!(FilterOp::LessThan.eval_ordering(Ordering::Less));
        assert!(FilterOp::LessOrEqual.eval_ordering(Ordering::Equal));
        assert!(!FilterOp::LessOrEqual.eval_ordering(Ordering::Greater));
        assert!(!FilterOp::Contains.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn op_kinds() {
        assert!(FilterOp::Contains.is_text_op());
        assert!(!FilterOp::Between.is_text_op());
        assert!(FilterOp::Between.is_numeric_op());
        assert!(!FilterOp::Equals.is_numeric_op());
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&FilterOp::LessOrEqual).unwrap();
        assert_eq!(json, "\"lessOrEqual\"");
        let op: FilterOp = serde_json::from_str("\"nope\"").unwrap();
        assert_eq!(op, FilterOp::Equals);
    }
}
