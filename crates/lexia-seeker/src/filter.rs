//! Per-field filter conditions.
//!
//! A [`FilterSpec`] is one of three shapes:
//!
//! | Shape | JSON form | Passes when |
//! |-------|-----------|-------------|
//! | Literal | `"civil"`, `3`, `true` | field equals the literal (same kind) |
//! | Membership | `["diaria", "semanal"]` | field equals any listed value |
//! | Operator | `{"operator": "between", "value": [22, 31]}` | operator test passes |

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SeekerError};
use crate::op::FilterOp;
use crate::value::{Number, Timestamp, Value};

/// Owned scalar used as a filter operand.
///
/// Unlike [`Value`], which borrows from the record, `Scalar` owns its data
/// so it can be stored in table state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Timestamp(Timestamp),
}

impl Scalar {
    /// Strict equality against a field value: same kind, equal value.
    ///
    /// `Null` only equals an absent field. Numbers of different
    /// representations compare by magnitude, so `30` equals `30.0`.
    pub fn matches(&self, value: &Value<'_>) -> bool {
        match (self, value) {
            (Scalar::Null, Value::None) => true,
            (Scalar::Bool(a), Value::Bool(b)) => a == b,
            (Scalar::Number(a), Value::Number(b)) => {
                a.compare(*b) == Some(std::cmp::Ordering::Equal)
            }
            (Scalar::String(a), Value::String(b)) => a == b,
            (Scalar::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }

    /// Borrows the scalar as a comparison value.
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Scalar::Null => Value::None,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(*n),
            Scalar::String(s) => Value::String(s),
            Scalar::Timestamp(t) => Value::Timestamp(*t),
        }
    }

    /// `true` for `null` and the empty string, which clear a filter.
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Converts a JSON scalar. Arrays and objects return `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Scalar> {
        match value {
            serde_json::Value::Null => Some(Scalar::Null),
            serde_json::Value::Bool(b) => Some(Scalar::Bool(*b)),
            serde_json::Value::Number(n) => Number::from_json(n).map(Scalar::Number),
            serde_json::Value::String(s) => Some(Scalar::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Reads a command-line token: `null`, `true`/`false`, a number, an
    /// RFC 3339 date-time, or text.
    pub fn infer(text: &str) -> Scalar {
        match text {
            "null" => Scalar::Null,
            "true" => Scalar::Bool(true),
            "false" => Scalar::Bool(false),
            _ => {
                if let Ok(n) = text.parse::<i64>() {
                    Scalar::Number(Number::I64(n))
                } else if let Ok(f) = text.parse::<f64>() {
                    Scalar::Number(Number::F64(f))
                } else if let Some(at) = Timestamp::parse(text) {
                    Scalar::Timestamp(at)
                } else {
                    Scalar::String(text.to_string())
                }
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => write!(f, "'{s}'"),
            Scalar::Timestamp(t) => write!(f, "{t}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<Timestamp> for Scalar {
    fn from(t: Timestamp) -> Self {
        Scalar::Timestamp(t)
    }
}

macro_rules! scalar_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(n: $t) -> Self {
                    Scalar::Number(Number::from(n))
                }
            }
        )*
    };
}

scalar_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// Operand of an operator-style filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    One(Scalar),
    Many(Vec<Scalar>),
}

/// A declarative condition on one field.
///
/// # Example
///
/// ```
/// use lexia_seeker::{FilterSpec, Value, Number};
///
/// let adults = FilterSpec::between(22, 31);
/// assert!(adults.matches(&Value::Number(Number::I64(25))));
/// assert!(!adults.matches(&Value::Number(Number::I64(20))));
///
/// let spec = FilterSpec::from_json(
///     "age",
///     &serde_json::json!({ "operator": "gte", "value": 18 }),
/// ).unwrap();
/// assert!(spec.matches(&Value::String("18")));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Equality with a literal value.
    Literal(Scalar),
    /// Membership in a set of allowed values.
    OneOf(Vec<Scalar>),
    /// Operator test.
    Op { op: FilterOp, operand: Operand },
}

impl FilterSpec {
    pub fn eq(value: impl Into<Scalar>) -> Self {
        FilterSpec::Literal(value.into())
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        FilterSpec::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn op(op: FilterOp, value: impl Into<Scalar>) -> Self {
        FilterSpec::Op {
            op,
            operand: Operand::One(value.into()),
        }
    }

    pub fn contains(text: &str) -> Self {
        FilterSpec::op(FilterOp::Contains, text)
    }

    pub fn starts_with(text: &str) -> Self {
        FilterSpec::op(FilterOp::StartsWith, text)
    }

    pub fn ends_with(text: &str) -> Self {
        FilterSpec::op(FilterOp::EndsWith, text)
    }

    pub fn between(low: impl Into<Scalar>, high: impl Into<Scalar>) -> Self {
        FilterSpec::Op {
            op: FilterOp::Between,
            operand: Operand::Many(vec![low.into(), high.into()]),
        }
    }

    /// A blank literal (`null` or `""`) means "no filter" for its field.
    pub fn is_blank(&self) -> bool {
        matches!(self, FilterSpec::Literal(s) if s.is_blank())
    }

    /// Tests a field value against this condition.
    pub fn matches(&self, value: &Value<'_>) -> bool {
        match self {
            FilterSpec::Literal(literal) => literal.matches(value),
            FilterSpec::OneOf(set) => set.iter().any(|allowed| allowed.matches(value)),
            FilterSpec::Op { op, operand } => match_op(*op, operand, value),
        }
    }

    /// Interprets a JSON filter description.
    ///
    /// Arrays become membership tests, objects with an `operator` key become
    /// operator tests, and scalars become literals. An object without an
    /// `operator` key is rejected.
    pub fn from_json(field: &str, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| {
                    Scalar::from_json(item).ok_or_else(|| {
                        SeekerError::invalid_filter(field, "membership values must be scalars")
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(FilterSpec::OneOf),
            serde_json::Value::Object(map) => {
                let Some(operator) = map.get("operator") else {
                    return Err(SeekerError::invalid_filter(
                        field,
                        "object filters need an 'operator' key",
                    ));
                };
                let op = operator.as_str().map(FilterOp::parse).unwrap_or_default();
                let operand = match map.get("value") {
                    None => Operand::One(Scalar::Null),
                    Some(serde_json::Value::Array(items)) => Operand::Many(
                        items
                            .iter()
                            .map(|item| {
                                Scalar::from_json(item).ok_or_else(|| {
                                    SeekerError::invalid_filter(
                                        field,
                                        "operand values must be scalars",
                                    )
                                })
                            })
                            .collect::<Result<Vec<_>>>()?,
                    ),
                    Some(other) => Operand::One(Scalar::from_json(other).ok_or_else(|| {
                        SeekerError::invalid_filter(field, "operand must be a scalar or array")
                    })?),
                };
                Ok(FilterSpec::Op { op, operand })
            }
            scalar => Ok(FilterSpec::Literal(
                Scalar::from_json(scalar).unwrap_or(Scalar::Null),
            )),
        }
    }

    /// Converts back to the JSON description accepted by [`from_json`](Self::from_json).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FilterSpec::Literal(s) => serde_json::to_value(s).unwrap_or_default(),
            FilterSpec::OneOf(set) => serde_json::to_value(set).unwrap_or_default(),
            FilterSpec::Op { op, operand } => serde_json::json!({
                "operator": op.as_str(),
                "value": operand,
            }),
        }
    }

    /// Human-readable summary, e.g. `frecuencia_envio in ['diaria', 'semanal']`.
    pub fn describe(&self, field: &str) -> String {
        match self {
            FilterSpec::Literal(s) => format!("{field}={s}"),
            FilterSpec::OneOf(set) => {
                let items: Vec<String> = set.iter().map(ToString::to_string).collect();
                format!("{field} in [{}]", items.join(", "))
            }
            FilterSpec::Op { op, operand } => match operand {
                Operand::One(s) => format!("{field} {op} {s}"),
                Operand::Many(items) => {
                    let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                    format!("{field} {op} [{}]", items.join(", "))
                }
            },
        }
    }
}

fn match_op(op: FilterOp, operand: &Operand, value: &Value<'_>) -> bool {
    match (op, operand) {
        (FilterOp::Equals, Operand::One(expected)) => expected.matches(value),
        (FilterOp::Between, Operand::Many(bounds)) if bounds.len() == 2 => {
            let v = value.coerce_f64();
            let low = bounds[0].as_value().coerce_f64();
            let high = bounds[1].as_value().coerce_f64();
            low <= v && v <= high
        }
        (op, Operand::One(needle)) if op.is_text_op() => {
            let (Some(haystack), Some(needle)) = (value.to_text(), needle.as_value().to_text())
            else {
                return false;
            };
            let haystack = haystack.to_lowercase();
            let needle = needle.to_lowercase();
            match op {
                FilterOp::Contains => haystack.contains(&needle),
                FilterOp::StartsWith => haystack.starts_with(&needle),
                FilterOp::EndsWith => haystack.ends_with(&needle),
                _ => false,
            }
        }
        (op, Operand::One(bound)) if op.is_numeric_op() => {
            let v = value.coerce_f64();
            let bound = bound.as_value().coerce_f64();
            v.partial_cmp(&bound)
                .map(|ordering| op.eval_ordering(ordering))
                .unwrap_or(false)
        }
        // Malformed operand for the operator
        _ => false,
    }
}

impl Serialize for FilterSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        FilterSpec::from_json("filter", &value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn literal_is_strict() {
        let spec = FilterSpec::eq(30);
        assert!(spec.matches(&Value::Number(Number::I64(30))));
        assert!(spec.matches(&Value::Number(Number::F64(30.0))));
        assert!(!spec.matches(&Value::String("30")));
        assert!(!spec.matches(&Value::None));
    }

    #[test]
    fn membership() {
        let spec = FilterSpec::one_of(["diaria", "semanal"]);
        assert!(spec.matches(&Value::String("semanal")));
        assert!(!spec.matches(&Value::String("mensual")));
    }

    #[test]
    fn text_operators_ignore_case() {
        assert!(FilterSpec::contains("POP").matches(&Value::String("Banco Popular")));
        assert!(FilterSpec::starts_with("ban").matches(&Value::String("Banco")));
        assert!(FilterSpec::ends_with("LAR").matches(&Value::String("Popular")));
        assert!(!FilterSpec::contains("x").matches(&Value::None));
        assert!(FilterSpec::contains("3").matches(&Value::Number(Number::I64(30))));
    }

    #[test]
    fn numeric_operators_coerce() {
        let gte = FilterSpec::op(FilterOp::GreaterOrEqual, 18);
        assert!(gte.matches(&Value::Number(Number::I64(18))));
        assert!(gte.matches(&Value::String("20")));
        assert!(!gte.matches(&Value::String("abc")));
        assert!(!gte.matches(&Value::None));

        let lt = FilterSpec::op(FilterOp::LessThan, "10");
        assert!(lt.matches(&Value::Number(Number::F64(9.5))));
    }

    #[test]
    fn between_is_inclusive() {
        let spec = FilterSpec::between(22, 31);
        assert!(spec.matches(&Value::Number(Number::I64(22))));
        assert!(spec.matches(&Value::Number(Number::I64(31))));
        assert!(!spec.matches(&Value::Number(Number::I64(32))));
    }

    #[test]
    fn malformed_between_never_matches() {
        let spec = FilterSpec::Op {
            op: FilterOp::Between,
            operand: Operand::One(Scalar::from(5)),
        };
        assert!(!spec.matches(&Value::Number(Number::I64(5))));

        let spec = FilterSpec::Op {
            op: FilterOp::Between,
            operand: Operand::Many(vec![Scalar::from(1)]),
        };
        assert!(!spec.matches(&Value::Number(Number::I64(1))));
    }

    #[test]
    fn from_json_shapes() {
        assert_eq!(
            FilterSpec::from_json("f", &json!("civil")).unwrap(),
            FilterSpec::eq("civil")
        );
        assert_eq!(
            FilterSpec::from_json("f", &json!([1, 2])).unwrap(),
            FilterSpec::one_of([1, 2])
        );
        assert_eq!(
            FilterSpec::from_json("f", &json!({"operator": "between", "value": [22, 31]}))
                .unwrap(),
            FilterSpec::between(22, 31)
        );
    }

    #[test]
    fn from_json_unknown_operator_is_equality() {
        let spec = FilterSpec::from_json("f", &json!({"operator": "like", "value": "x"})).unwrap();
        assert!(spec.matches(&Value::String("x")));
        assert!(!spec.matches(&Value::String("xy")));
    }

    #[test]
    fn from_json_rejects_operatorless_objects() {
        let err = FilterSpec::from_json("estado", &json!({"value": 1})).unwrap_err();
        assert!(err.to_string().contains("estado"));
    }

    #[test]
    fn blank_literals() {
        assert!(FilterSpec::eq("").is_blank());
        assert!(FilterSpec::Literal(Scalar::Null).is_blank());
        assert!(!FilterSpec::eq(0).is_blank());
        assert!(!FilterSpec::one_of(Vec::<Scalar>::new()).is_blank());
    }

    #[test]
    fn serde_round_trip_through_json_form() {
        let spec = FilterSpec::op(FilterOp::Contains, "abc");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json, json!({"operator": "contains", "value": "abc"}));
        let back: FilterSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn scalar_inference() {
        assert_eq!(Scalar::infer("42"), Scalar::Number(Number::I64(42)));
        assert_eq!(Scalar::infer("2.5"), Scalar::Number(Number::F64(2.5)));
        assert_eq!(Scalar::infer("true"), Scalar::Bool(true));
        assert_eq!(Scalar::infer("civil"), Scalar::String("civil".into()));
        assert_eq!(
            Scalar::infer("2025-05-20T00:00:00Z"),
            Scalar::Timestamp(Timestamp(1_747_699_200_000))
        );
        assert_eq!(Scalar::infer("2025-05-20"), Scalar::String("2025-05-20".into()));
    }

    #[test]
    fn describe_reads_naturally() {
        assert_eq!(FilterSpec::eq("civil").describe("categoria"), "categoria='civil'");
        assert_eq!(
            FilterSpec::between(1, 2).describe("n"),
            "n between [1, 2]"
        );
    }
}
