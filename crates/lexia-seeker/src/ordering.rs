//! Ordering types for result sorting.
//!
//! Provides [`SortOrder`] for sort direction, [`OrderBy`] for field-based
//! ordering and [`compare_values`], the comparator every sort goes through.

use std::cmp::Ordering;

use deunicode::deunicode;
use serde::{Deserialize, Serialize};

use crate::traits::Seekable;
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl SortOrder {
    pub fn is_asc(self) -> bool {
        matches!(self, SortOrder::Asc)
    }

    pub fn is_desc(self) -> bool {
        matches!(self, SortOrder::Desc)
    }

    /// Returns the opposite direction.
    pub fn toggle(self) -> SortOrder {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sort key: a field and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy::new(field, SortOrder::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy::new(field, SortOrder::Desc)
    }

    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        OrderBy {
            field: field.into(),
            order,
        }
    }

    /// Compares two values according to this ordering.
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        self.order.apply(compare_values(a, b))
    }

    /// Compares two records on this ordering's field.
    pub fn compare_items<T: Seekable>(&self, a: &T, b: &T) -> Ordering {
        self.compare(
            &a.seeker_field_value(&self.field),
            &b.seeker_field_value(&self.field),
        )
    }

    /// Sorts records in place. The sort is stable: rows that compare equal
    /// keep their relative order.
    pub fn sort<T: Seekable>(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare_items(a, b));
    }
}

/// Ascending comparison of two field values.
///
/// - Absent values sort after every present value.
/// - Two numbers compare numerically. A NaN compares equal to anything.
/// - Two timestamps compare by instant.
/// - Everything else compares as text with [`collate`].
///
/// Descending order reverses the whole result, so absent values come first.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    match (a, b) {
        (Value::None, Value::None) => Ordering::Equal,
        (Value::None, _) => Ordering::Greater,
        (_, Value::None) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x.compare(*y).unwrap_or(Ordering::Equal),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        _ => match (a.to_text(), b.to_text()) {
            (Some(x), Some(y)) => collate(&x, &y),
            _ => Ordering::Equal,
        },
    }
}

/// Locale-aware text comparison.
///
/// Accents and case are ignored at the primary level, so `"Ávila"` sorts
/// next to `"avila"`; ties are broken by the lowercase text, so `"ana"` and
/// `"Ana"` compare equal and keep their input order in a stable sort.
pub fn collate(a: &str, b: &str) -> Ordering {
    deunicode(a)
        .to_lowercase()
        .cmp(&deunicode(b).to_lowercase())
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
}
