//! Property-based tests for seeker using proptest.

use proptest::prelude::*;
use lexia_seeker::{collate, Number, Query, Seekable, SortOrder, Value};
use std::cmp::Ordering;

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct TestItem {
    value: Option<i64>,
    name: String,
    active: bool,
}

impl Seekable for TestItem {
    fn seeker_field_value(&self, field: &str) -> Value<'_> {
        match field {
            "value" => self
                .value
                .map(|v| Value::Number(Number::I64(v)))
                .unwrap_or(Value::None),
            "name" => Value::String(&self.name),
            "active" => Value::Bool(self.active),
            _ => Value::None,
        }
    }

    fn seeker_values(&self) -> Vec<Value<'_>> {
        vec![
            self.seeker_field_value("value"),
            self.seeker_field_value("name"),
            self.seeker_field_value("active"),
        ]
    }
}

// Values stay well inside the exactly-representable f64 range so numeric
// coercion never rounds.
fn test_item_strategy() -> impl Strategy<Value = TestItem> {
    (
        prop::option::weighted(0.9, -1_000_000i64..1_000_000),
        "[a-zA-Z]{1,10}",
        any::<bool>(),
    )
        .prop_map(|(value, name, active)| TestItem {
            value,
            name,
            active,
        })
}

fn items_strategy(max: usize) -> impl Strategy<Value = Vec<TestItem>> {
    prop::collection::vec(test_item_strategy(), 0..max)
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Filter should never return more items than the input.
    #[test]
    fn filter_never_grows_collection(
        items in items_strategy(100),
        threshold in -1_000_000i64..1_000_000,
        term in "[a-z]{0,3}",
    ) {
        let query = Query::new()
            .search(term)
            .and_gt("value", threshold)
            .build();

        let results = query.filter(&items);
        prop_assert!(results.len() <= items.len());
    }

    /// Count should equal the length of filtered results.
    #[test]
    fn count_equals_filter_len(
        items in items_strategy(100),
        threshold in -1_000_000i64..1_000_000,
    ) {
        let query = Query::new().and_gte("value", threshold).build();
        prop_assert_eq!(query.filter(&items).len(), query.count(&items));
    }

    /// Empty query should match all items.
    #[test]
    fn empty_query_matches_all(items in items_strategy(50)) {
        let query = Query::new().build();
        prop_assert_eq!(query.filter(&items).len(), items.len());
    }

    /// Offset + limit should work correctly.
    #[test]
    fn offset_and_limit_work_together(
        items in items_strategy(100),
        offset in 0usize..50,
        limit in 1usize..50,
    ) {
        let query = Query::new().offset(offset).limit(limit).build();
        let results = query.filter(&items);

        prop_assert!(results.len() <= limit);
        prop_assert!(results.len() <= items.len().saturating_sub(offset));
    }

    /// Every filter must be satisfied.
    #[test]
    fn filters_all_satisfied(
        items in items_strategy(50),
        threshold in -1_000_000i64..1_000_000,
    ) {
        let query = Query::new()
            .and_gte("value", threshold)
            .and_eq("active", true)
            .build();

        for item in query.filter(&items) {
            prop_assert!(item.value.is_some_and(|v| v >= threshold));
            prop_assert!(item.active);
        }
    }

    /// between keeps exactly the items inside the inclusive range.
    #[test]
    fn between_is_inclusive_range(
        items in items_strategy(50),
        a in -1_000i64..1_000,
        b in -1_000i64..1_000,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let query = Query::new().and_between("value", low, high).build();
        let expected = items
            .iter()
            .filter(|item| item.value.is_some_and(|v| low <= v && v <= high))
            .count();
        prop_assert_eq!(query.count(&items), expected);
    }

    /// Case-insensitive search only keeps items whose text contains the term.
    #[test]
    fn search_results_contain_term(
        items in items_strategy(50),
        term in "[a-z]{1,2}",
    ) {
        let query = Query::new().search(term.clone()).search_in(["name"]).build();
        for item in query.filter(&items) {
            prop_assert!(item.name.to_lowercase().contains(&term));
        }
    }

    /// Sorting is stable in both directions and keeps absent values at the
    /// ascending end.
    #[test]
    fn ordering_is_stable(
        base in prop::collection::vec(prop::option::weighted(0.8, 0i64..10), 5..30),
        desc in any::<bool>(),
    ) {
        let items: Vec<TestItem> = base
            .into_iter()
            .enumerate()
            .map(|(i, value)| TestItem { value, name: format!("n{i}"), active: true })
            .collect();
        let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
        let results = Query::new().order_by("value", order).build().filter(&items);

        for pair in results.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let pos = |x: &TestItem| items.iter().position(|y| std::ptr::eq(x, y));
            let base = match (prev.value, curr.value) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(&b),
            };
            match order.apply(base) {
                Ordering::Equal => prop_assert!(pos(prev) < pos(curr), "equal items reordered"),
                ordering => prop_assert_eq!(ordering, Ordering::Less, "sort order violated"),
            }
        }
    }

    /// Names that differ only in case compare equal, so they keep their
    /// input order in both directions.
    #[test]
    fn case_only_ties_keep_input_order(
        names in prop::collection::vec(("[a-c]{1,2}", any::<bool>()), 2..20),
        desc in any::<bool>(),
    ) {
        let items: Vec<TestItem> = names
            .into_iter()
            .enumerate()
            .map(|(i, (name, upper))| TestItem {
                value: Some(i as i64),
                name: if upper { name.to_uppercase() } else { name },
                active: true,
            })
            .collect();
        let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
        let results = Query::new().order_by("name", order).build().filter(&items);

        for pair in results.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let base = prev.name.to_lowercase().cmp(&curr.name.to_lowercase());
            match order.apply(base) {
                Ordering::Equal => prop_assert!(prev.value < curr.value, "case-only tie reordered"),
                ordering => prop_assert_eq!(ordering, Ordering::Less, "sort order violated"),
            }
        }
    }

    /// Collation is a total order consistent with sorting.
    #[test]
    fn collation_is_antisymmetric(a in "\\PC{0,8}", b in "\\PC{0,8}") {
        prop_assert_eq!(collate(&a, &b), collate(&b, &a).reverse());
    }
}

// ============================================================================
// Additional edge case tests
// ============================================================================

#[test]
fn empty_collection_returns_empty() {
    let items: Vec<TestItem> = vec![];
    let query = Query::new().and_eq("value", 42).build();

    assert!(query.filter(&items).is_empty());
    assert_eq!(query.count(&items), 0);
}

#[test]
fn offset_equal_to_length_returns_empty() {
    let items: Vec<TestItem> = (0..5)
        .map(|i| TestItem {
            value: Some(i),
            name: "x".into(),
            active: true,
        })
        .collect();
    assert!(Query::new().offset(5).build().filter(&items).is_empty());
    assert!(Query::new().limit(0).build().filter(&items).is_empty());
}
