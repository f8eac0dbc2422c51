//! Query builder and executor.
//!
//! The [`Query`] struct provides a fluent builder API for constructing queries
//! and methods for executing them against collections of [`Seekable`] records.

use crate::filter::{FilterSpec, Scalar};
use crate::op::FilterOp;
use crate::ordering::{OrderBy, SortOrder};
use crate::traits::Seekable;

/// Free-text search over a record.
///
/// A record matches when the term is a substring of the text of at least one
/// searched field. With no `fields`, every top-level value is searched.
/// Absent values never match. An empty term matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Search {
    pub term: String,
    pub fields: Vec<String>,
    pub case_sensitive: bool,
}

impl Search {
    pub fn new(term: impl Into<String>) -> Self {
        Search {
            term: term.into(),
            ..Search::default()
        }
    }

    pub fn matches<T: Seekable>(&self, item: &T) -> bool {
        if self.term.is_empty() {
            return true;
        }
        let needle = if self.case_sensitive {
            self.term.clone()
        } else {
            self.term.to_lowercase()
        };
        let hit = |text: &str| {
            if self.case_sensitive {
                text.contains(&needle)
            } else {
                text.to_lowercase().contains(&needle)
            }
        };

        if self.fields.is_empty() {
            item.seeker_values()
                .iter()
                .filter_map(|value| value.to_text())
                .any(|text| hit(&text))
        } else {
            self.fields.iter().any(|field| {
                item.seeker_field_value(field)
                    .to_text()
                    .is_some_and(|text| hit(&text))
            })
        }
    }
}

/// A query for searching, filtering and ordering collections.
///
/// Stages run in a fixed order: search, then every filter (all must pass),
/// then a stable sort, then offset and limit.
///
/// # Example
///
/// ```
/// use lexia_seeker::{Query, Record};
///
/// let rows = vec![
///     Record::new().with("id", "1").with("name", "Ana").with("age", 30),
///     Record::new().with("id", "2").with("name", "Beto").with("age", 25),
///     Record::new().with("id", "3").with("name", "Ana").with("age", 20),
/// ];
///
/// let query = Query::new()
///     .search("an")
///     .and_gte("age", 21)
///     .order_asc("age")
///     .build();
///
/// let results = query.filter(&rows);
/// assert_eq!(results.len(), 1);
/// assert_eq!(results[0].get("id"), Some(&"1".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    search: Search,
    filters: Vec<(String, FilterSpec)>,
    ordering: Option<OrderBy>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl Query {
    /// Creates a new empty query.
    ///
    /// An empty query matches all items.
    pub fn new() -> Self {
        Query::default()
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Sets the free-text search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search.term = term.into();
        self
    }

    /// Restricts search to the given dot paths.
    pub fn search_in<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.search.case_sensitive = yes;
        self
    }

    pub fn with_search(mut self, search: Search) -> Self {
        self.search = search;
        self
    }

    // ========================================================================
    // Filter builders
    // ========================================================================

    /// Adds a filter. Every filter must pass for an item to be included.
    ///
    /// Blank literals (`null`, `""`) are ignored.
    pub fn and(mut self, field: &str, spec: FilterSpec) -> Self {
        if !spec.is_blank() {
            self.filters.push((field.to_string(), spec));
        }
        self
    }

    /// Adds an equality filter.
    pub fn and_eq(self, field: &str, value: impl Into<Scalar>) -> Self {
        self.and(field, FilterSpec::eq(value))
    }

    /// Adds a membership filter.
    pub fn and_in<I, S>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        self.and(field, FilterSpec::one_of(values))
    }

    /// Adds a case-insensitive substring filter.
    pub fn and_contains(self, field: &str, value: &str) -> Self {
        self.and(field, FilterSpec::contains(value))
    }

    pub fn and_startswith(self, field: &str, value: &str) -> Self {
        self.and(field, FilterSpec::starts_with(value))
    }

    pub fn and_endswith(self, field: &str, value: &str) -> Self {
        self.and(field, FilterSpec::ends_with(value))
    }

    pub fn and_gt(self, field: &str, value: impl Into<Scalar>) -> Self {
        self.and(field, FilterSpec::op(FilterOp::GreaterThan, value))
    }

    pub fn and_gte(self, field: &str, value: impl Into<Scalar>) -> Self {
        self.and(field, FilterSpec::op(FilterOp::GreaterOrEqual, value))
    }

    pub fn and_lt(self, field: &str, value: impl Into<Scalar>) -> Self {
        self.and(field, FilterSpec::op(FilterOp::LessThan, value))
    }

    pub fn and_lte(self, field: &str, value: impl Into<Scalar>) -> Self {
        self.and(field, FilterSpec::op(FilterOp::LessOrEqual, value))
    }

    /// Adds an inclusive range filter.
    pub fn and_between(self, field: &str, low: impl Into<Scalar>, high: impl Into<Scalar>) -> Self {
        self.and(field, FilterSpec::between(low, high))
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Sets the sort key, replacing any previous one.
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.ordering = Some(OrderBy::new(field, order));
        self
    }

    pub fn order_asc(self, field: &str) -> Self {
        self.order_by(field, SortOrder::Asc)
    }

    pub fn order_desc(self, field: &str) -> Self {
        self.order_by(field, SortOrder::Desc)
    }

    // ========================================================================
    // Limits
    // ========================================================================

    /// Sets the maximum number of results to return.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets the number of results to skip.
    pub fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Finalizes the query.
    pub fn build(self) -> Self {
        self
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn search_spec(&self) -> &Search {
        &self.search
    }

    pub fn filters(&self) -> &[(String, FilterSpec)] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.ordering.as_ref()
    }

    /// Returns `true` if this query has no search term and no filters.
    pub fn is_empty(&self) -> bool {
        self.search.term.is_empty() && self.filters.is_empty()
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Tests if a single item passes the search and every filter.
    pub fn matches<T: Seekable>(&self, item: &T) -> bool {
        self.search.matches(item)
            && self
                .filters
                .iter()
                .all(|(field, spec)| spec.matches(&item.seeker_field_value(field)))
    }

    /// Returns references to matching items, sorted, then offset and limit
    /// applied.
    pub fn filter<'a, T: Seekable>(&self, items: &'a [T]) -> Vec<&'a T> {
        let mut results: Vec<&'a T> = items.iter().filter(|item| self.matches(*item)).collect();

        if let Some(ordering) = &self.ordering {
            results.sort_by(|a, b| ordering.compare_items(*a, *b));
        }

        let offset = self.offset.unwrap_or(0);
        if offset > 0 {
            if offset >= results.len() {
                return Vec::new();
            }
            results.drain(..offset);
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }

        results
    }

    /// Counts matching items, ignoring offset and limit.
    pub fn count<T: Seekable>(&self, items: &[T]) -> usize {
        items.iter().filter(|item| self.matches(*item)).count()
    }
}
