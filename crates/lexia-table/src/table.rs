//! The table engine.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use lexia_seeker::{FilterSpec, Query, Search, Seekable, SortOrder};
use serde::Serialize;

use crate::debounce::{Clock, Debounced, SystemClock};
use crate::options::TableOptions;
use crate::pagination::{clamp_page, total_pages, Pagination};
use crate::state::{SortIndicator, TableState};

/// The visible page and its metadata.
#[derive(Debug, Serialize)]
pub struct TableView<'a, T> {
    pub rows: Vec<&'a T>,
    pub pagination: Pagination,
}

/// Search, filter, sort, paginate and select over an owned set of records.
///
/// Rows are recomputed from the records and the current state on every
/// read, in a fixed order: applied search term, filters (all must pass),
/// stable sort, page slice. Records are never mutated.
///
/// The search term is debounced: [`set_search_term`](Self::set_search_term)
/// records it at once, but rows only follow after the quiet period, once
/// [`tick`](Self::tick) sees the deadline has passed (or on
/// [`flush_search`](Self::flush_search)).
///
/// # Example
///
/// ```
/// use lexia_table::{Table, TableOptions};
/// use lexia_seeker::Record;
///
/// let rows = (1..=5)
///     .map(|i| Record::new().with("id", i as i64).with("name", format!("row {i}")))
///     .collect();
/// let mut table = Table::new(rows, TableOptions::new().page_size(2));
///
/// table.set_page(3);
/// let view = table.view();
/// assert_eq!(view.rows.len(), 1);
/// assert_eq!(view.pagination.total_pages, 3);
/// assert_eq!(view.pagination.end_item, 5);
/// ```
pub struct Table<T> {
    records: Vec<T>,
    options: TableOptions,
    search: Debounced<String>,
    sort_by: Option<String>,
    sort_order: SortOrder,
    filters: BTreeMap<String, FilterSpec>,
    page: usize,
    page_size: usize,
    selected: BTreeSet<String>,
}

impl<T: Seekable> Table<T> {
    pub fn new(records: Vec<T>, options: TableOptions) -> Self {
        Table::with_clock(records, options, Arc::new(SystemClock))
    }

    /// Creates a table whose debounce reads time from `clock`.
    pub fn with_clock(records: Vec<T>, options: TableOptions, clock: Arc<dyn Clock>) -> Self {
        let initial = TableState::initial(&options);
        Table {
            records,
            search: Debounced::new(String::new(), options.debounce, clock),
            sort_by: initial.sort_by,
            sort_order: initial.sort_order,
            filters: initial.filters,
            page: initial.page,
            page_size: initial.page_size,
            selected: initial.selected_ids,
            options,
        }
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Records a new search term and goes back to page 1.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search.set(term.into());
        self.page = 1;
    }

    /// Applies the pending search term if its quiet period is over.
    ///
    /// Returns `true` when the applied term changed.
    pub fn tick(&mut self) -> bool {
        if self.search.poll() {
            tracing::debug!(term = %self.search.applied(), "search term applied");
            self.clamp_current_page();
            return true;
        }
        false
    }

    /// Applies the pending search term now.
    pub fn flush_search(&mut self) -> bool {
        if self.search.flush() {
            self.clamp_current_page();
            return true;
        }
        false
    }

    /// Clears both the typed and the applied search term.
    pub fn clear_search(&mut self) {
        self.search.reset(String::new());
        self.page = 1;
    }

    /// The latest typed term.
    pub fn search_term(&self) -> &str {
        self.search.latest()
    }

    /// The term rows are filtered by.
    pub fn applied_search_term(&self) -> &str {
        self.search.applied()
    }

    /// Whether a typed term is still waiting for its quiet period.
    pub fn is_search_pending(&self) -> bool {
        self.search.is_pending()
    }

    pub fn search_placeholder(&self) -> String {
        if self.options.search_fields.is_empty() {
            "Search...".to_string()
        } else {
            format!("Search in {}...", self.options.search_fields.join(", "))
        }
    }

    // ========================================================================
    // Sort
    // ========================================================================

    /// Sorts by `field`. The active field flips direction; a new field
    /// starts ascending. Goes back to page 1.
    pub fn set_sort(&mut self, field: &str) {
        if self.sort_by.as_deref() == Some(field) {
            self.sort_order = self.sort_order.toggle();
        } else {
            self.sort_by = Some(field.to_string());
            self.sort_order = SortOrder::Asc;
        }
        tracing::debug!(field, order = %self.sort_order, "sort changed");
        self.page = 1;
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn sort_indicator(&self, field: &str) -> SortIndicator {
        let active = self.sort_by.as_deref() == Some(field);
        SortIndicator {
            active,
            order: active.then_some(self.sort_order),
        }
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Sets or removes the filter on `field` and goes back to page 1.
    ///
    /// `None` and blank literals (`null`, `""`) remove the entry.
    pub fn set_filter(&mut self, field: &str, spec: Option<FilterSpec>) {
        match spec {
            Some(spec) if !spec.is_blank() => {
                tracing::debug!(filter = %spec.describe(field), "filter set");
                self.filters.insert(field.to_string(), spec);
            }
            _ => {
                tracing::debug!(field, "filter removed");
                self.filters.remove(field);
            }
        }
        self.page = 1;
    }

    /// Drops every filter and the search term.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.clear_search();
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterSpec> {
        &self.filters
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Moves to page `n`, clamped into `[1, max(1, total_pages)]`.
    pub fn set_page(&mut self, n: usize) {
        let total = total_pages(self.total_items(), self.page_size);
        self.page = clamp_page(n, total);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    /// Changes the page size (0 counts as 1) and goes back to page 1.
    pub fn set_page_size(&mut self, n: usize) {
        self.page_size = n.max(1);
        self.page = 1;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn toggle_row_selection(&mut self, id: impl Into<String>, selected: bool) {
        let id = id.into();
        if selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
    }

    /// Selects or deselects every row on the current page.
    ///
    /// Rows on other pages keep their selection: `true` adds the page's ids
    /// to the set and `false` removes only those ids. It never replaces or
    /// empties the whole set; [`clear_selection`](Self::clear_selection)
    /// does that. Rows without an id are skipped.
    pub fn select_all_on_page(&mut self, selected: bool) {
        let ids: Vec<String> = self
            .view()
            .rows
            .iter()
            .filter_map(|row| row.seeker_id())
            .collect();
        for id in ids {
            self.toggle_row_selection(id, selected);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_row_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn selected_ids(&self) -> &BTreeSet<String> {
        &self.selected
    }

    // ========================================================================
    // Records and lifecycle
    // ========================================================================

    /// Replaces the record set and re-clamps the page. Selection is kept.
    pub fn set_records(&mut self, records: Vec<T>) {
        self.records = records;
        self.clamp_current_page();
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Restores the caller defaults, including both search terms.
    pub fn reset(&mut self) {
        let initial = TableState::initial(&self.options);
        self.search.reset(initial.search_term);
        self.sort_by = initial.sort_by;
        self.sort_order = initial.sort_order;
        self.filters = initial.filters;
        self.page = initial.page;
        self.page_size = initial.page_size;
        self.selected = initial.selected_ids;
    }

    pub fn state(&self) -> TableState {
        TableState {
            search_term: self.search.latest().clone(),
            applied_search_term: self.search.applied().clone(),
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
            filters: self.filters.clone(),
            page: self.page,
            page_size: self.page_size,
            selected_ids: self.selected.clone(),
        }
    }

    // ========================================================================
    // Read side
    // ========================================================================

    /// The query the enabled stages amount to, without paging.
    pub fn query(&self) -> Query {
        let mut query = Query::new();
        if self.options.enable_search {
            query = query.with_search(Search {
                term: self.search.applied().clone(),
                fields: self.options.search_fields.clone(),
                case_sensitive: self.options.case_sensitive_search,
            });
        }
        if self.options.enable_filter {
            for (field, spec) in &self.filters {
                query = query.and(field, spec.clone());
            }
        }
        if self.options.enable_sort {
            if let Some(field) = &self.sort_by {
                query = query.order_by(field, self.sort_order);
            }
        }
        query.build()
    }

    /// Every row that passes search and filters, sorted.
    pub fn processed(&self) -> Vec<&T> {
        self.query().filter(&self.records)
    }

    pub fn total_items(&self) -> usize {
        self.query().count(&self.records)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::compute(self.total_items(), self.page, self.page_size)
    }

    /// The current page of processed rows. With pagination disabled, every
    /// processed row.
    pub fn view(&self) -> TableView<'_, T> {
        let query = self.query();
        let pagination = Pagination::compute(query.count(&self.records), self.page, self.page_size);
        let query = if self.options.enable_pagination {
            query
                .offset(pagination.range().start)
                .limit(pagination.page_size)
        } else {
            query
        };
        TableView {
            rows: query.filter(&self.records),
            pagination,
        }
    }

    fn clamp_current_page(&mut self) {
        let total = total_pages(self.total_items(), self.page_size);
        self.page = clamp_page(self.page, total);
    }
}

impl<T> std::fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("records", &self.records.len())
            .field("search", &self.search)
            .field("sort_by", &self.sort_by)
            .field("sort_order", &self.sort_order)
            .field("filters", &self.filters)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("selected", &self.selected.len())
            .finish()
    }
}
