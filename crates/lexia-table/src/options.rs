//! Caller defaults for a table.

use std::time::Duration;

use lexia_seeker::SortOrder;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered to users.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Default quiet period before a search term applies.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Construction-time configuration of a [`Table`](crate::Table).
///
/// The `initial_*` fields are also what [`Table::reset`](crate::Table::reset)
/// restores. Disabling a stage keeps its state settable but skips it when
/// rows are computed.
#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    pub initial_page_size: usize,
    pub initial_sort_by: Option<String>,
    pub initial_sort_order: SortOrder,
    /// Dot paths searched by the free-text search; empty means every
    /// top-level field.
    pub search_fields: Vec<String>,
    pub case_sensitive_search: bool,
    pub debounce: Duration,
    pub enable_search: bool,
    pub enable_filter: bool,
    pub enable_sort: bool,
    pub enable_pagination: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            initial_page_size: DEFAULT_PAGE_SIZE,
            initial_sort_by: None,
            initial_sort_order: SortOrder::Asc,
            search_fields: Vec::new(),
            case_sensitive_search: false,
            debounce: DEFAULT_DEBOUNCE,
            enable_search: true,
            enable_filter: true,
            enable_sort: true,
            enable_pagination: true,
        }
    }
}

impl TableOptions {
    pub fn new() -> Self {
        TableOptions::default()
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.initial_page_size = size.max(1);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.initial_sort_by = Some(field.into());
        self.initial_sort_order = order;
        self
    }

    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive_search = yes;
        self
    }

    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    pub fn debounce_ms(self, ms: u64) -> Self {
        self.debounce(Duration::from_millis(ms))
    }

    pub fn enable_search(mut self, yes: bool) -> Self {
        self.enable_search = yes;
        self
    }

    pub fn enable_filter(mut self, yes: bool) -> Self {
        self.enable_filter = yes;
        self
    }

    pub fn enable_sort(mut self, yes: bool) -> Self {
        self.enable_sort = yes;
        self
    }

    pub fn enable_pagination(mut self, yes: bool) -> Self {
        self.enable_pagination = yes;
        self
    }
}
