//! Snapshot of a table's query state.

use std::collections::{BTreeMap, BTreeSet};

use lexia_seeker::{FilterSpec, SortOrder};
use serde::{Deserialize, Serialize};

use crate::options::TableOptions;

/// Everything a user can change on a table, at one instant.
///
/// `search_term` is the latest typed term; `applied_search_term` is the one
/// rows are currently filtered by, which lags behind while the debounce
/// window is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub search_term: String,
    pub applied_search_term: String,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub filters: BTreeMap<String, FilterSpec>,
    pub page: usize,
    pub page_size: usize,
    pub selected_ids: BTreeSet<String>,
}

impl TableState {
    /// The state a table starts in, and returns to on reset.
    pub fn initial(options: &TableOptions) -> Self {
        TableState {
            search_term: String::new(),
            applied_search_term: String::new(),
            sort_by: options.initial_sort_by.clone(),
            sort_order: options.initial_sort_order,
            filters: BTreeMap::new(),
            page: 1,
            page_size: options.initial_page_size.max(1),
            selected_ids: BTreeSet::new(),
        }
    }
}

/// Header rendering hint for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortIndicator {
    /// The column is the active sort key.
    pub active: bool,
    /// The active direction, only set when `active`.
    pub order: Option<SortOrder>,
}
