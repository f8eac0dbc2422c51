//! Lexia Table - a headless table engine.
//!
//! A [`Table`] owns a set of [`Seekable`](lexia_seeker::Seekable) records
//! and the query state a user builds up by typing, clicking headers and
//! paging. It renders nothing: callers read [`Table::view`] and draw it
//! however they like.
//!
//! ```text
//! set_search_term ─► Debounced ─tick─► applied term ─┐
//! set_filter ──────────────────────────────────────► Query ─► processed ─► page slice ─► TableView
//! set_sort ────────────────────────────────────────┘
//! ```
//!
//! Debounce and throttle live in [`debounce`] and are driven by an
//! injectable [`Clock`], so tests never sleep.

pub mod debounce;
mod options;
mod pagination;
mod state;
mod table;

pub use debounce::{Clock, Debounced, ManualClock, SystemClock, Throttle};
pub use options::{TableOptions, DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
pub use pagination::{clamp_page, total_pages, Pagination};
pub use state::{SortIndicator, TableState};
pub use table::{Table, TableView};
