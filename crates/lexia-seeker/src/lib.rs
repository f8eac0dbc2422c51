//! Lexia Seeker - query primitives for in-memory record collections.
//!
//! Seeker provides the building blocks the table engine is made of:
//!
//! - [`Value`]: a borrowed view of one field (string, number, date, boolean or absent)
//! - [`Seekable`]: how a record exposes its fields, by name or dot path
//! - [`Record`]: a dynamic, owned record built from JSON
//! - [`FilterSpec`]: literal, membership and operator conditions on one field
//! - [`compare_values`]: the sort comparator (absent values last, numbers
//!   numerically, dates by instant, text with accent-insensitive collation)
//! - [`Query`]: a fluent pipeline of search, filters, sort, offset and limit
//!
//! # Quick Start
//!
//! ```rust
//! use lexia_seeker::{Query, Record, Seekable};
//!
//! let rows = Record::list_from_json(serde_json::json!([
//!     { "id": 1, "alias": "Banco Popular", "frecuencia_envio": "diaria" },
//!     { "id": 2, "alias": "Ávila vs Pérez", "frecuencia_envio": "semanal" },
//!     { "id": 3, "alias": "Constructora Andina", "frecuencia_envio": "diaria" },
//! ]))
//! .unwrap();
//!
//! let query = Query::new()
//!     .and_eq("frecuencia_envio", "diaria")
//!     .order_desc("alias")
//!     .build();
//!
//! let results = query.filter(&rows);
//! assert_eq!(results.len(), 2);
//! assert_eq!(results[0].seeker_id().as_deref(), Some("3"));
//! ```
//!
//! # Filter Operators
//!
//! | Operator | Semantics |
//! |----------|-----------|
//! | `equals` | strict equality (same kind, equal value) |
//! | `contains`, `startsWith`, `endsWith` | case-insensitive, on the value's text |
//! | `greaterThan`, `greaterOrEqual`, `lessThan`, `lessOrEqual` | numeric, after coercion |
//! | `between` | inclusive numeric range, operand `[low, high]` |

mod error;
mod filter;
mod op;
mod ordering;
mod query;
mod record;
mod traits;
mod value;

// Re-export public API
pub use error::{Result, SeekerError};
pub use filter::{FilterSpec, Operand, Scalar};
pub use op::FilterOp;
pub use ordering::{collate, compare_values, OrderBy, SortOrder};
pub use query::{Query, Search};
pub use record::{Field, Record};
pub use traits::Seekable;
pub use value::{Number, Timestamp, Value};
