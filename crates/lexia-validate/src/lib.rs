//! Lexia Validate - field validation for forms.
//!
//! Each field gets a [`FieldRules`] set. Rules run in a fixed order and the
//! first failure produces the field's message. A [`Validator`] ties the
//! rule sets of one form together with its error and touched state.
//!
//! ```text
//! value ─► cache? ─► required ─► kind ─► length ─► min/max ─► pattern ─► sync ─► async ─► Outcome
//!                                                                                   │
//!                                         newer call for the same field ─cancel─────┘─► Superseded
//! ```
//!
//! Failed validations are data, not errors: an [`Outcome::Invalid`] carries
//! the message to show. [`ValidateError`] only covers rules that cannot be
//! built, such as a pattern that does not compile.

mod cache;
mod error;
pub mod presets;
mod rules;
mod validator;

pub use cache::LruCache;
pub use error::{Result, ValidateError};
pub use rules::{AsyncCheck, BoxError, FieldKind, FieldRules, SyncCheck, Values, Verdict};
pub use validator::{FieldState, Outcome, ValidationMode, Validator, DEFAULT_CACHE_CAPACITY};
