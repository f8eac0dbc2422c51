//! Form-level validation state.
//!
//! A [`Validator`] owns the rules for every field of a form, the current
//! error and touched state, a bounded result cache and one cancellation
//! token per field with async work in flight.
//!
//! Starting a validation for a field cancels the previous one for the same
//! field. The cancelled call resolves to [`Outcome::Superseded`]; it is never
//! cached and never written to the error state.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::cache::LruCache;
use crate::rules::{FieldRules, Values, MSG_ASYNC_FAILED};

/// Cache capacity used by [`Validator::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Result of validating one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Invalid(String),
    /// A newer validation for the same field started before this one
    /// finished.
    Superseded,
}

impl Outcome {
    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Invalid(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid)
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Outcome::Superseded)
    }

    fn from_error(error: Option<String>) -> Self {
        match error {
            Some(message) => Outcome::Invalid(message),
            None => Outcome::Valid,
        }
    }
}

/// Which events trigger validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    #[default]
    OnChange,
    OnBlur,
    OnSubmit,
    All,
}

impl ValidationMode {
    pub fn on_change(self) -> bool {
        matches!(self, ValidationMode::OnChange | ValidationMode::All)
    }

    pub fn on_blur(self) -> bool {
        matches!(self, ValidationMode::OnBlur | ValidationMode::All)
    }
}

/// Snapshot of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldState {
    pub error: Option<String>,
    pub touched: bool,
    pub validating: bool,
}

#[derive(Debug, Default)]
struct FormState {
    errors: BTreeMap<String, String>,
    touched: BTreeSet<String>,
}

type CacheKey = (String, String);

/// Validation engine for one form.
///
/// # Example
///
/// ```
/// use lexia_validate::{presets, Outcome, Validator};
/// use serde_json::json;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let validator = Validator::new()
///     .field("alias", presets::required().max_length(255))
///     .field("radicado", presets::radicado());
///
/// let outcome = validator.validate_and_set("radicado", &json!("12AB"), &Default::default()).await;
/// assert_eq!(outcome, Outcome::Invalid("Must contain between 5 and 23 digits".into()));
/// assert!(!validator.is_valid());
/// # });
/// ```
pub struct Validator {
    rules: HashMap<String, FieldRules>,
    mode: ValidationMode,
    cache: Mutex<LruCache<CacheKey, Option<String>>>,
    in_flight: Mutex<HashMap<String, (u64, CancellationToken)>>,
    generation: AtomicU64,
    form: Mutex<FormState>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
            mode: ValidationMode::default(),
            cache: Mutex::new(LruCache::new(DEFAULT_CACHE_CAPACITY)),
            in_flight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            form: Mutex::new(FormState::default()),
        }
    }

    pub fn field(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.rules.insert(name.into(), rules);
        self
    }

    pub fn mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = Mutex::new(LruCache::new(capacity));
        self
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn rules(&self, name: &str) -> Option<&FieldRules> {
        self.rules.get(name)
    }

    /// Field names with rules, sorted.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    // ========================================================================
    // Running validations
    // ========================================================================

    /// Validates a single value with no other form values in scope.
    pub async fn validate_field(&self, name: &str, value: &Value) -> Outcome {
        self.validate_field_with(name, value, &Values::new()).await
    }

    /// Validates `value` for `name`. `all` holds the rest of the form for
    /// custom checks. Nothing is written to the error state.
    ///
    /// Results are cached by field and serialized value, so custom checks
    /// that read `all` should not depend on fields that change
    /// independently.
    pub async fn validate_field_with(&self, name: &str, value: &Value, all: &Values) -> Outcome {
        let (generation, token) = self.begin(name);
        let outcome = self.run(name, value, all, &token).await;
        self.finish(name, generation);
        outcome
    }

    /// Validates and writes the result to the error state.
    pub async fn validate_and_set(&self, name: &str, value: &Value, all: &Values) -> Outcome {
        let outcome = self.validate_field_with(name, value, all).await;
        self.apply(name, &outcome);
        outcome
    }

    /// Validates every field with rules concurrently, reading values from
    /// `values` (missing fields count as `null`), and writes the results.
    pub async fn validate_fields(&self, values: &Values) -> BTreeMap<String, Outcome> {
        let names = self.field_names();
        let runs = names.iter().map(|name| {
            let value = values.get(*name).cloned().unwrap_or(Value::Null);
            async move {
                let outcome = self.validate_and_set(name, &value, values).await;
                (name.to_string(), outcome)
            }
        });
        join_all(runs).await.into_iter().collect()
    }

    /// Validates on change when the mode asks for it.
    pub async fn on_change(&self, name: &str, value: &Value, all: &Values) -> Option<Outcome> {
        if self.mode.on_change() {
            Some(self.validate_and_set(name, value, all).await)
        } else {
            None
        }
    }

    /// Marks the field touched and validates when the mode asks for it.
    pub async fn on_blur(&self, name: &str, value: &Value, all: &Values) -> Option<Outcome> {
        self.set_touched(name, true);
        if self.mode.on_blur() {
            Some(self.validate_and_set(name, value, all).await)
        } else {
            None
        }
    }

    async fn run(&self, name: &str, value: &Value, all: &Values, token: &CancellationToken) -> Outcome {
        let Some(rules) = self.rules.get(name) else {
            return Outcome::Valid;
        };

        let key = (name.to_string(), serde_json::to_string(value).unwrap_or_default());
        if let Some(hit) = lock(&self.cache).get(&key).cloned() {
            tracing::trace!(field = name, "validation cache hit");
            return Outcome::from_error(hit);
        }

        if let Some(message) = rules.check(value, all) {
            self.store(key, Some(message.clone()));
            return Outcome::Invalid(message);
        }

        let Some(check) = rules.async_check() else {
            self.store(key, None);
            return Outcome::Valid;
        };

        let pending = check(value.clone(), all.clone());
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = pending => Some(result),
        };

        match result {
            None => {
                tracing::debug!(field = name, "validation superseded");
                Outcome::Superseded
            }
            Some(_) if token.is_cancelled() => Outcome::Superseded,
            Some(Ok(verdict)) => {
                let error = verdict.into_error();
                self.store(key, error.clone());
                Outcome::from_error(error)
            }
            Some(Err(err)) => {
                tracing::warn!(field = name, error = %err, "async validation failed");
                Outcome::Invalid(MSG_ASYNC_FAILED.to_string())
            }
        }
    }

    fn begin(&self, name: &str) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = lock(&self.in_flight).insert(name.to_string(), (generation, token.clone()));
        if let Some((_, previous)) = previous {
            previous.cancel();
        }
        (generation, token)
    }

    fn finish(&self, name: &str, generation: u64) {
        let mut in_flight = lock(&self.in_flight);
        if in_flight.get(name).is_some_and(|(current, _)| *current == generation) {
            in_flight.remove(name);
        }
    }

    fn store(&self, key: CacheKey, error: Option<String>) {
        lock(&self.cache).insert(key, error);
    }

    fn apply(&self, name: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Superseded => {}
            Outcome::Valid => self.set_field_error(name, None),
            Outcome::Invalid(message) => self.set_field_error(name, Some(message.clone())),
        }
    }

    // ========================================================================
    // Form state
    // ========================================================================

    pub fn set_field_error(&self, name: &str, error: Option<String>) {
        let mut form = lock(&self.form);
        match error {
            Some(message) => {
                form.errors.insert(name.to_string(), message);
            }
            None => {
                form.errors.remove(name);
            }
        }
    }

    /// Clears errors for `fields`, or for every field when `None`, together
    /// with their cached results.
    pub fn clear_errors(&self, fields: Option<&[&str]>) {
        match fields {
            None => {
                lock(&self.form).errors.clear();
                lock(&self.cache).clear();
            }
            Some(fields) => {
                let mut form = lock(&self.form);
                for field in fields {
                    form.errors.remove(*field);
                }
                drop(form);
                lock(&self.cache).retain(|(field, _)| !fields.contains(&field.as_str()));
            }
        }
    }

    pub fn set_touched(&self, name: &str, touched: bool) {
        let mut form = lock(&self.form);
        if touched {
            form.touched.insert(name.to_string());
        } else {
            form.touched.remove(name);
        }
    }

    pub fn clear_touched(&self) {
        lock(&self.form).touched.clear();
    }

    pub fn field_state(&self, name: &str) -> FieldState {
        let validating = lock(&self.in_flight).contains_key(name);
        let form = lock(&self.form);
        FieldState {
            error: form.errors.get(name).cloned(),
            touched: form.touched.contains(name),
            validating,
        }
    }

    pub fn errors(&self) -> BTreeMap<String, String> {
        lock(&self.form).errors.clone()
    }

    pub fn has_errors(&self) -> bool {
        !lock(&self.form).errors.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn is_validating(&self) -> bool {
        !lock(&self.in_flight).is_empty()
    }

    /// Cancels pending work and clears errors, touched fields and the cache.
    pub fn reset(&self) {
        for (_, (_, token)) in lock(&self.in_flight).drain() {
            token.cancel();
        }
        *lock(&self.form) = FormState::default();
        lock(&self.cache).clear();
    }
}

impl Drop for Validator {
    fn drop(&mut self) {
        let in_flight = self.in_flight.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, (_, token)) in in_flight.drain() {
            token.cancel();
        }
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("fields", &self.field_names())
            .field("mode", &self.mode)
            .field("errors", &lock(&self.form).errors)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_field_is_valid() {
        let validator = Validator::new();
        assert_eq!(validator.validate_field("nope", &json!(1)).await, Outcome::Valid);
    }

    #[tokio::test]
    async fn set_and_clear_errors() {
        let validator = Validator::new()
            .field("alias", presets::required())
            .field("cedula", presets::cedula());
        let values = Values::new();
        let outcomes = validator.validate_fields(&values).await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(validator.errors().len(), 2);

        validator.clear_errors(Some(&["alias"][..]));
        assert_eq!(validator.errors().keys().collect::<Vec<_>>(), vec!["cedula"]);
        validator.clear_errors(None);
        assert!(validator.is_valid());
    }

    #[tokio::test]
    async fn mode_gates_events() {
        let validator = Validator::new()
            .field("alias", presets::required())
            .mode(ValidationMode::OnBlur);
        let all = Values::new();
        assert_eq!(validator.on_change("alias", &json!(""), &all).await, None);
        assert!(validator.is_valid());

        let outcome = validator.on_blur("alias", &json!(""), &all).await;
        assert!(outcome.is_some_and(|o| o.error().is_some()));
        let state = validator.field_state("alias");
        assert!(state.touched);
        assert!(!state.validating);
        assert_eq!(state.error.as_deref(), Some("This field is required"));
    }

    #[test]
    fn mode_serializes_camel_case() {
        assert_eq!(serde_json::to_value(ValidationMode::OnSubmit).unwrap(), json!("onSubmit"));
    }
}
