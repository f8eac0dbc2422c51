//! Rule sets for one field.
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. required
//! 2. kind (email, number, url, date, phone, cedula, radicado)
//! 3. min length, max length
//! 4. numeric min, numeric max
//! 5. pattern
//! 6. synchronous custom check
//! 7. asynchronous custom check
//!
//! Steps 2 to 5 only look at non-empty values; an optional field left blank
//! passes them.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Result, ValidateError};

pub(crate) const MSG_REQUIRED: &str = "This field is required";
pub(crate) const MSG_PATTERN: &str = "Invalid format";
pub(crate) const MSG_CUSTOM: &str = "Invalid value";
pub(crate) const MSG_ASYNC_FAILED: &str = "Validation failed";

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\s\-+()]{7,15}$").unwrap());
static CEDULA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6,12}$").unwrap());
static RADICADO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5,23}$").unwrap());

/// Other values of the form, passed to custom checks.
pub type Values = Map<String, Value>;

/// Boxed error returned by a failing async check.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a custom check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Invalid, with the rule's default message.
    Invalid,
    /// Invalid, with this message.
    Message(String),
}

impl Verdict {
    pub(crate) fn into_error(self) -> Option<String> {
        match self {
            Verdict::Valid => None,
            Verdict::Invalid => Some(MSG_CUSTOM.to_string()),
            Verdict::Message(m) => Some(m),
        }
    }
}

impl From<bool> for Verdict {
    fn from(ok: bool) -> Self {
        if ok {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }
}

impl From<&str> for Verdict {
    fn from(message: &str) -> Self {
        Verdict::Message(message.to_string())
    }
}

impl From<String> for Verdict {
    fn from(message: String) -> Self {
        Verdict::Message(message)
    }
}

/// `None` is valid; `Some(message)` is invalid with that message.
impl<M: Into<String>> From<Option<M>> for Verdict {
    fn from(message: Option<M>) -> Self {
        match message {
            Some(m) => Verdict::Message(m.into()),
            None => Verdict::Valid,
        }
    }
}

pub type SyncCheck = Arc<dyn Fn(&Value, &Values) -> Verdict + Send + Sync>;
pub type AsyncCheck =
    Arc<dyn Fn(Value, Values) -> BoxFuture<'static, std::result::Result<Verdict, BoxError>> + Send + Sync>;

/// Built-in value formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Email,
    Number,
    Url,
    Date,
    Phone,
    /// Colombian national id: 6 to 12 digits.
    Cedula,
    /// Case number: 5 to 23 digits.
    Radicado,
}

impl FieldKind {
    pub fn accepts(self, text: &str) -> bool {
        match self {
            FieldKind::Email => EMAIL.is_match(text),
            FieldKind::Number => text.trim().parse::<f64>().is_ok_and(|n| !n.is_nan()),
            FieldKind::Url => url::Url::parse(text).is_ok(),
            FieldKind::Date => is_date(text),
            FieldKind::Phone => PHONE.is_match(text),
            FieldKind::Cedula => CEDULA.is_match(text),
            FieldKind::Radicado => RADICADO.is_match(text),
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            FieldKind::Email => "Must be a valid email",
            FieldKind::Number => "Must be a valid number",
            FieldKind::Url => "Must be a valid URL",
            FieldKind::Date => "Must be a valid date",
            FieldKind::Phone => "Invalid phone format",
            FieldKind::Cedula => "Must contain between 6 and 12 digits",
            FieldKind::Radicado => "Must contain between 5 and 23 digits",
        }
    }
}

fn is_date(text: &str) -> bool {
    let text = text.trim();
    chrono::DateTime::parse_from_rfc3339(text).is_ok()
        || chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok()
        || chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").is_ok()
        || chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// The rules attached to one field, built fluently.
///
/// Every rule has a `*_with` variant taking a custom message.
///
/// # Example
///
/// ```
/// use lexia_validate::{FieldKind, FieldRules};
/// use serde_json::json;
///
/// let rules = FieldRules::new()
///     .required()
///     .kind(FieldKind::Radicado)
///     .max_length_with(23, "Too long");
///
/// assert_eq!(rules.check(&json!(""), &Default::default()).as_deref(), Some("This field is required"));
/// assert_eq!(rules.check(&json!("12345"), &Default::default()), None);
/// ```
#[derive(Clone, Default)]
pub struct FieldRules {
    required: Option<Option<String>>,
    kind: Option<(FieldKind, Option<String>)>,
    min_length: Option<(usize, Option<String>)>,
    max_length: Option<(usize, Option<String>)>,
    min: Option<(f64, Option<String>)>,
    max: Option<(f64, Option<String>)>,
    pattern: Option<(Regex, Option<String>)>,
    validate: Option<SyncCheck>,
    validate_async: Option<AsyncCheck>,
}

impl FieldRules {
    pub fn new() -> Self {
        FieldRules::default()
    }

    // ========================================================================
    // Builders
    // ========================================================================

    pub fn required(mut self) -> Self {
        self.required = Some(None);
        self
    }

    pub fn required_with(mut self, message: impl Into<String>) -> Self {
        self.required = Some(Some(message.into()));
        self
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some((kind, None));
        self
    }

    pub fn kind_with(mut self, kind: FieldKind, message: impl Into<String>) -> Self {
        self.kind = Some((kind, Some(message.into())));
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some((n, None));
        self
    }

    pub fn min_length_with(mut self, n: usize, message: impl Into<String>) -> Self {
        self.min_length = Some((n, Some(message.into())));
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some((n, None));
        self
    }

    pub fn max_length_with(mut self, n: usize, message: impl Into<String>) -> Self {
        self.max_length = Some((n, Some(message.into())));
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.min = Some((n, None));
        self
    }

    pub fn min_with(mut self, n: f64, message: impl Into<String>) -> Self {
        self.min = Some((n, Some(message.into())));
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.max = Some((n, None));
        self
    }

    pub fn max_with(mut self, n: f64, message: impl Into<String>) -> Self {
        self.max = Some((n, Some(message.into())));
        self
    }

    /// Adds a regex rule. Fails if the pattern does not compile.
    pub fn pattern(self, pattern: &str) -> Result<Self> {
        let regex = compile(pattern)?;
        Ok(self.pattern_regex(regex, None))
    }

    pub fn pattern_with(self, pattern: &str, message: impl Into<String>) -> Result<Self> {
        let regex = compile(pattern)?;
        Ok(self.pattern_regex(regex, Some(message.into())))
    }

    /// Adds an already compiled regex rule.
    pub fn pattern_regex(mut self, regex: Regex, message: Option<String>) -> Self {
        self.pattern = Some((regex, message));
        self
    }

    /// Adds a synchronous custom check.
    pub fn validate<F, V>(mut self, check: F) -> Self
    where
        F: Fn(&Value, &Values) -> V + Send + Sync + 'static,
        V: Into<Verdict>,
    {
        self.validate = Some(Arc::new(move |value: &Value, all: &Values| -> Verdict {
            check(value, all).into()
        }));
        self
    }

    /// Adds an asynchronous custom check, run last and only when every
    /// other rule passed.
    pub fn validate_async<F, Fut, V, E>(mut self, check: F) -> Self
    where
        F: Fn(Value, Values) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        V: Into<Verdict>,
        E: Into<BoxError>,
    {
        self.validate_async = Some(Arc::new(
            move |value: Value, all: Values| -> BoxFuture<'static, std::result::Result<Verdict, BoxError>> {
                let fut = check(value, all);
                Box::pin(async move { fut.await.map(Into::into).map_err(Into::into) })
            },
        ));
        self
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    pub fn is_required(&self) -> bool {
        self.required.is_some()
    }

    pub fn has_async(&self) -> bool {
        self.validate_async.is_some()
    }

    pub(crate) fn async_check(&self) -> Option<&AsyncCheck> {
        self.validate_async.as_ref()
    }

    /// Runs every synchronous rule, returning the first failure message.
    pub fn check(&self, value: &Value, all: &Values) -> Option<String> {
        let blank = is_blank(value);

        if let Some(message) = &self.required {
            if blank {
                return Some(pick(message, MSG_REQUIRED));
            }
        }
        if blank {
            return self.custom(value, all);
        }

        let text = text_of(value);

        if let Some((kind, message)) = &self.kind {
            if !kind.accepts(&text) {
                return Some(pick(message, kind.default_message()));
            }
        }

        if let Some(len) = length_of(value) {
            if let Some((n, message)) = &self.min_length {
                if len < *n {
                    return Some(message.clone().unwrap_or_else(|| format!("Minimum {n} characters")));
                }
            }
            if let Some((n, message)) = &self.max_length {
                if len > *n {
                    return Some(message.clone().unwrap_or_else(|| format!("Maximum {n} characters")));
                }
            }
        }

        let number = number_of(value);
        if let Some((n, message)) = &self.min {
            if number < *n {
                return Some(message.clone().unwrap_or_else(|| format!("The minimum value is {n}")));
            }
        }
        if let Some((n, message)) = &self.max {
            if number > *n {
                return Some(message.clone().unwrap_or_else(|| format!("The maximum value is {n}")));
            }
        }

        if let Some((regex, message)) = &self.pattern {
            if !regex.is_match(&text) {
                return Some(pick(message, MSG_PATTERN));
            }
        }

        self.custom(value, all)
    }

    fn custom(&self, value: &Value, all: &Values) -> Option<String> {
        self.validate
            .as_ref()
            .and_then(|check| check(value, all).into_error())
    }
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("required", &self.required)
            .field("kind", &self.kind)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("pattern", &self.pattern.as_ref().map(|(r, _)| r.as_str()))
            .field("validate", &self.validate.is_some())
            .field("validate_async", &self.validate_async.is_some())
            .finish()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ValidateError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn pick(custom: &Option<String>, default: &str) -> String {
    custom.clone().unwrap_or_else(|| default.to_string())
}

/// `null`, the empty string and the empty array count as "no value".
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Numeric reading of a value; NaN when there is none, which passes both
/// bounds.
fn number_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(rules: &FieldRules, value: Value) -> Option<String> {
        rules.check(&value, &Values::new())
    }

    #[test]
    fn required_rejects_blank_values() {
        let rules = FieldRules::new().required();
        assert_eq!(check(&rules, json!(null)).as_deref(), Some(MSG_REQUIRED));
        assert_eq!(check(&rules, json!("")).as_deref(), Some(MSG_REQUIRED));
        assert_eq!(check(&rules, json!([])).as_deref(), Some(MSG_REQUIRED));
        assert_eq!(check(&rules, json!(0)), None);
        assert_eq!(check(&rules, json!(" ")), None);
    }

    #[test]
    fn optional_blank_skips_format_rules() {
        let rules = FieldRules::new().kind(FieldKind::Email).min_length(3).min(1.0);
        assert_eq!(check(&rules, json!("")), None);
        assert_eq!(check(&rules, json!(null)), None);
    }

    #[test]
    fn kinds() {
        assert!(FieldKind::Email.accepts("ana@example.com"));
        assert!(!FieldKind::Email.accepts("ana@example"));
        assert!(FieldKind::Number.accepts(" 4.5 "));
        assert!(!FieldKind::Number.accepts("4,5"));
        assert!(FieldKind::Url.accepts("https://rama.gov.co/consulta"));
        assert!(!FieldKind::Url.accepts("rama.gov.co"));
        assert!(FieldKind::Date.accepts("2025-05-24"));
        assert!(FieldKind::Date.accepts("2025-05-24T08:15:00Z"));
        assert!(!FieldKind::Date.accepts("24/05/2025"));
        assert!(FieldKind::Phone.accepts("+57 (601) 555-1234"));
        assert!(!FieldKind::Phone.accepts("123"));
        assert!(FieldKind::Cedula.accepts("1020304050"));
        assert!(!FieldKind::Cedula.accepts("12345"));
        assert!(FieldKind::Radicado.accepts("11001310300120230012300"));
        assert!(!FieldKind::Radicado.accepts("110013103001202300123001"));
        assert!(!FieldKind::Radicado.accepts("1100A"));
    }

    #[test]
    fn rule_order_first_failure_wins() {
        let rules = FieldRules::new()
            .required()
            .kind(FieldKind::Number)
            .max_length(2)
            .max(50.0)
            .pattern("^[0-9]+$")
            .unwrap();
        assert_eq!(check(&rules, json!("abc")).as_deref(), Some("Must be a valid number"));
        assert_eq!(check(&rules, json!("123")).as_deref(), Some("Maximum 2 characters"));
        assert_eq!(check(&rules, json!("99")).as_deref(), Some("The maximum value is 50"));
        assert_eq!(check(&rules, json!("-1")).as_deref(), Some(MSG_PATTERN));
        assert_eq!(check(&rules, json!("42")), None);
    }

    #[test]
    fn length_counts_characters() {
        let rules = FieldRules::new().max_length(5);
        assert_eq!(check(&rules, json!("Núñez")), None);
        assert!(check(&rules, json!("Núñezz")).is_some());
    }

    #[test]
    fn custom_messages_override_defaults() {
        let rules = FieldRules::new()
            .required_with("Alias is required")
            .min_length_with(3, "Too short");
        assert_eq!(check(&rules, json!("")).as_deref(), Some("Alias is required"));
        assert_eq!(check(&rules, json!("ab")).as_deref(), Some("Too short"));
    }

    #[test]
    fn sync_check_verdicts() {
        let rules = FieldRules::new()
            .validate(|value: &Value, all: &Values| {
                if value == &json!("taken") {
                    Verdict::from("Already in use")
                } else {
                    Verdict::from(all.get("confirm") != Some(&json!(false)))
                }
            });
        assert_eq!(check(&rules, json!("taken")).as_deref(), Some("Already in use"));
        assert_eq!(check(&rules, json!("free")), None);

        let mut all = Values::new();
        all.insert("confirm".into(), json!(false));
        assert_eq!(rules.check(&json!("free"), &all).as_deref(), Some(MSG_CUSTOM));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = FieldRules::new().pattern("([a-z").unwrap_err();
        assert!(err.to_string().contains("([a-z"));
    }
}
