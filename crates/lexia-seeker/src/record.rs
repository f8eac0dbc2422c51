//! Dynamic records built from JSON.
//!
//! A [`Record`] is an owned, possibly nested map of fields. It is the
//! shape rows have when they arrive from an API or a file and no typed
//! struct exists for them. Field lookup accepts dot paths, so
//! `record.get_path("user.email")` walks into nested maps.

use std::collections::BTreeMap;

use crate::error::{Result, SeekerError};
use crate::traits::Seekable;
use crate::value::{Number, Timestamp, Value};

/// A single field of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(Timestamp),
    List(Vec<Field>),
    Map(Record),
}

impl Field {
    /// Borrows this field as a comparison value.
    ///
    /// Lists and maps are not scalars and read as [`Value::None`].
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Field::Bool(b) => Value::Bool(*b),
            Field::Number(n) => Value::Number(*n),
            Field::String(s) => Value::String(s),
            Field::Date(t) => Value::Timestamp(*t),
            Field::Null | Field::List(_) | Field::Map(_) => Value::None,
        }
    }

    /// Converts back to JSON. Dates become RFC 3339 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Field::Null => serde_json::Value::Null,
            Field::Bool(b) => serde_json::Value::Bool(*b),
            Field::Number(Number::I64(n)) => serde_json::Value::from(*n),
            Field::Number(Number::U64(n)) => serde_json::Value::from(*n),
            Field::Number(Number::F64(n)) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Field::String(s) => serde_json::Value::String(s.clone()),
            Field::Date(t) => serde_json::Value::String(t.to_string()),
            Field::List(items) => {
                serde_json::Value::Array(items.iter().map(Field::to_json).collect())
            }
            Field::Map(record) => record.to_json(),
        }
    }
}

impl From<serde_json::Value> for Field {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Field::Null,
            serde_json::Value::Bool(b) => Field::Bool(b),
            serde_json::Value::Number(n) => Number::from_json(&n)
                .map(Field::Number)
                .unwrap_or(Field::Null),
            serde_json::Value::String(s) => Field::String(s),
            serde_json::Value::Array(items) => {
                Field::List(items.into_iter().map(Field::from).collect())
            }
            serde_json::Value::Object(map) => Field::Map(Record(
                map.into_iter().map(|(k, v)| (k, Field::from(v))).collect(),
            )),
        }
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::String(s.to_string())
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::String(s)
    }
}

impl From<bool> for Field {
    fn from(b: bool) -> Self {
        Field::Bool(b)
    }
}

impl From<i64> for Field {
    fn from(n: i64) -> Self {
        Field::Number(Number::I64(n))
    }
}

impl From<i32> for Field {
    fn from(n: i32) -> Self {
        Field::Number(Number::I64(n as i64))
    }
}

impl From<f64> for Field {
    fn from(n: f64) -> Self {
        Field::Number(Number::F64(n))
    }
}

impl From<Timestamp> for Field {
    fn from(t: Timestamp) -> Self {
        Field::Date(t)
    }
}

impl From<Record> for Field {
    fn from(r: Record) -> Self {
        Field::Map(r)
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Field::Null)
    }
}

/// An owned mapping from field name to [`Field`].
///
/// # Example
///
/// ```
/// use lexia_seeker::{Record, Seekable, Value};
///
/// let row = Record::new()
///     .with("id", "1")
///     .with("user", Record::new().with("email", "ana@example.com"));
///
/// assert_eq!(
///     row.seeker_field_value("user.email"),
///     Value::String("ana@example.com")
/// );
/// assert_eq!(row.seeker_field_value("user.phone.mobile"), Value::None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(BTreeMap<String, Field>);

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Builds a record from a JSON object.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match Field::from(value) {
            Field::Map(record) => Ok(record),
            other => Err(SeekerError::NotAnObject(kind_name(&other))),
        }
    }

    /// Builds records from a JSON array of objects.
    pub fn list_from_json(value: serde_json::Value) -> Result<Vec<Self>> {
        match value {
            serde_json::Value::Array(items) => items.into_iter().map(Record::from_json).collect(),
            other => Record::from_json(other).map(|record| vec![record]),
        }
    }

    /// Adds a field, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Field>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Field>) -> Option<Field> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.0.get(key)
    }

    /// Resolves a dot path (`"a.b.c"`) through nested maps.
    ///
    /// Returns `None` as soon as a segment is missing or the walk reaches a
    /// non-map field before the path ends.
    pub fn get_path(&self, path: &str) -> Option<&Field> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            match current {
                Field::Map(inner) => current = inner.0.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Interprets the field at `path` as an RFC 3339 date, in place.
    ///
    /// JSON has no date type, so rows read from JSON carry dates as
    /// strings. Converting them makes the field sort by instant. Returns
    /// `true` when the field was converted.
    pub fn parse_date(&mut self, path: &str) -> bool {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            return false;
        };
        let mut current = self;
        for segment in segments {
            match current.0.get_mut(segment) {
                Some(Field::Map(inner)) => current = inner,
                _ => return false,
            }
        }
        let parsed = match current.0.get(last) {
            Some(Field::String(text)) => Timestamp::parse(text),
            _ => None,
        };
        match parsed {
            Some(ts) => {
                current.0.insert(last.to_string(), Field::Date(ts));
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl Seekable for Record {
    fn seeker_field_value(&self, field: &str) -> Value<'_> {
        self.get_path(field)
            .map(Field::as_value)
            .unwrap_or(Value::None)
    }

    fn seeker_values(&self) -> Vec<Value<'_>> {
        self.0.values().map(Field::as_value).collect()
    }
}

fn kind_name(field: &Field) -> &'static str {
    match field {
        Field::Null => "null",
        Field::Bool(_) => "a boolean",
        Field::Number(_) => "a number",
        Field::String(_) | Field::Date(_) => "a string",
        Field::List(_) => "an array",
        Field::Map(_) => "an object",
    }
}
