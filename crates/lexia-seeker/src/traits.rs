//! The [`Seekable`] trait: how the engine reads fields out of a record.

use crate::value::Value;

/// Trait for types that can be searched, filtered and sorted.
///
/// Implementors expose their fields by name. Field names may be dot paths
/// (`"user.email"`) when the record is nested; a path that does not resolve
/// must return [`Value::None`] rather than panic.
///
/// # Example
///
/// ```
/// use lexia_seeker::{Seekable, Value, Number};
///
/// struct Row {
///     id: String,
///     name: String,
///     age: u8,
/// }
///
/// impl Seekable for Row {
///     fn seeker_field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "id" => Value::String(&self.id),
///             "name" => Value::String(&self.name),
///             "age" => Value::Number((self.age as u64).into()),
///             _ => Value::None,
///         }
///     }
///
///     fn seeker_values(&self) -> Vec<Value<'_>> {
///         vec![
///             self.seeker_field_value("id"),
///             self.seeker_field_value("name"),
///             self.seeker_field_value("age"),
///         ]
///     }
/// }
///
/// let row = Row { id: "7".into(), name: "Ana".into(), age: 30 };
/// assert_eq!(row.seeker_id().as_deref(), Some("7"));
/// ```
pub trait Seekable {
    /// Returns the value of a field for comparison.
    ///
    /// Returns [`Value::None`] if the field doesn't exist, is null, or is
    /// not a scalar.
    fn seeker_field_value(&self, field: &str) -> Value<'_>;

    /// Returns every top-level value of the record.
    ///
    /// Used by free-text search when no search fields are configured. The
    /// default is empty, so such a record only matches an empty search.
    fn seeker_values(&self) -> Vec<Value<'_>> {
        Vec::new()
    }

    /// Returns the identifier used for row selection.
    ///
    /// Defaults to the text of the `id` field; records without a non-empty
    /// id cannot be selected.
    fn seeker_id(&self) -> Option<String> {
        self.seeker_field_value("id")
            .to_text()
            .map(|text| text.into_owned())
            .filter(|id| !id.is_empty())
    }
}

impl<T: Seekable + ?Sized> Seekable for &T {
    fn seeker_field_value(&self, field: &str) -> Value<'_> {
        (**self).seeker_field_value(field)
    }

    fn seeker_values(&self) -> Vec<Value<'_>> {
        (**self).seeker_values()
    }

    fn seeker_id(&self) -> Option<String> {
        (**self).seeker_id()
    }
}
