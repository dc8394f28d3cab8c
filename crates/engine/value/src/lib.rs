//! The dynamic value model.
//!
//! Every value a resolver reads or produces is a [`Value`]. The resolver IR embeds them as
//! constants, the interpreter walks them when resolving context paths, and the executor
//! assembles its response tree out of them before projecting it to JSON.

mod from_value;
mod json;
mod kind;
mod ord;
mod record;

pub use from_value::{FromValue, FromValueError};
pub use json::AbsentPolicy;
pub use kind::ValueKind;
pub use record::Record;

/// A closed tagged union. No native or opaque value ever escapes it.
///
/// The derived serde implementation is lossless (externally tagged) so that compiled steps
/// embedding constants can be stored and shipped. The wire-facing JSON rendering is a separate
/// projection, see [`Value::to_json`].
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Record(Record),
    Sequence(Vec<Value>),
    /// `None` is the absent value: a successful result meaning "no value".
    Optional(Option<Box<Value>>),
}

impl Value {
    pub fn absent() -> Self {
        Value::Optional(None)
    }

    pub fn present(value: impl Into<Value>) -> Self {
        Value::Optional(Some(Box::new(value.into())))
    }

    pub fn record<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Record(entries.into_iter().collect())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Record(_) => ValueKind::Record,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Optional(_) => ValueKind::Optional,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this is `Optional(absent)`, looking through any number of present layers.
    pub fn is_absent(&self) -> bool {
        match self {
            Value::Optional(None) => true,
            Value::Optional(Some(inner)) => inner.is_absent(),
            _ => false,
        }
    }

    /// Null and absent both mean "nothing here" once a value reaches the response.
    pub fn is_nullish(&self) -> bool {
        self.is_null() || self.is_absent()
    }

    /// Peels every `Optional(present ..)` layer, returning `None` for absent.
    pub fn as_present(&self) -> Option<&Value> {
        match self {
            Value::Optional(None) => None,
            Value::Optional(Some(inner)) => inner.as_present(),
            value => Some(value),
        }
    }

    /// Owned counterpart of [`Value::as_present`].
    pub fn into_present(self) -> Option<Value> {
        match self {
            Value::Optional(None) => None,
            Value::Optional(Some(inner)) => inner.into_present(),
            value => Some(value),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Looks a key up if this (once present layers are peeled) is a record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_present()?.as_record()?.get(key)
    }

    pub fn into_typed<T: FromValue>(self) -> Result<T, FromValueError> {
        T::from_value(self)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json(AbsentPolicy::Null))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        Value::Optional(value.map(|value| Box::new(value.into())))
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Sequence(iter.into_iter().map(Into::into).collect())
    }
}
