use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{cmp::Ordering, fmt};
use uuid::Uuid;

/// A scalar read out of an entity, used for filtering and sorting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Comparison between two non-null values of compatible types.
    /// Integers and floats compare numerically; anything else mixed is `None`.
    pub fn partial_compare(&self, other: &FieldValue) -> Option<Ordering> {
        use FieldValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Text(a), Text(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order for sorting: nulls first, then by value.
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .partial_compare(other)
                .unwrap_or_else(|| self.rank().cmp(&other.rank())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Int(_) | FieldValue::Float(_) => 2,
            FieldValue::Text(_) => 3,
            FieldValue::Uuid(_) => 4,
            FieldValue::Timestamp(_) => 5,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "'{v}'"),
            FieldValue::Uuid(v) => write!(f, "{v}"),
            FieldValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

macro_rules! field_value_from {
    ($variant:ident: $($ty:ty => $conv:expr),* $(,)?) => {
        $(impl From<$ty> for FieldValue {
            fn from(v: $ty) -> Self {
                FieldValue::$variant($conv(v))
            }
        })*
    };
}

field_value_from!(Int: i64 => |v| v, i32 => i64::from, u32 => i64::from, i16 => i64::from);
field_value_from!(Float: f64 => |v| v, f32 => f64::from);
field_value_from!(Text: String => |v| v, &str => str::to_string, &String => Clone::clone);

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        FieldValue::Uuid(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// Static description of one queryable field of an entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Storage column; `None` for fields that only exist in memory.
    pub column: Option<&'static str>,
    /// Descriptors of the navigated value, for dotted paths.
    pub nested: Option<fn() -> &'static [FieldDescriptor]>,
}

impl FieldDescriptor {
    /// A field stored in a column of the same name.
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            column: Some(name),
            nested: None,
        }
    }

    pub const fn column(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column: Some(column),
            nested: None,
        }
    }

    pub const fn computed(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            nested: None,
        }
    }

    pub const fn nested(name: &'static str, fields: fn() -> &'static [FieldDescriptor]) -> Self {
        Self {
            name,
            column: None,
            nested: Some(fields),
        }
    }

    /// Case-insensitive match that also ignores underscores, so
    /// `createdAt`, `CreatedAt` and `created_at` are the same field.
    pub fn matches(&self, segment: &str) -> bool {
        let mut ours = self.name.chars().filter(|c| *c != '_');
        let mut theirs = segment.chars().filter(|c| *c != '_');
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => continue,
                _ => return false,
            }
        }
    }
}

/// Entities expose their fields through a static descriptor table and a
/// lookup by canonical path.
pub trait Fields {
    fn fields() -> &'static [FieldDescriptor];

    /// Value at `path`, given as canonical descriptor names.
    fn field_value(&self, path: &[&str]) -> Option<FieldValue>;
}

/// A dotted navigation path such as `owner.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Walks the descriptors one segment at a time. Every segment but the
    /// last has to navigate into a nested entity and the last one has to be
    /// a scalar.
    pub fn resolve(
        &self,
        fields: &'static [FieldDescriptor],
    ) -> Option<Vec<&'static FieldDescriptor>> {
        let mut level = fields;
        let mut chain = Vec::with_capacity(self.0.len());

        for (i, segment) in self.0.iter().enumerate() {
            let descriptor = level.iter().find(|d| d.matches(segment))?;
            let last = i + 1 == self.0.len();
            match (last, descriptor.nested) {
                (false, Some(nested)) => level = nested(),
                (true, None) => {}
                _ => return None,
            }
            chain.push(descriptor);
        }

        (!chain.is_empty()).then_some(chain)
    }

    /// The same path spelled with the entity's own field names.
    pub fn canonical<T: Fields>(&self) -> Option<FieldPath> {
        self.resolve(T::fields())
            .map(|chain| FieldPath(chain.iter().map(|d| d.name.to_string()).collect()))
    }

    /// Reads this path from `entity`; `None` when the path doesn't resolve.
    pub fn read<T: Fields>(&self, entity: &T) -> Option<FieldValue> {
        let chain = self.resolve(T::fields())?;
        let names: Vec<&str> = chain.iter().map(|d| d.name).collect();
        entity.field_value(&names)
    }
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        FieldPath(raw.trim().split('.').map(|s| s.trim().to_string()).collect())
    }
}

impl From<String> for FieldPath {
    fn from(raw: String) -> Self {
        FieldPath::from(raw.as_str())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}
