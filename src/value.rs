use indexmap::IndexMap;

// -----------------------------------------------------------------------------
// Marker key

/// Default marker key recording a type identity inside a tagged mapping.
///
/// A mapping holding this key is a *tagged mapping*: the key's value is the
/// identity of the type the mapping was snapshotted from, and the key itself
/// is never a domain attribute. Both transform directions treat the pair
/// symmetrically, stripping it before handing attributes to a routine and
/// reattaching it on pass-through.
pub const CLASS_MARKER: &str = "__CLASS__";

// -----------------------------------------------------------------------------
// Value

/// An attribute mapping inside a [`Value`] tree.
///
/// Insertion-ordered so snapshots and encoder output stay deterministic.
pub type AttrMap = IndexMap<String, Value>;

/// The typeless intermediate tree every instance is snapshotted into.
///
/// This is the sole representation exchanged between the reflection layer,
/// the transform walks, and downstream encoders. It carries no dependency on
/// any concrete instance type; type identities survive only as marker
/// entries inside mappings.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(AttrMap),
}

impl Value {
    /// The runtime tag of this node.
    ///
    /// Untagged nodes are looked up in the strategy registry under this
    /// identity, so routines can be registered for, say, every `"SEQUENCE"`
    /// a given namespace serializes.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "STRING",
            Value::Sequence(_) => "SEQUENCE",
            Value::Mapping(_) => "MAPPING",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value of this node, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&AttrMap> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Type identity recorded under `marker`, if this node is a tagged
    /// mapping.
    ///
    /// Returns `None` for non-mappings, untagged mappings, and mappings
    /// whose marker entry is not a string.
    pub fn class_of(&self, marker: &str) -> Option<&str> {
        self.as_mapping()?.get(marker)?.as_str()
    }
}

// -----------------------------------------------------------------------------
// Conversions

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<AttrMap> for Value {
    fn from(map: AttrMap) -> Self {
        Value::Mapping(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
