use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use core::any::Any;

use indexmap::IndexMap;

use crate::reflection::{ExpandError, FromReflect, Reflect, Typed};
use crate::value::{AttrMap, Value};

// -----------------------------------------------------------------------------
// Option

impl<T: Typed> Typed for Option<T> {
    fn type_identity() -> Cow<'static, str> {
        T::type_identity()
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect_identity(&self) -> Cow<'static, str> {
        match self {
            Some(value) => value.reflect_identity(),
            None => Cow::Borrowed("NULL"),
        }
    }

    fn reflect(&self, marker: Option<&str>) -> Value {
        match self {
            Some(value) => value.reflect(marker),
            None => Value::Null,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: FromReflect> FromReflect for Option<T> {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_reflect(value).map(Some)
        }
    }
}

// -----------------------------------------------------------------------------
// Vec

impl<T: Reflect> Typed for Vec<T> {
    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed("SEQUENCE")
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect_identity(&self) -> Cow<'static, str> {
        Cow::Borrowed("SEQUENCE")
    }

    fn reflect(&self, marker: Option<&str>) -> Value {
        Value::Sequence(self.iter().map(|item| item.reflect(marker)).collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: FromReflect> FromReflect for Vec<T> {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
        let items = value.as_sequence().ok_or(ExpandError::ExpectedKind {
            expected: "SEQUENCE",
            found: value.type_tag(),
        })?;
        items.iter().map(T::from_reflect).collect()
    }
}

// -----------------------------------------------------------------------------
// String-keyed maps

impl<T: Reflect> Typed for IndexMap<String, T> {
    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed("MAPPING")
    }
}

impl<T: Reflect> Reflect for IndexMap<String, T> {
    fn reflect_identity(&self) -> Cow<'static, str> {
        Cow::Borrowed("MAPPING")
    }

    fn reflect(&self, marker: Option<&str>) -> Value {
        let mut map = AttrMap::with_capacity(self.len());
        for (key, value) in self {
            map.insert(key.clone(), value.reflect(marker));
        }
        Value::Mapping(map)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: FromReflect> FromReflect for IndexMap<String, T> {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
        let map = value.as_mapping().ok_or(ExpandError::ExpectedKind {
            expected: "MAPPING",
            found: value.type_tag(),
        })?;
        map.iter()
            .map(|(key, value)| Ok((key.clone(), T::from_reflect(value)?)))
            .collect()
    }
}

impl<T: Reflect> Typed for HashMap<String, T> {
    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed("MAPPING")
    }
}

impl<T: Reflect> Reflect for HashMap<String, T> {
    fn reflect_identity(&self) -> Cow<'static, str> {
        Cow::Borrowed("MAPPING")
    }

    // Keys are sorted so the snapshot is reproducible regardless of hash
    // seeding.
    fn reflect(&self, marker: Option<&str>) -> Value {
        let mut keys: Vec<&String> = self.keys().collect();
        keys.sort();
        let mut map = AttrMap::with_capacity(self.len());
        for key in keys {
            map.insert(key.clone(), self[key].reflect(marker));
        }
        Value::Mapping(map)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: FromReflect> FromReflect for HashMap<String, T> {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
        let map = value.as_mapping().ok_or(ExpandError::ExpectedKind {
            expected: "MAPPING",
            found: value.type_tag(),
        })?;
        map.iter()
            .map(|(key, value)| Ok((key.clone(), T::from_reflect(value)?)))
            .collect()
    }
}

impl<T: Reflect> Typed for BTreeMap<String, T> {
    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed("MAPPING")
    }
}

impl<T: Reflect> Reflect for BTreeMap<String, T> {
    fn reflect_identity(&self) -> Cow<'static, str> {
        Cow::Borrowed("MAPPING")
    }

    fn reflect(&self, marker: Option<&str>) -> Value {
        let mut map = AttrMap::with_capacity(self.len());
        for (key, value) in self {
            map.insert(key.clone(), value.reflect(marker));
        }
        Value::Mapping(map)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: FromReflect> FromReflect for BTreeMap<String, T> {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
        let map = value.as_mapping().ok_or(ExpandError::ExpectedKind {
            expected: "MAPPING",
            found: value.type_tag(),
        })?;
        map.iter()
            .map(|(key, value)| Ok((key.clone(), T::from_reflect(value)?)))
            .collect()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::reflection::{FromReflect, Reflect};
    use crate::value::{AttrMap, Value};

    #[test]
    fn options_collapse_to_null() {
        assert_eq!(None::<i64>.reflect(None), Value::Null);
        assert_eq!(Some(4_i64).reflect(None), Value::Integer(4));
        assert_eq!(Option::<i64>::from_reflect(&Value::Null), Ok(None));
        assert_eq!(Option::<i64>::from_reflect(&Value::Integer(4)), Ok(Some(4)));
    }

    #[test]
    fn sequences_preserve_order() {
        let items = vec![1_i64, 2, 3];
        let tree = items.reflect(None);
        assert_eq!(
            tree,
            Value::Sequence(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
            ])
        );
        assert_eq!(Vec::<i64>::from_reflect(&tree), Ok(items));
    }

    #[test]
    fn hash_maps_snapshot_in_sorted_key_order() {
        let mut map = HashMap::new();
        map.insert("b".to_owned(), 2_i64);
        map.insert("a".to_owned(), 1_i64);
        map.insert("c".to_owned(), 3_i64);

        let mut expected = AttrMap::new();
        expected.insert("a".to_owned(), Value::Integer(1));
        expected.insert("b".to_owned(), Value::Integer(2));
        expected.insert("c".to_owned(), Value::Integer(3));

        assert_eq!(map.reflect(None), Value::Mapping(expected));
    }

    #[test]
    fn maps_rebuild_their_entries() {
        let mut expected = HashMap::new();
        expected.insert("a".to_owned(), 1_i64);

        let mut tree = AttrMap::new();
        tree.insert("a".to_owned(), Value::Integer(1));

        assert_eq!(
            HashMap::<String, i64>::from_reflect(&Value::Mapping(tree)),
            Ok(expected)
        );
    }
}
