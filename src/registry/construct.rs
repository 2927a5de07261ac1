use std::collections::HashMap;

use crate::reflection::{ExpandError, FromReflect, Reflect, Typed};
use crate::value::{AttrMap, Value};

// -----------------------------------------------------------------------------
// Constructors

/// Builds a typed instance from the attributes of a tagged mapping (marker
/// entry already stripped).
pub type ConstructFn = fn(&AttrMap) -> Result<Box<dyn Reflect>, ExpandError>;

fn construct_erased<T: FromReflect>(attrs: &AttrMap) -> Result<Box<dyn Reflect>, ExpandError> {
    Ok(Box::new(T::from_reflect(&Value::Mapping(attrs.clone()))?))
}

/// A constructor collected at link time under the `auto_register` feature.
///
/// `#[derive(Reflect)]` submits one of these for every non-generic
/// named-field or unit struct, so [`ConstructorRegistry::new`] already
/// knows how to rebuild every derived type.
pub struct RegisteredConstructor {
    pub identity: &'static str,
    pub construct: ConstructFn,
}

impl RegisteredConstructor {
    pub const fn of<T: FromReflect>(identity: &'static str) -> Self {
        Self {
            identity,
            construct: construct_erased::<T>,
        }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(RegisteredConstructor);

// -----------------------------------------------------------------------------
// ConstructorRegistry

/// The type identity → constructor table used by the expand direction.
///
/// Reconstruction of a tagged mapping fails hard when its identity has no
/// entry here; an unknown type is not a pass-through case.
pub struct ConstructorRegistry {
    table: HashMap<String, ConstructFn>,
}

impl ConstructorRegistry {
    /// A registry with no constructors at all.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// A registry pre-filled with every link-time collected constructor
    /// (or empty when `auto_register` is disabled).
    pub fn new() -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "auto_register")]
        for entry in inventory::iter::<RegisteredConstructor> {
            registry
                .table
                .insert(entry.identity.to_owned(), entry.construct);
        }
        registry
    }

    /// Register `T` under its own type identity.
    pub fn register<T: FromReflect + Typed>(&mut self) {
        self.table
            .insert(T::type_identity().into_owned(), construct_erased::<T>);
    }

    /// Register `T` under an explicit identity.
    pub fn register_as<T: FromReflect>(&mut self, identity: impl Into<String>) {
        self.table.insert(identity.into(), construct_erased::<T>);
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.table.contains_key(identity)
    }

    /// The construction primitive: rebuild a typed instance from raw
    /// attributes.
    pub fn construct(
        &self,
        identity: &str,
        attrs: &AttrMap,
    ) -> Result<Box<dyn Reflect>, ExpandError> {
        let construct = self
            .table
            .get(identity)
            .ok_or_else(|| ExpandError::UnresolvedType {
                identity: identity.to_owned(),
            })?;
        construct(attrs)
    }
}

impl Default for ConstructorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::ConstructorRegistry;
    use crate::derive::Reflect;
    use crate::reflection::ExpandError;
    use crate::value::{AttrMap, Value};

    #[derive(Reflect, Debug, PartialEq)]
    struct Marble {
        weight: i64,
    }

    fn attrs() -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert("weight".to_owned(), Value::Integer(12));
        attrs
    }

    #[test]
    fn construct_builds_a_typed_instance() {
        let mut registry = ConstructorRegistry::empty();
        registry.register::<Marble>();

        let instance = registry.construct("Marble", &attrs()).unwrap();
        assert_eq!(
            instance.downcast_ref::<Marble>(),
            Some(&Marble { weight: 12 })
        );
    }

    #[test]
    fn unknown_identity_is_a_hard_error() {
        let registry = ConstructorRegistry::empty();
        assert_eq!(
            registry.construct("Marble", &attrs()).unwrap_err(),
            ExpandError::UnresolvedType {
                identity: "Marble".to_owned(),
            }
        );
    }

    #[test]
    fn missing_attribute_surfaces_the_constructor_error() {
        let mut registry = ConstructorRegistry::empty();
        registry.register::<Marble>();

        assert_eq!(
            registry.construct("Marble", &AttrMap::new()).unwrap_err(),
            ExpandError::MissingAttribute {
                identity: "Marble".into(),
                attribute: "weight".into(),
            }
        );
    }

    #[cfg(feature = "auto_register")]
    #[test]
    fn derived_constructors_are_collected() {
        let registry = ConstructorRegistry::new();
        assert!(registry.contains("Marble"));
    }
}
