use std::borrow::Cow;

use core::any::Any;
use core::{error, fmt};

use crate::value::Value;

// -----------------------------------------------------------------------------
// Typed

/// Static-side type identity.
///
/// The identity is the string recorded under the marker key when a value of
/// the type is snapshotted, and the key a constructor for the type is filed
/// under. [`#[derive(Reflect)]`](crate::derive::Reflect) implements this
/// with the type's name, overridable via `#[reflect(identity = "...")]`.
pub trait Typed {
    fn type_identity() -> Cow<'static, str>;
}

// -----------------------------------------------------------------------------
// Reflect

/// The snapshot seam of the engine.
///
/// `reflect` converts a value into the generic [`Value`] tree without
/// mutating the original. Attribute-keyed types become mappings with the
/// marker key injected (when `marker` is `Some`); everything else passes
/// through structurally, with nested values snapshotted by the same call.
///
/// Implemented for primitives, strings, `Option`, `Vec`, string-keyed maps,
/// and [`Value`] itself (where it is a clone, making reflection idempotent
/// on already-generic input). Use the derive macro for your own structs.
///
/// # Example
///
/// ```
/// use remold::derive::Reflect;
/// use remold::{CLASS_MARKER, Reflect};
///
/// #[derive(Reflect)]
/// struct Point { x: i64, y: i64 }
///
/// let tree = Point { x: 1, y: 2 }.reflect(Some(CLASS_MARKER));
/// assert_eq!(tree.class_of(CLASS_MARKER), Some("Point"));
///
/// // Untagged when the marker is disabled.
/// let bare = Point { x: 1, y: 2 }.reflect(None);
/// assert_eq!(bare.class_of(CLASS_MARKER), None);
/// ```
pub trait Reflect: Any {
    /// Identity of the underlying type, without static type knowledge.
    fn reflect_identity(&self) -> Cow<'static, str>;

    /// Snapshot `self` into a generic tree, tagging attribute-keyed nodes
    /// under `marker`.
    fn reflect(&self, marker: Option<&str>) -> Value;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Reflect {
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Move the concrete value out of the box.
    pub fn take<T: Reflect>(self: Box<Self>) -> Result<T, Box<dyn Any>> {
        self.into_any().downcast::<T>().map(|boxed| *boxed)
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reflect({})", self.reflect_identity())
    }
}

// -----------------------------------------------------------------------------
// FromReflect

/// Reconstruct a typed value from its generic snapshot.
///
/// This is the typed half of the construction primitive: a derived
/// implementation reads its fields back out of a mapping (ignoring the
/// marker entry and any other unknown keys) and recurses through each
/// field's own `FromReflect`.
pub trait FromReflect: Reflect + Sized {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError>;
}

// -----------------------------------------------------------------------------
// ExpandError

/// A enumeration of all error outcomes of the expand (deserialize)
/// direction.
///
/// The collapse direction has no failure mode: missing strategies and
/// untagged leaves pass through unchanged.
#[derive(Debug, PartialEq)]
pub enum ExpandError {
    /// No constructor is registered for the tagged identity.
    UnresolvedType { identity: String },
    /// The marker entry of a tagged mapping is not a string.
    MalformedTag { found: &'static str },
    /// A node had the wrong shape for the type being rebuilt.
    ExpectedKind {
        expected: &'static str,
        found: &'static str,
    },
    /// A required attribute is absent from a tagged mapping.
    MissingAttribute {
        identity: Cow<'static, str>,
        attribute: Cow<'static, str>,
    },
    /// An integer attribute does not fit the target type.
    OutOfRange { target: &'static str },
    /// Failure reported by a registered expand routine.
    Custom(String),
}

impl ExpandError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

impl fmt::Display for ExpandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedType { identity } => {
                write!(f, "no constructor registered for type `{identity}`")
            }
            Self::MalformedTag { found } => {
                write!(f, "marker entry must be a string, found `{found}`")
            }
            Self::ExpectedKind { expected, found } => {
                write!(f, "expected a `{expected}` node, found `{found}`")
            }
            Self::MissingAttribute {
                identity,
                attribute,
            } => {
                write!(f, "attribute `{attribute}` missing while rebuilding `{identity}`")
            }
            Self::OutOfRange { target } => {
                write!(f, "integer attribute out of range for `{target}`")
            }
            Self::Custom(message) => f.write_str(message),
        }
    }
}

impl error::Error for ExpandError {}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::Reflect;
    use crate::derive::Reflect;

    #[derive(Reflect, Debug, PartialEq)]
    struct Tiny {
        n: i64,
    }

    #[test]
    fn downcast_through_the_trait_object() {
        let boxed: Box<dyn Reflect> = Box::new(Tiny { n: 4 });
        assert_eq!(boxed.reflect_identity(), "Tiny");
        assert_eq!(boxed.downcast_ref::<Tiny>(), Some(&Tiny { n: 4 }));
        assert_eq!(boxed.take::<Tiny>().unwrap(), Tiny { n: 4 });
    }

    #[test]
    fn take_rejects_the_wrong_type() {
        let boxed: Box<dyn Reflect> = Box::new(Tiny { n: 4 });
        assert!(boxed.take::<i64>().is_err());
    }
}
