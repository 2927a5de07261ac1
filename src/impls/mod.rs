//! [`Reflect`]/[`FromReflect`] implementations for primitives, strings,
//! options, sequences, and string-keyed maps.
//!
//! [`Reflect`]: crate::Reflect
//! [`FromReflect`]: crate::FromReflect

mod collections;
mod scalar;

use std::borrow::Cow;

use core::any::Any;

use crate::reflection::{ExpandError, FromReflect, Reflect};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Value

// Reflection of an already-generic tree is a clone, which makes the
// reflection step idempotent on generic input.
impl Reflect for Value {
    fn reflect_identity(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.type_tag())
    }

    fn reflect(&self, _marker: Option<&str>) -> Value {
        self.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl FromReflect for Value {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
        Ok(value.clone())
    }
}

// No `Typed` impl: a generic tree has no static identity, only the
// per-variant runtime tag reported by `reflect_identity`.
