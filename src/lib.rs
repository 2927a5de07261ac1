#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Extern Self

// The derive macro emits `remold::` paths; this alias keeps them valid when
// the macro is used inside this crate (tests, doctests).
extern crate self as remold;

// -----------------------------------------------------------------------------
// Modules

mod pipeline;
mod reflection;
mod value;

pub mod impls;
pub mod registry;
pub mod serde;
pub mod transform;

// -----------------------------------------------------------------------------
// Macro support

#[cfg(feature = "auto_register")]
#[doc(hidden)]
pub mod __macro_exports {
    pub use inventory;
}

// -----------------------------------------------------------------------------
// Top-level exports

pub use pipeline::{Pipeline, SerializeOptions, Tagging};
pub use reflection::{ExpandError, FromReflect, Reflect, Typed};
pub use transform::Expanded;
pub use value::{AttrMap, CLASS_MARKER, Value};

pub use remold_derive as derive;
