use std::borrow::Cow;

use core::any::Any;

use crate::reflection::{ExpandError, FromReflect, Reflect, Typed};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Integers

macro_rules! impl_reflect_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl Typed for $ty {
            fn type_identity() -> Cow<'static, str> {
                Cow::Borrowed("INTEGER")
            }
        }

        impl Reflect for $ty {
            fn reflect_identity(&self) -> Cow<'static, str> {
                <Self as Typed>::type_identity()
            }

            fn reflect(&self, _marker: Option<&str>) -> Value {
                Value::Integer(*self as i64)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }
        }

        impl FromReflect for $ty {
            fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
                let raw = value.as_integer().ok_or(ExpandError::ExpectedKind {
                    expected: "INTEGER",
                    found: value.type_tag(),
                })?;
                <$ty>::try_from(raw).map_err(|_| ExpandError::OutOfRange {
                    target: stringify!($ty),
                })
            }
        }
    )*};
}

impl_reflect_integer!(i8, i16, i32, i64, isize, u8, u16, u32);

// u64/usize may exceed the signed scalar range; the snapshot degrades to a
// float at that extreme, matching what JSON numbers would do anyway.
macro_rules! impl_reflect_wide_unsigned {
    ($($ty:ty),* $(,)?) => {$(
        impl Typed for $ty {
            fn type_identity() -> Cow<'static, str> {
                Cow::Borrowed("INTEGER")
            }
        }

        impl Reflect for $ty {
            fn reflect_identity(&self) -> Cow<'static, str> {
                <Self as Typed>::type_identity()
            }

            fn reflect(&self, _marker: Option<&str>) -> Value {
                match i64::try_from(*self) {
                    Ok(value) => Value::Integer(value),
                    Err(_) => Value::Float(*self as f64),
                }
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }
        }

        impl FromReflect for $ty {
            fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
                let raw = value.as_integer().ok_or(ExpandError::ExpectedKind {
                    expected: "INTEGER",
                    found: value.type_tag(),
                })?;
                <$ty>::try_from(raw).map_err(|_| ExpandError::OutOfRange {
                    target: stringify!($ty),
                })
            }
        }
    )*};
}

impl_reflect_wide_unsigned!(u64, usize);

// -----------------------------------------------------------------------------
// Floats

macro_rules! impl_reflect_float {
    ($($ty:ty),* $(,)?) => {$(
        impl Typed for $ty {
            fn type_identity() -> Cow<'static, str> {
                Cow::Borrowed("FLOAT")
            }
        }

        impl Reflect for $ty {
            fn reflect_identity(&self) -> Cow<'static, str> {
                <Self as Typed>::type_identity()
            }

            fn reflect(&self, _marker: Option<&str>) -> Value {
                Value::Float(*self as f64)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }
        }

        impl FromReflect for $ty {
            fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
                let raw = value.as_float().ok_or(ExpandError::ExpectedKind {
                    expected: "FLOAT",
                    found: value.type_tag(),
                })?;
                Ok(raw as $ty)
            }
        }
    )*};
}

impl_reflect_float!(f32, f64);

// -----------------------------------------------------------------------------
// bool

impl Typed for bool {
    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed("BOOLEAN")
    }
}

impl Reflect for bool {
    fn reflect_identity(&self) -> Cow<'static, str> {
        <Self as Typed>::type_identity()
    }

    fn reflect(&self, _marker: Option<&str>) -> Value {
        Value::Bool(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl FromReflect for bool {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
        value.as_bool().ok_or(ExpandError::ExpectedKind {
            expected: "BOOLEAN",
            found: value.type_tag(),
        })
    }
}

// -----------------------------------------------------------------------------
// Strings

impl Typed for String {
    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed("STRING")
    }
}

impl Reflect for String {
    fn reflect_identity(&self) -> Cow<'static, str> {
        <Self as Typed>::type_identity()
    }

    fn reflect(&self, _marker: Option<&str>) -> Value {
        Value::String(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl FromReflect for String {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or(ExpandError::ExpectedKind {
                expected: "STRING",
                found: value.type_tag(),
            })
    }
}

impl Typed for &'static str {
    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed("STRING")
    }
}

// Snapshot-only; a borrowed str cannot be rebuilt from a generic tree.
impl Reflect for &'static str {
    fn reflect_identity(&self) -> Cow<'static, str> {
        <Self as Typed>::type_identity()
    }

    fn reflect(&self, _marker: Option<&str>) -> Value {
        Value::String((*self).to_owned())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Typed for char {
    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed("STRING")
    }
}

impl Reflect for char {
    fn reflect_identity(&self) -> Cow<'static, str> {
        <Self as Typed>::type_identity()
    }

    fn reflect(&self, _marker: Option<&str>) -> Value {
        Value::String(self.to_string())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl FromReflect for char {
    fn from_reflect(value: &Value) -> Result<Self, ExpandError> {
        let raw = value.as_str().ok_or(ExpandError::ExpectedKind {
            expected: "STRING",
            found: value.type_tag(),
        })?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ExpandError::custom(format!(
                "expected a single-character string, found {raw:?}"
            ))),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::reflection::{ExpandError, FromReflect, Reflect};
    use crate::value::Value;

    #[test]
    fn scalars_pass_through_untagged() {
        assert_eq!(7_i32.reflect(Some("__CLASS__")), Value::Integer(7));
        assert_eq!(true.reflect(None), Value::Bool(true));
        assert_eq!(2.5_f64.reflect(None), Value::Float(2.5));
        assert_eq!("hi".reflect(None), Value::from("hi"));
        assert_eq!('x'.reflect(None), Value::from("x"));
    }

    #[test]
    fn integers_rebuild_with_range_checks() {
        assert_eq!(i32::from_reflect(&Value::Integer(40)), Ok(40));
        assert_eq!(
            u8::from_reflect(&Value::Integer(300)),
            Err(ExpandError::OutOfRange { target: "u8" })
        );
        assert_eq!(
            i64::from_reflect(&Value::from("40")),
            Err(ExpandError::ExpectedKind {
                expected: "INTEGER",
                found: "STRING",
            })
        );
    }

    #[test]
    fn wide_unsigned_degrades_to_float() {
        assert_eq!(u64::MAX.reflect(None), Value::Float(u64::MAX as f64));
        assert_eq!(1_u64.reflect(None), Value::Integer(1));
    }

    #[test]
    fn floats_accept_integer_nodes() {
        assert_eq!(f64::from_reflect(&Value::Integer(3)), Ok(3.0));
        assert_eq!(f32::from_reflect(&Value::Float(0.5)), Ok(0.5));
    }

    #[test]
    fn char_requires_a_single_character() {
        assert_eq!(char::from_reflect(&Value::from("x")), Ok('x'));
        assert!(char::from_reflect(&Value::from("xy")).is_err());
    }
}
