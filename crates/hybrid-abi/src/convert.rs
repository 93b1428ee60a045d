//! Conversions between Rust types and [`NativeValue`].
//!
//! Typed wrappers over proxies use these to expose `fn size(&self) -> Result<ImageSize>`
//! style accessors instead of raw values.

use std::collections::BTreeMap;

use crate::buffer::SharedBuffer;
use crate::callback::NativeCallback;
use crate::error::MarshalError;
use crate::value::{NativeRecord, NativeValue, ObjectRef};

/// Extract a Rust value from a native value.
pub trait FromNative: Sized {
    fn from_native(value: NativeValue) -> Result<Self, MarshalError>;
}

/// Build a native value from a Rust value.
pub trait IntoNative {
    fn into_native(self) -> NativeValue;
}

fn mismatch(expected: &str, value: &NativeValue) -> MarshalError {
    MarshalError::mismatch(expected, value.type_name())
}

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl FromNative for $ty {
            fn from_native(value: NativeValue) -> Result<Self, MarshalError> {
                match value {
                    NativeValue::$variant(v) => Ok(v),
                    other => Err(mismatch($name, &other)),
                }
            }
        }

        impl IntoNative for $ty {
            fn into_native(self) -> NativeValue {
                NativeValue::$variant(self)
            }
        }
    };
}

impl_scalar!(i64, Int, "int");
impl_scalar!(f64, Double, "double");
impl_scalar!(bool, Bool, "bool");
impl_scalar!(String, String, "string");
impl_scalar!(SharedBuffer, Buffer, "buffer");
impl_scalar!(NativeRecord, Record, "record");
impl_scalar!(NativeCallback, Callback, "callback");
impl_scalar!(ObjectRef, Object, "object");

impl FromNative for () {
    fn from_native(value: NativeValue) -> Result<Self, MarshalError> {
        match value {
            NativeValue::Void => Ok(()),
            other => Err(mismatch("void", &other)),
        }
    }
}

impl IntoNative for () {
    fn into_native(self) -> NativeValue {
        NativeValue::Void
    }
}

impl IntoNative for &str {
    fn into_native(self) -> NativeValue {
        NativeValue::String(self.to_string())
    }
}

impl<T: FromNative> FromNative for Option<T> {
    fn from_native(value: NativeValue) -> Result<Self, MarshalError> {
        match value {
            NativeValue::Optional(None) => Ok(None),
            NativeValue::Optional(Some(inner)) => T::from_native(*inner).map(Some),
            other => Err(mismatch("optional", &other)),
        }
    }
}

impl<T: IntoNative> IntoNative for Option<T> {
    fn into_native(self) -> NativeValue {
        NativeValue::Optional(self.map(|v| Box::new(v.into_native())))
    }
}

impl<T: FromNative> FromNative for Vec<T> {
    fn from_native(value: NativeValue) -> Result<Self, MarshalError> {
        match value {
            NativeValue::Array(items) => items.into_iter().map(T::from_native).collect(),
            other => Err(mismatch("array", &other)),
        }
    }
}

impl<T: IntoNative> IntoNative for Vec<T> {
    fn into_native(self) -> NativeValue {
        NativeValue::Array(self.into_iter().map(IntoNative::into_native).collect())
    }
}

impl<T: FromNative> FromNative for BTreeMap<String, T> {
    fn from_native(value: NativeValue) -> Result<Self, MarshalError> {
        match value {
            NativeValue::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| Ok((key, T::from_native(value)?)))
                .collect(),
            other => Err(mismatch("map", &other)),
        }
    }
}

impl<T: IntoNative> IntoNative for BTreeMap<String, T> {
    fn into_native(self) -> NativeValue {
        NativeValue::Map(
            self.into_iter()
                .map(|(key, value)| (key, value.into_native()))
                .collect(),
        )
    }
}

impl FromNative for NativeValue {
    fn from_native(value: NativeValue) -> Result<Self, MarshalError> {
        Ok(value)
    }
}

impl IntoNative for NativeValue {
    fn into_native(self) -> NativeValue {
        self
    }
}
