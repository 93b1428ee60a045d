//! Native value representation.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::buffer::SharedBuffer;
use crate::callback::NativeCallback;
use crate::error::MarshalError;
use crate::host::HostHandle;

/// A native object that stands for a host object.
///
/// Implemented by the proxy runtime. Marshaling only needs to know the
/// interface an object implements and how to reach its host handle.
pub trait NativeObject: Send + Sync + fmt::Debug + 'static {
    fn interface_name(&self) -> &str;

    /// The host object behind this proxy.
    ///
    /// Fails with [`MarshalError::UseAfterRelease`] once released.
    fn host_handle(&self) -> Result<HostHandle, MarshalError>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

pub type ObjectRef = Arc<dyn NativeObject>;

/// A record value: a name and a set of named fields.
///
/// Fields keep insertion order for display, but two records are equal when
/// they have the same name and the same fields, in any order.
#[derive(Clone, Debug, Default)]
pub struct NativeRecord {
    pub name: String,
    pub fields: Vec<(String, NativeValue)>,
}

impl NativeRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, field: impl Into<String>, value: NativeValue) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field, replacing an existing one of the same name.
    pub fn set(&mut self, field: impl Into<String>, value: NativeValue) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&NativeValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

impl PartialEq for NativeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

/// A value on the native side of the bridge.
#[derive(Clone, Debug)]
pub enum NativeValue {
    Void,
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
    Buffer(SharedBuffer),
    /// Numeric value of an enum member.
    Enum(i32),
    Optional(Option<Box<NativeValue>>),
    Array(Vec<NativeValue>),
    Map(BTreeMap<String, NativeValue>),
    Record(NativeRecord),
    Callback(NativeCallback),
    Object(ObjectRef),
}

impl NativeValue {
    pub fn none() -> Self {
        NativeValue::Optional(None)
    }

    pub fn some(value: NativeValue) -> Self {
        NativeValue::Optional(Some(Box::new(value)))
    }

    pub fn string(s: impl Into<String>) -> Self {
        NativeValue::String(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Void => "void",
            NativeValue::Int(_) => "int",
            NativeValue::Double(_) => "double",
            NativeValue::Bool(_) => "bool",
            NativeValue::String(_) => "string",
            NativeValue::Buffer(_) => "buffer",
            NativeValue::Enum(_) => "enum",
            NativeValue::Optional(_) => "optional",
            NativeValue::Array(_) => "array",
            NativeValue::Map(_) => "map",
            NativeValue::Record(_) => "record",
            NativeValue::Callback(_) => "callback",
            NativeValue::Object(_) => "object",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            NativeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            NativeValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&SharedBuffer> {
        match self {
            NativeValue::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, NativeValue>> {
        match self {
            NativeValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&NativeRecord> {
        match self {
            NativeValue::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&NativeCallback> {
        match self {
            NativeValue::Callback(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            NativeValue::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NativeValue::Void, NativeValue::Void) => true,
            (NativeValue::Int(a), NativeValue::Int(b)) => a == b,
            (NativeValue::Double(a), NativeValue::Double(b)) => a.to_bits() == b.to_bits(),
            (NativeValue::Bool(a), NativeValue::Bool(b)) => a == b,
            (NativeValue::String(a), NativeValue::String(b)) => a == b,
            (NativeValue::Buffer(a), NativeValue::Buffer(b)) => a == b,
            (NativeValue::Enum(a), NativeValue::Enum(b)) => a == b,
            (NativeValue::Optional(a), NativeValue::Optional(b)) => a == b,
            (NativeValue::Array(a), NativeValue::Array(b)) => a == b,
            (NativeValue::Map(a), NativeValue::Map(b)) => a == b,
            (NativeValue::Record(a), NativeValue::Record(b)) => a == b,
            (NativeValue::Callback(a), NativeValue::Callback(b)) => a.ptr_eq(b),
            (NativeValue::Object(a), NativeValue::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_set_replaces() {
        let mut rec = NativeRecord::new("ImageSize")
            .with("width", NativeValue::Int(1))
            .with("height", NativeValue::Int(2));
        rec.set("width", NativeValue::Int(10));
        assert_eq!(rec.fields.len(), 2);
        assert_eq!(rec.get("width"), Some(&NativeValue::Int(10)));
        assert_eq!(rec.get("depth"), None);
    }

    #[test]
    fn test_record_equality_ignores_field_order() {
        let a = NativeRecord::new("Size")
            .with("width", NativeValue::Int(100))
            .with("height", NativeValue::Int(50));
        let b = NativeRecord::new("Size")
            .with("height", NativeValue::Int(50))
            .with("width", NativeValue::Int(100));
        assert_eq!(a, b);

        assert_ne!(a, b.clone().with("depth", NativeValue::Int(1)));
        assert_ne!(a, NativeRecord::new("Size").with("width", NativeValue::Int(100)));
        assert_ne!(a, b.clone().with("width", NativeValue::Int(99)));
        let mut renamed = b;
        renamed.name = "Dimensions".to_string();
        assert_ne!(a, renamed);
    }

    #[test]
    fn test_optional_helpers() {
        assert_eq!(NativeValue::none(), NativeValue::Optional(None));
        assert_eq!(
            NativeValue::some(NativeValue::Bool(true)),
            NativeValue::Optional(Some(Box::new(NativeValue::Bool(true))))
        );
        assert_ne!(NativeValue::none(), NativeValue::Void);
    }
}
