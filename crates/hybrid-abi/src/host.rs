//! Host object model.
//!
//! The host runtime is seen through a narrow interface: objects that can
//! resolve a member by accessor name and signature into a [`MethodHandle`],
//! then invoke that handle with a list of [`HostValue`] arguments. Handles
//! are stable for the lifetime of the object, so callers may cache them.
//!
//! [`DynamicObject`] is a table-driven host object for hosts that register
//! their members at runtime (and for tests).

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::buffer::SharedBuffer;
use crate::context::{HostContext, InlineContext};
use crate::error::HostError;
use crate::text::HostString;

/// Identity of a host object, stable while any handle to it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(usize);

impl HandleId {
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// A resolved host member, valid for the object that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodHandle {
    name: String,
    slot: usize,
}

impl MethodHandle {
    pub fn new(name: impl Into<String>, slot: usize) -> Self {
        Self {
            name: name.into(),
            slot,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// An object living in the host runtime.
pub trait HostObject: Send + Sync + 'static {
    /// Host class name, used in diagnostics.
    fn class_name(&self) -> &str;

    /// Look up a member by accessor name and signature string.
    ///
    /// `None` means the host does not implement the member.
    fn resolve(&self, name: &str, signature: &str) -> Option<MethodHandle>;

    /// Invoke a previously resolved member.
    fn invoke(&self, method: &MethodHandle, args: Vec<HostValue>) -> Result<HostValue, HostError>;

    /// Bytes held outside the native heap, if the host reports it.
    fn memory_size(&self) -> Option<usize> {
        None
    }
}

/// A reference to a host object together with the context it runs on.
#[derive(Clone)]
pub struct HostHandle {
    object: Arc<dyn HostObject>,
    context: Arc<dyn HostContext>,
}

impl HostHandle {
    /// A handle whose object may be called from any thread.
    pub fn new(object: Arc<dyn HostObject>) -> Self {
        Self {
            object,
            context: Arc::new(InlineContext),
        }
    }

    /// A handle whose object must only be touched on `context`.
    pub fn with_context(object: Arc<dyn HostObject>, context: Arc<dyn HostContext>) -> Self {
        Self { object, context }
    }

    pub fn id(&self) -> HandleId {
        HandleId(Arc::as_ptr(&self.object) as *const () as usize)
    }

    pub fn object(&self) -> &Arc<dyn HostObject> {
        &self.object
    }

    pub fn context(&self) -> &Arc<dyn HostContext> {
        &self.context
    }

    pub fn class_name(&self) -> &str {
        self.object.class_name()
    }

    /// Whether both handles refer to the same host object.
    pub fn same_object(&self, other: &HostHandle) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHandle")
            .field("id", &self.id())
            .field("class", &self.class_name())
            .field("context", &self.context.name())
            .finish()
    }
}

/// A function value living in the host runtime.
pub trait HostCallable: Send + Sync + fmt::Debug + 'static {
    fn call(&self, args: Vec<HostValue>) -> Result<HostValue, HostError>;

    fn as_any(&self) -> &dyn Any;
}

pub type HostCallableRef = Arc<dyn HostCallable>;

type HostFn = dyn Fn(Vec<HostValue>) -> Result<HostValue, HostError> + Send + Sync;

/// A host callable backed by a Rust closure.
pub struct HostFunction {
    name: String,
    func: Box<HostFn>,
}

impl HostFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> HostCallableRef
    where
        F: Fn(Vec<HostValue>) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.into(),
            func: Box::new(func),
        })
    }
}

impl HostCallable for HostFunction {
    fn call(&self, args: Vec<HostValue>) -> Result<HostValue, HostError> {
        (self.func)(args)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostFunction({})", self.name)
    }
}

/// A value in the host runtime's representation.
#[derive(Clone, Debug)]
pub enum HostValue {
    Null,
    Int(i64),
    Double(f64),
    Bool(bool),
    String(HostString),
    Buffer(SharedBuffer),
    Record(BTreeMap<String, HostValue>),
    Array(Vec<HostValue>),
    Object(HostHandle),
    Callable(HostCallableRef),
}

impl HostValue {
    pub fn string(s: &str) -> Self {
        HostValue::String(HostString::from(s))
    }

    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, HostValue)>) -> Self {
        HostValue::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    /// Name of the host-side type, used in mismatch diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Int(_) => "int",
            HostValue::Double(_) => "double",
            HostValue::Bool(_) => "bool",
            HostValue::String(_) => "string",
            HostValue::Buffer(_) => "buffer",
            HostValue::Record(_) => "record",
            HostValue::Array(_) => "array",
            HostValue::Object(_) => "object",
            HostValue::Callable(_) => "callable",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Double(a), HostValue::Double(b)) => a.to_bits() == b.to_bits(),
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Buffer(a), HostValue::Buffer(b)) => a == b,
            (HostValue::Record(a), HostValue::Record(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => a.same_object(b),
            (HostValue::Callable(a), HostValue::Callable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

type HostMethodFn = Arc<HostFn>;

struct HostMethodEntry {
    name: String,
    signature: Option<String>,
    func: HostMethodFn,
}

/// A host object whose members are registered at runtime.
///
/// Members are resolved by accessor name. A member registered with a
/// signature only resolves when the caller asks for that exact signature.
pub struct DynamicObject {
    class_name: String,
    methods: Vec<HostMethodEntry>,
    memory_size: Option<usize>,
    resolutions: AtomicUsize,
    invocations: AtomicUsize,
}

impl DynamicObject {
    pub fn builder(class_name: impl Into<String>) -> DynamicObjectBuilder {
        DynamicObjectBuilder {
            class_name: class_name.into(),
            methods: Vec::new(),
            memory_size: None,
        }
    }

    /// Number of `resolve` calls served so far.
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    /// Number of `invoke` calls served so far.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl HostObject for DynamicObject {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn resolve(&self, name: &str, signature: &str) -> Option<MethodHandle> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.methods
            .iter()
            .position(|m| {
                m.name == name && m.signature.as_deref().is_none_or(|sig| sig == signature)
            })
            .map(|slot| MethodHandle::new(name, slot))
    }

    fn invoke(&self, method: &MethodHandle, args: Vec<HostValue>) -> Result<HostValue, HostError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .methods
            .get(method.slot())
            .filter(|m| m.name == method.name())
            .ok_or_else(|| {
                HostError::with_class(
                    "NoSuchMethodError",
                    format!("{}.{} is not a member", self.class_name, method.name()),
                )
            })?;
        (entry.func)(args)
    }

    fn memory_size(&self) -> Option<usize> {
        self.memory_size
    }
}

/// Builder for [`DynamicObject`].
pub struct DynamicObjectBuilder {
    class_name: String,
    methods: Vec<HostMethodEntry>,
    memory_size: Option<usize>,
}

impl DynamicObjectBuilder {
    /// Register a member under its accessor name, matching any signature.
    pub fn method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Vec<HostValue>) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        self.methods.push(HostMethodEntry {
            name: name.into(),
            signature: None,
            func: Arc::new(func),
        });
        self
    }

    /// Register a member that only resolves for one signature.
    pub fn typed_method<F>(mut self, name: impl Into<String>, signature: impl Into<String>, func: F) -> Self
    where
        F: Fn(Vec<HostValue>) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        self.methods.push(HostMethodEntry {
            name: name.into(),
            signature: Some(signature.into()),
            func: Arc::new(func),
        });
        self
    }

    pub fn memory_size(mut self, bytes: usize) -> Self {
        self.memory_size = Some(bytes);
        self
    }

    pub fn build(self) -> Arc<DynamicObject> {
        Arc::new(DynamicObject {
            class_name: self.class_name,
            methods: self.methods,
            memory_size: self.memory_size,
            resolutions: AtomicUsize::new(0),
            invocations: AtomicUsize::new(0),
        })
    }
}
