//! Capability traits shared by dynamic proxies and typed wrappers.
//!
//! Every bound interface offers the same three capabilities: property
//! access, method calls and a lifecycle. [`ProxyInstance`] implements them
//! dynamically; a typed wrapper implements [`TypedProxy`] and gets them
//! through the blanket impls.

use std::sync::Arc;

use hybrid_abi::{HostHandle, NativeObject, NativeValue, ObjectRef};

use crate::error::Result;
use crate::pending::PendingCall;
use crate::proxy::{ProxyInstance, ProxyState};
use crate::registry::Registry;

pub trait HasProperties {
    fn get_property(&self, name: &str) -> Result<NativeValue>;
    fn set_property(&self, name: &str, value: NativeValue) -> Result<()>;
}

pub trait HasMethods {
    fn call_method(&self, name: &str, args: Vec<NativeValue>) -> Result<NativeValue>;
    fn call_method_async(&self, name: &str, args: Vec<NativeValue>) -> Result<PendingCall>;
}

pub trait HasLifecycle {
    fn state(&self) -> ProxyState;
    /// Bytes held by the host object outside the native heap, zero if unknown.
    fn external_memory_size(&self) -> usize;
    fn release(&self) -> Result<()>;

    fn is_released(&self) -> bool {
        self.state() == ProxyState::Released
    }
}

impl HasProperties for ProxyInstance {
    fn get_property(&self, name: &str) -> Result<NativeValue> {
        self.get(name)
    }

    fn set_property(&self, name: &str, value: NativeValue) -> Result<()> {
        self.set(name, value)
    }
}

impl HasMethods for ProxyInstance {
    fn call_method(&self, name: &str, args: Vec<NativeValue>) -> Result<NativeValue> {
        self.call(name, args)
    }

    fn call_method_async(&self, name: &str, args: Vec<NativeValue>) -> Result<PendingCall> {
        self.call_async(name, args)
    }
}

impl HasLifecycle for ProxyInstance {
    fn state(&self) -> ProxyState {
        ProxyInstance::state(self)
    }

    fn external_memory_size(&self) -> usize {
        ProxyInstance::external_memory_size(self)
    }

    fn release(&self) -> Result<()> {
        ProxyInstance::release(self)
    }
}

/// A statically typed view of one interface.
///
/// Implementors wrap a [`ProxyInstance`] bound to [`TypedProxy::INTERFACE`]
/// and add typed accessors on top of it.
///
/// ```
/// use std::sync::Arc;
/// use hybrid_bridge::prelude::*;
///
/// struct HybridImage(Arc<ProxyInstance>);
///
/// impl TypedProxy for HybridImage {
///     const INTERFACE: &'static str = "Image";
///
///     fn from_proxy(proxy: Arc<ProxyInstance>) -> Self {
///         Self(proxy)
///     }
///
///     fn proxy(&self) -> &Arc<ProxyInstance> {
///         &self.0
///     }
/// }
///
/// impl HybridImage {
///     fn some_settable_prop(&self) -> Result<f64> {
///         self.proxy().get_as("someSettableProp")
///     }
/// }
/// ```
pub trait TypedProxy: Sized {
    const INTERFACE: &'static str;

    fn from_proxy(proxy: Arc<ProxyInstance>) -> Self;

    fn proxy(&self) -> &Arc<ProxyInstance>;

    /// The wrapper for a native object, if it is a proxy of this interface.
    fn from_object(object: ObjectRef) -> Option<Self> {
        let proxy = object.into_any().downcast::<ProxyInstance>().ok()?;
        (proxy.interface_name() == Self::INTERFACE).then(|| Self::from_proxy(proxy))
    }

    /// The wrapper for an `InterfaceRef` value.
    fn from_value(value: NativeValue) -> Option<Self> {
        match value {
            NativeValue::Object(object) => Self::from_object(object),
            _ => None,
        }
    }

    /// This object as a native value, for passing it back across the bridge.
    fn to_value(&self) -> NativeValue {
        let object: ObjectRef = Arc::clone(self.proxy()) as ObjectRef;
        NativeValue::Object(object)
    }
}

impl<T: TypedProxy> HasProperties for T {
    fn get_property(&self, name: &str) -> Result<NativeValue> {
        self.proxy().get(name)
    }

    fn set_property(&self, name: &str, value: NativeValue) -> Result<()> {
        self.proxy().set(name, value)
    }
}

impl<T: TypedProxy> HasMethods for T {
    fn call_method(&self, name: &str, args: Vec<NativeValue>) -> Result<NativeValue> {
        self.proxy().call(name, args)
    }

    fn call_method_async(&self, name: &str, args: Vec<NativeValue>) -> Result<PendingCall> {
        self.proxy().call_async(name, args)
    }
}

impl<T: TypedProxy> HasLifecycle for T {
    fn state(&self) -> ProxyState {
        self.proxy().state()
    }

    fn external_memory_size(&self) -> usize {
        self.proxy().external_memory_size()
    }

    fn release(&self) -> Result<()> {
        self.proxy().release()
    }
}

impl Registry {
    /// Create a new host object and return its typed wrapper.
    pub fn create_typed<T: TypedProxy>(&self) -> Result<T> {
        self.create(T::INTERFACE).map(T::from_proxy)
    }

    /// The typed wrapper for an existing host object.
    pub fn wrap_typed<T: TypedProxy>(&self, handle: &HostHandle) -> Result<T> {
        self.get_or_create(T::INTERFACE, handle).map(T::from_proxy)
    }
}
