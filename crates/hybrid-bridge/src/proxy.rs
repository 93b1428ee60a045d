//! Proxy objects standing in for host objects.
//!
//! A [`ProxyInstance`] owns one [`HostHandle`] and exposes the members of
//! its [`InterfaceDescriptor`] through a dynamic call table. Each call
//! resolves the host member once (the handle is memoized until release),
//! marshals the arguments, invokes the member on the object's host
//! context and marshals the result back.
//!
//! # Lifecycle
//!
//! `Constructed` (bound, nothing resolved) moves to `Active` on the first
//! call. `Released` is terminal: the host handle and the member cache are
//! dropped and every further call fails with
//! [`BridgeError::UseAfterRelease`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::RwLock;

use hybrid_abi::{
    FromNative, HandleId, HostError, HostFunction, HostHandle, HostValue, MarshalError, Marshaler,
    MethodHandle, NativeObject, NativeValue, ValueKind, run_blocking,
};
use hybrid_spec::{InterfaceDescriptor, Member, MethodDescriptor, getter_name, setter_name};

use crate::error::{BindingCause, BridgeError, Result};
use crate::logging::{debug, error, trace, warn};
use crate::pending::PendingCall;
use crate::registry::RegistryInner;

const CONSTRUCTED: u8 = 0;
const ACTIVE: u8 = 1;
const RELEASED: u8 = 2;

/// Lifecycle state of a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// Bound to a host object, no member resolved yet.
    Constructed,
    /// In use.
    Active,
    /// Host handle dropped. Terminal.
    Released,
}

impl ProxyState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            CONSTRUCTED => Self::Constructed,
            ACTIVE => Self::Active,
            _ => Self::Released,
        }
    }
}

type MemberKey = (String, String);

/// The native stand-in for one host object.
pub struct ProxyInstance {
    descriptor: Arc<InterfaceDescriptor>,
    id: HandleId,
    handle: RwLock<Option<HostHandle>>,
    state: AtomicU8,
    members: RwLock<HashMap<MemberKey, Option<MethodHandle>>>,
    cache_members: bool,
    registry: Arc<RegistryInner>,
}

impl ProxyInstance {
    pub(crate) fn new(
        descriptor: Arc<InterfaceDescriptor>,
        handle: HostHandle,
        registry: Arc<RegistryInner>,
        cache_members: bool,
    ) -> Self {
        Self {
            descriptor,
            id: handle.id(),
            handle: RwLock::new(Some(handle)),
            state: AtomicU8::new(CONSTRUCTED),
            members: RwLock::new(HashMap::new()),
            cache_members,
            registry,
        }
    }

    pub fn descriptor(&self) -> &Arc<InterfaceDescriptor> {
        &self.descriptor
    }

    pub fn interface_name(&self) -> &str {
        self.descriptor.name()
    }

    /// Identity of the bound host object.
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn state(&self) -> ProxyState {
        ProxyState::from_raw(self.state.load(Ordering::SeqCst))
    }

    pub fn is_released(&self) -> bool {
        self.state() == ProxyState::Released
    }

    /// Number of memoized member resolutions, including negative ones.
    pub fn cached_members(&self) -> usize {
        self.members.read().len()
    }

    /// Read a property through its host getter.
    pub fn get(&self, property: &str) -> Result<NativeValue> {
        let accessor = getter_name(property);
        let handle = self.live_handle(&accessor)?;
        let declared = self
            .descriptor
            .property(property)
            .ok_or_else(|| self.binding_error(&accessor, BindingCause::Undeclared))?;
        self.dispatch(&handle, Member::Getter(declared), Vec::new())
    }

    /// Write a property through its host setter.
    pub fn set(&self, property: &str, value: NativeValue) -> Result<()> {
        let accessor = setter_name(property);
        let handle = self.live_handle(&accessor)?;
        let declared = self
            .descriptor
            .property(property)
            .ok_or_else(|| self.binding_error(&accessor, BindingCause::Undeclared))?;
        if !declared.has_setter {
            return Err(self.binding_error(&accessor, BindingCause::ReadOnly));
        }
        self.dispatch(&handle, Member::Setter(declared), vec![value])?;
        Ok(())
    }

    /// Call a method and wait for its result.
    ///
    /// Asynchronous methods are started and then waited on.
    pub fn call(&self, method: &str, args: Vec<NativeValue>) -> Result<NativeValue> {
        let handle = self.live_handle(method)?;
        let declared = self
            .descriptor
            .method(method)
            .ok_or_else(|| self.binding_error(method, BindingCause::Undeclared))?;
        if declared.is_async {
            return self.start_async(&handle, declared, args)?.wait();
        }
        self.dispatch(&handle, Member::Method(declared), args)
    }

    /// Start a method call without waiting for its result.
    ///
    /// Synchronous methods run to completion and return a ready call.
    pub fn call_async(&self, method: &str, args: Vec<NativeValue>) -> Result<PendingCall> {
        let handle = self.live_handle(method)?;
        let declared = self
            .descriptor
            .method(method)
            .ok_or_else(|| self.binding_error(method, BindingCause::Undeclared))?;
        if declared.is_async {
            return self.start_async(&handle, declared, args);
        }
        let result = self.dispatch(&handle, Member::Method(declared), args);
        Ok(PendingCall::ready(self.interface_name(), method, result))
    }

    /// Read a property and convert it to a Rust type.
    pub fn get_as<T: FromNative>(&self, property: &str) -> Result<T> {
        let value = self.get(property)?;
        T::from_native(value).map_err(|e| self.binding_error(&getter_name(property), e))
    }

    /// Call a method and convert its result to a Rust type.
    pub fn call_as<T: FromNative>(&self, method: &str, args: Vec<NativeValue>) -> Result<T> {
        let value = self.call(method, args)?;
        T::from_native(value).map_err(|e| self.binding_error(method, e))
    }

    /// Bytes the host object holds outside the native heap.
    ///
    /// Zero when the host reports nothing or the proxy is released.
    pub fn external_memory_size(&self) -> usize {
        let Some(handle) = self.handle.read().clone() else {
            return 0;
        };
        let object = Arc::clone(handle.object());
        run_blocking(handle.context().as_ref(), move || object.memory_size())
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    /// Drop the host handle and move to `Released`.
    ///
    /// A second release fails with [`BridgeError::AlreadyReleased`].
    pub fn release(&self) -> Result<()> {
        if self.state.swap(RELEASED, Ordering::SeqCst) == RELEASED {
            return Err(BridgeError::AlreadyReleased {
                interface: self.interface_name().to_string(),
                handle: self.id,
            });
        }

        let handle = self.handle.write().take();
        self.members.write().clear();
        self.registry.forget(self.id, self);
        debug!(interface = self.interface_name(), handle = %self.id, "proxy released");

        if let Some(handle) = handle {
            drop_on_context(handle);
        }
        Ok(())
    }

    fn live_handle(&self, member: &str) -> Result<HostHandle> {
        let handle = self.handle.read().clone();
        match handle {
            Some(handle) => {
                // only the first call moves the state; a failed exchange is expected afterwards
                let _ = self
                    .state
                    .compare_exchange(CONSTRUCTED, ACTIVE, Ordering::SeqCst, Ordering::SeqCst);
                Ok(handle)
            }
            None => Err(BridgeError::UseAfterRelease {
                interface: self.interface_name().to_string(),
                member: member.to_string(),
            }),
        }
    }

    fn dispatch(&self, handle: &HostHandle, member: Member<'_>, args: Vec<NativeValue>) -> Result<NativeValue> {
        let accessor = member.accessor_name();
        let method = self.resolve(handle, &accessor, &member.signature())?;
        let marshaler = self.marshaler(handle);
        let host_args = self.marshal_args(&marshaler, &accessor, &member.params(), &args)?;
        let result = self.invoke(handle, &accessor, method, host_args)?;
        marshaler
            .to_native(member.returns(), &result)
            .map_err(|e| self.binding_error(&accessor, e))
    }

    fn start_async(
        &self,
        handle: &HostHandle,
        method: &MethodDescriptor,
        args: Vec<NativeValue>,
    ) -> Result<PendingCall> {
        let member = Member::Method(method);
        let accessor = method.name.clone();
        let resolved = self.resolve(handle, &accessor, &member.signature())?;
        let marshaler = self.marshaler(handle);
        let mut host_args = self.marshal_args(&marshaler, &accessor, &member.params(), &args)?;

        let (tx, pending) = PendingCall::channel(self.interface_name(), &accessor);
        let interface = self.interface_name().to_string();
        let name = accessor.clone();
        let returns = method.returns.clone();
        let completion = HostFunction::new(format!("{}.{}#complete", interface, accessor), move |args| {
            // (result) resolves the call, (null, message) rejects it
            let mut args = args.into_iter();
            let value = args.next().unwrap_or(HostValue::Null);
            let result = match args.next() {
                Some(HostValue::String(message)) => Err(BridgeError::binding(
                    &interface,
                    &name,
                    HostError::new(message.to_string()),
                )),
                _ => marshaler
                    .to_native(&returns, &value)
                    .map_err(|e| BridgeError::binding(&interface, &name, e)),
            };
            if tx.try_send(result).is_err() {
                warn!(interface = %interface, member = %name, "async completion not delivered");
            }
            Ok(HostValue::Null)
        });
        host_args.push(HostValue::Callable(completion));

        self.invoke(handle, &accessor, resolved, host_args)?;
        Ok(pending)
    }

    fn resolve(&self, handle: &HostHandle, accessor: &str, signature: &str) -> Result<MethodHandle> {
        let key = (accessor.to_string(), signature.to_string());
        if self.cache_members
            && let Some(cached) = self.members.read().get(&key)
        {
            trace!(interface = self.interface_name(), member = accessor, "member cache hit");
            return cached.clone().ok_or_else(|| self.not_implemented(accessor));
        }

        trace!(interface = self.interface_name(), member = accessor, signature, "resolving member");
        let object = Arc::clone(handle.object());
        let (name, sig) = key.clone();
        let found = run_blocking(handle.context().as_ref(), move || object.resolve(&name, &sig))
            .map_err(|e| self.binding_error(accessor, e))?;

        let found = if self.cache_members && !self.is_released() {
            // a concurrent first resolution may have won; keep its result
            self.members.write().entry(key).or_insert(found).clone()
        } else {
            found
        };
        found.ok_or_else(|| self.not_implemented(accessor))
    }

    fn marshal_args(
        &self,
        marshaler: &Marshaler,
        accessor: &str,
        params: &[&ValueKind],
        args: &[NativeValue],
    ) -> Result<Vec<HostValue>> {
        if params.len() != args.len() {
            let cause = BindingCause::Arity {
                expected: params.len(),
                got: args.len(),
            };
            return Err(self.binding_error(accessor, cause));
        }
        params
            .iter()
            .zip(args)
            .map(|(kind, arg)| marshaler.to_host(kind, arg))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| self.binding_error(accessor, e))
    }

    fn invoke(
        &self,
        handle: &HostHandle,
        accessor: &str,
        method: MethodHandle,
        args: Vec<HostValue>,
    ) -> Result<HostValue> {
        let object = Arc::clone(handle.object());
        match run_blocking(handle.context().as_ref(), move || object.invoke(&method, args)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(host)) => {
                error!(interface = self.interface_name(), member = accessor, error = %host, "host member failed");
                Err(self.binding_error(accessor, host))
            }
            Err(context) => {
                error!(interface = self.interface_name(), member = accessor, error = %context, "host context failed");
                Err(self.binding_error(accessor, context))
            }
        }
    }

    fn marshaler(&self, handle: &HostHandle) -> Marshaler {
        Marshaler::new(self.registry.clone(), Arc::clone(handle.context()))
    }

    fn not_implemented(&self, accessor: &str) -> BridgeError {
        BridgeError::NotImplemented {
            interface: self.interface_name().to_string(),
            member: accessor.to_string(),
        }
    }

    fn binding_error(&self, accessor: &str, cause: impl Into<BindingCause>) -> BridgeError {
        BridgeError::binding(self.interface_name(), accessor, cause)
    }
}

/// Drop a host handle on the context that owns its object.
fn drop_on_context(handle: HostHandle) {
    let context = Arc::clone(handle.context());
    if context.is_current() {
        drop(handle);
        return;
    }
    // if the context is gone the job, and the handle in it, is dropped here
    let _ = context.dispatch(Box::new(move || drop(handle)));
}

impl Drop for ProxyInstance {
    fn drop(&mut self) {
        self.registry.forget(self.id, self);
        if let Some(handle) = self.handle.get_mut().take() {
            drop_on_context(handle);
        }
    }
}

impl NativeObject for ProxyInstance {
    fn interface_name(&self) -> &str {
        self.descriptor.name()
    }

    fn host_handle(&self) -> std::result::Result<HostHandle, MarshalError> {
        self.handle
            .read()
            .clone()
            .ok_or_else(|| MarshalError::UseAfterRelease {
                interface: self.interface_name().to_string(),
            })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("interface", &self.interface_name())
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
