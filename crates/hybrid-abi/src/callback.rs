//! Callbacks that can cross the bridge in either direction.
//!
//! A host function passed to native code becomes a [`NativeCallback`]
//! that marshals its arguments to the host and runs on the host context.
//! A native callback passed to the host becomes a [`NativeCallable`]
//! that marshals host arguments back. Either kind round-trips to the
//! original object rather than being wrapped twice.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hybrid_spec::MethodDescriptor;

use crate::Marshaler;
use crate::context::run_blocking;
use crate::error::{CallbackError, HostError};
use crate::host::{HostCallable, HostCallableRef, HostValue};
use crate::logging::debug;
use crate::value::NativeValue;

type NativeFn = dyn Fn(Vec<NativeValue>) -> Result<NativeValue, CallbackError> + Send + Sync;

enum CallbackTarget {
    Host {
        callable: HostCallableRef,
        marshaler: Marshaler,
    },
    Native(Box<NativeFn>),
}

/// A callable value on the native side.
///
/// Cloning shares the target; equality is identity of the target.
#[derive(Clone)]
pub struct NativeCallback {
    signature: Arc<MethodDescriptor>,
    target: Arc<CallbackTarget>,
}

impl NativeCallback {
    /// A callback implemented in Rust.
    pub fn from_fn<F>(signature: MethodDescriptor, func: F) -> Self
    where
        F: Fn(Vec<NativeValue>) -> Result<NativeValue, CallbackError> + Send + Sync + 'static,
    {
        Self {
            signature: Arc::new(signature),
            target: Arc::new(CallbackTarget::Native(Box::new(func))),
        }
    }

    pub(crate) fn from_host(signature: MethodDescriptor, callable: HostCallableRef, marshaler: Marshaler) -> Self {
        Self {
            signature: Arc::new(signature),
            target: Arc::new(CallbackTarget::Host { callable, marshaler }),
        }
    }

    pub fn signature(&self) -> &MethodDescriptor {
        &self.signature
    }

    /// Whether this callback is implemented by the host.
    pub fn is_host(&self) -> bool {
        matches!(*self.target, CallbackTarget::Host { .. })
    }

    pub fn host_callable(&self) -> Option<&HostCallableRef> {
        match &*self.target {
            CallbackTarget::Host { callable, .. } => Some(callable),
            CallbackTarget::Native(_) => None,
        }
    }

    pub fn ptr_eq(&self, other: &NativeCallback) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }

    /// Call the callback.
    ///
    /// Host callbacks run on their host context and block until it
    /// returns, so this may be called from any thread.
    pub fn invoke(&self, args: Vec<NativeValue>) -> Result<NativeValue, CallbackError> {
        if args.len() != self.signature.params.len() {
            return Err(CallbackError::Arity {
                expected: self.signature.params.len(),
                got: args.len(),
            });
        }

        match &*self.target {
            CallbackTarget::Native(func) => func(args),
            CallbackTarget::Host { callable, marshaler } => {
                let host_args = self
                    .signature
                    .params
                    .iter()
                    .zip(&args)
                    .map(|(param, arg)| marshaler.to_host(&param.kind, arg))
                    .collect::<Result<Vec<_>, _>>()?;

                debug!(callable = ?callable, context = marshaler.context().name(), "invoking host callback");
                let callable = Arc::clone(callable);
                let result = run_blocking(marshaler.context().as_ref(), move || callable.call(host_args))??;
                Ok(marshaler.to_native(&self.signature.returns, &result)?)
            }
        }
    }
}

impl fmt::Debug for NativeCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = if self.is_host() { "host" } else { "native" };
        write!(f, "NativeCallback(fn{}, {})", self.signature.signature(), side)
    }
}

/// A native callback exposed to the host as a host callable.
pub(crate) struct NativeCallable {
    callback: NativeCallback,
    marshaler: Marshaler,
}

impl NativeCallable {
    pub(crate) fn new(callback: NativeCallback, marshaler: Marshaler) -> Self {
        Self { callback, marshaler }
    }

    pub(crate) fn callback(&self) -> &NativeCallback {
        &self.callback
    }
}

impl HostCallable for NativeCallable {
    fn call(&self, args: Vec<HostValue>) -> Result<HostValue, HostError> {
        let signature = self.callback.signature();
        let to_host_error = |e: &dyn fmt::Display| HostError::with_class("NativeCallbackError", e.to_string());

        if args.len() != signature.params.len() {
            let err = CallbackError::Arity {
                expected: signature.params.len(),
                got: args.len(),
            };
            return Err(to_host_error(&err));
        }
        let native_args = signature
            .params
            .iter()
            .zip(&args)
            .map(|(param, arg)| self.marshaler.to_native(&param.kind, arg))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| to_host_error(&e))?;

        let result = self.callback.invoke(native_args).map_err(|e| match e {
            // a host error raised further down keeps its class
            CallbackError::Host(host) => host,
            other => to_host_error(&other),
        })?;
        self.marshaler
            .to_host(&signature.returns, &result)
            .map_err(|e| to_host_error(&e))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for NativeCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeCallable({:?})", self.callback)
    }
}
