//! Host value model and marshaling for hybrid object bridges.
//!
//! This crate converts values between the host runtime's representation
//! ([`HostValue`]) and the native representation ([`NativeValue`]) as
//! directed by a [`ValueKind`] from `hybrid-spec`. Conversion is strict:
//! a value whose runtime type does not match the declared kind fails with
//! [`MarshalError::TypeMismatch`] and is never coerced.
//!
//! # Module Organization
//!
//! - [`host`]: host objects, handles, values and callables
//! - [`context`]: host execution contexts and thread confinement
//! - [`value`]: native values, records and the [`NativeObject`] trait
//! - [`callback`]: callbacks usable from either side
//! - [`buffer`]: shared byte buffers
//! - [`text`]: UTF-16 host strings
//! - [`convert`]: conversions between Rust types and native values
//! - `to_native` / `to_host`: the two marshaling directions
//!
//! # Objects
//!
//! Interface references are the one kind the marshaler cannot handle on
//! its own: turning a host object into a native object means finding or
//! creating its proxy. That decision is delegated to an [`ObjectBridge`],
//! implemented by the registry that owns the proxies.

pub mod buffer;
pub mod callback;
pub mod context;
pub mod convert;
pub mod error;
pub mod host;
mod logging;
pub mod text;
mod to_host;
mod to_native;
pub mod value;

pub use buffer::SharedBuffer;
pub use callback::NativeCallback;
pub use context::{ConfinedContext, HostContext, InlineContext, Job, run_blocking};
pub use convert::{FromNative, IntoNative};
pub use error::{CallbackError, ContextError, HostError, MarshalError};
pub use host::{
    DynamicObject, DynamicObjectBuilder, HandleId, HostCallable, HostCallableRef, HostFunction,
    HostHandle, HostObject, HostValue, MethodHandle,
};
pub use text::HostString;
pub use value::{NativeObject, NativeRecord, NativeValue, ObjectRef};

pub use hybrid_spec::ValueKind;

use std::sync::Arc;

/// Turns host objects into native objects for interface references.
pub trait ObjectBridge: Send + Sync + 'static {
    /// The live native object for `handle` as an instance of `interface`.
    ///
    /// Implementations return the existing proxy when one is alive so that
    /// one host object maps to one native object.
    fn wrap(&self, interface: &str, handle: &HostHandle) -> Result<ObjectRef, MarshalError>;
}

/// A bridge with no registered interfaces.
///
/// Every interface reference fails with [`MarshalError::UnknownInterface`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedBridge;

impl ObjectBridge for DetachedBridge {
    fn wrap(&self, interface: &str, _handle: &HostHandle) -> Result<ObjectRef, MarshalError> {
        Err(MarshalError::UnknownInterface(interface.to_string()))
    }
}

/// Converts values in both directions for one host context.
///
/// # Example
///
/// ```
/// use hybrid_abi::{HostValue, Marshaler, NativeValue, ValueKind};
///
/// let marshaler = Marshaler::detached();
/// let native = marshaler.to_native(&ValueKind::String, &HostValue::string("héllo"))?;
/// assert_eq!(native, NativeValue::String("héllo".to_string()));
///
/// let host = marshaler.to_host(&ValueKind::optional(ValueKind::Int), &NativeValue::none())?;
/// assert_eq!(host, HostValue::Null);
/// # Ok::<(), hybrid_abi::MarshalError>(())
/// ```
#[derive(Clone)]
pub struct Marshaler {
    pub(crate) bridge: Arc<dyn ObjectBridge>,
    pub(crate) context: Arc<dyn HostContext>,
}

impl Marshaler {
    pub fn new(bridge: Arc<dyn ObjectBridge>, context: Arc<dyn HostContext>) -> Self {
        Self { bridge, context }
    }

    /// A marshaler with no object bridge, running host callbacks inline.
    pub fn detached() -> Self {
        Self::new(Arc::new(DetachedBridge), Arc::new(InlineContext))
    }

    pub fn context(&self) -> &Arc<dyn HostContext> {
        &self.context
    }

    pub fn bridge(&self) -> &Arc<dyn ObjectBridge> {
        &self.bridge
    }
}

impl std::fmt::Debug for Marshaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marshaler")
            .field("context", &self.context.name())
            .finish_non_exhaustive()
    }
}
