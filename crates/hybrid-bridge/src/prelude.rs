//! Convenient re-exports for embedders.
//!
//! ```ignore
//! use hybrid_bridge::prelude::*;
//! ```

pub use crate::capability::{HasLifecycle, HasMethods, HasProperties, TypedProxy};
pub use crate::config::BridgeConfig;
pub use crate::error::{BindingCause, BridgeError, Result};
pub use crate::pending::PendingCall;
pub use crate::proxy::{ProxyInstance, ProxyState};
pub use crate::registry::Registry;

pub use hybrid_abi::{
    DynamicObject, FromNative, HostError, HostHandle, HostObject, HostValue, IntoNative,
    NativeCallback, NativeRecord, NativeValue, SharedBuffer,
};
pub use hybrid_spec::{InterfaceDescriptor, MethodDescriptor, ValueKind};
