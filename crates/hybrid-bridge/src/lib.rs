//! Proxy objects and lifecycle management for cross-language object bridges.
//!
//! hybrid-bridge binds objects living in a host runtime to native proxies
//! described by an [`InterfaceDescriptor`]. A proxy forwards property
//! reads, property writes and method calls to its host object, marshaling
//! values through `hybrid-abi`. Members the host object does not implement
//! are reported when they are called, as [`BridgeError::NotImplemented`],
//! and never at bind time.
//!
//! # Module Organization
//!
//! - [`registry`]: interface registration, identity map and the process-wide registry
//! - [`proxy`]: the dynamic proxy and its lifecycle
//! - [`capability`]: capability traits and typed wrappers
//! - [`pending`]: results of asynchronous member calls
//! - [`config`]: TOML configuration
//! - [`error`]: unified error types
//! - [`subscriber`]: tracing subscriber setup (requires `subscriber` feature)
//! - [`prelude`]: convenient re-exports
//! - `logging`: conditional logging macros (internal)
//!
//! # Features
//!
//! - `logging`: emit `tracing` events from the bridge and the marshaler
//! - `subscriber`: [`subscriber::init_logging`] for embedders without their own subscriber
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hybrid_bridge::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let image = InterfaceDescriptor::builder("Image")
//!     .readonly("width", ValueKind::Int)
//!     .method(MethodDescriptor::new("toArrayBuffer").returns(ValueKind::Buffer))
//!     .build()?;
//!
//! let registry = Registry::new();
//! registry.register(image, || {
//!     let object = DynamicObject::builder("NativeImage")
//!         .method("getWidth", |_| Ok(HostValue::Int(640)))
//!         .build();
//!     Ok(object as Arc<dyn HostObject>)
//! })?;
//!
//! let proxy = registry.create("Image")?;
//! assert_eq!(proxy.get_as::<i64>("width")?, 640);
//!
//! let err = proxy.call("toArrayBuffer", vec![]).unwrap_err();
//! assert_eq!(err.to_string(), "Image.toArrayBuffer(...) is not yet implemented!");
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod config;
pub mod error;
#[macro_use]
pub(crate) mod logging;
pub mod pending;
pub mod prelude;
pub mod proxy;
pub mod registry;
#[cfg(feature = "subscriber")]
pub mod subscriber;

pub use capability::{HasLifecycle, HasMethods, HasProperties, TypedProxy};
pub use config::{BridgeConfig, ConfigError, ContextConfig, ContextMode, LogFormat, LoggingConfig, ProxyConfig};
pub use error::{BindingCause, BridgeError, Result};
pub use pending::PendingCall;
pub use proxy::{ProxyInstance, ProxyState};
pub use registry::{Factory, Registry, RegistryBuilder, global, install, install_registry, teardown};

#[cfg(feature = "subscriber")]
pub use subscriber::{LoggingError, init_logging};

pub use hybrid_abi::{HandleId, HostHandle, Marshaler, NativeValue};
pub use hybrid_spec::{InterfaceDescriptor, ValueKind};
