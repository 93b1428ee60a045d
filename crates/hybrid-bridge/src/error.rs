//! Unified error type for the bridge.
//!
//! Every failure raised at the proxy boundary names the interface and the
//! member it happened on. [`BridgeError::NotImplemented`] is kept apart
//! from [`BridgeError::Binding`] so that a stubbed member can be told from
//! a genuine host failure.

use thiserror::Error;

use hybrid_abi::{ContextError, HandleId, HostError, MarshalError};
use hybrid_spec::SpecError;

use crate::config::ConfigError;

/// Why a binding failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingCause {
    /// An argument or the result could not be marshaled.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// The host member raised an error.
    #[error("host raised {0}")]
    Host(#[from] HostError),

    /// The call could not reach the object's host context.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Wrong number of arguments for the member.
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: usize, got: usize },

    /// The interface declares no such member.
    #[error("member is not declared by the interface")]
    Undeclared,

    /// The property has no setter.
    #[error("property is read-only")]
    ReadOnly,
}

/// Unified error type for all bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host object does not implement a declared member.
    #[error("{interface}.{member}(...) is not yet implemented!")]
    NotImplemented { interface: String, member: String },

    /// A call across the bridge failed.
    #[error("{interface}.{member} failed: {cause}")]
    Binding {
        interface: String,
        member: String,
        #[source]
        cause: BindingCause,
    },

    /// A member was used after the proxy was released.
    #[error("{interface}.{member} called on a released object")]
    UseAfterRelease { interface: String, member: String },

    /// An interface name was registered twice.
    #[error("Interface '{interface}' is already registered")]
    DuplicateRegistration { interface: String },

    /// `release` was called on an already released proxy.
    #[error("Object {handle} of interface '{interface}' was already released")]
    AlreadyReleased { interface: String, handle: HandleId },

    /// No interface of that name is registered.
    #[error("Interface '{0}' is not registered")]
    UnknownInterface(String),

    /// The interface was registered without a factory.
    #[error("Interface '{0}' has no factory and cannot be created")]
    NoFactory(String),

    /// The process-wide registry was installed twice.
    #[error("The global registry is already installed")]
    AlreadyInstalled,

    /// The process-wide registry is not installed.
    #[error("The global registry is not installed")]
    NotInstalled,

    /// Invalid interface descriptor.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Marshaling failure outside a member call.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// A host context could not be started or reached.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A [`Result`] type alias using [`BridgeError`].
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    pub(crate) fn binding(interface: &str, member: &str, cause: impl Into<BindingCause>) -> Self {
        Self::Binding {
            interface: interface.to_string(),
            member: member.to_string(),
            cause: cause.into(),
        }
    }

    /// Returns `true` if the host object does not implement the member.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }

    /// Returns `true` if a value did not match its declared kind.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Marshal(MarshalError::TypeMismatch { .. })
                | Self::Binding {
                    cause: BindingCause::Marshal(MarshalError::TypeMismatch { .. }),
                    ..
                }
        )
    }

    /// Returns `true` if a released object was used.
    pub fn is_use_after_release(&self) -> bool {
        matches!(
            self,
            Self::UseAfterRelease { .. }
                | Self::Marshal(MarshalError::UseAfterRelease { .. })
                | Self::Binding {
                    cause: BindingCause::Marshal(MarshalError::UseAfterRelease { .. }),
                    ..
                }
        )
    }

    /// Interface the failure happened on, when there is one.
    pub fn interface(&self) -> Option<&str> {
        match self {
            Self::NotImplemented { interface, .. }
            | Self::Binding { interface, .. }
            | Self::UseAfterRelease { interface, .. }
            | Self::DuplicateRegistration { interface }
            | Self::AlreadyReleased { interface, .. } => Some(interface),
            Self::UnknownInterface(name) | Self::NoFactory(name) => Some(name),
            _ => None,
        }
    }

    /// Member the failure happened on, when there is one.
    pub fn member(&self) -> Option<&str> {
        match self {
            Self::NotImplemented { member, .. }
            | Self::Binding { member, .. }
            | Self::UseAfterRelease { member, .. } => Some(member),
            _ => None,
        }
    }

    /// The binding cause, for [`BridgeError::Binding`].
    pub fn cause(&self) -> Option<&BindingCause> {
        match self {
            Self::Binding { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_implemented_message() {
        let err = BridgeError::NotImplemented {
            interface: "Image".to_string(),
            member: "toArrayBuffer".to_string(),
        };
        assert_eq!(err.to_string(), "Image.toArrayBuffer(...) is not yet implemented!");
        assert!(err.is_not_implemented());
        assert_eq!(err.interface(), Some("Image"));
        assert_eq!(err.member(), Some("toArrayBuffer"));
    }

    #[test]
    fn test_binding_predicates() {
        let mismatch = MarshalError::TypeMismatch {
            expected: "double".to_string(),
            got: "string".to_string(),
        };
        let err = BridgeError::binding("Image", "setSomeSettableProp", mismatch);
        assert!(err.is_type_mismatch());
        assert!(!err.is_not_implemented());
        assert_eq!(
            err.to_string(),
            "Image.setSomeSettableProp failed: Type mismatch: expected double, got string"
        );

        let host = BridgeError::binding("Image", "getSize", HostError::with_class("Error", "boom"));
        assert_eq!(host.to_string(), "Image.getSize failed: host raised Error: boom");
        assert!(std::error::Error::source(&host).is_some());
    }

    #[test]
    fn test_use_after_release_predicate() {
        let nested = BridgeError::binding(
            "Car",
            "setDriver",
            MarshalError::UseAfterRelease {
                interface: "Person".to_string(),
            },
        );
        assert!(nested.is_use_after_release());
        assert_eq!(BridgeError::NotInstalled.interface(), None);
    }
}
