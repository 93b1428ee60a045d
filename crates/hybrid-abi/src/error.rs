//! Error types for marshaling, host code and host execution contexts.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while converting values across the bridge.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarshalError {
    /// The value's runtime type does not match the declared kind.
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    /// Text could not be converted between host and native encodings.
    #[error("Encoding error: {reason}")]
    Encoding { reason: String },

    /// A required record field is absent on the source side.
    #[error("Missing field '{field}' in record '{record}'")]
    MissingField { record: String, field: String },

    /// An interface reference names an interface nobody registered.
    #[error("Interface '{0}' is not registered")]
    UnknownInterface(String),

    /// A released object was passed across the bridge.
    #[error("Object of interface '{interface}' was already released")]
    UseAfterRelease { interface: String },

    /// The object bridge refused to wrap a host object.
    #[error("Cannot wrap host object as '{interface}': {reason}")]
    Wrap { interface: String, reason: String },
}

impl MarshalError {
    pub(crate) fn mismatch(expected: impl fmt::Display, got: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

/// A failure raised by host code (an exception on the host side).
///
/// Only the class and message survive the crossing, the same information
/// a host runtime without cross-language exception support can propagate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render_host_error(.class, .message))]
pub struct HostError {
    pub class: Option<String>,
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            class: None,
            message: message.into(),
        }
    }

    pub fn with_class(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            message: message.into(),
        }
    }
}

fn render_host_error(class: &Option<String>, message: &str) -> String {
    match class {
        Some(class) => format!("{}: {}", class, message),
        None => message.to_string(),
    }
}

/// Errors from routing work onto a host execution context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The context was shut down or its thread is gone.
    #[error("Host context '{context}' is unavailable")]
    Unavailable { context: String },

    /// Host code panicked while running on the context.
    #[error("Host code panicked on context '{context}': {message}")]
    Panicked { context: String, message: String },

    /// The context's thread could not be started.
    #[error("Failed to start host context '{context}': {reason}")]
    Spawn { context: String, reason: String },
}

/// Errors from invoking a callback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallbackError {
    /// Wrong number of arguments for the callback's signature.
    #[error("Callback expects {expected} argument(s), got {got}")]
    Arity { expected: usize, got: usize },

    /// An argument or the result could not be marshaled.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// The host callable raised an error.
    #[error("Host callback failed: {0}")]
    Host(#[from] HostError),

    /// The callback could not be routed to its host context.
    #[error(transparent)]
    Context(#[from] ContextError),
}
