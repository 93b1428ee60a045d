//! Error types for descriptor construction and loading.

use thiserror::Error;

/// Errors that can occur while building, validating or loading descriptors.
#[derive(Error, Debug)]
pub enum SpecError {
    /// An interface, member, record or enum was given an empty name.
    #[error("{what} name must not be empty")]
    EmptyName { what: &'static str },

    /// Two members of one interface share a name (or a host accessor name).
    #[error("Duplicate member '{member}' in interface '{interface}'")]
    DuplicateMember { interface: String, member: String },

    /// Two fields of one record share a name.
    #[error("Duplicate field '{field}' in record '{record}'")]
    DuplicateField { record: String, field: String },

    /// Enum without members, or with clashing member names/values.
    #[error("Invalid enum '{name}': {reason}")]
    InvalidEnum { name: String, reason: String },

    /// JSON descriptor could not be parsed.
    #[error("JSON descriptor error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML descriptor could not be parsed.
    #[error("TOML descriptor error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A [`Result`] type alias using [`SpecError`].
pub type Result<T> = std::result::Result<T, SpecError>;
