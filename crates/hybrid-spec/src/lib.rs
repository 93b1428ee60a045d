//! Interface descriptor model for hybrid object bridges.
//!
//! A descriptor names an interface and lists its properties and methods
//! together with the [`ValueKind`] of every value that crosses the bridge.
//! Descriptors are plain data: the same descriptor drives marshaling at
//! runtime and spec-source generation for every target language.
//!
//! # Module Organization
//!
//! - [`kind`]: value kinds, enums and records
//! - [`descriptor`]: interface, property and method descriptors
//! - [`codegen`]: C++, Swift and Kotlin spec-source generation
//! - [`error`]: error types
//!
//! # Example
//!
//! ```
//! use hybrid_spec::{InterfaceDescriptor, MethodDescriptor, RecordDescriptor, ValueKind};
//!
//! let size = RecordDescriptor::new("ImageSize")
//!     .field("width", ValueKind::Int)
//!     .field("height", ValueKind::Int);
//!
//! let image = InterfaceDescriptor::builder("Image")
//!     .readonly("size", ValueKind::Record(size))
//!     .method(
//!         MethodDescriptor::new("saveToFile")
//!             .param("path", ValueKind::String)
//!             .param(
//!                 "onFinished",
//!                 ValueKind::callback(MethodDescriptor::callback().param("path", ValueKind::String)),
//!             ),
//!     )
//!     .build()?;
//!
//! assert_eq!(image.member("getSize").map(|m| m.signature()), Some("() -> ImageSize".to_string()));
//! # Ok::<(), hybrid_spec::SpecError>(())
//! ```

pub mod codegen;
pub mod descriptor;
pub mod error;
pub mod kind;

pub use descriptor::{
    InterfaceBuilder, InterfaceDescriptor, Member, MethodDescriptor, ParamDescriptor,
    PropertyDescriptor, capitalize, getter_name, setter_name,
};
pub use error::{Result, SpecError};
pub use kind::{EnumDescriptor, EnumMember, EnumRepr, FieldDescriptor, RecordDescriptor, ValueKind};
