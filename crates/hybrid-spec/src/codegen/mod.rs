//! Spec-source generation.
//!
//! Turns an [`InterfaceDescriptor`] into the platform-facing source files a
//! native implementation builds against: a C++ abstract class with its member
//! registration table, a Swift protocol, or a Kotlin abstract class.
//!
//! # Module Organization
//!
//! - [`cpp`]: shared C++ spec (header, registration body, record/enum headers)
//! - [`swift`]: Swift protocol
//! - [`kotlin`]: Kotlin abstract class
//!
//! # Example
//!
//! ```
//! use hybrid_spec::codegen::{generate, Language};
//! use hybrid_spec::{InterfaceDescriptor, ValueKind};
//!
//! let iface = InterfaceDescriptor::builder("Counter")
//!     .property("count", ValueKind::Int)
//!     .build()?;
//! let files = generate(&iface, Language::Cpp);
//! assert_eq!(files[0].name, "HybridCounterSpec.hpp");
//! # Ok::<(), hybrid_spec::SpecError>(())
//! ```

pub mod cpp;
pub mod kotlin;
pub mod swift;

use std::collections::BTreeMap;
use std::fmt;

use crate::descriptor::InterfaceDescriptor;
use crate::kind::{EnumDescriptor, RecordDescriptor, ValueKind};

/// Target language of a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Cpp,
    Swift,
    Kotlin,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpp => "c++",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
        };
        write!(f, "{}", name)
    }
}

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub language: Language,
    pub content: String,
}

/// Generate all spec files of `descriptor` for `language`.
pub fn generate(descriptor: &InterfaceDescriptor, language: Language) -> Vec<GeneratedFile> {
    match language {
        Language::Cpp => cpp::generate(descriptor),
        Language::Swift => swift::generate(descriptor),
        Language::Kotlin => kotlin::generate(descriptor),
    }
}

/// Name of the generated spec type for an interface (`Image` -> `HybridImageSpec`).
pub fn spec_type_name(interface: &str) -> String {
    format!("Hybrid{}Spec", interface)
}

/// Banner placed at the top of every generated file.
pub(crate) fn banner(file_name: &str) -> String {
    format!(
        "///\n/// {}\n/// This file was generated by hybrid-spec. DO NOT MODIFY THIS FILE.\n///\n",
        file_name
    )
}

/// Join lines, indenting every line after the first.
pub(crate) fn join_indented(lines: &[String], indentation: &str) -> String {
    lines.join(&format!("\n{}", indentation))
}

/// Records and enums used anywhere in the interface, keyed (and deduplicated) by name.
pub(crate) struct NamedTypes<'a> {
    pub records: BTreeMap<&'a str, &'a RecordDescriptor>,
    pub enums: BTreeMap<&'a str, &'a EnumDescriptor>,
}

pub(crate) fn named_types(descriptor: &InterfaceDescriptor) -> NamedTypes<'_> {
    let mut records = BTreeMap::new();
    let mut enums = BTreeMap::new();
    for kind in descriptor.all_kinds() {
        kind.walk(&mut |k| match k {
            ValueKind::Record(r) => {
                records.entry(r.name.as_str()).or_insert(r);
            }
            ValueKind::Enum(e) => {
                enums.entry(e.name.as_str()).or_insert(e);
            }
            _ => {}
        });
    }
    NamedTypes { records, enums }
}
