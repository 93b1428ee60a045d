//! Value kinds: the shape of every value that can cross the bridge.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::MethodDescriptor;
use crate::error::{Result, SpecError};

/// Tagged description of a marshalable value's shape.
///
/// Kinds nest: records contain fields of any kind, optionals and arrays wrap
/// an inner kind, and callbacks carry a full method signature. References to
/// other bridged interfaces are kept by name only and resolved lazily, which
/// lets an interface mention itself without building an infinite structure.
///
/// # Example
///
/// ```
/// use hybrid_spec::{RecordDescriptor, ValueKind};
///
/// let size = ValueKind::Record(
///     RecordDescriptor::new("ImageSize")
///         .field("width", ValueKind::Int)
///         .field("height", ValueKind::Int),
/// );
/// assert_eq!(size.to_string(), "ImageSize");
/// assert_eq!(ValueKind::optional(ValueKind::String).to_string(), "string?");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValueKind {
    Void,
    Int,
    Double,
    Bool,
    String,
    Buffer,
    Enum(EnumDescriptor),
    Optional { of: Box<ValueKind> },
    Array { of: Box<ValueKind> },
    /// Dictionary with string keys and values of one kind.
    Map { of: Box<ValueKind> },
    Record(RecordDescriptor),
    Callback(Box<MethodDescriptor>),
    InterfaceRef { name: String },
}

impl ValueKind {
    pub fn optional(inner: ValueKind) -> Self {
        Self::Optional { of: Box::new(inner) }
    }

    pub fn array(element: ValueKind) -> Self {
        Self::Array {
            of: Box::new(element),
        }
    }

    pub fn map(value: ValueKind) -> Self {
        Self::Map { of: Box::new(value) }
    }

    pub fn callback(signature: MethodDescriptor) -> Self {
        Self::Callback(Box::new(signature))
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::InterfaceRef { name: name.into() }
    }

    /// Returns true for `Optional` kinds, which may be absent on the host side.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional { .. })
    }

    /// Short lowercase tag of the kind, without nested detail.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Int => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Buffer => "buffer",
            Self::Enum(_) => "enum",
            Self::Optional { .. } => "optional",
            Self::Array { .. } => "array",
            Self::Map { .. } => "map",
            Self::Record(_) => "record",
            Self::Callback(_) => "callback",
            Self::InterfaceRef { .. } => "interface",
        }
    }

    /// Visit this kind and every kind nested inside it, depth first.
    ///
    /// Interface references are visited but not followed.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ValueKind)) {
        visit(self);
        match self {
            Self::Optional { of } | Self::Array { of } | Self::Map { of } => of.walk(visit),
            Self::Record(record) => {
                for field in &record.fields {
                    field.kind.walk(visit);
                }
            }
            Self::Callback(signature) => {
                for param in &signature.params {
                    param.kind.walk(visit);
                }
                signature.returns.walk(visit);
            }
            _ => {}
        }
    }

    /// Check enums and records nested in this kind.
    pub(crate) fn validate(&self) -> Result<()> {
        let mut outcome = Ok(());
        self.walk(&mut |kind| {
            if outcome.is_err() {
                return;
            }
            outcome = match kind {
                Self::Enum(e) => e.validate(),
                Self::Record(r) => r.validate(),
                _ => Ok(()),
            };
        });
        outcome
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(e) => write!(f, "{}", e.name),
            Self::Optional { of } => write!(f, "{}?", of),
            Self::Array { of } => write!(f, "{}[]", of),
            Self::Map { of } => write!(f, "map<string, {}>", of),
            Self::Record(r) => write!(f, "{}", r.name),
            Self::Callback(signature) => write!(f, "fn{}", signature.signature()),
            Self::InterfaceRef { name } => write!(f, "{}", name),
            other => write!(f, "{}", other.tag()),
        }
    }
}

/// How enum values travel on the host side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumRepr {
    /// The host carries the member's integer value.
    #[default]
    Numeric,
    /// The host carries the member's name as a string.
    Text,
}

/// One named member of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i32,
}

/// A closed set of named integer values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub members: Vec<EnumMember>,
    #[serde(default)]
    pub repr: EnumRepr,
}

impl EnumDescriptor {
    /// Enum whose host representation is the integer value.
    pub fn numeric<'a>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (&'a str, i32)>,
    ) -> Self {
        Self {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(name, value)| EnumMember {
                    name: name.to_string(),
                    value,
                })
                .collect(),
            repr: EnumRepr::Numeric,
        }
    }

    /// Enum whose host representation is the member name. Values are the
    /// declaration index.
    pub fn text<'a>(name: impl Into<String>, members: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            name: name.into(),
            members: members
                .into_iter()
                .zip(0..)
                .map(|(name, value)| EnumMember {
                    name: name.to_string(),
                    value,
                })
                .collect(),
            repr: EnumRepr::Text,
        }
    }

    pub fn by_value(&self, value: i32) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value == value)
    }

    pub fn by_name(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SpecError::EmptyName { what: "enum" });
        }
        if self.members.is_empty() {
            return Err(SpecError::InvalidEnum {
                name: self.name.clone(),
                reason: "enum has no members".to_string(),
            });
        }
        let mut names = HashSet::new();
        let mut values = HashSet::new();
        for member in &self.members {
            if !names.insert(member.name.as_str()) {
                return Err(SpecError::InvalidEnum {
                    name: self.name.clone(),
                    reason: format!("member '{}' declared twice", member.name),
                });
            }
            if !values.insert(member.value) {
                return Err(SpecError::InvalidEnum {
                    name: self.name.clone(),
                    reason: format!("value {} used twice", member.value),
                });
            }
        }
        Ok(())
    }
}

/// A named field of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ValueKind,
}

impl FieldDescriptor {
    /// Required fields must be present on the host side; optional ones may be missing.
    pub fn is_required(&self) -> bool {
        !self.kind.is_optional()
    }
}

/// A structured value with named, ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn field(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SpecError::EmptyName { what: "record" });
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(SpecError::EmptyName { what: "field" });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SpecError::DuplicateField {
                    record: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}
