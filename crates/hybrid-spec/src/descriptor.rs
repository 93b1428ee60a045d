//! Interface, property and method descriptors.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpecError};
use crate::kind::ValueKind;

static VOID: ValueKind = ValueKind::Void;

/// Upper-case the first character of a member name (`size` -> `Size`).
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Host-side getter name for a property (`size` -> `getSize`).
pub fn getter_name(property: &str) -> String {
    format!("get{}", capitalize(property))
}

/// Host-side setter name for a property (`size` -> `setSize`).
pub fn setter_name(property: &str) -> String {
    format!("set{}", capitalize(property))
}

/// A named property exposed by an interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    #[serde(default)]
    pub has_setter: bool,
}

/// A named method parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ValueKind,
}

fn void_kind() -> ValueKind {
    ValueKind::Void
}

/// A method signature: ordered parameters, a return kind, and whether the
/// result is delivered asynchronously.
///
/// Callback kinds reuse this type for their signature; their name is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
    #[serde(default = "void_kind")]
    pub returns: ValueKind,
    #[serde(default)]
    pub is_async: bool,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: ValueKind::Void,
            is_async: false,
        }
    }

    /// Anonymous signature used by callback kinds.
    pub fn callback() -> Self {
        Self::new("")
    }

    pub fn param(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.params.push(ParamDescriptor {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn returns(mut self, kind: ValueKind) -> Self {
        self.returns = kind;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Canonical signature text, e.g. `(string, fn(string) -> void) -> void`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.kind.to_string()).collect();
        let prefix = if self.is_async { "async " } else { "" };
        format!("{}({}) -> {}", prefix, params.join(", "), self.returns)
    }
}

/// One callable entry of an interface as seen from the host: a property
/// getter, a property setter or a method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Member<'a> {
    Getter(&'a PropertyDescriptor),
    Setter(&'a PropertyDescriptor),
    Method(&'a MethodDescriptor),
}

impl<'a> Member<'a> {
    /// Name the host object exposes for this member (`getSize`, `toArrayBuffer`).
    pub fn accessor_name(&self) -> String {
        match self {
            Self::Getter(p) => getter_name(&p.name),
            Self::Setter(p) => setter_name(&p.name),
            Self::Method(m) => m.name.clone(),
        }
    }

    /// Name as declared in the interface (`size`, `toArrayBuffer`).
    pub fn declared_name(&self) -> &'a str {
        match *self {
            Self::Getter(p) | Self::Setter(p) => &p.name,
            Self::Method(m) => &m.name,
        }
    }

    pub fn params(&self) -> Vec<&'a ValueKind> {
        match *self {
            Self::Getter(_) => Vec::new(),
            Self::Setter(p) => vec![&p.kind],
            Self::Method(m) => m.params.iter().map(|p| &p.kind).collect(),
        }
    }

    pub fn returns(&self) -> &'a ValueKind {
        match *self {
            Self::Getter(p) => &p.kind,
            Self::Setter(_) => &VOID,
            Self::Method(m) => &m.returns,
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Method(m) if m.is_async)
    }

    /// Canonical signature text; with the accessor name it identifies the
    /// host member unambiguously.
    pub fn signature(&self) -> String {
        match self {
            Self::Method(m) => m.signature(),
            _ => {
                let params: Vec<String> = self.params().iter().map(|k| k.to_string()).collect();
                format!("({}) -> {}", params.join(", "), self.returns())
            }
        }
    }
}

/// Language-agnostic description of a bridged interface.
///
/// Descriptors are immutable once built and are shared read-only by every
/// proxy of the interface.
///
/// # Example
///
/// ```
/// use hybrid_spec::{EnumDescriptor, InterfaceDescriptor, MethodDescriptor, ValueKind};
///
/// let image = InterfaceDescriptor::builder("Image")
///     .readonly("width", ValueKind::Int)
///     .property("someSettableProp", ValueKind::Double)
///     .method(
///         MethodDescriptor::new("toArrayBuffer")
///             .param("format", ValueKind::Enum(EnumDescriptor::numeric("ImageFormat", [("PNG", 0)])))
///             .returns(ValueKind::Buffer),
///     )
///     .build()?;
///
/// assert_eq!(image.members().len(), 4);
/// assert!(image.member("getWidth").is_some());
/// assert!(image.member("setWidth").is_none());
/// # Ok::<(), hybrid_spec::SpecError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    name: String,
    #[serde(default)]
    properties: Vec<PropertyDescriptor>,
    #[serde(default)]
    methods: Vec<MethodDescriptor>,
}

impl InterfaceDescriptor {
    pub fn builder(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder::new(name)
    }

    /// Parse and validate a descriptor from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let descriptor: Self = serde_json::from_str(text)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Parse and validate a descriptor from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let descriptor: Self = toml::from_str(text)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// All host-visible members: getters and setters in property order, then methods.
    pub fn members(&self) -> Vec<Member<'_>> {
        let mut members = Vec::with_capacity(self.properties.len() * 2 + self.methods.len());
        for property in &self.properties {
            members.push(Member::Getter(property));
            if property.has_setter {
                members.push(Member::Setter(property));
            }
        }
        members.extend(self.methods.iter().map(Member::Method));
        members
    }

    /// Find a member by its host accessor name.
    pub fn member(&self, accessor: &str) -> Option<Member<'_>> {
        self.members()
            .into_iter()
            .find(|m| m.accessor_name() == accessor)
    }

    /// Names of other interfaces referenced anywhere in this one.
    pub fn referenced_interfaces(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        for kind in self.all_kinds() {
            kind.walk(&mut |k| {
                if let ValueKind::InterfaceRef { name } = k {
                    names.insert(name.as_str());
                }
            });
        }
        names
    }

    /// Top-level kinds of every property, parameter and return value.
    pub fn all_kinds(&self) -> Vec<&ValueKind> {
        let mut kinds: Vec<&ValueKind> = self.properties.iter().map(|p| &p.kind).collect();
        for method in &self.methods {
            kinds.extend(method.params.iter().map(|p| &p.kind));
            kinds.push(&method.returns);
        }
        kinds
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SpecError::EmptyName { what: "interface" });
        }

        let mut declared = HashSet::new();
        for name in self
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.methods.iter().map(|m| m.name.as_str()))
        {
            if name.is_empty() {
                return Err(SpecError::EmptyName { what: "member" });
            }
            if !declared.insert(name) {
                return Err(self.duplicate(name));
            }
        }

        let mut accessors = HashSet::new();
        for member in self.members() {
            let accessor = member.accessor_name();
            if !accessors.insert(accessor.clone()) {
                return Err(self.duplicate(&accessor));
            }
        }

        for kind in self.all_kinds() {
            kind.validate()?;
        }
        Ok(())
    }

    fn duplicate(&self, member: &str) -> SpecError {
        SpecError::DuplicateMember {
            interface: self.name.clone(),
            member: member.to_string(),
        }
    }
}

/// Builder for [`InterfaceDescriptor`].
#[derive(Debug, Clone)]
pub struct InterfaceBuilder {
    descriptor: InterfaceDescriptor,
}

impl InterfaceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: InterfaceDescriptor {
                name: name.into(),
                properties: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    /// Add a property with a getter and a setter.
    pub fn property(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.push_property(name.into(), kind, true)
    }

    /// Add a getter-only property.
    pub fn readonly(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.push_property(name.into(), kind, false)
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.descriptor.methods.push(method);
        self
    }

    /// Validate and finish the descriptor.
    pub fn build(self) -> Result<InterfaceDescriptor> {
        self.descriptor.validate()?;
        Ok(self.descriptor)
    }

    fn push_property(mut self, name: String, kind: ValueKind, has_setter: bool) -> Self {
        self.descriptor.properties.push(PropertyDescriptor {
            name,
            kind,
            has_setter,
        });
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kind::RecordDescriptor;

    #[test]
    fn test_accessor_names() {
        assert_eq!(getter_name("size"), "getSize");
        assert_eq!(setter_name("someSettableProp"), "setSomeSettableProp");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_member_order_and_signatures() {
        let car = InterfaceDescriptor::builder("Car")
            .property("power", ValueKind::Double)
            .readonly("make", ValueKind::String)
            .method(
                MethodDescriptor::new("drive")
                    .param("distance", ValueKind::Double)
                    .returns(ValueKind::Bool),
            )
            .build()
            .unwrap();

        let names: Vec<String> = car.members().iter().map(|m| m.accessor_name()).collect();
        assert_eq!(names, vec!["getPower", "setPower", "getMake", "drive"]);

        let setter = car.member("setPower").unwrap();
        assert_eq!(setter.signature(), "(double) -> void");
        assert_eq!(setter.declared_name(), "power");
        assert_eq!(car.member("drive").unwrap().signature(), "(double) -> bool");
    }

    #[test]
    fn test_async_signature() {
        let m = MethodDescriptor::new("load")
            .param("path", ValueKind::String)
            .returns(ValueKind::Buffer)
            .asynchronous();
        assert_eq!(m.signature(), "async (string) -> buffer");
        assert!(Member::Method(&m).is_async());
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let err = InterfaceDescriptor::builder("Image")
            .readonly("size", ValueKind::Int)
            .method(MethodDescriptor::new("size"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::DuplicateMember { ref member, .. } if member == "size"));
    }

    #[test]
    fn test_accessor_collision_rejected() {
        let err = InterfaceDescriptor::builder("Image")
            .readonly("size", ValueKind::Int)
            .method(MethodDescriptor::new("getSize").returns(ValueKind::Int))
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::DuplicateMember { ref member, .. } if member == "getSize"));
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(matches!(
            InterfaceDescriptor::builder("").build(),
            Err(SpecError::EmptyName { what: "interface" })
        ));
        assert!(matches!(
            InterfaceDescriptor::builder("X")
                .method(MethodDescriptor::new(""))
                .build(),
            Err(SpecError::EmptyName { what: "member" })
        ));
    }

    #[test]
    fn test_nested_kinds_validated() {
        let bad = RecordDescriptor::new("Pair")
            .field("a", ValueKind::Int)
            .field("a", ValueKind::Int);
        let err = InterfaceDescriptor::builder("Holder")
            .readonly("pair", ValueKind::array(ValueKind::Record(bad)))
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::DuplicateField { .. }));
    }

    #[test]
    fn test_referenced_interfaces() {
        let node = InterfaceDescriptor::builder("Node")
            .readonly("next", ValueKind::optional(ValueKind::interface("Node")))
            .method(
                MethodDescriptor::new("visit").param(
                    "visitor",
                    ValueKind::callback(
                        MethodDescriptor::callback().param("other", ValueKind::interface("Graph")),
                    ),
                ),
            )
            .build()
            .unwrap();
        let refs: Vec<&str> = node.referenced_interfaces().into_iter().collect();
        assert_eq!(refs, vec!["Graph", "Node"]);
    }
}
