//! Shared C++ spec: abstract class, registration body, and one header per
//! record or enum the interface uses.

use std::collections::BTreeSet;

use super::{GeneratedFile, Language, banner, join_indented, named_types, spec_type_name};
use crate::descriptor::{InterfaceDescriptor, Member};
use crate::kind::{EnumDescriptor, RecordDescriptor, ValueKind};

/// C++ type used for a value kind.
pub fn type_name(kind: &ValueKind) -> String {
    match kind {
        ValueKind::Void => "void".to_string(),
        ValueKind::Int => "int64_t".to_string(),
        ValueKind::Double => "double".to_string(),
        ValueKind::Bool => "bool".to_string(),
        ValueKind::String => "std::string".to_string(),
        ValueKind::Buffer => "std::shared_ptr<ArrayBuffer>".to_string(),
        ValueKind::Enum(e) => e.name.clone(),
        ValueKind::Optional { of } => format!("std::optional<{}>", type_name(of)),
        ValueKind::Array { of } => format!("std::vector<{}>", type_name(of)),
        ValueKind::Map { of } => format!("std::unordered_map<std::string, {}>", type_name(of)),
        ValueKind::Record(r) => r.name.clone(),
        ValueKind::Callback(signature) => {
            let params: Vec<String> = signature.params.iter().map(|p| type_name(&p.kind)).collect();
            format!(
                "std::function<{}({})>",
                type_name(&signature.returns),
                params.join(", ")
            )
        }
        ValueKind::InterfaceRef { name } => format!("std::shared_ptr<{}>", spec_type_name(name)),
    }
}

/// Whether a parameter of this kind is passed as `const T&`.
pub fn by_reference(kind: &ValueKind) -> bool {
    match kind {
        ValueKind::String
        | ValueKind::Array { .. }
        | ValueKind::Map { .. }
        | ValueKind::Record(_)
        | ValueKind::Callback(_) => true,
        ValueKind::Optional { of } => by_reference(of),
        _ => false,
    }
}

/// `#include` lines needed by declarations that mention some set of kinds.
///
/// Named records and enums are included from their own header, which in turn
/// includes whatever their fields need.
#[derive(Default)]
struct Includes {
    system: BTreeSet<&'static str>,
    local: BTreeSet<String>,
}

impl Includes {
    fn add_kind(&mut self, kind: &ValueKind) {
        match kind {
            ValueKind::Void | ValueKind::Double | ValueKind::Bool => {}
            ValueKind::Int => {
                self.system.insert("cstdint");
            }
            ValueKind::String => {
                self.system.insert("string");
            }
            ValueKind::Buffer => {
                self.system.insert("memory");
                self.system.insert("ArrayBuffer.hpp");
            }
            ValueKind::Enum(e) => {
                self.local.insert(format!("{}.hpp", e.name));
            }
            ValueKind::Optional { of } => {
                self.system.insert("optional");
                self.add_kind(of);
            }
            ValueKind::Array { of } => {
                self.system.insert("vector");
                self.add_kind(of);
            }
            ValueKind::Map { of } => {
                self.system.insert("string");
                self.system.insert("unordered_map");
                self.add_kind(of);
            }
            ValueKind::Record(r) => {
                self.local.insert(format!("{}.hpp", r.name));
            }
            ValueKind::Callback(signature) => {
                self.system.insert("functional");
                for param in &signature.params {
                    self.add_kind(&param.kind);
                }
                self.add_kind(&signature.returns);
            }
            ValueKind::InterfaceRef { name } => {
                self.system.insert("memory");
                self.local.insert(format!("{}.hpp", spec_type_name(name)));
            }
        }
    }

    /// Render system headers first, then generated ones, skipping `own`.
    fn render(&self, own: &str) -> String {
        let system = self.system.iter().map(|h| format!("#include <{}>", h));
        let local = self
            .local
            .iter()
            .filter(|h| h.as_str() != own)
            .map(|h| format!("#include \"{}\"", h));
        system.chain(local).collect::<Vec<_>>().join("\n")
    }
}

fn param_decl(kind: &ValueKind, name: &str) -> String {
    if by_reference(kind) {
        format!("const {}& {}", type_name(kind), name)
    } else {
        format!("{} {}", type_name(kind), name)
    }
}

fn return_type(member: &Member<'_>) -> String {
    let ty = type_name(member.returns());
    if member.is_async() {
        format!("std::future<{}>", ty)
    } else {
        ty
    }
}

fn virtual_decl(member: &Member<'_>) -> String {
    let params: Vec<String> = match member {
        Member::Getter(_) => Vec::new(),
        Member::Setter(p) => vec![param_decl(&p.kind, &p.name)],
        Member::Method(m) => m.params.iter().map(|p| param_decl(&p.kind, &p.name)).collect(),
    };
    format!(
        "virtual {} {}({}) = 0;",
        return_type(member),
        member.accessor_name(),
        params.join(", ")
    )
}

fn registration(class_name: &str, member: &Member<'_>) -> String {
    let register = match member {
        Member::Getter(_) => "registerHybridGetter",
        Member::Setter(_) => "registerHybridSetter",
        Member::Method(_) => "registerHybridMethod",
    };
    format!(
        "{}(\"{}\", &{}::{}, this);",
        register,
        member.declared_name(),
        class_name,
        member.accessor_name()
    )
}

fn record_header(record: &RecordDescriptor) -> GeneratedFile {
    let name = format!("{}.hpp", record.name);
    let mut includes = Includes::default();
    for field in &record.fields {
        includes.add_kind(&field.kind);
    }
    let includes = includes.render(&name);
    let fields: Vec<String> = record
        .fields
        .iter()
        .map(|f| format!("{} {};", type_name(&f.kind), f.name))
        .collect();
    let content = format!(
        "{banner}\n#pragma once\n\n{includes}{separator}struct {record} {{\npublic:\n  {fields}\n}};\n",
        banner = banner(&name),
        separator = if includes.is_empty() { "" } else { "\n\n" },
        includes = includes,
        record = record.name,
        fields = join_indented(&fields, "  "),
    );
    GeneratedFile {
        name,
        language: Language::Cpp,
        content,
    }
}

fn enum_header(descriptor: &EnumDescriptor) -> GeneratedFile {
    let name = format!("{}.hpp", descriptor.name);
    let members: Vec<String> = descriptor
        .members
        .iter()
        .map(|m| format!("{} = {},", m.name, m.value))
        .collect();
    let content = format!(
        "{banner}\n#pragma once\n\nenum class {enum_name} {{\n  {members}\n}};\n",
        banner = banner(&name),
        enum_name = descriptor.name,
        members = join_indented(&members, "  "),
    );
    GeneratedFile {
        name,
        language: Language::Cpp,
        content,
    }
}

/// Generate the header, the registration body and the definition headers.
pub fn generate(descriptor: &InterfaceDescriptor) -> Vec<GeneratedFile> {
    let class_name = spec_type_name(descriptor.name());
    let members = descriptor.members();
    let types = named_types(descriptor);

    let mut definitions: Vec<GeneratedFile> = types.records.values().map(|r| record_header(r)).collect();
    definitions.extend(types.enums.values().map(|e| enum_header(e)));

    let header_name = format!("{}.hpp", class_name);
    let mut includes = Includes::default();
    for kind in descriptor.all_kinds() {
        includes.add_kind(kind);
    }
    if descriptor.methods().iter().any(|m| m.is_async) {
        includes.system.insert("future");
    }
    includes.local.extend(definitions.iter().map(|d| d.name.clone()));
    for referenced in descriptor.referenced_interfaces() {
        includes.local.insert(format!("{}.hpp", spec_type_name(referenced)));
    }

    let properties: Vec<String> = members
        .iter()
        .filter(|m| !matches!(m, Member::Method(_)))
        .map(virtual_decl)
        .collect();
    let methods: Vec<String> = members
        .iter()
        .filter(|m| matches!(m, Member::Method(_)))
        .map(virtual_decl)
        .collect();

    let header = format!(
        "{banner}\n#pragma once\n\n#include <HybridObject.hpp>\n{includes}\n\n\
/**\n * An abstract base class for `{iface}`.\n * Inherit this class to implement `{iface}` in C++.\n */\n\
class {class}: public HybridObject {{\n  public:\n    explicit {class}(): HybridObject(TAG) {{ }}\n\n\
  public:\n    // Properties\n    {properties}\n\n  public:\n    // Methods\n    {methods}\n\n\
  protected:\n    static constexpr auto TAG = \"{iface}\";\n\n  private:\n    void loadHybridMethods() override;\n}};\n",
        banner = banner(&header_name),
        includes = includes.render(&header_name),
        iface = descriptor.name(),
        class = class_name,
        properties = join_indented(&properties, "    "),
        methods = join_indented(&methods, "    "),
    );

    let registrations: Vec<String> = members
        .iter()
        .map(|m| registration(&class_name, m))
        .collect();
    let body_name = format!("{}.cpp", class_name);
    let body = format!(
        "{banner}\n#include \"{header}\"\n\nvoid {class}::loadHybridMethods() {{\n  {registrations}\n}}\n",
        banner = banner(&body_name),
        header = header_name,
        class = class_name,
        registrations = join_indented(&registrations, "  "),
    );

    let mut files = vec![
        GeneratedFile {
            name: header_name,
            language: Language::Cpp,
            content: header,
        },
        GeneratedFile {
            name: body_name,
            language: Language::Cpp,
            content: body,
        },
    ];
    files.extend(definitions);
    files
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptor::MethodDescriptor;

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&ValueKind::optional(ValueKind::Bool)), "std::optional<bool>");
        assert_eq!(
            type_name(&ValueKind::callback(
                MethodDescriptor::callback().param("path", ValueKind::String)
            )),
            "std::function<void(std::string)>"
        );
        assert_eq!(
            type_name(&ValueKind::interface("Image")),
            "std::shared_ptr<HybridImageSpec>"
        );
        assert_eq!(
            type_name(&ValueKind::map(ValueKind::Double)),
            "std::unordered_map<std::string, double>"
        );
    }

    #[test]
    fn test_record_header_includes_its_field_types() {
        let engine = RecordDescriptor::new("Engine").field("power", ValueKind::Double);
        let fuel = EnumDescriptor::numeric("Fuel", [("Diesel", 0), ("Petrol", 1)]);
        let car = RecordDescriptor::new("Car")
            .field("engine", ValueKind::Record(engine))
            .field("fuel", ValueKind::Enum(fuel))
            .field("make", ValueKind::String)
            .field("driver", ValueKind::optional(ValueKind::interface("Person")))
            .field("tags", ValueKind::map(ValueKind::array(ValueKind::Int)));

        let header = record_header(&car).content;
        for include in [
            "#include <cstdint>",
            "#include <memory>",
            "#include <optional>",
            "#include <string>",
            "#include <unordered_map>",
            "#include <vector>",
            "#include \"Engine.hpp\"",
            "#include \"Fuel.hpp\"",
            "#include \"HybridPersonSpec.hpp\"",
        ] {
            assert!(header.contains(include), "missing {include} in:\n{header}");
        }
        assert!(!header.contains("Car.hpp\""));
        assert!(header.contains("Engine engine;"));
    }

    #[test]
    fn test_plain_record_header_has_no_includes() {
        let flags = RecordDescriptor::new("Flags").field("on", ValueKind::Bool);
        let header = record_header(&flags).content;
        assert!(!header.contains("#include"));
        assert!(header.contains("#pragma once\n\nstruct Flags {"));
    }

    #[test]
    fn test_spec_header_skips_own_include() {
        let node = InterfaceDescriptor::builder("Node")
            .property("next", ValueKind::optional(ValueKind::interface("Node")))
            .method(MethodDescriptor::new("load").returns(ValueKind::Buffer).asynchronous())
            .build()
            .unwrap();
        let header = &generate(&node)[0].content;
        assert!(!header.contains("#include \"HybridNodeSpec.hpp\""));
        assert!(header.contains("#include <future>"));
        assert!(header.contains("#include <ArrayBuffer.hpp>"));
    }

    #[test]
    fn test_pass_by_reference() {
        assert!(by_reference(&ValueKind::String));
        assert!(by_reference(&ValueKind::optional(ValueKind::String)));
        assert!(!by_reference(&ValueKind::Double));
        assert!(!by_reference(&ValueKind::interface("Image")));
    }
}
