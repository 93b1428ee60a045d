//! Swift protocol generation.

use super::{GeneratedFile, Language, banner, join_indented, spec_type_name};
use crate::descriptor::InterfaceDescriptor;
use crate::kind::ValueKind;

/// Swift type used for a value kind.
pub fn type_name(kind: &ValueKind) -> String {
    match kind {
        ValueKind::Void => "Void".to_string(),
        ValueKind::Int => "Int64".to_string(),
        ValueKind::Double => "Double".to_string(),
        ValueKind::Bool => "Bool".to_string(),
        ValueKind::String => "String".to_string(),
        ValueKind::Buffer => "ArrayBuffer".to_string(),
        ValueKind::Enum(e) => e.name.clone(),
        ValueKind::Optional { of } => match of.as_ref() {
            ValueKind::Callback(_) | ValueKind::InterfaceRef { .. } => {
                format!("({})?", type_name(of))
            }
            _ => format!("{}?", type_name(of)),
        },
        ValueKind::Array { of } => format!("[{}]", type_name(of)),
        ValueKind::Map { of } => format!("[String: {}]", type_name(of)),
        ValueKind::Record(r) => r.name.clone(),
        ValueKind::Callback(signature) => {
            let params: Vec<String> = signature.params.iter().map(|p| type_name(&p.kind)).collect();
            format!("({}) -> {}", params.join(", "), type_name(&signature.returns))
        }
        ValueKind::InterfaceRef { name } => format!("any {}", spec_type_name(name)),
    }
}

fn param_type(kind: &ValueKind) -> String {
    match kind {
        ValueKind::Callback(_) => format!("@escaping {}", type_name(kind)),
        _ => type_name(kind),
    }
}

/// Generate `Hybrid<Name>Spec.swift`.
pub fn generate(descriptor: &InterfaceDescriptor) -> Vec<GeneratedFile> {
    let protocol = spec_type_name(descriptor.name());

    let properties: Vec<String> = descriptor
        .properties()
        .iter()
        .map(|p| {
            let accessors = if p.has_setter { "get set" } else { "get" };
            format!("var {}: {} {{ {} }}", p.name, type_name(&p.kind), accessors)
        })
        .collect();

    let methods: Vec<String> = descriptor
        .methods()
        .iter()
        .map(|m| {
            let params: Vec<String> = m
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, param_type(&p.kind)))
                .collect();
            let effects = if m.is_async { "async throws" } else { "throws" };
            format!(
                "func {}({}) {} -> {}",
                m.name,
                params.join(", "),
                effects,
                type_name(&m.returns)
            )
        })
        .collect();

    let name = format!("{}.swift", protocol);
    let content = format!(
        "{banner}\nimport Foundation\n\n\
/**\n * A Swift protocol representing the {iface} hybrid object.\n * Implement this protocol to create Swift-based instances of {iface}.\n */\n\
public protocol {protocol}: HybridObjectSpec {{\n  // Properties\n  {properties}\n\n  // Methods\n  {methods}\n\n\
  // Size of the instance outside the native heap, reported for memory pressure\n  var memorySize: Int {{ get }}\n}}\n",
        banner = banner(&name),
        iface = descriptor.name(),
        protocol = protocol,
        properties = join_indented(&properties, "  "),
        methods = join_indented(&methods, "  "),
    );

    vec![GeneratedFile {
        name,
        language: Language::Swift,
        content,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MethodDescriptor;

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&ValueKind::array(ValueKind::Double)), "[Double]");
        assert_eq!(type_name(&ValueKind::map(ValueKind::String)), "[String: String]");
        assert_eq!(type_name(&ValueKind::optional(ValueKind::interface("Person"))), "(any HybridPersonSpec)?");
        let cb = ValueKind::callback(MethodDescriptor::callback().param("path", ValueKind::String));
        assert_eq!(param_type(&cb), "@escaping (String) -> Void");
        assert_eq!(type_name(&ValueKind::optional(cb)), "((String) -> Void)?");
    }
}
