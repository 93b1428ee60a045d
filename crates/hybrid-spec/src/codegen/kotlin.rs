//! Kotlin abstract class generation.

use super::{GeneratedFile, Language, banner, join_indented, spec_type_name};
use crate::descriptor::InterfaceDescriptor;
use crate::kind::ValueKind;

/// Kotlin type used for a value kind.
pub fn type_name(kind: &ValueKind) -> String {
    match kind {
        ValueKind::Void => "Unit".to_string(),
        ValueKind::Int => "Long".to_string(),
        ValueKind::Double => "Double".to_string(),
        ValueKind::Bool => "Boolean".to_string(),
        ValueKind::String => "String".to_string(),
        ValueKind::Buffer => "java.nio.ByteBuffer".to_string(),
        ValueKind::Enum(e) => e.name.clone(),
        ValueKind::Optional { of } => match of.as_ref() {
            ValueKind::Callback(_) => format!("({})?", type_name(of)),
            _ => format!("{}?", type_name(of)),
        },
        ValueKind::Array { of } => format!("Array<{}>", type_name(of)),
        ValueKind::Map { of } => format!("Map<String, {}>", type_name(of)),
        ValueKind::Record(r) => r.name.clone(),
        ValueKind::Callback(signature) => {
            let params: Vec<String> = signature.params.iter().map(|p| type_name(&p.kind)).collect();
            format!("({}) -> {}", params.join(", "), type_name(&signature.returns))
        }
        ValueKind::InterfaceRef { name } => spec_type_name(name),
    }
}

/// Generate `Hybrid<Name>Spec.kt`.
pub fn generate(descriptor: &InterfaceDescriptor) -> Vec<GeneratedFile> {
    let class_name = spec_type_name(descriptor.name());

    let properties: Vec<String> = descriptor
        .properties()
        .iter()
        .map(|p| {
            let keyword = if p.has_setter { "var" } else { "val" };
            format!("abstract {} {}: {}", keyword, p.name, type_name(&p.kind))
        })
        .collect();

    let methods: Vec<String> = descriptor
        .methods()
        .iter()
        .map(|m| {
            let params: Vec<String> = m
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, type_name(&p.kind)))
                .collect();
            let modifier = if m.is_async { "abstract suspend fun" } else { "abstract fun" };
            format!(
                "{} {}({}): {}",
                modifier,
                m.name,
                params.join(", "),
                type_name(&m.returns)
            )
        })
        .collect();

    let name = format!("{}.kt", class_name);
    let content = format!(
        "{banner}\n\
/**\n * A Kotlin class representing the {iface} hybrid object.\n * Implement this abstract class to create Kotlin-based instances of {iface}.\n */\n\
abstract class {class} : HybridObject() {{\n  // Properties\n  {properties}\n\n  // Methods\n  {methods}\n\n\
  // Bytes held outside the native heap, reported for memory pressure\n  open val memorySize: Long\n    get() = 0L\n}}\n",
        banner = banner(&name),
        iface = descriptor.name(),
        class = class_name,
        properties = join_indented(&properties, "  "),
        methods = join_indented(&methods, "  "),
    );

    vec![GeneratedFile {
        name,
        language: Language::Kotlin,
        content,
    }]
}
