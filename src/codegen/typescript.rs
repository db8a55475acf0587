//! TypeScript Emitter
//!
//! Lowers emitted fields to static type declarations. The type block is the
//! same in both emission modes: type aliases are hoisted, so cycles between
//! types never need deferral.

use crate::codegen::fields::{EmittedField, LinkTarget, ValueType};
use crate::codegen::variants::{EntityModel, Variant};
use crate::codegen::zod::literal;

/// Render the four type declarations of an entity
pub fn render_types(model: &EntityModel) -> String {
    Variant::ALL
        .iter()
        .map(|variant| declaration(model, *variant))
        .collect::<Vec<_>>()
        .join("\n")
}

fn declaration(model: &EntityModel, variant: Variant) -> String {
    let name = variant.type_name(&model.type_name);
    if variant == Variant::Get {
        return format!(
            "export type {} = {};\n",
            name,
            Variant::Base.type_name(&model.type_name)
        );
    }

    format!("export type {} = {};\n", name, object_type(model.fields(variant)))
}

/// Multi-line object type
pub fn object_type(fields: &[EmittedField]) -> String {
    if fields.is_empty() {
        return "Record<string, never>".to_string();
    }

    let mut out = String::from("{\n");
    for field in fields {
        out.push_str(&format!("  {};\n", member(field)));
    }
    out.push('}');
    out
}

/// `key?: T | null`
pub fn member(field: &EmittedField) -> String {
    let marker = if field.optional { "?" } else { "" };
    let mut ty = type_expr(&field.value);
    if field.nullable {
        ty.push_str(" | null");
    }
    format!("{}{}: {}", field.key(), marker, ty)
}

pub fn type_expr(value: &ValueType) -> String {
    match value {
        ValueType::String | ValueType::Uuid | ValueType::Temporal(_) => "string".to_string(),
        ValueType::Integer | ValueType::Number => "number".to_string(),
        ValueType::Numeric => "number | string".to_string(),
        ValueType::Boolean => "boolean".to_string(),
        ValueType::Json => "unknown".to_string(),
        ValueType::Geometry => "Record<string, unknown>".to_string(),
        ValueType::Key => "string | number".to_string(),
        ValueType::Any => "any".to_string(),
        ValueType::Enum(values) if values.is_empty() => "never".to_string(),
        ValueType::Enum(values) => values.iter().map(literal).collect::<Vec<_>>().join(" | "),
        ValueType::Array(inner) => {
            let inner = type_expr(inner);
            if inner.contains(' ') {
                format!("({})[]", inner)
            } else {
                format!("{}[]", inner)
            }
        }
        ValueType::Object(fields) if fields.is_empty() => "Record<string, never>".to_string(),
        ValueType::Object(fields) => format!(
            "{{ {} }}",
            fields.iter().map(member).collect::<Vec<_>>().join("; ")
        ),
        ValueType::Link(LinkTarget::Entity(name)) | ValueType::Link(LinkTarget::SelfRef(name)) => {
            format!("string | number | {}", name)
        }
        ValueType::Link(LinkTarget::Shared(def)) => format!("string | {}", def.type_name()),
    }
}
