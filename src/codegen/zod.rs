//! Zod Emitter
//!
//! Lowers emitted fields to Zod validator text. Consumes only
//! [`EntityModel`] values, never raw descriptors.

use crate::codegen::classify::{ChoiceValue, TemporalKind};
use crate::codegen::fields::{EmittedField, LinkTarget, ValueType};
use crate::codegen::variants::{EntityModel, Variant};
use crate::codegen::EmitMode;

/// Import line of the validation library
pub const IMPORT_LINE: &str = "import { z } from \"zod\";";

// =============================================================================
// Entity Blocks
// =============================================================================

/// Render the four schema declarations of an entity. `typed` says whether
/// the matching type declarations exist to annotate with.
pub fn render_schemas(model: &EntityModel, mode: EmitMode, typed: bool) -> String {
    Variant::ALL
        .iter()
        .map(|variant| match mode {
            EmitMode::Direct => direct_declaration(model, *variant, typed),
            EmitMode::Deferred => deferred_declaration(model, *variant, typed),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn type_annotation(type_name: &str, typed: bool) -> String {
    if typed {
        format!(": z.ZodType<{}>", type_name)
    } else {
        ": z.ZodTypeAny".to_string()
    }
}

fn direct_declaration(model: &EntityModel, variant: Variant, typed: bool) -> String {
    let name = variant.schema_name(&model.type_name);
    if variant == Variant::Get {
        return format!(
            "export const {} = {};\n",
            name,
            Variant::Base.schema_name(&model.type_name)
        );
    }

    // A self-referencing schema needs an explicit type to name itself
    let annotation = if variant == Variant::Base && model.is_self_referential() {
        type_annotation(&variant.type_name(&model.type_name), typed)
    } else {
        String::new()
    };

    format!(
        "export const {}{} = {};\n",
        name,
        annotation,
        object_expr(model.fields(variant), "")
    )
}

fn deferred_declaration(model: &EntityModel, variant: Variant, typed: bool) -> String {
    let name = variant.schema_name(&model.type_name);
    let annotation = type_annotation(&variant.type_name(&model.type_name), typed);
    if variant == Variant::Get {
        return format!(
            "export const {}{} = z.lazy(() => {});\n",
            name,
            annotation,
            Variant::Base.schema_name(&model.type_name)
        );
    }

    format!(
        "export const {}{} = z.lazy(() =>\n  {}\n);\n",
        name,
        annotation,
        object_expr(model.fields(variant), "  ")
    )
}

/// Multi-line `z.object({...})`, closing brace at `indent`
pub fn object_expr(fields: &[EmittedField], indent: &str) -> String {
    if fields.is_empty() {
        return "z.object({})".to_string();
    }

    let mut out = String::from("z.object({\n");
    for field in fields {
        out.push_str(&format!("{}  {}: {},\n", indent, field.key(), field_expr(field)));
    }
    out.push_str(indent);
    out.push_str("})");
    out
}

// =============================================================================
// Field Expressions
// =============================================================================

/// Validator of a field with its modifiers, nullable before optional
pub fn field_expr(field: &EmittedField) -> String {
    let mut expr = value_expr(&field.value);
    if field.nullable {
        expr.push_str(".nullable()");
    }
    if field.optional {
        expr.push_str(".optional()");
    }
    expr
}

pub fn value_expr(value: &ValueType) -> String {
    match value {
        ValueType::String => "z.string()".to_string(),
        ValueType::Uuid => "z.string().uuid()".to_string(),
        ValueType::Temporal(kind) => temporal_expr(*kind).to_string(),
        ValueType::Integer => "z.number().int()".to_string(),
        ValueType::Number => "z.number()".to_string(),
        ValueType::Numeric => "z.union([z.number(), z.string()])".to_string(),
        ValueType::Boolean => "z.boolean()".to_string(),
        ValueType::Json => "z.unknown()".to_string(),
        ValueType::Geometry => "z.record(z.string(), z.unknown())".to_string(),
        ValueType::Key => "z.union([z.string(), z.number()])".to_string(),
        ValueType::Any => "z.any()".to_string(),
        ValueType::Enum(values) => enum_expr(values),
        ValueType::Array(inner) => format!("z.array({})", value_expr(inner)),
        ValueType::Object(fields) => inline_object_expr(fields),
        ValueType::Link(target) => link_expr(target),
    }
}

fn temporal_expr(kind: TemporalKind) -> &'static str {
    match kind {
        TemporalKind::Date => "z.string().date()",
        TemporalKind::Time => "z.string().time()",
        TemporalKind::DateTime => "z.string().datetime({ local: true })",
        TemporalKind::Timestamp => "z.string().datetime({ offset: true })",
    }
}

fn enum_expr(values: &[ChoiceValue]) -> String {
    match values {
        [] => "z.never()".to_string(),
        [single] => format!("z.literal({})", literal(single)),
        _ if values.iter().all(|v| matches!(v, ChoiceValue::String(_))) => format!(
            "z.enum([{}])",
            values.iter().map(literal).collect::<Vec<_>>().join(", ")
        ),
        _ => format!(
            "z.union([{}])",
            values
                .iter()
                .map(|v| format!("z.literal({})", literal(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn inline_object_expr(fields: &[EmittedField]) -> String {
    if fields.is_empty() {
        return "z.object({})".to_string();
    }
    let body = fields
        .iter()
        .map(|f| format!("{}: {}", f.key(), field_expr(f)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("z.object({{ {} }})", body)
}

fn link_expr(target: &LinkTarget) -> String {
    match target {
        LinkTarget::Entity(name) => {
            format!("z.union([z.string(), z.number(), {}])", Variant::Base.schema_name(name))
        }
        LinkTarget::SelfRef(name) => format!(
            "z.union([z.string(), z.number(), z.lazy(() => {})])",
            Variant::Base.schema_name(name)
        ),
        LinkTarget::Shared(def) => format!("z.union([z.string(), {}])", def.schema_name()),
    }
}

/// Literal as written in generated code
pub fn literal(value: &ChoiceValue) -> String {
    match value {
        ChoiceValue::String(s) => format!("\"{}\"", s.escape_default()),
        ChoiceValue::Number(n) => n.to_string(),
        ChoiceValue::Boolean(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::fields::SharedDef;

    fn field(name: &str, value: ValueType, optional: bool, nullable: bool) -> EmittedField {
        EmittedField { name: name.into(), value, optional, nullable }
    }

    #[test]
    fn test_modifier_order() {
        let f = field("title", ValueType::String, true, true);
        assert_eq!(field_expr(&f), "z.string().nullable().optional()");
        let f = field("title", ValueType::String, true, false);
        assert_eq!(field_expr(&f), "z.string().optional()");
    }

    #[test]
    fn test_enum_forms() {
        let strings = ValueType::Enum(vec![
            ChoiceValue::String("draft".into()),
            ChoiceValue::String("published".into()),
        ]);
        assert_eq!(value_expr(&strings), "z.enum([\"draft\", \"published\"])");

        let mixed = ValueType::Enum(vec![ChoiceValue::Number(1.0), ChoiceValue::String("n/a".into())]);
        assert_eq!(value_expr(&mixed), "z.union([z.literal(1), z.literal(\"n/a\")])");

        let single = ValueType::Enum(vec![ChoiceValue::Boolean(true)]);
        assert_eq!(value_expr(&single), "z.literal(true)");
    }

    #[test]
    fn test_links() {
        assert_eq!(
            value_expr(&ValueType::Link(LinkTarget::Entity("User".into()))),
            "z.union([z.string(), z.number(), UserSchema])"
        );
        assert_eq!(
            value_expr(&ValueType::array(ValueType::Link(LinkTarget::SelfRef("Page".into())))),
            "z.array(z.union([z.string(), z.number(), z.lazy(() => PageSchema)]))"
        );
        assert_eq!(
            value_expr(&ValueType::Link(LinkTarget::Shared(SharedDef::ImageFile))),
            "z.union([z.string(), DirectusImageFileSchema])"
        );
    }

    #[test]
    fn test_inline_object() {
        let value = ValueType::array(ValueType::Object(vec![
            field("url", ValueType::String, false, false),
            field("label", ValueType::String, true, false),
        ]));
        assert_eq!(
            value_expr(&value),
            "z.array(z.object({ url: z.string(), label: z.string().optional() }))"
        );
    }

    #[test]
    fn test_literal_escaping() {
        assert_eq!(literal(&ChoiceValue::String("say \"hi\"".into())), "\"say \\\"hi\\\"\"");
        assert_eq!(literal(&ChoiceValue::Number(2.5)), "2.5");
    }
}
