//! Field Emission
//!
//! Turns a classified field into a language-agnostic [`ValueType`] plus its
//! modifiers. The Zod and TypeScript emitters lower the same tree, so the
//! validator and the type of a field can never disagree on shape.
//!
//! References to other entities are part of the tree itself; the dependency
//! graph and the import planner read them back with [`EmittedField::references`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::codegen::classify::{
    classify, scalar_kind, Cardinality, ChoiceValue, FieldKind, FileKind, ScalarKind,
    TemporalKind,
};
use crate::codegen::names::{entity_type_name, property_key};
use crate::codegen::EmitContext;
use crate::metadata::FieldDescriptor;

/// Raw name of the backend's file collection, served by the shared module
pub const FILES_COLLECTION: &str = "directus_files";

// =============================================================================
// References
// =============================================================================

/// Definitions provided by the shared auxiliary module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SharedDef {
    File,
    ImageFile,
}

impl SharedDef {
    pub fn type_name(&self) -> &'static str {
        match self {
            SharedDef::File => "DirectusFile",
            SharedDef::ImageFile => "DirectusImageFile",
        }
    }

    pub fn schema_name(&self) -> &'static str {
        match self {
            SharedDef::File => "DirectusFileSchema",
            SharedDef::ImageFile => "DirectusImageFileSchema",
        }
    }
}

/// A structured cross-definition reference collected during emission
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Reference {
    /// Another entity, by singular type name
    Entity(String),
    Shared(SharedDef),
}

/// What a relation or file field points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkTarget {
    Entity(String),
    /// The entity under construction; always emitted deferred
    SelfRef(String),
    Shared(SharedDef),
}

impl LinkTarget {
    fn reference(&self) -> Reference {
        match self {
            LinkTarget::Entity(name) | LinkTarget::SelfRef(name) => Reference::Entity(name.clone()),
            LinkTarget::Shared(def) => Reference::Shared(*def),
        }
    }
}

// =============================================================================
// Value Types
// =============================================================================

/// Language-agnostic value shape of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Uuid,
    Temporal(TemporalKind),
    Integer,
    Number,
    /// Number or numeric string
    Numeric,
    Boolean,
    Json,
    Geometry,
    /// String or number key
    Key,
    /// Permissive fallback
    Any,
    /// Enumerated literal values
    Enum(Vec<ChoiceValue>),
    Array(Box<ValueType>),
    /// Inline object (repeater rows)
    Object(Vec<EmittedField>),
    /// Key or expanded record of the target
    Link(LinkTarget),
}

impl ValueType {
    pub fn array(inner: ValueType) -> Self {
        ValueType::Array(Box::new(inner))
    }

    fn collect_references(&self, out: &mut BTreeSet<Reference>) {
        match self {
            ValueType::Link(target) => {
                out.insert(target.reference());
            }
            ValueType::Array(inner) => inner.collect_references(out),
            ValueType::Object(fields) => {
                for field in fields {
                    field.value.collect_references(out);
                }
            }
            _ => {}
        }
    }

    fn is_self_reference(&self) -> bool {
        match self {
            ValueType::Link(LinkTarget::SelfRef(_)) => true,
            ValueType::Array(inner) => inner.is_self_reference(),
            ValueType::Object(fields) => fields.iter().any(|f| f.value.is_self_reference()),
            _ => false,
        }
    }

    /// Lower every link rejected by `keep` to a plain key
    pub fn retain_links(self, keep: &dyn Fn(&LinkTarget) -> bool) -> ValueType {
        match self {
            ValueType::Link(target) if !keep(&target) => ValueType::Key,
            ValueType::Array(inner) => ValueType::array(inner.retain_links(keep)),
            ValueType::Object(fields) => ValueType::Object(
                fields.into_iter().map(|f| f.retain_links(keep)).collect(),
            ),
            other => other,
        }
    }
}

// =============================================================================
// Emitted Field
// =============================================================================

/// One field ready for lowering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmittedField {
    /// Field name as in the backend
    pub name: String,

    pub value: ValueType,

    /// `.optional()` / `key?:`
    pub optional: bool,

    /// `.nullable()` / `| null`, applied before `optional`
    pub nullable: bool,
}

impl EmittedField {
    /// Apply the modifier rules: nullable and not required gets both
    /// modifiers, not required alone gets `optional` only.
    pub fn new(field: &FieldDescriptor, value: ValueType) -> Self {
        Self {
            name: field.name.clone(),
            value,
            optional: !field.required,
            nullable: field.nullable && !field.required,
        }
    }

    /// Object key as written in the output
    pub fn key(&self) -> String {
        property_key(&self.name)
    }

    pub fn references(&self) -> BTreeSet<Reference> {
        let mut out = BTreeSet::new();
        self.value.collect_references(&mut out);
        out
    }

    pub fn is_self_reference(&self) -> bool {
        self.value.is_self_reference()
    }

    pub fn retain_links(mut self, keep: &dyn Fn(&LinkTarget) -> bool) -> Self {
        self.value = self.value.retain_links(keep);
        self
    }
}

// =============================================================================
// Emission
// =============================================================================

/// Emit one field of `entity_type`. Returns `None` for layout-only fields.
pub fn emit_field(
    field: &FieldDescriptor,
    entity_raw: &str,
    entity_type: &str,
    ctx: &EmitContext<'_>,
) -> Option<EmittedField> {
    let value = match classify(field) {
        FieldKind::Presentation => return None,
        FieldKind::File(kind) => file_value(kind),
        FieldKind::Relation { cardinality, hints } => {
            let target = ctx
                .relations
                .resolve(field, cardinality, &hints, entity_raw)
                .and_then(|raw| link_target(&raw, entity_type, ctx));
            let item = target.map(ValueType::Link).unwrap_or(ValueType::Key);
            if cardinality == Cardinality::ToOne {
                item
            } else {
                ValueType::array(item)
            }
        }
        FieldKind::Choice(options) => {
            let value = ValueType::Enum(options.values);
            if options.multiple {
                ValueType::array(value)
            } else {
                value
            }
        }
        FieldKind::DateTime(kind) => ValueType::Temporal(kind),
        FieldKind::Autocomplete => ValueType::String,
        FieldKind::Tag => ValueType::array(ValueType::String),
        FieldKind::Repeater(nested) => {
            ValueType::array(ValueType::Object(nested.iter().map(emit_nested_field).collect()))
        }
        FieldKind::Scalar(kind) => scalar_value(kind),
        FieldKind::Unknown => ValueType::Any,
    };

    Some(EmittedField::new(field, value))
}

/// Reduced mapping for repeater sub-fields: raw type only, no relation or
/// choice resolution.
pub fn emit_nested_field(field: &FieldDescriptor) -> EmittedField {
    let value = match field.raw_type.as_str() {
        "date" => ValueType::Temporal(TemporalKind::Date),
        "time" => ValueType::Temporal(TemporalKind::Time),
        "dateTime" => ValueType::Temporal(TemporalKind::DateTime),
        "timestamp" => ValueType::Temporal(TemporalKind::Timestamp),
        raw => scalar_kind(raw).map(scalar_value).unwrap_or(ValueType::Any),
    };
    EmittedField::new(field, value)
}

fn file_value(kind: FileKind) -> ValueType {
    match kind {
        FileKind::Single => ValueType::Link(LinkTarget::Shared(SharedDef::File)),
        FileKind::Image => ValueType::Link(LinkTarget::Shared(SharedDef::ImageFile)),
        FileKind::Multiple => ValueType::array(ValueType::Link(LinkTarget::Shared(SharedDef::File))),
    }
}

/// Map a resolved raw target to a link. Targets outside the run's entity
/// set have no definition to point at.
fn link_target(raw: &str, entity_type: &str, ctx: &EmitContext<'_>) -> Option<LinkTarget> {
    if raw == FILES_COLLECTION {
        return Some(LinkTarget::Shared(SharedDef::File));
    }

    let type_name = entity_type_name(raw);
    if type_name == entity_type {
        Some(LinkTarget::SelfRef(type_name))
    } else if ctx.entities.contains(&type_name) {
        Some(LinkTarget::Entity(type_name))
    } else {
        None
    }
}

pub fn scalar_value(kind: ScalarKind) -> ValueType {
    match kind {
        ScalarKind::String => ValueType::String,
        ScalarKind::Uuid => ValueType::Uuid,
        ScalarKind::Integer => ValueType::Integer,
        ScalarKind::Float => ValueType::Number,
        ScalarKind::Numeric => ValueType::Numeric,
        ScalarKind::Boolean => ValueType::Boolean,
        ScalarKind::Json => ValueType::Json,
        ScalarKind::Csv => ValueType::array(ValueType::String),
        ScalarKind::Geometry => ValueType::Geometry,
        ScalarKind::Identifier => ValueType::Key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::relations::RelationshipIndex;
    use crate::codegen::EntityIndex;
    use crate::metadata::CollectionInfo;
    use serde_json::json;

    fn entities() -> EntityIndex {
        EntityIndex::from_collections(&[
            CollectionInfo { name: "posts".into(), namespaced: false },
            CollectionInfo { name: "users".into(), namespaced: false },
        ])
    }

    fn emit(field: &FieldDescriptor) -> Option<EmittedField> {
        let relations = RelationshipIndex::empty();
        let entities = entities();
        let ctx = EmitContext { relations: &relations, entities: &entities };
        emit_field(field, "posts", "Post", &ctx)
    }

    #[test]
    fn test_modifiers() {
        let optional_nullable = emit(&FieldDescriptor::new("title", "string").nullable()).unwrap();
        assert!(optional_nullable.optional && optional_nullable.nullable);

        let required_nullable =
            emit(&FieldDescriptor::new("title", "string").nullable().required()).unwrap();
        assert!(!required_nullable.optional && !required_nullable.nullable);

        let optional = emit(&FieldDescriptor::new("title", "string")).unwrap();
        assert!(optional.optional && !optional.nullable);
    }

    #[test]
    fn test_presentation_is_dropped() {
        let field = FieldDescriptor::new("notice", "alias")
            .with_interface("presentation-notice")
            .with_special("m2o");
        assert!(emit(&field).is_none());
    }

    #[test]
    fn test_relation_targets() {
        let author = emit(&FieldDescriptor::new("author", "uuid").with_foreign_key("users")).unwrap();
        assert_eq!(author.value, ValueType::Link(LinkTarget::Entity("User".into())));
        assert_eq!(
            author.references().into_iter().collect::<Vec<_>>(),
            vec![Reference::Entity("User".into())]
        );

        let parent = emit(&FieldDescriptor::new("parent", "integer").with_foreign_key("posts")).unwrap();
        assert!(parent.is_self_reference());

        let unknown = emit(&FieldDescriptor::new("owner", "uuid").with_foreign_key("owners")).unwrap();
        assert_eq!(unknown.value, ValueType::Key);
        assert!(unknown.references().is_empty());
    }

    #[test]
    fn test_to_many_wraps_in_array() {
        let field = FieldDescriptor::new("comments", "alias")
            .with_special("o2m")
            .with_options(json!({ "related_collection": "users" }));
        assert_eq!(
            emit(&field).unwrap().value,
            ValueType::array(ValueType::Link(LinkTarget::Entity("User".into())))
        );
    }

    #[test]
    fn test_files_reference_shared_definitions() {
        let cover = emit(&FieldDescriptor::new("cover", "uuid").with_interface("file-image")).unwrap();
        assert!(cover.references().contains(&Reference::Shared(SharedDef::ImageFile)));

        let raw_fk = emit(&FieldDescriptor::new("doc", "uuid").with_foreign_key("directus_files")).unwrap();
        assert!(raw_fk.references().contains(&Reference::Shared(SharedDef::File)));
    }

    #[test]
    fn test_repeater_uses_reduced_mapping() {
        let field = FieldDescriptor::new("links", "json").with_interface("list").with_nested(vec![
            FieldDescriptor::new("url", "string").required(),
            FieldDescriptor::new("target", "uuid").with_special("m2o"),
        ]);
        match emit(&field).unwrap().value {
            ValueType::Array(inner) => match *inner {
                ValueType::Object(fields) => {
                    assert_eq!(fields[0].value, ValueType::String);
                    assert!(!fields[0].optional);
                    assert_eq!(fields[1].value, ValueType::Uuid);
                }
                other => panic!("Expected Object, got {:?}", other),
            },
            other => panic!("Expected Array, got {:?}", other),
        }
    }

    #[test]
    fn test_retain_links_lowers_rejected_targets() {
        let tags = ValueType::array(ValueType::Link(LinkTarget::Entity("Tag".into())));
        let keep = |target: &LinkTarget| !matches!(target, LinkTarget::Entity(name) if name == "Tag");
        assert_eq!(tags.retain_links(&keep), ValueType::array(ValueType::Key));

        let cover = ValueType::Link(LinkTarget::Shared(SharedDef::File));
        assert_eq!(cover.clone().retain_links(&keep), cover);
    }
}
