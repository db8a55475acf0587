//! Entity Variants
//!
//! Every entity is emitted in four variants derived from one base field list:
//! base, create (no identifier, no audit fields), update (everything optional
//! but the identifier) and get (same as base).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::codegen::fields::{emit_field, EmittedField, LinkTarget, Reference};
use crate::codegen::names::entity_type_name;
use crate::codegen::EmitContext;
use crate::error::{GenError, Result};
use crate::metadata::{EntityDescriptor, FieldDescriptor, IDENTIFIER_FIELD};

/// Audit fields the backend fills in on write
pub const AUDIT_FIELDS: &[&str] = &["user_created", "date_created", "user_updated", "date_updated"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Base,
    Create,
    Update,
    Get,
}

impl Variant {
    pub const ALL: [Variant; 4] = [Variant::Base, Variant::Create, Variant::Update, Variant::Get];

    pub fn suffix(&self) -> &'static str {
        match self {
            Variant::Base => "",
            Variant::Create => "Create",
            Variant::Update => "Update",
            Variant::Get => "Get",
        }
    }

    /// `PostCreate`
    pub fn type_name(&self, entity_type: &str) -> String {
        format!("{}{}", entity_type, self.suffix())
    }

    /// `PostCreateSchema`
    pub fn schema_name(&self, entity_type: &str) -> String {
        format!("{}{}Schema", entity_type, self.suffix())
    }
}

/// Everything needed to render an entity, retained after its descriptor is
/// dropped so the deferred pass can re-render without refetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityModel {
    /// Raw collection name
    pub raw_name: String,

    /// Singular type name (`BlogPost`)
    pub type_name: String,

    pub namespaced: bool,

    pub base: Vec<EmittedField>,
    pub create: Vec<EmittedField>,
    pub update: Vec<EmittedField>,

    /// Fields left out of the create variant, in field order
    pub create_omissions: Vec<String>,

    /// Whether the identifier was synthesized
    pub synthetic_identifier: bool,
}

impl EntityModel {
    /// Classify, resolve and emit every field of an entity
    pub fn build(entity: &EntityDescriptor, ctx: &EmitContext<'_>) -> Result<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = entity.fields.iter().find(|f| !seen.insert(f.name.as_str())) {
            return Err(GenError::InvalidMetadata {
                collection: entity.name.clone(),
                reason: format!("duplicate field '{}'", dup.name),
            });
        }

        let type_name = entity_type_name(&entity.name);

        let synthetic_identifier = !entity.fields.iter().any(FieldDescriptor::is_identifier);
        let synthetic = synthetic_identifier.then(FieldDescriptor::synthetic_identifier);
        let fields = synthetic.iter().chain(entity.fields.iter());

        let base: Vec<EmittedField> = fields
            .filter_map(|f| emit_field(f, &entity.name, &type_name, ctx))
            .collect();

        let (create, create_omissions) = create_variant(&base);
        let update = update_variant(&base);

        Ok(Self {
            raw_name: entity.name.clone(),
            type_name,
            namespaced: entity.namespaced,
            base,
            create,
            update,
            create_omissions,
            synthetic_identifier,
        })
    }

    pub fn fields(&self, variant: Variant) -> &[EmittedField] {
        match variant {
            Variant::Base | Variant::Get => &self.base,
            Variant::Create => &self.create,
            Variant::Update => &self.update,
        }
    }

    /// References of the base variant; the other variants are subsets
    pub fn references(&self) -> BTreeSet<Reference> {
        self.base.iter().flat_map(|f| f.references()).collect()
    }

    pub fn is_self_referential(&self) -> bool {
        self.base.iter().any(EmittedField::is_self_reference)
    }

    /// Lower links rejected by `keep` to plain keys in every variant
    pub fn retain_links(self, keep: &dyn Fn(&LinkTarget) -> bool) -> Self {
        let lower = |fields: Vec<EmittedField>| -> Vec<EmittedField> {
            fields.into_iter().map(|f| f.retain_links(keep)).collect()
        };
        Self {
            base: lower(self.base),
            create: lower(self.create),
            update: lower(self.update),
            ..self
        }
    }
}

fn create_variant(base: &[EmittedField]) -> (Vec<EmittedField>, Vec<String>) {
    let (omitted, kept): (Vec<_>, Vec<_>) = base
        .iter()
        .cloned()
        .partition(|f| f.name == IDENTIFIER_FIELD || AUDIT_FIELDS.contains(&f.name.as_str()));
    (kept, omitted.into_iter().map(|f| f.name).collect())
}

fn update_variant(base: &[EmittedField]) -> Vec<EmittedField> {
    base.iter()
        .cloned()
        .map(|mut f| {
            if f.name == IDENTIFIER_FIELD {
                f.optional = false;
                f.nullable = false;
            } else {
                f.optional = true;
            }
            f
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::fields::ValueType;
    use crate::codegen::relations::RelationshipIndex;
    use crate::codegen::EntityIndex;

    fn build(entity: &EntityDescriptor) -> Result<EntityModel> {
        let relations = RelationshipIndex::empty();
        let entities = EntityIndex::default();
        EntityModel::build(entity, &EmitContext { relations: &relations, entities: &entities })
    }

    fn names(fields: &[EmittedField]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_synthetic_identifier_comes_first() {
        let entity = EntityDescriptor::new("settings", vec![FieldDescriptor::new("theme", "string")]);
        let model = build(&entity).unwrap();

        assert!(model.synthetic_identifier);
        assert_eq!(names(&model.base), vec!["id", "theme"]);
        assert_eq!(model.base[0].value, ValueType::Key);
        assert!(model.base[0].optional);
        assert_eq!(names(model.fields(Variant::Update)), vec!["id", "theme"]);
        assert_eq!(names(model.fields(Variant::Get)), vec!["id", "theme"]);
    }

    #[test]
    fn test_create_omits_synthetic_identifier() {
        let entity = EntityDescriptor::new("settings", vec![FieldDescriptor::new("theme", "string")]);
        let model = build(&entity).unwrap();

        assert_eq!(names(model.fields(Variant::Create)), vec!["theme"]);
        assert_eq!(model.create_omissions, vec!["id"]);
    }

    #[test]
    fn test_retain_links_applies_to_every_variant() {
        let relations = RelationshipIndex::empty();
        let entities = EntityIndex::from_collections(&[
            crate::metadata::CollectionInfo { name: "posts".into(), namespaced: false },
            crate::metadata::CollectionInfo { name: "users".into(), namespaced: false },
        ]);
        let ctx = EmitContext { relations: &relations, entities: &entities };
        let entity = EntityDescriptor::new(
            "posts",
            vec![
                FieldDescriptor::new("id", "integer").required(),
                FieldDescriptor::new("author", "uuid").with_foreign_key("users"),
                FieldDescriptor::new("parent", "integer").with_foreign_key("posts"),
            ],
        );
        let model = EntityModel::build(&entity, &ctx).unwrap();
        assert_eq!(model.references().len(), 2);

        let model = model.retain_links(&|t| !matches!(t, LinkTarget::Entity(_)));
        for variant in Variant::ALL {
            let author = model.fields(variant).iter().find(|f| f.name == "author").unwrap();
            assert_eq!(author.value, ValueType::Key);
        }
        assert!(model.is_self_referential());
        assert_eq!(model.references().len(), 1);
    }

    #[test]
    fn test_create_omits_only_present_audit_fields() {
        let entity = EntityDescriptor::new(
            "posts",
            vec![
                FieldDescriptor::new("id", "integer").primary().required(),
                FieldDescriptor::new("title", "string"),
                FieldDescriptor::new("user_created", "uuid"),
                FieldDescriptor::new("date_updated", "timestamp"),
            ],
        );
        let model = build(&entity).unwrap();

        assert_eq!(names(&model.create), vec!["title"]);
        assert_eq!(model.create_omissions, vec!["id", "user_created", "date_updated"]);
        assert!(!model.create_omissions.iter().any(|n| n == "date_created"));
    }

    #[test]
    fn test_update_forces_identifier_required() {
        let entity = EntityDescriptor::new(
            "posts",
            vec![
                FieldDescriptor::new("id", "integer").nullable(),
                FieldDescriptor::new("title", "string").required(),
            ],
        );
        let model = build(&entity).unwrap();

        let id = &model.update[0];
        assert!(!id.optional && !id.nullable);
        assert!(model.update[1].optional);
        assert!(!model.base[1].optional);
    }

    #[test]
    fn test_duplicate_fields_fail() {
        let entity = EntityDescriptor::new(
            "posts",
            vec![FieldDescriptor::new("title", "string"), FieldDescriptor::new("title", "text")],
        );
        assert!(matches!(build(&entity), Err(GenError::InvalidMetadata { .. })));
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(Variant::Base.schema_name("Post"), "PostSchema");
        assert_eq!(Variant::Create.type_name("Post"), "PostCreate");
        assert_eq!(Variant::Get.schema_name("Post"), "PostGetSchema");
    }
}
