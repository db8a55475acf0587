//! Code Generation
//!
//! Generates Zod validators and TypeScript types from entity descriptors.
//!
//! Architecture:
//! - classify: descriptor → FieldKind (typed options, fixed priority chain)
//! - relations: FieldKind::Relation → target collection
//! - fields: FieldKind → language-agnostic ValueType + modifiers
//! - variants: EntityModel (base/create/update/get field lists)
//! - zod / typescript: emitters that consume EntityModels only
//!
//! The key constraint: emitters NEVER read descriptors. Everything they need
//! is decided before an [`EntityModel`] exists.

pub mod classify;
pub mod fields;
pub mod names;
pub mod relations;
pub mod typescript;
pub mod variants;
pub mod zod;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::error::Result;
use crate::metadata::{CollectionInfo, EntityDescriptor};

pub use classify::{classify, FieldKind};
pub use fields::{EmittedField, Reference, SharedDef, ValueType};
pub use names::{entity_type_name, to_kebab_case, to_pascal_case, to_singular};
pub use relations::{resolve_target, RelationshipIndex};
pub use variants::{EntityModel, Variant};

// =============================================================================
// Entity Index
// =============================================================================

/// An entity known to the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEntry {
    pub raw_name: String,
    pub namespaced: bool,
}

/// Singular type name → entity, built from the collection list before any
/// entity is emitted. Decides whether a relation target has a definition.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    by_type: BTreeMap<String, EntityEntry>,
}

impl EntityIndex {
    /// Index collections by type name. When two collections singularize to
    /// the same name, the first one keeps it.
    pub fn from_collections(collections: &[CollectionInfo]) -> Self {
        let mut by_type: BTreeMap<String, EntityEntry> = BTreeMap::new();
        for info in collections {
            let type_name = entity_type_name(&info.name);
            if let Some(existing) = by_type.get(&type_name) {
                warn!(
                    collection = %info.name,
                    kept = %existing.raw_name,
                    type_name = %type_name,
                    "type name collision, keeping first collection"
                );
                continue;
            }
            by_type.insert(
                type_name,
                EntityEntry {
                    raw_name: info.name.clone(),
                    namespaced: info.namespaced,
                },
            );
        }
        Self { by_type }
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.by_type.contains_key(type_name)
    }

    pub fn get(&self, type_name: &str) -> Option<&EntityEntry> {
        self.by_type.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

/// Read-only inputs shared by every entity's emission
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub relations: &'a RelationshipIndex,
    pub entities: &'a EntityIndex,
}

// =============================================================================
// Artifacts
// =============================================================================

/// How top-level declarations are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitMode {
    /// `export const XSchema = z.object({...})`
    Direct,
    /// `export const XSchema: z.ZodType<X> = z.lazy(() => z.object({...}))`
    Deferred,
}

/// Which blocks to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitOptions {
    pub validators: bool,
    pub types: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            validators: true,
            types: true,
        }
    }
}

/// Generated validator and type text of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub mode: EmitMode,

    /// Validator block, if validators are enabled
    pub validator: Option<String>,

    /// Type block, if types are enabled
    pub types: Option<String>,

    /// Retained for re-rendering and reference queries
    pub model: EntityModel,
}

impl GeneratedArtifact {
    pub fn render(model: EntityModel, mode: EmitMode, options: EmitOptions) -> Self {
        let validator = options
            .validators
            .then(|| zod::render_schemas(&model, mode, options.types));
        let types = options.types.then(|| typescript::render_types(&model));
        Self {
            mode,
            validator,
            types,
            model,
        }
    }

    pub fn entity(&self) -> &str {
        &self.model.raw_name
    }

    pub fn type_name(&self) -> &str {
        &self.model.type_name
    }

    pub fn namespaced(&self) -> bool {
        self.model.namespaced
    }

    pub fn references(&self) -> BTreeSet<Reference> {
        self.model.references()
    }

    /// The blocks this artifact was rendered with
    pub fn options(&self) -> EmitOptions {
        EmitOptions {
            validators: self.validator.is_some(),
            types: self.types.is_some(),
        }
    }
}

/// Emit the first-pass artifact of one entity
pub fn emit_entity(
    entity: &EntityDescriptor,
    ctx: &EmitContext<'_>,
    options: EmitOptions,
) -> Result<GeneratedArtifact> {
    let model = EntityModel::build(entity, ctx)?;
    Ok(GeneratedArtifact::render(model, EmitMode::Direct, options))
}

/// Artifacts of a run, keyed by raw entity name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSet {
    artifacts: BTreeMap<String, GeneratedArtifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, artifact: GeneratedArtifact) {
        self.artifacts.insert(artifact.entity().to_string(), artifact);
    }

    pub fn get(&self, entity: &str) -> Option<&GeneratedArtifact> {
        self.artifacts.get(entity)
    }

    /// Artifact producing a type name
    pub fn by_type_name(&self, type_name: &str) -> Option<&GeneratedArtifact> {
        self.artifacts.values().find(|a| a.type_name() == type_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedArtifact> {
        self.artifacts.values()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl FromIterator<GeneratedArtifact> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = GeneratedArtifact>>(iter: I) -> Self {
        let mut set = Self::new();
        for artifact in iter {
            set.insert(artifact);
        }
        set
    }
}

impl IntoIterator for ArtifactSet {
    type Item = GeneratedArtifact;
    type IntoIter = std::collections::btree_map::IntoValues<String, GeneratedArtifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.into_values()
    }
}
