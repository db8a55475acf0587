//! Snapshot Loading
//!
//! Reads a Directus schema snapshot (`collections`, `fields`, `relations`)
//! from a single JSON file or from a directory of snapshot fragments, and
//! serves it through [`MetadataSource`].

use serde::{Deserialize, Deserializer};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use super::{
    is_system_collection, CollectionInfo, FieldDescriptor, MetadataSource, RelationSide,
    RelationshipRecord,
};
use crate::error::{GenError, Result};

// =============================================================================
// Wire Format
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    collections: Vec<RawCollection>,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    relations: Vec<RawRelation>,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    collection: String,
    /// Folders (grouping-only collections) carry no schema
    #[serde(default)]
    schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    collection: String,
    field: String,
    #[serde(rename = "type", default = "default_raw_type")]
    raw_type: String,
    #[serde(default)]
    meta: Option<RawFieldMeta>,
    #[serde(default)]
    schema: Option<RawFieldSchema>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFieldMeta {
    #[serde(default)]
    interface: Option<String>,
    #[serde(default, deserialize_with = "special_tags")]
    special: BTreeSet<String>,
    #[serde(default)]
    options: Option<serde_json::Value>,
    #[serde(default)]
    required: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFieldSchema {
    #[serde(default)]
    is_nullable: Option<bool>,
    #[serde(default)]
    is_primary_key: Option<bool>,
    #[serde(default)]
    foreign_key_table: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRelation {
    collection: String,
    field: String,
    #[serde(default)]
    related_collection: Option<String>,
    #[serde(default)]
    meta: Option<RawRelationMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRelationMeta {
    #[serde(default)]
    one_field: Option<String>,
    #[serde(default)]
    junction_field: Option<String>,
}

/// Repeater sub-field as stored in `options.fields`
#[derive(Debug, Deserialize)]
struct RawNestedField {
    field: String,
    #[serde(rename = "type", default = "default_raw_type")]
    raw_type: String,
    #[serde(default)]
    meta: Option<RawFieldMeta>,
}

fn default_raw_type() -> String {
    "unknown".to_string()
}

/// Special tags arrive either as a list or as a comma separated string
fn special_tags<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Csv(String),
    }

    let tags: Option<Tags> = Option::deserialize(deserializer)?;
    Ok(match tags {
        None => BTreeSet::new(),
        Some(Tags::List(list)) => list.into_iter().collect(),
        Some(Tags::Csv(csv)) => csv
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    })
}

// =============================================================================
// Conversion
// =============================================================================

impl RawField {
    fn into_descriptor(self) -> FieldDescriptor {
        let meta = self.meta.unwrap_or_default();
        let schema = self.schema.unwrap_or_default();
        let nested = nested_fields(meta.options.as_ref());

        FieldDescriptor {
            name: self.field,
            raw_type: self.raw_type,
            nullable: schema.is_nullable.unwrap_or(true),
            required: meta.required.unwrap_or(false),
            primary_key: schema.is_primary_key.unwrap_or(false),
            foreign_key_target: schema.foreign_key_table,
            interface: meta.interface,
            special: meta.special,
            options: meta.options,
            nested,
        }
    }
}

/// Extract repeater sub-fields from an options payload
fn nested_fields(options: Option<&serde_json::Value>) -> Option<Vec<FieldDescriptor>> {
    let raw = options?.get("fields")?.clone();
    let nested: Vec<RawNestedField> = serde_json::from_value(raw).ok()?;

    Some(
        nested
            .into_iter()
            .map(|n| {
                let meta = n.meta.unwrap_or_default();
                FieldDescriptor {
                    name: n.field,
                    raw_type: n.raw_type,
                    nullable: false,
                    required: meta.required.unwrap_or(false),
                    primary_key: false,
                    foreign_key_target: None,
                    interface: meta.interface,
                    special: meta.special,
                    options: meta.options,
                    nested: None,
                }
            })
            .collect(),
    )
}

impl RawRelation {
    fn into_record(self) -> Option<RelationshipRecord> {
        // Polymorphic relations name no single related collection
        let related = self.related_collection?;
        let meta = self.meta.unwrap_or_default();
        let junction = meta.junction_field.is_some().then(|| self.collection.clone());

        Some(RelationshipRecord {
            one: RelationSide::new(related, meta.one_field.as_deref()),
            many: RelationSide::new(self.collection, Some(&self.field)),
            junction,
        })
    }
}

// =============================================================================
// Snapshot Source
// =============================================================================

/// Metadata served from a schema snapshot held in memory
#[derive(Debug, Default)]
pub struct SnapshotSource {
    collections: Vec<CollectionInfo>,
    fields: HashMap<String, Vec<FieldDescriptor>>,
    relations: Vec<RelationshipRecord>,
}

impl SnapshotSource {
    /// Load from a snapshot file or a directory of snapshot fragments
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.is_dir() {
            Self::from_directory(path)
        } else {
            let content = fs::read_to_string(path)?;
            Self::from_json(&content)
        }
    }

    /// Parse a single snapshot document
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// Merge every `*.json` fragment under a directory, in path order
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let mut paths: Vec<_> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let mut merged = RawSnapshot::default();
        for path in paths {
            debug!(path = %path.display(), "loading snapshot fragment");
            let content = fs::read_to_string(&path)?;
            let part: RawSnapshot = serde_json::from_str(&content)?;
            merged.collections.extend(part.collections);
            merged.fields.extend(part.fields);
            merged.relations.extend(part.relations);
        }

        Ok(Self::from_raw(merged))
    }

    fn from_raw(raw: RawSnapshot) -> Self {
        let mut seen = BTreeSet::new();
        let collections = raw
            .collections
            .into_iter()
            .filter(|c| c.schema.as_ref().map(|s| !s.is_null()).unwrap_or(false))
            .filter(|c| seen.insert(c.collection.clone()))
            .map(|c| CollectionInfo {
                namespaced: is_system_collection(&c.collection),
                name: c.collection,
            })
            .collect();

        let mut fields: HashMap<String, Vec<FieldDescriptor>> = HashMap::new();
        for field in raw.fields {
            fields
                .entry(field.collection.clone())
                .or_default()
                .push(field.into_descriptor());
        }

        let relations = raw
            .relations
            .into_iter()
            .filter_map(RawRelation::into_record)
            .collect();

        Self {
            collections,
            fields,
            relations,
        }
    }
}

impl MetadataSource for SnapshotSource {
    fn collections(&self) -> Result<Vec<CollectionInfo>> {
        Ok(self.collections.clone())
    }

    fn fields(&self, collection: &str) -> Result<Vec<FieldDescriptor>> {
        self.fields
            .get(collection)
            .cloned()
            .ok_or_else(|| GenError::CollectionNotFound(collection.to_string()))
    }

    fn relations(&self) -> Result<Vec<RelationshipRecord>> {
        Ok(self.relations.clone())
    }
}
