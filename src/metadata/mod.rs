//! Backend Metadata
//!
//! Descriptors for collections, fields and relations as delivered by the
//! metadata provider. Descriptors are plain values: they are built once by a
//! [`MetadataSource`], handed to the emitter, and dropped after the entity's
//! artifact exists.

pub mod snapshot;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::Result;

pub use snapshot::SnapshotSource;

/// Name of the identifier field every entity is expected to carry
pub const IDENTIFIER_FIELD: &str = "id";

/// Raw type assigned to the synthetic identifier (string or number key)
pub const SYNTHETIC_IDENTIFIER_TYPE: &str = "identifier";

/// Reserved prefix for backend-internal collections
pub const SYSTEM_PREFIX: &str = "directus_";

// =============================================================================
// Field Descriptor
// =============================================================================

/// A single field of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name (unique within its collection)
    pub name: String,

    /// Backend data type (`string`, `integer`, `uuid`, `alias`, ...)
    pub raw_type: String,

    /// Whether the column accepts null
    #[serde(default)]
    pub nullable: bool,

    /// Whether a value must be provided
    #[serde(default)]
    pub required: bool,

    /// Whether this is the primary key
    #[serde(default)]
    pub primary_key: bool,

    /// Collection referenced by a database-level foreign key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key_target: Option<String>,

    /// Interface tag used by the admin app (`select-dropdown`, `tags`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,

    /// Special tags (`m2o`, `file`, `cast-json`, `date-created`, ...)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub special: BTreeSet<String>,

    /// Interface options payload, interpreted by the classifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,

    /// Sub-fields of composite (repeater) fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Vec<FieldDescriptor>>,
}

impl FieldDescriptor {
    /// Create a plain field with the given name and raw type
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            nullable: false,
            required: false,
            primary_key: false,
            foreign_key_target: None,
            interface: None,
            special: BTreeSet::new(),
            options: None,
            nested: None,
        }
    }

    /// The optional identifier inserted into entities that lack one
    pub fn synthetic_identifier() -> Self {
        let mut field = Self::new(IDENTIFIER_FIELD, SYNTHETIC_IDENTIFIER_TYPE);
        field.primary_key = true;
        field
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    pub fn with_special(mut self, tag: impl Into<String>) -> Self {
        self.special.insert(tag.into());
        self
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_foreign_key(mut self, target: impl Into<String>) -> Self {
        self.foreign_key_target = Some(target.into());
        self
    }

    pub fn with_nested(mut self, fields: Vec<FieldDescriptor>) -> Self {
        self.nested = Some(fields);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Check for a special tag
    pub fn has_special(&self, tag: &str) -> bool {
        self.special.contains(tag)
    }

    /// Interface tag, or "" when absent
    pub fn interface_tag(&self) -> &str {
        self.interface.as_deref().unwrap_or("")
    }

    /// Look up a string entry in the options payload
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|o| o.get(key))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn is_identifier(&self) -> bool {
        self.name == IDENTIFIER_FIELD
    }
}

// =============================================================================
// Entity Descriptor
// =============================================================================

/// A collection and its ordered field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Raw collection name as known to the backend
    pub name: String,

    /// Fields in emission order
    pub fields: Vec<FieldDescriptor>,

    /// Reserved-prefix collection, routed to the system output folder
    #[serde(default)]
    pub namespaced: bool,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        let name = name.into();
        let namespaced = is_system_collection(&name);
        Self { name, fields, namespaced }
    }
}

/// Whether a raw collection name is reserved for backend internals
pub fn is_system_collection(name: &str) -> bool {
    name.starts_with(SYSTEM_PREFIX)
}

// =============================================================================
// Relationship Record
// =============================================================================

/// One end of a relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSide {
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl RelationSide {
    pub fn new(entity: impl Into<String>, field: Option<&str>) -> Self {
        Self {
            entity: entity.into(),
            field: field.map(str::to_string),
        }
    }

    /// Does this side name exactly this entity + field?
    pub fn is(&self, entity: &str, field: &str) -> bool {
        self.entity == entity && self.field.as_deref() == Some(field)
    }
}

/// A backend-declared link between two collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// The "one" side (collection holding the alias field)
    pub one: RelationSide,
    /// The "many" side (collection holding the foreign key)
    pub many: RelationSide,
    /// Intermediate linking collection of a many-to-many
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junction: Option<String>,
}

// =============================================================================
// Metadata Source
// =============================================================================

/// Summary of a collection known to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub namespaced: bool,
}

/// The external metadata provider.
///
/// Implementations own transport concerns; the generator only consumes the
/// structured descriptors.
pub trait MetadataSource: Sync {
    /// Ordered list of collections to generate
    fn collections(&self) -> Result<Vec<CollectionInfo>>;

    /// Ordered field list of one collection
    fn fields(&self, collection: &str) -> Result<Vec<FieldDescriptor>>;

    /// Flat list of every relationship
    fn relations(&self) -> Result<Vec<RelationshipRecord>>;

    /// Fetch a collection as a full descriptor
    fn entity(&self, info: &CollectionInfo) -> Result<EntityDescriptor> {
        let fields = self.fields(&info.name)?;
        Ok(EntityDescriptor {
            name: info.name.clone(),
            fields,
            namespaced: info.namespaced,
        })
    }
}
