//! Shared Definitions Module
//!
//! `DirectusFile` and `DirectusImageFile`, referenced by every file field.
//! Built from the backend's file collection when its fields can be fetched,
//! otherwise from a fixed field set.

use tracing::info;

use crate::codegen::fields::{emit_field, FILES_COLLECTION};
use crate::codegen::{
    typescript, zod, EmitContext, EmitOptions, EmittedField, EntityIndex, RelationshipIndex,
    SharedDef,
};
use crate::metadata::{FieldDescriptor, MetadataSource};

use super::{assemble, OutputLayout, RenderedFile};

/// Field set used when the file collection is unavailable
const FALLBACK_FIELDS: &[(&str, &str, bool)] = &[
    ("id", "uuid", true),
    ("storage", "string", true),
    ("filename_disk", "string", false),
    ("filename_download", "string", true),
    ("title", "string", false),
    ("type", "string", false),
    ("folder", "uuid", false),
    ("uploaded_by", "uuid", false),
    ("uploaded_on", "timestamp", false),
    ("modified_by", "uuid", false),
    ("modified_on", "timestamp", false),
    ("filesize", "bigInteger", false),
    ("width", "integer", false),
    ("height", "integer", false),
    ("duration", "integer", false),
    ("description", "text", false),
    ("location", "text", false),
    ("tags", "json", false),
    ("metadata", "json", false),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedSource {
    /// Reflects the backend's actual file fields
    Dynamic,
    Fallback,
}

/// The shared module's field list and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SharedModule {
    pub source: SharedSource,
    pub fields: Vec<EmittedField>,
}

impl SharedModule {
    /// Fetch the file collection's fields, falling back to the fixed set
    pub fn load(source: &dyn MetadataSource) -> Self {
        match source.fields(FILES_COLLECTION) {
            Ok(fields) if !fields.is_empty() => Self::from_fields(&fields),
            Ok(_) => {
                info!("file collection has no fields, using fallback shared definitions");
                Self::fallback()
            }
            Err(e) => {
                info!(error = %e, "file collection unavailable, using fallback shared definitions");
                Self::fallback()
            }
        }
    }

    /// Build from the file collection's descriptors. Relations are kept as
    /// plain keys so the module imports nothing but the validation library.
    pub fn from_fields(fields: &[FieldDescriptor]) -> Self {
        let relations = RelationshipIndex::empty();
        let entities = EntityIndex::default();
        let ctx = EmitContext {
            relations: &relations,
            entities: &entities,
        };

        let fields = fields
            .iter()
            .filter_map(|f| emit_field(f, FILES_COLLECTION, SharedDef::File.type_name(), &ctx))
            .map(|f| f.retain_links(&|_| false))
            .collect();

        Self {
            source: SharedSource::Dynamic,
            fields,
        }
    }

    pub fn fallback() -> Self {
        let descriptors: Vec<FieldDescriptor> = FALLBACK_FIELDS
            .iter()
            .map(|(name, raw_type, required)| {
                let field = FieldDescriptor::new(*name, *raw_type);
                if *required {
                    field.required()
                } else {
                    field.nullable()
                }
            })
            .collect();

        Self {
            source: SharedSource::Fallback,
            ..Self::from_fields(&descriptors)
        }
    }

    /// Render `shared.ts`
    pub fn render(&self, layout: &OutputLayout, options: EmitOptions) -> RenderedFile {
        let file = SharedDef::File;
        let image = SharedDef::ImageFile;

        let mut header = Vec::new();
        let mut blocks = Vec::new();

        if options.validators {
            header.push(zod::IMPORT_LINE.to_string());
            blocks.push(format!(
                "export const {} = {};\n\n\
                 export const {} = {}.extend({{\n  \
                 type: z.string().startsWith(\"image/\"),\n  \
                 width: z.number().int().nullable(),\n  \
                 height: z.number().int().nullable(),\n\
                 }});\n",
                file.schema_name(),
                zod::object_expr(&self.fields, ""),
                image.schema_name(),
                file.schema_name(),
            ));
        }

        if options.types {
            blocks.push(format!(
                "export type {} = {};\n\n\
                 export type {} = {} & {{\n  \
                 type: string;\n  \
                 width: number | null;\n  \
                 height: number | null;\n\
                 }};\n",
                file.type_name(),
                typescript::object_type(&self.fields),
                image.type_name(),
                file.type_name(),
            ));
        }

        let blocks: Vec<&str> = blocks.iter().map(String::as_str).collect();
        RenderedFile {
            path: layout.shared_path(),
            content: assemble(&header, &blocks),
        }
    }
}
