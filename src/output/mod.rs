//! Output Organization
//!
//! Maps final artifacts to paths under the output root, renders each file in
//! a fixed byte order and writes the tree:
//!
//! ```text
//! import { z } from "zod";                      (only with a validator block)
//! import { ... } from "./shared";               (only if referenced)
//! import { ... } from "./<entity>";             (one per related entity)
//!
//! <validator block>
//!
//! <type block>
//! ```

pub mod shared;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::codegen::{to_kebab_case, zod, ArtifactSet, GeneratedArtifact};
use crate::error::{GenError, Result};
use crate::plan::plan_imports;

pub use shared::{SharedModule, SharedSource};

/// File extension of generated modules
pub const EXTENSION: &str = "ts";

/// Where files go relative to the output root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLayout {
    /// Subfolder for namespaced (system) entities
    pub system_dir: String,

    /// Stem of the shared definitions module
    pub shared_module: String,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            system_dir: "system".to_string(),
            shared_module: "shared".to_string(),
        }
    }
}

impl OutputLayout {
    /// Relative path of an entity's file
    pub fn entity_path(&self, raw_name: &str, namespaced: bool) -> PathBuf {
        let file = format!("{}.{}", to_kebab_case(raw_name), EXTENSION);
        if namespaced {
            Path::new(&self.system_dir).join(file)
        } else {
            PathBuf::from(file)
        }
    }

    /// Relative path of the shared module
    pub fn shared_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.shared_module, EXTENSION))
    }
}

/// A file ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Relative to the output root
    pub path: PathBuf,
    pub content: String,
}

// =============================================================================
// Rendering
// =============================================================================

/// Render one entity's file
pub fn render_file(
    artifact: &GeneratedArtifact,
    artifacts: &ArtifactSet,
    layout: &OutputLayout,
) -> RenderedFile {
    let imports = plan_imports(artifact, artifacts, layout);

    let mut header = Vec::new();
    if imports.validation_library {
        header.push(zod::IMPORT_LINE.to_string());
    }
    if let Some(shared) = &imports.shared {
        header.push(shared.render());
    }
    header.extend(imports.entities.iter().map(|line| line.render()));

    let blocks: Vec<&str> = [artifact.validator.as_deref(), artifact.types.as_deref()]
        .into_iter()
        .flatten()
        .collect();

    RenderedFile {
        path: layout.entity_path(artifact.entity(), artifact.namespaced()),
        content: assemble(&header, &blocks),
    }
}

/// Header lines, one blank line, then blocks separated by blank lines
pub(crate) fn assemble(header: &[String], blocks: &[&str]) -> String {
    let mut content = String::new();
    for line in header {
        content.push_str(line);
        content.push('\n');
    }
    if !header.is_empty() && !blocks.is_empty() {
        content.push('\n');
    }
    content.push_str(&blocks.join("\n"));
    content
}

/// Render every entity's file, in entity order
pub fn render_all(artifacts: &ArtifactSet, layout: &OutputLayout) -> Vec<RenderedFile> {
    artifacts
        .iter()
        .map(|artifact| render_file(artifact, artifacts, layout))
        .collect()
}

// =============================================================================
// Writing
// =============================================================================

/// Write files under `root`, creating directories as needed. Returns the
/// written paths.
pub fn write_files(root: &Path, files: &[RenderedFile]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let escapes = file
            .path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(GenError::InvalidOutputPath(file.path.display().to_string()));
        }

        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &file.content)?;
        debug!(path = %path.display(), bytes = file.content.len(), "wrote file");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{emit_entity, EmitContext, EmitOptions, EntityIndex, RelationshipIndex};
    use crate::metadata::{CollectionInfo, EntityDescriptor, FieldDescriptor};
    use tempfile::TempDir;

    fn artifacts(options: EmitOptions) -> ArtifactSet {
        let entities = vec![
            EntityDescriptor::new(
                "blog_posts",
                vec![
                    FieldDescriptor::new("id", "integer").required(),
                    FieldDescriptor::new("author", "uuid").with_foreign_key("directus_users"),
                    FieldDescriptor::new("hero", "uuid").with_interface("file-image"),
                ],
            ),
            EntityDescriptor::new("directus_users", vec![FieldDescriptor::new("id", "uuid").required()]),
        ];
        let infos: Vec<CollectionInfo> = entities
            .iter()
            .map(|e| CollectionInfo { name: e.name.clone(), namespaced: e.namespaced })
            .collect();
        let index = EntityIndex::from_collections(&infos);
        let relations = RelationshipIndex::empty();
        let ctx = EmitContext { relations: &relations, entities: &index };
        entities
            .iter()
            .map(|e| emit_entity(e, &ctx, options).unwrap())
            .collect()
    }

    #[test]
    fn test_paths() {
        let layout = OutputLayout::default();
        assert_eq!(layout.entity_path("blog_posts", false), PathBuf::from("blog-posts.ts"));
        assert_eq!(
            layout.entity_path("directus_users", true),
            PathBuf::from("system/directus-users.ts")
        );
        assert_eq!(layout.shared_path(), PathBuf::from("shared.ts"));
    }

    #[test]
    fn test_byte_order() {
        let set = artifacts(EmitOptions::default());
        let file = render_file(set.get("blog_posts").unwrap(), &set, &OutputLayout::default());

        let expected_header = "import { z } from \"zod\";\n\
            import { DirectusImageFileSchema, type DirectusImageFile } from \"./shared\";\n\
            import { DirectusUserSchema, type DirectusUser } from \"./system/directus-users\";\n\
            \n\
            export const BlogPostSchema = z.object({\n";
        assert!(file.content.starts_with(expected_header), "{}", file.content);

        let validator_at = file.content.find("export const BlogPostSchema").unwrap();
        let types_at = file.content.find("export type BlogPost = {").unwrap();
        assert!(validator_at < types_at);
        assert!(file.content.contains("export const BlogPostGetSchema = BlogPostSchema;\n\nexport type BlogPost = {"));
    }

    #[test]
    fn test_types_only_file_has_no_validation_import() {
        let set = artifacts(EmitOptions { validators: false, types: true });
        let file = render_file(set.get("blog_posts").unwrap(), &set, &OutputLayout::default());

        assert!(!file.content.contains("from \"zod\""));
        assert!(file
            .content
            .starts_with("import type { DirectusImageFile } from \"./shared\";\n"));
    }

    #[test]
    fn test_write_files() {
        let dir = TempDir::new().unwrap();
        let set = artifacts(EmitOptions::default());
        let files = render_all(&set, &OutputLayout::default());

        let written = write_files(dir.path(), &files).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("blog-posts.ts").exists());
        assert!(dir.path().join("system").join("directus-users.ts").exists());

        let content = fs::read_to_string(dir.path().join("system/directus-users.ts")).unwrap();
        assert!(content.contains("export const DirectusUserSchema"));
    }

    #[test]
    fn test_write_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let files = vec![RenderedFile {
            path: PathBuf::from("../outside.ts"),
            content: String::new(),
        }];
        assert!(matches!(
            write_files(dir.path(), &files),
            Err(GenError::InvalidOutputPath(_))
        ));
    }
}
