//! End-to-end Generation Tests
//!
//! Runs the whole pipeline against a schema snapshot fixture and checks the
//! rendered output tree.

use std::path::PathBuf;

use directus_typegen::output::SharedSource;
use directus_typegen::{
    is_circular_dependency, EmitMode, Generation, Generator, SnapshotSource, TypegenConfig,
};
use tempfile::TempDir;

const SNAPSHOT: &str = include_str!("fixtures/snapshot.json");

fn source() -> SnapshotSource {
    SnapshotSource::from_json(SNAPSHOT).unwrap()
}

fn generate(source: &SnapshotSource) -> Generation {
    Generator::new(source).generate().unwrap()
}

fn file<'a>(generation: &'a Generation, path: &str) -> &'a str {
    generation
        .files
        .iter()
        .find(|f| f.path == PathBuf::from(path))
        .map(|f| f.content.as_str())
        .unwrap_or_else(|| panic!("no file {}", path))
}

// =============================================================================
// Run Shape
// =============================================================================

#[test]
fn test_file_list() {
    let source = source();
    let generation = generate(&source);

    let paths: Vec<PathBuf> = generation.files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("shared.ts"),
            PathBuf::from("articles.ts"),
            PathBuf::from("authors.ts"),
            PathBuf::from("system/directus-users.ts"),
            PathBuf::from("pages.ts"),
            PathBuf::from("settings.ts"),
        ]
    );
}

#[test]
fn test_failing_entities_are_isolated() {
    let source = source();
    let generation = generate(&source);

    let skipped: Vec<&str> = generation.skipped.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(skipped, vec!["legacy_imports", "archived"]);
    assert!(generation.skipped[0].reason.contains("duplicate field 'name'"));

    assert!(generation.artifacts.get("legacy_imports").is_none());
    assert!(!generation.graph.nodes().contains("LegacyImport"));
    assert!(generation
        .files
        .iter()
        .all(|f| !f.content.contains("LegacyImport") && !f.content.contains("Archived")));

    // Links to a skipped entity fall back to the plain key
    let articles = file(&generation, "articles.ts");
    assert!(articles.contains("    legacy_source: z.union([z.string(), z.number()]).nullable().optional(),\n"));
    assert!(articles.contains("  legacy_source?: string | number | null;\n"));
    assert!(!generation.graph.references("Article").unwrap().contains("LegacyImport"));
}

// =============================================================================
// Cycles
// =============================================================================

#[test]
fn test_mutual_reference_is_deferred() {
    let source = source();
    let generation = generate(&source);

    assert!(is_circular_dependency("Article", "Author", &generation.cycles));
    assert_eq!(
        generation.cycles.iter().cloned().collect::<Vec<_>>(),
        vec![vec!["Article".to_string(), "Author".to_string(), "Article".to_string()]]
    );
    assert_eq!(generation.graph.scc_groups().len(), 1);

    assert_eq!(generation.artifacts.get("articles").unwrap().mode, EmitMode::Deferred);
    assert_eq!(generation.artifacts.get("authors").unwrap().mode, EmitMode::Deferred);
    assert_eq!(generation.artifacts.get("pages").unwrap().mode, EmitMode::Direct);

    let articles = file(&generation, "articles.ts");
    assert!(articles.contains(
        "export const ArticleSchema: z.ZodType<Article> = z.lazy(() =>\n  z.object({\n    id: z.number().int(),\n    title: z.string(),\n"
    ));
    assert!(articles.contains(
        "    author: z.union([z.string(), z.number(), AuthorSchema]).nullable().optional(),\n"
    ));
    assert!(articles
        .contains("export const ArticleGetSchema: z.ZodType<ArticleGet> = z.lazy(() => ArticleSchema);\n"));

    let authors = file(&generation, "authors.ts");
    assert!(authors.starts_with(
        "import { z } from \"zod\";\nimport { ArticleSchema, type Article } from \"./articles\";\n\n"
    ));
    assert!(authors.contains("export const AuthorSchema: z.ZodType<Author> = z.lazy(() =>\n"));
}

#[test]
fn test_self_reference_is_not_a_cycle() {
    let source = source();
    let generation = generate(&source);

    assert!(!generation.cycles.contains("Page"));
    assert!(!generation.graph.contains_key("Page"));

    let pages = file(&generation, "pages.ts");
    assert!(pages.starts_with("import { z } from \"zod\";\n\nexport const PageSchema: z.ZodType<Page> = z.object({\n"));
    assert!(pages.contains(
        "  parent: z.union([z.string(), z.number(), z.lazy(() => PageSchema)]).nullable().optional(),\n"
    ));
    assert!(pages.contains("  parent?: string | number | Page | null;\n"));
}

// =============================================================================
// Imports
// =============================================================================

#[test]
fn test_article_header() {
    let source = source();
    let generation = generate(&source);

    let articles = file(&generation, "articles.ts");
    let expected = "import { z } from \"zod\";\n\
        import { DirectusImageFileSchema, type DirectusImageFile } from \"./shared\";\n\
        import { AuthorSchema, type Author } from \"./authors\";\n\
        import { DirectusUserSchema, type DirectusUser } from \"./system/directus-users\";\n\
        \n";
    assert!(articles.starts_with(expected), "{}", articles);
}

#[test]
fn test_excluding_system_collections_drops_their_links() {
    let source = source();
    let generation = Generator::new(&source).include_system(false).generate().unwrap();

    assert!(generation.artifacts.get("directus_users").is_none());
    let articles = file(&generation, "articles.ts");
    assert!(!articles.contains("./system/directus-users"));
    assert!(articles.contains("    editor: z.union([z.string(), z.number()]).nullable().optional(),\n"));
}

// =============================================================================
// Variants
// =============================================================================

#[test]
fn test_variant_field_lists() {
    let source = source();
    let generation = generate(&source);
    let articles = file(&generation, "articles.ts");

    // Presentation fields never reach the output
    assert!(!articles.contains("divider"));

    assert!(articles.contains("export type ArticleCreate = {\n  title: string;\n  status?:"));
    assert!(!articles
        .split("export type ArticleCreate")
        .nth(1)
        .unwrap()
        .split("export type ArticleUpdate")
        .next()
        .unwrap()
        .contains("date_created"));
    assert!(articles.contains("export type ArticleUpdate = {\n  id: number;\n  title?: string;\n"));
    assert!(articles.contains("export type ArticleGet = Article;\n"));
}

#[test]
fn test_field_kinds_render() {
    let source = source();
    let generation = generate(&source);

    let articles = file(&generation, "articles.ts");
    assert!(articles.contains("status: z.enum([\"draft\", \"published\"]).nullable().optional(),"));
    assert!(articles.contains("hero_image: z.union([z.string(), DirectusImageFileSchema]).nullable().optional(),"));
    assert!(articles.contains("date_created: z.string().datetime({ offset: true }).nullable().optional(),"));

    let pages = file(&generation, "pages.ts");
    assert!(pages.contains(
        "links: z.array(z.object({ url: z.string(), label: z.string().optional() })).nullable().optional(),"
    ));

    let settings = file(&generation, "settings.ts");
    assert!(settings.contains("export const SettingSchema = z.object({\n  id: z.union([z.string(), z.number()]).optional(),\n"));
    assert!(settings.contains("  theme: z.enum([\"light\", \"dark\"]).optional(),\n"));
    assert!(settings.contains("  keywords: z.array(z.string()).nullable().optional(),\n"));
}

// =============================================================================
// Shared Module
// =============================================================================

#[test]
fn test_shared_module_reflects_file_collection() {
    let source = source();
    let generation = generate(&source);

    assert_eq!(generation.shared.source, SharedSource::Dynamic);
    assert_eq!(generation.shared.fields.len(), 3);

    let shared = file(&generation, "shared.ts");
    assert!(shared.contains("  uploaded_by: z.union([z.string(), z.number()]).nullable().optional(),\n"));
    assert!(!shared.contains("./system"));
}

#[test]
fn test_shared_module_fallback() {
    let snapshot = r#"{ "collections": [ { "collection": "notes", "schema": {} } ],
        "fields": [ { "collection": "notes", "field": "body", "type": "text" } ] }"#;
    let source = SnapshotSource::from_json(snapshot).unwrap();
    let generation = generate(&source);

    assert_eq!(generation.shared.source, SharedSource::Fallback);
    assert!(file(&generation, "shared.ts").contains("  filename_download: z.string(),\n"));
}

// =============================================================================
// Options and Writing
// =============================================================================

#[test]
fn test_types_only_output() {
    let source = source();
    let mut config = TypegenConfig::default();
    config.output.validators = false;
    let generation = Generator::from_config(&source, &config).generate().unwrap();

    for rendered in &generation.files {
        assert!(!rendered.content.contains("from \"zod\""), "{}", rendered.path.display());
        assert!(!rendered.content.contains("export const"));
    }
    assert!(file(&generation, "authors.ts").starts_with("import type { Article } from \"./articles\";\n\n"));
}

#[test]
fn test_write_tree() {
    let dir = TempDir::new().unwrap();
    let source = source();
    let generation = generate(&source);

    let written = generation.write(dir.path()).unwrap();
    assert_eq!(written.len(), generation.files.len());
    assert!(dir.path().join("shared.ts").exists());
    assert!(dir.path().join("system").join("directus-users.ts").exists());

    let on_disk = std::fs::read_to_string(dir.path().join("articles.ts")).unwrap();
    assert_eq!(on_disk, file(&generation, "articles.ts"));
}

#[test]
fn test_snapshot_fragments_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("a-collections.json"),
        r#"{ "collections": [ { "collection": "notes", "schema": {} } ] }"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("b-fields.json"),
        r#"{ "fields": [ { "collection": "notes", "field": "id", "type": "integer",
             "meta": { "required": true }, "schema": { "is_nullable": false } } ] }"#,
    )
    .unwrap();

    let source = SnapshotSource::from_path(dir.path()).unwrap();
    let generation = generate(&source);
    assert!(file(&generation, "notes.ts").contains("export const NoteSchema = z.object({\n  id: z.number().int(),\n"));
}

#[test]
fn test_dot_export() {
    let source = source();
    let dot = generate(&source).graph.to_dot();
    assert!(dot.starts_with("digraph EntityGraph {"));
    assert!(dot.contains("\"Article\" -> \"Author\";"));
    assert!(dot.contains("\"Author\" -> \"Article\";"));
}
