//! Directus Type Generator
//!
//! Turns Directus collection metadata into one TypeScript module per
//! collection, each holding Zod validators and static types for four
//! variants of the entity (base, create, update, get).
//!
//! ## Pipeline
//!
//! ```text
//! metadata ──► classify ──► resolve relations ──► EntityModel
//!                                                     │
//!        first pass (parallel, one artifact per entity)
//!                                                     │
//!              dependency graph ──► cycles ──► second pass (deferred)
//!                                                     │
//!                        imports ──► files ──► output tree
//! ```
//!
//! ## Output
//!
//! ```text
//! generated/
//! ├── shared.ts              DirectusFile, DirectusImageFile
//! ├── blog-posts.ts
//! ├── authors.ts
//! └── system/
//!     └── directus-users.ts
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod plan;

pub use codegen::{emit_entity, ArtifactSet, EmitMode, EmitOptions, GeneratedArtifact};
pub use config::TypegenConfig;
pub use error::{GenError, Result};
pub use graph::{detect_circular_dependencies, is_circular_dependency, CycleSet, DependencyGraph};
pub use metadata::{MetadataSource, SnapshotSource};
pub use output::{OutputLayout, RenderedFile, SharedModule};
pub use pipeline::{Generation, Generator, SkippedEntity};
