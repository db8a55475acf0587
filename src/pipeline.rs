//! Generation Pipeline
//!
//! Orchestrates one run. Two barriers hold:
//! 1. relationship records are loaded before any field is resolved and are
//!    read-only afterwards;
//! 2. graph, cycles and the second pass start only after every entity's
//!    first-pass artifact exists.
//!
//! Entities are emitted in parallel between the barriers. A failing entity is
//! skipped and leaves no trace in the artifacts, the graph or the output:
//! links to it from other entities are lowered to plain keys before the
//! graph is built.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::codegen::fields::FILES_COLLECTION;
use crate::codegen::{
    emit_entity, entity_type_name, ArtifactSet, EmitContext, EmitOptions, EntityIndex,
    GeneratedArtifact, RelationshipIndex,
};
use crate::config::TypegenConfig;
use crate::error::Result;
use crate::graph::{detect_circular_dependencies, CycleSet, DependencyGraph};
use crate::metadata::{CollectionInfo, MetadataSource, SYSTEM_PREFIX};
use crate::output::{render_all, write_files, OutputLayout, RenderedFile, SharedModule};
use crate::plan::{drop_missing_targets, plan_second_pass};

/// An entity left out of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntity {
    pub name: String,
    pub reason: String,
}

/// Result of a run, before anything touches the disk
#[derive(Debug, Clone)]
pub struct Generation {
    /// Final artifacts (second pass applied)
    pub artifacts: ArtifactSet,
    pub graph: DependencyGraph,
    pub cycles: CycleSet,
    pub shared: SharedModule,
    pub skipped: Vec<SkippedEntity>,
    /// Shared module first, then one file per entity
    pub files: Vec<RenderedFile>,
}

impl Generation {
    /// Write every rendered file under `root`
    pub fn write(&self, root: &Path) -> Result<Vec<PathBuf>> {
        write_files(root, &self.files)
    }
}

/// Runs the pipeline against a metadata source
pub struct Generator<'a> {
    source: &'a dyn MetadataSource,
    options: EmitOptions,
    layout: OutputLayout,
    include_system: bool,
    system_prefix: String,
}

impl<'a> Generator<'a> {
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self {
            source,
            options: EmitOptions::default(),
            layout: OutputLayout::default(),
            include_system: true,
            system_prefix: SYSTEM_PREFIX.to_string(),
        }
    }

    pub fn from_config(source: &'a dyn MetadataSource, config: &TypegenConfig) -> Self {
        Self::new(source)
            .with_options(config.emit_options())
            .with_layout(config.layout())
            .include_system(config.output.include_system)
            .with_system_prefix(&config.naming.system_prefix)
    }

    pub fn with_options(mut self, options: EmitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn include_system(mut self, include: bool) -> Self {
        self.include_system = include;
        self
    }

    pub fn with_system_prefix(mut self, prefix: &str) -> Self {
        self.system_prefix = prefix.to_string();
        self
    }

    /// Run every step up to, not including, writing
    pub fn generate(&self) -> Result<Generation> {
        // Barrier 1: relationship records
        let relations = match self.source.relations() {
            Ok(records) => RelationshipIndex::new(records),
            Err(e) => {
                warn!(error = %e, "relationship records unavailable, resolving without them");
                RelationshipIndex::empty()
            }
        };
        debug!(records = relations.len(), "relationship index loaded");

        let collections = self.collections()?;
        let entities = EntityIndex::from_collections(&collections);

        // A collection whose type name is already taken is never emitted
        let mut skipped = Vec::new();
        let collections: Vec<CollectionInfo> = collections
            .into_iter()
            .filter(|info| {
                let type_name = entity_type_name(&info.name);
                match entities.get(&type_name) {
                    Some(owner) if owner.raw_name != info.name => {
                        skipped.push(SkippedEntity {
                            name: info.name.clone(),
                            reason: format!(
                                "type name '{}' is already produced by '{}'",
                                type_name, owner.raw_name
                            ),
                        });
                        false
                    }
                    _ => true,
                }
            })
            .collect();

        let ctx = EmitContext {
            relations: &relations,
            entities: &entities,
        };

        // First pass, one independent unit per entity
        let results: Vec<(String, Result<GeneratedArtifact>)> = collections
            .par_iter()
            .map(|info| {
                let result = self
                    .source
                    .entity(info)
                    .and_then(|entity| emit_entity(&entity, &ctx, self.options));
                (info.name.clone(), result)
            })
            .collect();

        // Barrier 2: every first-pass artifact exists
        let mut first_pass = ArtifactSet::new();
        for (name, result) in results {
            match result {
                Ok(artifact) => first_pass.insert(artifact),
                Err(e) => {
                    warn!(entity = %name, error = %e, "skipping entity");
                    skipped.push(SkippedEntity {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let first_pass = drop_missing_targets(first_pass);
        let graph = DependencyGraph::from_artifacts(&first_pass);
        let cycles = detect_circular_dependencies(&graph);
        for group in graph.scc_groups() {
            info!(members = ?group.members, "circular reference group");
        }

        let artifacts = plan_second_pass(first_pass, &cycles);
        let shared = SharedModule::load(self.source);

        let mut files = vec![shared.render(&self.layout, self.options)];
        files.extend(render_all(&artifacts, &self.layout));

        info!(
            entities = artifacts.len(),
            skipped = skipped.len(),
            edges = graph.edge_count(),
            cycles = cycles.len(),
            "generation complete"
        );

        Ok(Generation {
            artifacts,
            graph,
            cycles,
            shared,
            skipped,
            files,
        })
    }

    /// Collections to generate, with the namespace flag from the configured
    /// prefix. The file collection is served by the shared module instead.
    fn collections(&self) -> Result<Vec<CollectionInfo>> {
        let collections = self
            .source
            .collections()?
            .into_iter()
            .filter(|c| c.name != FILES_COLLECTION)
            .map(|c| CollectionInfo {
                namespaced: c.name.starts_with(&self.system_prefix),
                name: c.name,
            })
            .filter(|c| self.include_system || !c.namespaced)
            .collect();
        Ok(collections)
    }
}
