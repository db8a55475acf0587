//! Emission Planning
//!
//! The second pass and import resolution. Both run after every first-pass
//! artifact exists and the cycle set is known.

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::codegen::fields::LinkTarget;
use crate::codegen::{
    to_kebab_case, ArtifactSet, EmitMode, GeneratedArtifact, Reference, Variant,
};
use crate::graph::CycleSet;
use crate::output::OutputLayout;

// =============================================================================
// Missing Targets
// =============================================================================

/// Lower links to entities that produced no artifact (skipped during the
/// first pass) to plain keys, so no file names a definition it cannot import.
pub fn drop_missing_targets(first_pass: ArtifactSet) -> ArtifactSet {
    let produced: BTreeSet<String> = first_pass
        .iter()
        .map(|artifact| artifact.type_name().to_string())
        .collect();
    let keep = |target: &LinkTarget| match target {
        LinkTarget::Entity(name) => produced.contains(name),
        LinkTarget::SelfRef(_) | LinkTarget::Shared(_) => true,
    };

    first_pass
        .into_iter()
        .map(|artifact| {
            let missing: Vec<String> = artifact
                .references()
                .into_iter()
                .filter_map(|reference| match reference {
                    Reference::Entity(name) if !produced.contains(&name) => Some(name),
                    _ => None,
                })
                .collect();
            if missing.is_empty() {
                return artifact;
            }

            warn!(
                entity = %artifact.entity(),
                targets = ?missing,
                "referenced entities were skipped, links lowered to keys"
            );
            let mode = artifact.mode;
            let options = artifact.options();
            GeneratedArtifact::render(artifact.model.retain_links(&keep), mode, options)
        })
        .collect()
}

// =============================================================================
// Second Pass
// =============================================================================

/// Replace every cyclic entity's artifact with a deferred one. Other
/// artifacts pass through unchanged.
pub fn plan_second_pass(first_pass: ArtifactSet, cycles: &CycleSet) -> ArtifactSet {
    first_pass
        .into_iter()
        .map(|artifact| {
            if cycles.contains(artifact.type_name()) {
                debug!(entity = %artifact.entity(), "re-emitting with deferred definitions");
                let options = artifact.options();
                GeneratedArtifact::render(artifact.model, EmitMode::Deferred, options)
            } else {
                artifact
            }
        })
        .collect()
}

// =============================================================================
// Imports
// =============================================================================

/// One `import` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLine {
    pub path: String,
    /// Runtime names (schemas)
    pub values: BTreeSet<String>,
    /// Type-only names
    pub types: BTreeSet<String>,
}

impl ImportLine {
    pub fn new(path: String) -> Self {
        Self {
            path,
            values: BTreeSet::new(),
            types: BTreeSet::new(),
        }
    }

    /// Add a definition's schema and type names, as far as each block exists
    fn add(&mut self, schema: &str, type_name: &str, with_values: bool, with_types: bool) {
        if with_values {
            self.values.insert(schema.to_string());
        }
        if with_types {
            self.types.insert(type_name.to_string());
        }
    }

    pub fn render(&self) -> String {
        if self.values.is_empty() {
            let names: Vec<&str> = self.types.iter().map(String::as_str).collect();
            return format!("import type {{ {} }} from \"{}\";", names.join(", "), self.path);
        }

        let names: Vec<String> = self
            .values
            .iter()
            .cloned()
            .chain(self.types.iter().map(|t| format!("type {}", t)))
            .collect();
        format!("import {{ {} }} from \"{}\";", names.join(", "), self.path)
    }
}

/// Import header of one output file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    /// Whether the validation library is needed
    pub validation_library: bool,
    pub shared: Option<ImportLine>,
    /// One line per distinct related entity, sorted by path
    pub entities: Vec<ImportLine>,
}

impl ImportPlan {
    pub fn is_empty(&self) -> bool {
        !self.validation_library && self.shared.is_none() && self.entities.is_empty()
    }
}

/// Path from one output file to another entity's file
pub fn import_path(
    current_namespaced: bool,
    target_namespaced: bool,
    target_stem: &str,
    layout: &OutputLayout,
) -> String {
    match (current_namespaced, target_namespaced) {
        (true, false) => format!("../{}", target_stem),
        (false, true) => format!("./{}/{}", layout.system_dir, target_stem),
        _ => format!("./{}", target_stem),
    }
}

/// Path from an output file to the shared module
pub fn shared_import_path(current_namespaced: bool, layout: &OutputLayout) -> String {
    if current_namespaced {
        format!("../{}", layout.shared_module)
    } else {
        format!("./{}", layout.shared_module)
    }
}

/// Plan the import header of a final artifact
pub fn plan_imports(
    artifact: &GeneratedArtifact,
    artifacts: &ArtifactSet,
    layout: &OutputLayout,
) -> ImportPlan {
    let with_values = artifact.validator.is_some();
    let with_types = artifact.types.is_some();

    let mut shared_defs = BTreeSet::new();
    let mut targets = BTreeSet::new();
    for reference in artifact.references() {
        match reference {
            Reference::Shared(def) => {
                shared_defs.insert(def);
            }
            Reference::Entity(name) if name != artifact.type_name() => {
                targets.insert(name);
            }
            Reference::Entity(_) => {}
        }
    }

    let shared = (!shared_defs.is_empty()).then(|| {
        let mut line = ImportLine::new(shared_import_path(artifact.namespaced(), layout));
        for def in &shared_defs {
            line.add(def.schema_name(), def.type_name(), with_values, with_types);
        }
        line
    });

    let mut entities = Vec::new();
    for name in targets {
        let Some(target) = artifacts.by_type_name(&name) else {
            warn!(
                entity = %artifact.entity(),
                target = %name,
                "referenced entity has no artifact, import skipped"
            );
            continue;
        };
        let mut line = ImportLine::new(import_path(
            artifact.namespaced(),
            target.namespaced(),
            &to_kebab_case(target.entity()),
            layout,
        ));
        line.add(&Variant::Base.schema_name(&name), &name, with_values, with_types);
        entities.push(line);
    }
    entities.sort_by(|a, b| a.path.cmp(&b.path));

    ImportPlan {
        validation_library: with_values,
        shared,
        entities,
    }
}
