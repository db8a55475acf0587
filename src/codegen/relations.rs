//! Relationship Resolution
//!
//! Finds the target collection of a relation field. The relationship records
//! are loaded once per run into a [`RelationshipIndex`] and shared read-only
//! by every entity's emission.

use crate::codegen::classify::{classify, Cardinality, FieldKind, RelationHints};
use crate::codegen::names::pluralize_segment;
use crate::metadata::{FieldDescriptor, RelationshipRecord};

/// Immutable view over the backend's relationship records
#[derive(Debug, Clone, Default)]
pub struct RelationshipIndex {
    records: Vec<RelationshipRecord>,
}

impl RelationshipIndex {
    pub fn new(records: Vec<RelationshipRecord>) -> Self {
        Self { records }
    }

    /// Index with no records; lookups always miss
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record lookup for `entity.field`, returning the other side
    pub fn lookup(&self, entity: &str, field: &str) -> Option<&str> {
        // One side matches: the many side holds the rows
        if let Some(record) = self
            .records
            .iter()
            .find(|r| r.one.is(entity, field) && r.many.entity != entity)
        {
            return Some(&record.many.entity);
        }

        if let Some(record) = self
            .records
            .iter()
            .find(|r| r.many.is(entity, field) && r.one.entity != entity)
        {
            return Some(&record.one.entity);
        }

        self.records
            .iter()
            .find(|r| r.junction.as_deref() == Some(entity))
            .map(|r| {
                if r.one.entity != entity {
                    r.one.entity.as_str()
                } else {
                    r.many.entity.as_str()
                }
            })
    }

    /// Resolve the raw target collection of a relation field.
    ///
    /// Strategies, first match wins: foreign key (to-one only), option hints,
    /// relationship records, field name heuristic.
    pub fn resolve(
        &self,
        field: &FieldDescriptor,
        cardinality: Cardinality,
        hints: &RelationHints,
        current_entity: &str,
    ) -> Option<String> {
        if cardinality == Cardinality::ToOne {
            if let Some(target) = field.foreign_key_target.as_deref().filter(|t| !t.is_empty()) {
                return Some(target.to_string());
            }
        }

        if let Some(hint) = hints.first() {
            return Some(hint.to_string());
        }

        if let Some(target) = self.lookup(current_entity, &field.name) {
            return Some(target.to_string());
        }

        heuristic_target(&field.name)
    }
}

/// Resolve the target of any field; `None` for non-relation kinds.
pub fn resolve_target(
    field: &FieldDescriptor,
    current_entity: &str,
    index: &RelationshipIndex,
) -> Option<String> {
    match classify(field) {
        FieldKind::Relation { cardinality, hints } => {
            index.resolve(field, cardinality, &hints, current_entity)
        }
        _ => None,
    }
}

/// `blog_author` → `authors`, `mainImage` → `images`, `owner` → `owners`
fn heuristic_target(field_name: &str) -> Option<String> {
    let tail = trailing_segment(field_name);
    if tail.is_empty() {
        return None;
    }
    Some(pluralize_segment(tail))
}

/// Text after the last underscore or lower→upper boundary
fn trailing_segment(name: &str) -> &str {
    let underscore = name.rfind('_').map(|i| i + 1);
    let camel = name
        .char_indices()
        .zip(name.chars().skip(1))
        .filter(|((_, a), b)| a.is_lowercase() && b.is_uppercase())
        .map(|((i, a), _)| i + a.len_utf8())
        .last();

    let start = underscore.max(camel).unwrap_or(0);
    &name[start..]
}
