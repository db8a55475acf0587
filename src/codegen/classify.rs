//! Field Classification
//!
//! Maps a [`FieldDescriptor`] to exactly one [`FieldKind`]. Each kind carries
//! its own typed options, parsed once here so emitters never inspect the raw
//! options payload.
//!
//! Predicates overlap (a `tags` interface on an `m2m` field, a `file` special
//! on an `m2o` field, ...). The fixed priority chain in [`classify`] is the
//! only disambiguation: interface hints are checked before generic special
//! tags because they are more specific.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metadata::{FieldDescriptor, SYNTHETIC_IDENTIFIER_TYPE};

// =============================================================================
// Field Kind
// =============================================================================

/// Closed set of field classifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Layout-only field (divider, notice); never emitted
    Presentation,
    File(FileKind),
    Relation {
        cardinality: Cardinality,
        hints: RelationHints,
    },
    Choice(ChoiceOptions),
    DateTime(TemporalKind),
    Autocomplete,
    Tag,
    /// Repeater with its reduced, scalar-only sub-fields
    Repeater(Vec<FieldDescriptor>),
    Scalar(ScalarKind),
    /// Unrecognized raw type; emitted as a permissive type
    Unknown,
}

impl FieldKind {
    /// Whether the field produces output at all
    pub fn is_emitted(&self) -> bool {
        !matches!(self, FieldKind::Presentation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Single,
    Multiple,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    ToOne,
    ToManyOrdered,
    ToManyUnordered,
    Polymorphic,
}

impl Cardinality {
    pub fn is_to_many(&self) -> bool {
        !matches!(self, Cardinality::ToOne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    String,
    Uuid,
    Integer,
    Float,
    /// Big integers and decimals, delivered as number or string
    Numeric,
    Boolean,
    Json,
    /// Comma separated values, delivered as a string list
    Csv,
    Geometry,
    /// String or number primary key
    Identifier,
}

// =============================================================================
// Relation Hints
// =============================================================================

/// Target hints found in a relation field's options payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationHints {
    pub junction_table: Option<String>,
    pub related_collection: Option<String>,
    pub junction_collection: Option<String>,
    pub collection: Option<String>,
    pub many_collection: Option<String>,
    pub one_collection: Option<String>,
}

impl RelationHints {
    pub fn from_field(field: &FieldDescriptor) -> Self {
        let get = |key: &str| field.option_str(key).map(str::to_string);
        Self {
            junction_table: get("junction_table"),
            related_collection: get("related_collection"),
            junction_collection: get("junction_collection"),
            collection: get("collection"),
            many_collection: get("many_collection"),
            one_collection: get("one_collection"),
        }
    }

    /// First hint in priority order
    pub fn first(&self) -> Option<&str> {
        [
            &self.junction_table,
            &self.related_collection,
            &self.junction_collection,
            &self.collection,
            &self.many_collection,
            &self.one_collection,
        ]
        .into_iter()
        .find_map(|h| h.as_deref())
    }
}

// =============================================================================
// Choice Options
// =============================================================================

/// How choice values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
}

impl ValueKind {
    fn for_raw_type(raw_type: &str) -> Self {
        match raw_type {
            "integer" | "bigInteger" | "float" | "decimal" => ValueKind::Number,
            "boolean" => ValueKind::Boolean,
            _ => ValueKind::String,
        }
    }
}

/// A single enumerated value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChoiceValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl ChoiceValue {
    /// Interpret a raw choice value for the given kind.
    ///
    /// Numbers fall back to a string literal when they do not parse; booleans
    /// are true only for `true` or `"true"`.
    pub fn parse(raw: &Value, kind: ValueKind) -> Self {
        let text = match raw {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        match kind {
            ValueKind::String => ChoiceValue::String(text),
            ValueKind::Number => match text.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => ChoiceValue::Number(n),
                _ => ChoiceValue::String(text),
            },
            ValueKind::Boolean => ChoiceValue::Boolean(text == "true"),
        }
    }
}

/// Parsed options of an enumerated field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOptions {
    pub values: Vec<ChoiceValue>,
    pub multiple: bool,
    pub value_kind: ValueKind,
}

impl ChoiceOptions {
    /// Parse `options.choices`, flattening nested `children` lists
    pub fn from_field(field: &FieldDescriptor, multiple: bool) -> Self {
        let value_kind = ValueKind::for_raw_type(&field.raw_type);
        let mut values = Vec::new();
        if let Some(choices) = raw_choices(field) {
            collect_choice_values(choices, value_kind, &mut values);
        }
        Self {
            values,
            multiple,
            value_kind,
        }
    }
}

fn raw_choices(field: &FieldDescriptor) -> Option<&Vec<Value>> {
    field.options.as_ref()?.get("choices")?.as_array()
}

fn collect_choice_values(choices: &[Value], kind: ValueKind, out: &mut Vec<ChoiceValue>) {
    for choice in choices {
        // Choices are either `{ text, value }` records or bare values
        let raw = match choice {
            Value::Object(map) => map.get("value"),
            other => Some(other),
        };
        if let Some(raw) = raw {
            let value = ChoiceValue::parse(raw, kind);
            if !out.contains(&value) {
                out.push(value);
            }
        }
        if let Some(children) = choice.get("children").and_then(|c| c.as_array()) {
            collect_choice_values(children, kind, out);
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

const PRESENTATION_INTERFACES: &[&str] = &["presentation-divider", "presentation-notice"];

/// Classify a field. Order matters; see the module docs.
pub fn classify(field: &FieldDescriptor) -> FieldKind {
    let interface = field.interface_tag();

    // 1. UI-only
    if PRESENTATION_INTERFACES.contains(&interface)
        || (field.raw_type == "alias" && field.has_special("no-data"))
    {
        return FieldKind::Presentation;
    }

    // 2. Files
    if let Some(kind) = file_kind(field) {
        return FieldKind::File(kind);
    }

    // 3. Interface-specific kinds, ahead of generic special tags
    if let Some(kind) = interface_kind(field) {
        return kind;
    }

    // 4. Relations
    if let Some(cardinality) = relation_cardinality(field) {
        return FieldKind::Relation {
            cardinality,
            hints: RelationHints::from_field(field),
        };
    }

    // 5. Enumerations driven by a raw options list
    if raw_choices(field).map(|c| !c.is_empty()).unwrap_or(false) {
        let multiple = interface.contains("multiple")
            || interface.contains("checkbox")
            || matches!(field.raw_type.as_str(), "json" | "csv");
        return FieldKind::Choice(ChoiceOptions::from_field(field, multiple));
    }

    // 6. Dates and times
    if let Some(kind) = temporal_kind(field) {
        return FieldKind::DateTime(kind);
    }

    // 7. Scalars
    scalar_kind(&field.raw_type)
        .map(FieldKind::Scalar)
        .unwrap_or(FieldKind::Unknown)
}

fn file_kind(field: &FieldDescriptor) -> Option<FileKind> {
    match field.interface_tag() {
        "file-image" => return Some(FileKind::Image),
        "files" => return Some(FileKind::Multiple),
        "file" => return Some(FileKind::Single),
        _ => {}
    }
    if field.has_special("files") {
        Some(FileKind::Multiple)
    } else if field.has_special("file") {
        Some(FileKind::Single)
    } else {
        None
    }
}

fn interface_kind(field: &FieldDescriptor) -> Option<FieldKind> {
    let kind = match field.interface_tag() {
        "select-radio" => choice_or_scalar(field, false),
        "select-multiple-dropdown" | "select-multiple-checkbox-tree" => {
            choice_or_scalar(field, true)
        }
        "input-autocomplete-api" => FieldKind::Autocomplete,
        "tags" => FieldKind::Tag,
        "list" => FieldKind::Repeater(field.nested.clone().unwrap_or_default()),
        _ => return None,
    };
    Some(kind)
}

/// A UI choice interface without choices degrades to its raw scalar
fn choice_or_scalar(field: &FieldDescriptor, multiple: bool) -> FieldKind {
    let options = ChoiceOptions::from_field(field, multiple);
    if !options.values.is_empty() {
        return FieldKind::Choice(options);
    }
    if multiple {
        return FieldKind::Scalar(ScalarKind::Csv);
    }
    scalar_kind(&field.raw_type)
        .map(FieldKind::Scalar)
        .unwrap_or(FieldKind::Unknown)
}

fn relation_cardinality(field: &FieldDescriptor) -> Option<Cardinality> {
    let interface = field.interface_tag();
    if field.has_special("m2a") || interface == "list-m2a" {
        Some(Cardinality::Polymorphic)
    } else if field.has_special("m2m") || interface == "list-m2m" {
        Some(Cardinality::ToManyUnordered)
    } else if field.has_special("o2m") || interface == "list-o2m" {
        Some(Cardinality::ToManyOrdered)
    } else if field.has_special("m2o")
        || interface == "select-dropdown-m2o"
        || field.foreign_key_target.is_some()
    {
        Some(Cardinality::ToOne)
    } else {
        None
    }
}

fn temporal_kind(field: &FieldDescriptor) -> Option<TemporalKind> {
    match field.raw_type.as_str() {
        "date" => Some(TemporalKind::Date),
        "time" => Some(TemporalKind::Time),
        "dateTime" => Some(TemporalKind::DateTime),
        "timestamp" => Some(TemporalKind::Timestamp),
        _ if field.has_special("date-created") || field.has_special("date-updated") => {
            Some(TemporalKind::Timestamp)
        }
        _ => None,
    }
}

/// Scalar mapping by raw type. Also used for repeater sub-fields, which get
/// no relation or choice resolution.
pub fn scalar_kind(raw_type: &str) -> Option<ScalarKind> {
    let kind = match raw_type {
        "string" | "text" | "hash" | "char" => ScalarKind::String,
        "uuid" => ScalarKind::Uuid,
        "integer" => ScalarKind::Integer,
        "float" => ScalarKind::Float,
        "bigInteger" | "decimal" => ScalarKind::Numeric,
        "boolean" => ScalarKind::Boolean,
        "json" => ScalarKind::Json,
        "csv" => ScalarKind::Csv,
        SYNTHETIC_IDENTIFIER_TYPE => ScalarKind::Identifier,
        t if t.starts_with("geometry") => ScalarKind::Geometry,
        _ => return None,
    };
    Some(kind)
}
