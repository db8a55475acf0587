//! Naming Engine
//!
//! Casing conversion and plural → singular normalization for collection
//! names. Every function here is total: input that matches no rule comes back
//! unchanged.
//!
//! The singularizer is a heuristic rule table, not a linguistic model. Its
//! outputs for unlisted stems (e.g. `UserAddresses` → `UserAddresse`) are
//! relied upon by generated file names and are kept stable on purpose.

use regex::Regex;
use std::sync::OnceLock;

// =============================================================================
// Rule Tables
// =============================================================================

/// Irregular plurals, matched case-insensitively against the whole word
const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("teeth", "tooth"),
    ("feet", "foot"),
    ("oxen", "ox"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("analyses", "analysis"),
    ("theses", "thesis"),
    ("crises", "crisis"),
    ("quizzes", "quiz"),
    ("series", "series"),
    ("species", "species"),
];

/// Namespace prefixes kept verbatim while the remainder is singularized
const NAMESPACE_PREFIXES: &[&str] = &["Directus", "directus_"];

/// Words whose "-ves" plural comes from a "-f" singular
const VES_TO_F: &[&str] = &[
    "wolves", "leaves", "halves", "shelves", "calves", "loaves", "thieves", "selves",
    "elves", "scarves", "hooves",
];

/// Words whose "-ves" plural comes from a "-fe" singular
const VES_TO_FE: &[&str] = &["knives", "lives", "wives"];

/// Stem endings that take "-es" in the plural
const ES_STEMS: &[&str] = &["ss", "x", "z", "ch", "sh", "us"];

/// Endings whose singular legitimately ends in "s"
const S_PROTECTED_SUFFIXES: &[&str] = &["ss", "us", "is"];

/// Whole words whose singular legitimately ends in "s"
const S_PROTECTED_WORDS: &[&str] = &[
    "news", "canvas", "alias", "atlas", "bias", "gas", "lens", "plus", "yes", "this",
    "analytics", "physics", "economics", "always", "perhaps",
];

// =============================================================================
// Singularization
// =============================================================================

/// Convert a plural word to its singular form.
///
/// Rules are tried in strict order: irregular table, namespace prefix,
/// compound word, then plain suffix rules.
pub fn to_singular(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    if let Some(singular) = irregular(word) {
        return singular;
    }

    if let Some(singular) = namespaced(word) {
        return singular;
    }

    if let Some(singular) = compound(word) {
        return singular;
    }

    plain(word)
}

/// (a) irregular table, re-cased to the input's pattern
fn irregular(word: &str) -> Option<String> {
    let lower = word.to_lowercase();
    IRREGULAR
        .iter()
        .find(|(plural, _)| *plural == lower)
        .map(|(_, singular)| match_case(word, singular))
}

/// (b) reserved namespace prefix: singularize only the remainder
fn namespaced(word: &str) -> Option<String> {
    for prefix in NAMESPACE_PREFIXES {
        let Some(rest) = word.strip_prefix(prefix) else {
            continue;
        };
        // "Directus" must be followed by a new capitalized segment
        if !prefix.ends_with('_') && !rest.starts_with(|c: char| c.is_uppercase()) {
            continue;
        }
        if rest.is_empty() {
            return None;
        }
        return Some(format!("{}{}", prefix, singularize_segment(rest)));
    }
    None
}

/// (c) compound word split on capital boundaries, last segment only
fn compound(word: &str) -> Option<String> {
    let split = last_capital_boundary(word)?;
    let (head, tail) = word.split_at(split);
    Some(format!("{}{}", head, singularize_segment(tail)))
}

/// Byte offset of the last lower → upper boundary, if any
fn last_capital_boundary(word: &str) -> Option<usize> {
    let mut boundary = None;
    let mut prev: Option<char> = None;
    for (i, c) in word.char_indices() {
        if let Some(p) = prev {
            if c.is_uppercase() && p.is_lowercase() {
                boundary = Some(i);
            }
        }
        prev = Some(c);
    }
    boundary
}

/// The "-ies" / "-s" sub-rules shared by namespaced and compound words
fn singularize_segment(segment: &str) -> String {
    let lower = segment.to_lowercase();
    if lower.ends_with("ies") && lower.len() > 3 {
        return replace_suffix(segment, 3, "y");
    }
    if lower.ends_with('s') && !is_s_protected(&lower) {
        return replace_suffix(segment, 1, "");
    }
    segment.to_string()
}

/// (d) plain suffix rules
fn plain(word: &str) -> String {
    let lower = word.to_lowercase();

    if lower.ends_with("ies") && lower.len() > 4 {
        return replace_suffix(word, 3, "y");
    }

    if lower.ends_with("ves") {
        if VES_TO_F.contains(&lower.as_str()) {
            return replace_suffix(word, 3, "f");
        }
        if VES_TO_FE.contains(&lower.as_str()) {
            return replace_suffix(word, 3, "fe");
        }
    }

    if let Some(stem) = lower.strip_suffix("es") {
        if ES_STEMS.iter().any(|s| stem.ends_with(s)) {
            return replace_suffix(word, 2, "");
        }
    }

    if lower.ends_with('s') && !is_s_protected(&lower) {
        return replace_suffix(word, 1, "");
    }

    word.to_string()
}

fn is_s_protected(lower: &str) -> bool {
    S_PROTECTED_WORDS.contains(&lower) || S_PROTECTED_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Drop `strip` trailing characters and append `replacement`, upper-casing
/// the replacement when the word ends in an upper-case letter
fn replace_suffix(word: &str, strip: usize, replacement: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    let keep = chars.len().saturating_sub(strip);
    let mut out: String = chars[..keep].iter().collect();
    if chars.last().map(|c| c.is_uppercase()).unwrap_or(false) {
        out.push_str(&replacement.to_uppercase());
    } else {
        out.push_str(replacement);
    }
    out
}

/// Re-case `output` to follow the case pattern of `input`
fn match_case(input: &str, output: &str) -> String {
    let letters: Vec<char> = input.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return output.to_uppercase();
    }
    if input.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
        return capitalize(output);
    }
    output.to_lowercase()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

// =============================================================================
// Pluralization
// =============================================================================

/// Pluralize a single lower-case segment (used by the relation heuristic)
pub fn pluralize_segment(segment: &str) -> String {
    let lower = segment.to_lowercase();
    if lower.is_empty() {
        return lower;
    }
    if let Some(stem) = lower.strip_suffix('y') {
        let before_vowel = stem
            .chars()
            .last()
            .map(|c| "aeiou".contains(c))
            .unwrap_or(true);
        if !before_vowel {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", lower);
    }
    format!("{}s", lower)
}

// =============================================================================
// Casing
// =============================================================================

/// `blog_posts` → `BlogPosts`. Each segment is capitalized and the rest of
/// the segment lower-cased.
pub fn to_pascal_case(s: &str) -> String {
    s.split(['-', '_', ' '])
        .filter(|seg| !seg.is_empty())
        .map(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
            }
        })
        .collect()
}

/// `BlogPosts` → `blog-posts`, `HTMLParser` → `html-parser`
pub fn to_kebab_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == ' ' || c == '-' {
            if !result.is_empty() && !result.ends_with('-') {
                result.push('-');
            }
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            let boundary =
                prev.is_lowercase() || (prev.is_uppercase() && next_lower);
            if boundary && !result.is_empty() && !result.ends_with('-') {
                result.push('-');
            }
        }

        result.extend(c.to_lowercase());
    }

    result.trim_end_matches('-').to_string()
}

/// Type name of a collection: `blog_posts` → `BlogPost`
pub fn entity_type_name(raw: &str) -> String {
    to_singular(&to_pascal_case(raw))
}

/// Object key as written in generated code (quoted unless a plain identifier)
pub fn property_key(name: &str) -> String {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let ident = IDENT.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
    });

    if ident.is_match(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
