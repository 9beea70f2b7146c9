//! Resistance / vulnerability / immunity tags
//!
//! Sheets store these as free text ("Fire, Cold and Poison") or as a list
//! of strings. Both normalize to a set of lowercase tokens.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Normalized, lowercase tag tokens
pub type TagSet = BTreeSet<String>;

/// Separators: comma, slash, semicolon, and the words "and" / "or"
static TAG_SPLIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),|/|;|\band\b|\bor\b").unwrap());

/// A tag field as stored on a sheet, kept in its original form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagField {
    Text(String),
    List(Vec<String>),
}

impl TagField {
    /// Normalize into a tag set
    pub fn tags(&self) -> TagSet {
        parse_tags(self)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TagField::Text(s) => s.trim().is_empty(),
            TagField::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

impl Default for TagField {
    fn default() -> Self {
        TagField::Text(String::new())
    }
}

impl From<&str> for TagField {
    fn from(s: &str) -> Self {
        TagField::Text(s.to_string())
    }
}

impl From<String> for TagField {
    fn from(s: String) -> Self {
        TagField::Text(s)
    }
}

impl From<Vec<String>> for TagField {
    fn from(items: Vec<String>) -> Self {
        TagField::List(items)
    }
}

impl std::fmt::Display for TagField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagField::Text(s) => write!(f, "{}", s),
            TagField::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Normalize a stored tag field.
///
/// List entries are trimmed and lowercased but not split further.
pub fn parse_tags(value: &TagField) -> TagSet {
    match value {
        TagField::Text(text) => parse_tag_text(text),
        TagField::List(items) => items.iter().filter_map(|s| normalize(s)).collect(),
    }
}

/// Split free text on the tag separators and normalize each fragment
pub fn parse_tag_text(text: &str) -> TagSet {
    if text.trim().is_empty() {
        return TagSet::new();
    }
    TAG_SPLIT_REGEX.split(text).filter_map(normalize).collect()
}

fn normalize(fragment: &str) -> Option<String> {
    let trimmed = fragment.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}
