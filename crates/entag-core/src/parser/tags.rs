//! # Tag Grammar
//!
//! Marker strings for the output grammar shared by canonical answers and
//! model generations:
//!
//! ```text
//! <think> free text </think> <entity> e1, e2, ..., en </entity>
//! ```

/// Opening marker of the reasoning block.
pub const THINK_OPEN: &str = "<think>";
/// Closing marker of the reasoning block.
pub const THINK_CLOSE: &str = "</think>";
/// Opening marker of the entity block.
pub const ENTITY_OPEN: &str = "<entity>";
/// Closing marker of the entity block.
pub const ENTITY_CLOSE: &str = "</entity>";

/// Separator between mentions inside an entity block.
pub const MENTION_SEPARATOR: char = ',';

/// Separator used when rendering a canonical answer.
pub const MENTION_JOINER: &str = ", ";

/// Wraps `content` in a single entity tag pair.
#[must_use]
pub fn wrap_entity(content: &str) -> String {
    format!("{ENTITY_OPEN}{content}{ENTITY_CLOSE}")
}

/// Splits entity-block content into trimmed, non-empty mentions.
pub(crate) fn split_mentions(content: &str) -> Vec<String> {
    content
        .split(MENTION_SEPARATOR)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
