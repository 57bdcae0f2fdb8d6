//! # Tag Insertion
//!
//! Turns token spans of a [`SpanRecord`] into entity mentions and a
//! canonical tagged answer.

use serde::{Deserialize, Serialize};

use super::tags::{ENTITY_CLOSE, ENTITY_OPEN, MENTION_JOINER, wrap_entity};
use crate::error::ValidationError;
use crate::types::{LabeledExample, SpanRecord};

/// Which rendering becomes the canonical answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerMode {
    /// Mentions joined with `", "` inside one entity tag pair.
    #[default]
    EntityList,
    /// The full context with each span tagged in place.
    InlineContext,
}

/// Everything derived from one record's spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedRecord {
    /// One mention per span, in listed order, duplicates kept.
    pub mentions: Vec<String>,
    /// The context with span markers inserted in place.
    pub inline: String,
    /// The canonical answer under the inserter's [`AnswerMode`].
    pub answer: String,
}

/// Converts span records into supervision targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagInserter {
    mode: AnswerMode,
}

impl TagInserter {
    #[must_use]
    pub fn new(mode: AnswerMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub fn mode(&self) -> AnswerMode {
        self.mode
    }

    /// Derives mentions, inline rendering and canonical answer.
    ///
    /// Spans are applied greedily in listed order against the original
    /// token indices; overlapping spans yield nested markers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SpanOutOfBounds`] if a span reaches past
    /// the last token, or [`ValidationError::InvertedSpan`] if it is reversed.
    ///
    /// # Examples
    /// ```
    /// use entag_core::parser::TagInserter;
    /// use entag_core::types::{EntityLabel, Span, SpanRecord};
    ///
    /// let record = SpanRecord {
    ///     id: "0".into(),
    ///     context: "Japan beat Syria on Friday".into(),
    ///     query: "countries".into(),
    ///     entity_label: EntityLabel::Location,
    ///     spans: vec![Span::new(0, 0), Span::new(2, 2)],
    ///     has_span: true,
    /// };
    /// let tagged = TagInserter::default().insert(&record).unwrap();
    /// assert_eq!(tagged.answer, "<entity>Japan, Syria</entity>");
    /// ```
    pub fn insert(&self, record: &SpanRecord) -> Result<TaggedRecord, ValidationError> {
        let tokens: Vec<&str> = record.tokens().collect();
        let mut marked: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        let mut mentions = Vec::with_capacity(record.spans.len());

        for span in &record.spans {
            if span.start > span.end {
                return Err(ValidationError::InvertedSpan {
                    record: record.id.clone(),
                    start: span.start,
                    end: span.end,
                });
            }
            if span.end >= tokens.len() {
                return Err(ValidationError::SpanOutOfBounds {
                    record: record.id.clone(),
                    start: span.start,
                    end: span.end,
                    token_count: tokens.len(),
                });
            }

            mentions.push(tokens[span.start..=span.end].join(" "));
            marked[span.start].insert_str(0, ENTITY_OPEN);
            marked[span.end].push_str(ENTITY_CLOSE);
        }

        let inline = marked.join(" ");
        let answer = match self.mode {
            AnswerMode::EntityList => wrap_entity(&mentions.join(MENTION_JOINER)),
            AnswerMode::InlineContext => inline.clone(),
        };

        Ok(TaggedRecord {
            mentions,
            inline,
            answer,
        })
    }

    /// Derives the labeled example consumed by generation and scoring.
    ///
    /// # Errors
    ///
    /// Propagates span validation failures from [`TagInserter::insert`].
    pub fn label(&self, record: &SpanRecord) -> Result<LabeledExample, ValidationError> {
        let tagged = self.insert(record)?;
        Ok(LabeledExample {
            context: record.context.clone(),
            entity: record.entity_label,
            query: record.query.clone(),
            answer: tagged.answer,
        })
    }
}
