use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::label::EntityLabel;
use crate::error::ValidationError;

/// An inclusive `(start, end)` pair of whitespace-token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.start, self.end)
    }
}

impl FromStr for Span {
    type Err = ();

    /// Parses the `"start;end"` annotation form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s.split_once(';').ok_or(())?;
        let start = start.trim().parse().map_err(|_| ())?;
        let end = end.trim().parse().map_err(|_| ())?;
        Ok(Self { start, end })
    }
}

/// A record exactly as it appears in an MRC-style NER annotation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpanRecord {
    pub context: String,
    pub query: String,
    pub entity_label: String,
    #[serde(default)]
    pub start_position: Vec<serde_json::Value>,
    #[serde(default)]
    pub span_position: Vec<String>,
    #[serde(default)]
    pub qas_id: Option<String>,
}

/// A validated span-annotated record.
///
/// Spans are guaranteed well-formed and ordered (`start <= end`); bounds
/// against the context tokens are checked when tags are inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    /// `qas_id` when the source has one, otherwise `#<position>`.
    pub id: String,
    pub context: String,
    pub query: String,
    pub entity_label: EntityLabel,
    pub spans: Vec<Span>,
    /// Whether the source annotated at least one start position.
    pub has_span: bool,
}

impl SpanRecord {
    /// Validates a raw record found at `position` in its source file.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an unknown label code, a malformed
    /// span string, or a span whose start lies after its end.
    pub fn from_raw(raw: RawSpanRecord, position: usize) -> Result<Self, ValidationError> {
        let id = raw.qas_id.unwrap_or_else(|| format!("#{position}"));

        let entity_label =
            EntityLabel::from_code(&raw.entity_label).ok_or_else(|| ValidationError::UnknownLabel {
                record: id.clone(),
                label: raw.entity_label.clone(),
            })?;

        let spans = raw
            .span_position
            .iter()
            .map(|s| {
                let span: Span = s.parse().map_err(|()| ValidationError::MalformedSpan {
                    record: id.clone(),
                    span: s.clone(),
                })?;
                if span.start > span.end {
                    return Err(ValidationError::InvertedSpan {
                        record: id.clone(),
                        start: span.start,
                        end: span.end,
                    });
                }
                Ok(span)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            context: raw.context,
            query: raw.query,
            entity_label,
            spans,
            has_span: !raw.start_position.is_empty(),
        })
    }

    /// Whitespace-split tokens of the context.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.context.split_whitespace()
    }

    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str, spans: &[&str]) -> RawSpanRecord {
        RawSpanRecord {
            context: "Japan began the defence against Syria".into(),
            query: "locations".into(),
            entity_label: label.into(),
            start_position: spans.iter().map(|_| serde_json::json!(0)).collect(),
            span_position: spans.iter().map(|s| s.to_string()).collect(),
            qas_id: None,
        }
    }

    #[test]
    fn span_parses_annotation_form() {
        assert_eq!("3;5".parse::<Span>(), Ok(Span::new(3, 5)));
        assert_eq!(" 0 ; 0 ".parse::<Span>(), Ok(Span::new(0, 0)));
        assert!("3".parse::<Span>().is_err());
        assert!("-1;2".parse::<Span>().is_err());
        assert!("a;b".parse::<Span>().is_err());
    }

    #[test]
    fn span_display_matches_annotation_form() {
        assert_eq!(Span::new(2, 4).to_string(), "2;4");
    }

    #[test]
    fn from_raw_validates_label_and_spans() {
        let record = SpanRecord::from_raw(raw("LOC", &["0;0", "5;5"]), 4).unwrap();
        assert_eq!(record.id, "#4");
        assert_eq!(record.entity_label, EntityLabel::Location);
        assert_eq!(record.spans, vec![Span::new(0, 0), Span::new(5, 5)]);
        assert!(record.has_span);
        assert_eq!(record.token_count(), 6);
    }

    #[test]
    fn from_raw_prefers_qas_id() {
        let mut r = raw("PER", &[]);
        r.qas_id = Some("12.3".into());
        let record = SpanRecord::from_raw(r, 0).unwrap();
        assert_eq!(record.id, "12.3");
        assert!(!record.has_span);
    }

    #[test]
    fn from_raw_rejects_unknown_label() {
        let err = SpanRecord::from_raw(raw("GPE", &[]), 1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownLabel {
                record: "#1".into(),
                label: "GPE".into()
            }
        );
    }

    #[test]
    fn from_raw_rejects_malformed_span() {
        let err = SpanRecord::from_raw(raw("LOC", &["0;0", "x;2"]), 2).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedSpan { ref span, .. } if span == "x;2"));
    }

    #[test]
    fn from_raw_rejects_inverted_span() {
        let err = SpanRecord::from_raw(raw("LOC", &["4;1"]), 0).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedSpan { start: 4, end: 1, .. }));
    }

    #[test]
    fn raw_record_deserializes_without_optional_fields() {
        let json = r#"{"context": "a b", "query": "q", "entity_label": "ORG"}"#;
        let r: RawSpanRecord = serde_json::from_str(json).unwrap();
        assert!(r.span_position.is_empty());
        assert!(r.start_position.is_empty());
        assert!(r.qas_id.is_none());
    }
}
