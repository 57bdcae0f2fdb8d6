use thiserror::Error;

/// A span-annotated record failed validation.
///
/// Always fatal for the offending record: nothing is truncated or coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A span string is not of the form `"start;end"` with non-negative integers.
    #[error("record {record}: malformed span {span:?}")]
    MalformedSpan {
        /// Identifier of the offending record.
        record: String,
        /// The raw span string.
        span: String,
    },

    /// A span whose start lies after its end.
    #[error("record {record}: span start {start} is after end {end}")]
    InvertedSpan {
        record: String,
        start: usize,
        end: usize,
    },

    /// A span referencing a token past the end of the context.
    #[error(
        "record {record}: span ({start}, {end}) out of bounds for context of {token_count} tokens"
    )]
    SpanOutOfBounds {
        record: String,
        start: usize,
        end: usize,
        token_count: usize,
    },

    /// The entity label code is not one of `PER`, `LOC`, `ORG`, `MISC`.
    #[error("record {record}: unknown entity label {label:?}")]
    UnknownLabel { record: String, label: String },
}

/// Errors that can occur during entag core operations.
#[derive(Debug, Error)]
pub enum EntagError {
    /// A record failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Predictions and ground truths must pair up one-to-one.
    #[error("predictions ({predictions}) and ground truths ({ground_truths}) differ in length")]
    LengthMismatch {
        predictions: usize,
        ground_truths: usize,
    },

    /// A tag pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// A batch handed to the reward scorer has misaligned columns.
    #[error("reward batch misaligned: {completions} completions, {answers} answers")]
    BatchMismatch { completions: usize, answers: usize },

    /// Invalid evaluation configuration.
    #[error("invalid evaluation config: {0}")]
    InvalidConfig(String),

    /// A single evaluation pass failed.
    #[error("evaluation pass {pass} failed: {reason}")]
    PassFailed { pass: usize, reason: String },
}

/// Result type alias for entag operations.
pub type Result<T> = std::result::Result<T, EntagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = ValidationError::MalformedSpan {
            record: "3.1".into(),
            span: "a;b".into(),
        };
        assert_eq!(err.to_string(), "record 3.1: malformed span \"a;b\"");

        let err: EntagError = ValidationError::SpanOutOfBounds {
            record: "#7".into(),
            start: 2,
            end: 9,
            token_count: 5,
        }
        .into();
        assert!(err.to_string().contains("#7"));
        assert!(err.to_string().contains("5 tokens"));
    }

    #[test]
    fn length_mismatch_names_both_sides() {
        let err = EntagError::LengthMismatch {
            predictions: 3,
            ground_truths: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains('3') && msg.contains('2'));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EntagError>();
        assert_send_sync::<ValidationError>();
    }
}
