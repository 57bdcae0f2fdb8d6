//! # Entag Core
//!
//! Supervision and scoring for generative named-entity extraction, where a
//! model answers with `<think> … </think> <entity> a, b </entity>`.
//! Turns span annotations into canonical tagged answers, parses entity
//! blocks out of generations, and scores generations with reward channels
//! and micro-averaged precision/recall/F1.
//!
//! ## Quick Start
//!
//! ```rust
//! use entag_core::parser::TagParser;
//! use entag_core::scoring::RewardScorer;
//!
//! let scorer = RewardScorer::new().unwrap();
//! let completion = "<think>Japan is a country</think> <entity>Japan</entity>";
//! let rewards = scorer.score(completion, "<entity>Japan</entity>");
//!
//! assert_eq!(rewards.format, 0.5);
//! assert_eq!(rewards.exact_match, 2.0);
//!
//! let parser = TagParser::new().unwrap();
//! assert_eq!(parser.extract_last(completion), vec!["Japan"]);
//! ```
pub mod error;
pub mod eval;
pub mod parser;
pub mod scoring;
pub mod types;

// Re-export primary API
pub use error::{EntagError, Result, ValidationError};
pub use eval::{
    ConfusionCounts, EvaluationMetrics, MultiPassReport, PassOutput, evaluate_passes,
    evaluate_predictions,
};
pub use parser::{AnswerMode, TagInserter, TagParser, TaggedRecord};
pub use scoring::{
    NoopTraceSink, RewardBatch, RewardChannel, RewardScorer, RewardVector, ScoringTrace,
    TraceSink, TracingSink,
};
pub use types::{EntityLabel, LabeledExample, RawSpanRecord, Span, SpanRecord};
