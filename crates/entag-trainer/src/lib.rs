//! # Entag Trainer
//!
//! Workflows around the core scoring library: turning span-annotated
//! datasets into tagged examples, rendering prompts, talking to an
//! OpenAI-compatible completion server, and running multi-pass evaluation.

pub mod data;
pub mod evaluate;
pub mod generation;
pub mod prompt;
pub mod trace;

pub use data::{
    CompletionLine, label_records, load_completions, load_examples, load_span_records,
    save_examples,
};
pub use evaluate::{EvaluationConfig, predict_entities, run_evaluation};
pub use generation::{GenerationConfig, OpenAiCompletionsClient, TextGenerator};
pub use prompt::{FewShotExample, PromptTemplate, few_shot_examples, render_prompt};
pub use trace::FileTraceSink;
