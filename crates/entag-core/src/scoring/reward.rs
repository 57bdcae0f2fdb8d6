use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::trace::{NoopTraceSink, ScoringTrace, TraceSink};
use crate::error::{EntagError, Result};
use crate::parser::tags::{ENTITY_CLOSE, ENTITY_OPEN, THINK_CLOSE, THINK_OPEN};
use crate::parser::TagParser;

/// Reward for a completion that follows the think-then-entity layout.
pub const FORMAT_REWARD: f32 = 0.5;
/// Reward for a post-reasoning answer identical to the canonical answer.
pub const EXACT_MATCH_REWARD: f32 = 2.0;
/// Reward per ground-truth mention found in the generation.
pub const ENTITY_HIT_REWARD: f32 = 0.5;
/// Penalty per generated mention absent from the ground truth.
pub const ENTITY_MISS_PENALTY: f32 = 0.5;

/// Text following the reasoning block, trimmed.
///
/// Everything up to the last `<think>` is dropped, then everything up to the
/// last `</think>` after it.
#[must_use]
pub fn extract_post_reasoning(text: &str) -> &str {
    let after_open = text.rsplit(THINK_OPEN).next().unwrap_or(text);
    let after_close = after_open.rsplit(THINK_CLOSE).next().unwrap_or(after_open);
    after_close.trim()
}

/// `+0.5` for every ground-truth mention (with repetition) present in `generated`.
#[must_use]
pub fn positive_entity_score(answer: &[String], generated: &[String]) -> f32 {
    answer
        .iter()
        .filter(|mention| generated.contains(mention))
        .fold(0.0, |score, _| score + ENTITY_HIT_REWARD)
}

/// `-0.5` for every generated mention (with repetition) absent from `answer`.
#[must_use]
pub fn negative_entity_score(answer: &[String], generated: &[String]) -> f32 {
    generated
        .iter()
        .filter(|mention| !answer.contains(mention))
        .fold(0.0, |score, _| score - ENTITY_MISS_PENALTY)
}

/// Independent reward channels handed to a trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardChannel {
    Format,
    ExactMatch,
    PositiveEntity,
    NegativeEntity,
}

impl RewardChannel {
    pub const ALL: [RewardChannel; 4] = [
        RewardChannel::Format,
        RewardChannel::ExactMatch,
        RewardChannel::PositiveEntity,
        RewardChannel::NegativeEntity,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::ExactMatch => "exact_match",
            Self::PositiveEntity => "positive_entity",
            Self::NegativeEntity => "negative_entity",
        }
    }
}

impl fmt::Display for RewardChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All four channel values for one completion. Never merged here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardVector {
    pub format: f32,
    pub exact_match: f32,
    pub positive_entity: f32,
    pub negative_entity: f32,
}

impl RewardVector {
    #[must_use]
    pub fn get(&self, channel: RewardChannel) -> f32 {
        match channel {
            RewardChannel::Format => self.format,
            RewardChannel::ExactMatch => self.exact_match,
            RewardChannel::PositiveEntity => self.positive_entity,
            RewardChannel::NegativeEntity => self.negative_entity,
        }
    }
}

/// A batch of completions aligned with their prompts and canonical answers.
#[derive(Debug, Clone, Copy)]
pub struct RewardBatch<'a> {
    prompts: &'a [String],
    completions: &'a [String],
    answers: &'a [String],
}

impl<'a> RewardBatch<'a> {
    /// Pairs completions with answers. `prompts` may be empty; it only
    /// feeds the trace transcript.
    ///
    /// # Errors
    ///
    /// Returns `EntagError::BatchMismatch` when completions and answers
    /// differ in length.
    pub fn new(
        prompts: &'a [String],
        completions: &'a [String],
        answers: &'a [String],
    ) -> Result<Self> {
        if completions.len() != answers.len() {
            return Err(EntagError::BatchMismatch {
                completions: completions.len(),
                answers: answers.len(),
            });
        }
        Ok(Self {
            prompts,
            completions,
            answers,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.completions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
    }
}

/// Computes the reward channels for generated completions.
#[derive(Clone)]
pub struct RewardScorer {
    parser: TagParser,
    re_format: Regex,
    sink: Arc<dyn TraceSink>,
}

impl fmt::Debug for RewardScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewardScorer")
            .field("re_format", &self.re_format.as_str())
            .finish_non_exhaustive()
    }
}

impl RewardScorer {
    /// Constructs a scorer with a no-op trace sink.
    ///
    /// # Errors
    ///
    /// Returns `EntagError::RegexError` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        let pattern = format!(
            r"(?s)^{}.*?{}\s*{}.*?{}",
            regex::escape(THINK_OPEN),
            regex::escape(THINK_CLOSE),
            regex::escape(ENTITY_OPEN),
            regex::escape(ENTITY_CLOSE),
        );
        Ok(Self {
            parser: TagParser::new()?,
            re_format: Regex::new(&pattern)?,
            sink: Arc::new(NoopTraceSink),
        })
    }

    /// Replace the trace sink.
    #[must_use]
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    /// `0.5` when the completion starts with a reasoning block followed by an
    /// entity block, else `0.0`. Trailing text is allowed.
    #[must_use]
    pub fn format_reward(&self, completion: &str) -> f32 {
        if self.re_format.is_match(completion) {
            FORMAT_REWARD
        } else {
            0.0
        }
    }

    /// `2.0` when the post-reasoning text equals `answer` byte for byte.
    #[must_use]
    pub fn exact_match_reward(&self, completion: &str, answer: &str) -> f32 {
        if extract_post_reasoning(completion) == answer {
            EXACT_MATCH_REWARD
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn positive_entity_reward(&self, completion: &str, answer: &str) -> f32 {
        let (truth, generated) = self.entity_lists(completion, answer);
        positive_entity_score(&truth, &generated)
    }

    #[must_use]
    pub fn negative_entity_reward(&self, completion: &str, answer: &str) -> f32 {
        let (truth, generated) = self.entity_lists(completion, answer);
        negative_entity_score(&truth, &generated)
    }

    /// All channels for one completion. Does not emit a trace.
    #[must_use]
    pub fn score(&self, completion: &str, answer: &str) -> RewardVector {
        let (truth, generated) = self.entity_lists(completion, answer);
        RewardVector {
            format: self.format_reward(completion),
            exact_match: self.exact_match_reward(completion, answer),
            positive_entity: positive_entity_score(&truth, &generated),
            negative_entity: negative_entity_score(&truth, &generated),
        }
    }

    /// One channel over a batch, in batch order.
    ///
    /// The exact-match channel reports the first example to the trace sink.
    #[must_use]
    pub fn score_channel(&self, channel: RewardChannel, batch: &RewardBatch<'_>) -> Vec<f32> {
        if channel == RewardChannel::ExactMatch {
            self.trace_first(batch);
        }

        batch
            .completions
            .par_iter()
            .zip(batch.answers.par_iter())
            .map(|(completion, answer)| match channel {
                RewardChannel::Format => self.format_reward(completion),
                RewardChannel::ExactMatch => self.exact_match_reward(completion, answer),
                RewardChannel::PositiveEntity => self.positive_entity_reward(completion, answer),
                RewardChannel::NegativeEntity => self.negative_entity_reward(completion, answer),
            })
            .collect()
    }

    /// Every channel over a batch, in batch order.
    #[must_use]
    pub fn score_batch(&self, batch: &RewardBatch<'_>) -> Vec<RewardVector> {
        self.trace_first(batch);

        batch
            .completions
            .par_iter()
            .zip(batch.answers.par_iter())
            .map(|(completion, answer)| self.score(completion, answer))
            .collect()
    }

    fn entity_lists(&self, completion: &str, answer: &str) -> (Vec<String>, Vec<String>) {
        let truth = self.parser.extract_all(answer);
        let generated = self.parser.extract_all(extract_post_reasoning(completion));
        (truth, generated)
    }

    fn trace_first(&self, batch: &RewardBatch<'_>) {
        let (Some(response), Some(answer)) = (batch.completions.first(), batch.answers.first())
        else {
            return;
        };
        self.sink.record(&ScoringTrace {
            question: batch.prompts.first().map_or("", String::as_str),
            answer,
            response,
            extracted: extract_post_reasoning(response),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn scorer() -> RewardScorer {
        RewardScorer::new().unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[derive(Default)]
    struct RecordingSink {
        traces: Mutex<Vec<String>>,
    }

    impl TraceSink for RecordingSink {
        fn record(&self, trace: &ScoringTrace<'_>) {
            self.traces.lock().unwrap().push(trace.response.to_string());
        }
    }

    #[test]
    fn format_reward_accepts_think_then_entity() {
        let s = scorer();
        assert_eq!(s.format_reward("<think>x</think>\n<entity>a, b</entity>"), 0.5);
        assert_eq!(s.format_reward("<think>multi\nline</think><entity></entity> tail"), 0.5);
    }

    #[test]
    fn format_reward_rejects_bad_layouts() {
        let s = scorer();
        assert_eq!(s.format_reward("<entity>a</entity><think>x</think>"), 0.0);
        assert_eq!(s.format_reward("<think>x</think>"), 0.0);
        assert_eq!(s.format_reward(" <think>x</think><entity>a</entity>"), 0.0);
        assert_eq!(s.format_reward("<think>x</think> words <entity>a</entity>"), 0.0);
    }

    #[test]
    fn post_reasoning_text() {
        assert_eq!(
            extract_post_reasoning("<think>r</think>  <entity>a</entity>\n"),
            "<entity>a</entity>"
        );
        assert_eq!(
            extract_post_reasoning("<think>a</think><think>b</think> x"),
            "x"
        );
        assert_eq!(extract_post_reasoning("  plain  "), "plain");
    }

    #[test]
    fn exact_match_is_strict() {
        let s = scorer();
        let answer = "<entity>Japan, Syria</entity>";
        assert_eq!(
            s.exact_match_reward("<think>r</think> <entity>Japan, Syria</entity>", answer),
            2.0
        );
        assert_eq!(
            s.exact_match_reward("<think>r</think> <entity>Japan,Syria</entity>", answer),
            0.0
        );
        assert_eq!(
            s.exact_match_reward("<think>r</think> <entity>japan, Syria</entity>", answer),
            0.0
        );
    }

    #[test]
    fn entity_scores_on_lists() {
        let truth = strings(&["Japan", "Syria"]);
        let generated = strings(&["Japan", "China"]);
        assert_eq!(positive_entity_score(&truth, &generated), 0.5);
        assert_eq!(negative_entity_score(&truth, &generated), -0.5);
        assert_eq!(
            positive_entity_score(&truth, &generated) + negative_entity_score(&truth, &generated),
            0.0
        );
    }

    #[test]
    fn entity_scores_keep_multiplicity() {
        let truth = strings(&["Japan", "Japan"]);
        let generated = strings(&["Japan", "China", "China"]);
        assert_eq!(positive_entity_score(&truth, &generated), 1.0);
        assert_eq!(negative_entity_score(&truth, &generated), -1.0);
    }

    #[test]
    fn entity_scores_are_case_sensitive() {
        let truth = strings(&["Japan"]);
        let generated = strings(&["japan"]);
        assert_eq!(positive_entity_score(&truth, &generated), 0.0);
        assert_eq!(negative_entity_score(&truth, &generated), -0.5);
    }

    #[test]
    fn entity_rewards_on_text() {
        let s = scorer();
        let answer = "<entity>Japan, Syria</entity>";
        let completion =
            "<think>Japan and China are countries</think> <entity>Japan, China</entity>";
        assert_eq!(s.positive_entity_reward(completion, answer), 0.5);
        assert_eq!(s.negative_entity_reward(completion, answer), -0.5);
    }

    #[test]
    fn entity_rewards_ignore_reasoning_blocks() {
        let s = scorer();
        let answer = "<entity>Japan</entity>";
        // The entity block inside the reasoning is not part of the answer.
        let completion = "<think><entity>China</entity></think><entity>Japan</entity>";
        assert_eq!(s.negative_entity_reward(completion, answer), 0.0);
    }

    #[test]
    fn score_collects_all_channels() {
        let v = scorer().score(
            "<think>r</think> <entity>Japan, Syria</entity>",
            "<entity>Japan, Syria</entity>",
        );
        assert_eq!(
            v,
            RewardVector {
                format: 0.5,
                exact_match: 2.0,
                positive_entity: 1.0,
                negative_entity: 0.0,
            }
        );
        assert_eq!(v.get(RewardChannel::ExactMatch), 2.0);
    }

    #[test]
    fn batch_rejects_misaligned_columns() {
        let completions = strings(&["a", "b"]);
        let answers = strings(&["a"]);
        assert!(matches!(
            RewardBatch::new(&[], &completions, &answers),
            Err(EntagError::BatchMismatch { completions: 2, answers: 1 })
        ));
    }

    #[test]
    fn channels_score_in_batch_order() {
        let s = scorer();
        let prompts = strings(&["q1", "q2"]);
        let completions = strings(&[
            "<think>r</think><entity>Japan</entity>",
            "no tags at all",
        ]);
        let answers = strings(&["<entity>Japan</entity>", "<entity>Syria</entity>"]);
        let batch = RewardBatch::new(&prompts, &completions, &answers).unwrap();

        assert_eq!(s.score_channel(RewardChannel::Format, &batch), vec![0.5, 0.0]);
        assert_eq!(s.score_channel(RewardChannel::ExactMatch, &batch), vec![2.0, 0.0]);
        assert_eq!(s.score_channel(RewardChannel::PositiveEntity, &batch), vec![0.5, 0.0]);
        assert_eq!(s.score_channel(RewardChannel::NegativeEntity, &batch), vec![0.0, 0.0]);

        let vectors = s.score_batch(&batch);
        for channel in RewardChannel::ALL {
            let column: Vec<f32> = vectors.iter().map(|v| v.get(channel)).collect();
            assert_eq!(column, s.score_channel(channel, &batch), "{channel}");
        }
    }

    #[test]
    fn exact_match_traces_first_example_only() {
        let sink = Arc::new(RecordingSink::default());
        let s = scorer().with_trace_sink(sink.clone());
        let completions = strings(&["first", "second"]);
        let answers = strings(&["a", "b"]);
        let batch = RewardBatch::new(&[], &completions, &answers).unwrap();

        let _ = s.score_channel(RewardChannel::Format, &batch);
        assert!(sink.traces.lock().unwrap().is_empty());

        let _ = s.score_channel(RewardChannel::ExactMatch, &batch);
        assert_eq!(*sink.traces.lock().unwrap(), vec!["first".to_string()]);
    }

    #[test]
    fn empty_batch_scores_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let s = scorer().with_trace_sink(sink.clone());
        let batch = RewardBatch::new(&[], &[], &[]).unwrap();
        assert!(batch.is_empty());
        assert!(s.score_channel(RewardChannel::ExactMatch, &batch).is_empty());
        assert!(sink.traces.lock().unwrap().is_empty());
    }

    #[test]
    fn reward_vector_serializes_by_channel_name() {
        let json = serde_json::to_value(RewardVector::default()).unwrap();
        for channel in RewardChannel::ALL {
            assert!(json.get(channel.name()).is_some(), "{channel}");
        }
    }
}
