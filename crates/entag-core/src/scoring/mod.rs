pub mod reward;
pub mod trace;

pub use reward::{
    RewardBatch, RewardChannel, RewardScorer, RewardVector, extract_post_reasoning,
    negative_entity_score, positive_entity_score,
};
pub use trace::{NoopTraceSink, ScoringTrace, TraceSink, TracingSink};
