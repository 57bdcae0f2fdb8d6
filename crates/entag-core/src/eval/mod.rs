pub mod confusion;
pub mod passes;

pub use confusion::{ConfusionCounts, EvaluationMetrics, evaluate_predictions};
pub use passes::{MultiPassReport, PassOutput, evaluate_passes};
