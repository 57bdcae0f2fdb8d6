//! Averaging over repeated, independent predict-then-score passes.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::confusion::{EvaluationMetrics, evaluate_predictions};
use crate::error::{EntagError, Result};

/// Entity lists produced by one prediction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutput {
    pub predictions: Vec<Vec<String>>,
    pub ground_truths: Vec<Vec<String>>,
    /// Generations that contained no entity block at all.
    pub parse_misses: usize,
    /// Generations whose final entity block held no mention. Also a parse
    /// miss for the extractor, but valid when the ground truth is empty too.
    pub empty_blocks: usize,
}

/// Per-pass metrics and their mean F1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPassReport {
    pub passes: Vec<EvaluationMetrics>,
    pub mean_f1: f64,
}

impl MultiPassReport {
    /// Reduces finished passes into a report.
    ///
    /// # Errors
    ///
    /// Returns `EntagError::InvalidConfig` if `passes` is empty.
    pub fn from_passes(passes: Vec<EvaluationMetrics>) -> Result<Self> {
        if passes.is_empty() {
            return Err(EntagError::InvalidConfig(
                "at least one evaluation pass is required".into(),
            ));
        }
        let mean_f1 = passes.iter().map(|m| m.f1).sum::<f64>() / passes.len() as f64;
        Ok(Self { passes, mean_f1 })
    }
}

/// Runs `pass_count` independent passes and averages their F1.
///
/// Every pass gets its own accumulator; passes run in parallel and are only
/// combined in the final mean.
///
/// # Errors
///
/// Returns `EntagError::InvalidConfig` for zero passes, or the first error
/// raised by a pass or its scoring.
pub fn evaluate_passes<F>(pass_count: usize, run_pass: F) -> Result<MultiPassReport>
where
    F: Fn(usize) -> Result<PassOutput> + Sync,
{
    if pass_count == 0 {
        return Err(EntagError::InvalidConfig(
            "at least one evaluation pass is required".into(),
        ));
    }

    let passes = (0..pass_count)
        .into_par_iter()
        .map(|pass| -> Result<EvaluationMetrics> {
            let output = run_pass(pass)?;
            let metrics = evaluate_predictions(&output.predictions, &output.ground_truths)?;
            info!(
                pass,
                f1 = metrics.f1,
                parse_misses = output.parse_misses,
                empty_blocks = output.empty_blocks,
                "evaluation pass complete"
            );
            Ok(metrics)
        })
        .collect::<Result<Vec<_>>>()?;

    MultiPassReport::from_passes(passes)
}
