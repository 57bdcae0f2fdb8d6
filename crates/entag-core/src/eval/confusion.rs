use std::collections::HashSet;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EntagError, Result};

/// Pooled set-level match counts. Shards reduce by summation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionCounts {
    /// Counts for one example. Duplicate mentions collapse to one.
    #[must_use]
    pub fn from_example(predicted: &[String], truth: &[String]) -> Self {
        let predicted: HashSet<&str> = predicted.iter().map(String::as_str).collect();
        let truth: HashSet<&str> = truth.iter().map(String::as_str).collect();

        Self {
            true_positives: predicted.intersection(&truth).count(),
            false_positives: predicted.difference(&truth).count(),
            false_negatives: truth.difference(&predicted).count(),
        }
    }

    /// Adds one example's counts in place.
    pub fn add_example(&mut self, predicted: &[String], truth: &[String]) {
        *self += Self::from_example(predicted, truth);
    }

    /// `tp / (tp + fp)`, or `0.0` when nothing was predicted.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// `tp / (tp + fn)`, or `0.0` when there was nothing to find.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall, or `0.0` when both are zero.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn metrics(&self) -> EvaluationMetrics {
        EvaluationMetrics {
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
            true_positives: self.true_positives,
            false_positives: self.false_positives,
            false_negatives: self.false_negatives,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl Add for ConfusionCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            true_positives: self.true_positives + rhs.true_positives,
            false_positives: self.false_positives + rhs.false_positives,
            false_negatives: self.false_negatives + rhs.false_negatives,
        }
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for ConfusionCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Micro-averaged scores of one evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

/// Micro-averaged precision/recall/F1 over paired entity lists.
///
/// Examples are counted in parallel and reduced by summation.
///
/// # Errors
///
/// Returns `EntagError::LengthMismatch` if the two sequences differ in length.
///
/// # Examples
/// ```
/// use entag_core::eval::evaluate_predictions;
///
/// let predictions = vec![vec!["Japan".to_string(), "Syria".to_string()]];
/// let ground_truths = vec![vec!["Japan".to_string()]];
/// let metrics = evaluate_predictions(&predictions, &ground_truths).unwrap();
/// assert_eq!(metrics.true_positives, 1);
/// assert_eq!(metrics.false_positives, 1);
/// assert!((metrics.f1 - 2.0 / 3.0).abs() < 1e-9);
/// ```
pub fn evaluate_predictions(
    predictions: &[Vec<String>],
    ground_truths: &[Vec<String>],
) -> Result<EvaluationMetrics> {
    if predictions.len() != ground_truths.len() {
        return Err(EntagError::LengthMismatch {
            predictions: predictions.len(),
            ground_truths: ground_truths.len(),
        });
    }

    let counts = predictions
        .par_iter()
        .zip(ground_truths.par_iter())
        .map(|(predicted, truth)| ConfusionCounts::from_example(predicted, truth))
        .reduce(ConfusionCounts::default, Add::add);

    Ok(counts.metrics())
}
