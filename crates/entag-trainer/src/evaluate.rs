//! Evaluation driver: generate, parse with the last-match policy, score.

use anyhow::{Result, ensure};
use entag_core::{
    EntagError, LabeledExample, MultiPassReport, PassOutput, TagParser, evaluate_predictions,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::generation::{GenerationConfig, TextGenerator};
use crate::prompt::{PromptTemplate, render_prompt};

/// Configuration for an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Independent predict-then-score passes to average.
    pub passes: usize,
    /// Prompts sent per generation request.
    pub batch_size: usize,
    pub template: PromptTemplate,
    pub generation: GenerationConfig,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            passes: 16,
            batch_size: 256,
            template: PromptTemplate::FewShot,
            generation: GenerationConfig::default(),
        }
    }
}

impl EvaluationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Generation settings for one pass. Seeded passes get distinct seeds.
    fn generation_for_pass(&self, pass: usize) -> GenerationConfig {
        let mut generation = self.generation.clone();
        generation.seed = generation.seed.map(|seed| seed.wrapping_add(pass as u64));
        generation
    }
}

/// Run one prediction pass over `examples`.
///
/// Every generated sample is paired with the example's ground truth, so the
/// two lists stay aligned when more than one sample is drawn per prompt.
pub async fn predict_entities<G: TextGenerator>(
    generator: &G,
    parser: &TagParser,
    examples: &[LabeledExample],
    config: &EvaluationConfig,
    generation: &GenerationConfig,
) -> Result<PassOutput> {
    let prompts: Vec<String> = examples
        .iter()
        .map(|example| render_prompt(example, config.template))
        .collect();

    let mut outputs = Vec::with_capacity(prompts.len());
    for chunk in prompts.chunks(config.batch_size.max(1)) {
        let generated = generator.generate(chunk, generation).await?;
        ensure!(
            generated.len() == chunk.len(),
            "generator returned {} outputs for {} prompts",
            generated.len(),
            chunk.len()
        );
        outputs.extend(generated);
    }

    let mut output = PassOutput::default();
    for (example, texts) in examples.iter().zip(outputs) {
        let truth = parser.extract_last(&example.answer);
        for text in texts {
            let predicted = parser.extract_last(&text);
            if !parser.has_entity_block(&text) {
                output.parse_misses += 1;
            } else if predicted.is_empty() {
                output.empty_blocks += 1;
            }
            output.predictions.push(predicted);
            output.ground_truths.push(truth.clone());
        }
    }

    if output.parse_misses > 0 {
        warn!(
            misses = output.parse_misses,
            total = output.predictions.len(),
            "generations without an entity block"
        );
    }
    debug!(
        empty_blocks = output.empty_blocks,
        total = output.predictions.len(),
        "generations with an empty entity block"
    );
    Ok(output)
}

/// Run `config.passes` independent passes and average their F1.
///
/// Each pass owns its predictions and counts; only the per-pass metrics are
/// combined at the end.
pub async fn run_evaluation<G: TextGenerator>(
    generator: &G,
    examples: &[LabeledExample],
    config: &EvaluationConfig,
) -> Result<MultiPassReport> {
    ensure!(config.passes > 0, "at least one evaluation pass is required");
    let parser = TagParser::new()?;

    let mut passes = Vec::with_capacity(config.passes);
    for pass in 0..config.passes {
        let generation = config.generation_for_pass(pass);
        let output = predict_entities(generator, &parser, examples, config, &generation)
            .await
            .map_err(|e| EntagError::PassFailed {
                pass,
                reason: format!("{e:#}"),
            })?;
        let metrics = evaluate_predictions(&output.predictions, &output.ground_truths)?;
        info!(
            pass,
            f1 = metrics.f1,
            precision = metrics.precision,
            recall = metrics.recall,
            parse_misses = output.parse_misses,
            empty_blocks = output.empty_blocks,
            "evaluation pass complete"
        );
        passes.push(metrics);
    }

    let report = MultiPassReport::from_passes(passes)?;
    info!(passes = config.passes, mean_f1 = report.mean_f1, "evaluation finished");
    Ok(report)
}
