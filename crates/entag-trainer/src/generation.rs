//! Text-generation backend interface and an OpenAI-compatible HTTP client.

use std::future::Future;

use anyhow::{Context, Result, bail, ensure};
use entag_core::parser::ENTITY_CLOSE;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sampling settings passed to the generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: usize,
    pub stop: Vec<String>,
    /// Keep the stop string in the returned text so the entity block closes.
    pub include_stop_str_in_output: bool,
    /// Samples per prompt.
    pub n: usize,
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.8,
            max_tokens: 2048,
            stop: vec![ENTITY_CLOSE.to_string()],
            include_stop_str_in_output: true,
            n: 1,
            seed: Some(42),
        }
    }
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.max(0.0);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set samples per prompt (at least one).
    pub fn with_samples(mut self, n: usize) -> Self {
        self.n = n.max(1);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// A backend that turns prompts into generated texts.
///
/// Returns one entry per prompt, in prompt order, each holding `config.n`
/// generations.
pub trait TextGenerator {
    fn generate(
        &self,
        prompts: &[String],
        config: &GenerationConfig,
    ) -> impl Future<Output = Result<Vec<Vec<String>>>> + Send;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a [String],
    temperature: f32,
    top_p: f32,
    max_tokens: usize,
    stop: &'a [String],
    include_stop_str_in_output: bool,
    n: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    index: usize,
    text: String,
}

/// Client for an OpenAI-compatible `/v1/completions` endpoint (e.g. vLLM).
#[derive(Debug, Clone)]
pub struct OpenAiCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompletionsClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/completions", self.base_url)
    }
}

impl TextGenerator for OpenAiCompletionsClient {
    async fn generate(
        &self,
        prompts: &[String],
        config: &GenerationConfig,
    ) -> Result<Vec<Vec<String>>> {
        if prompts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CompletionRequest {
            model: &self.model,
            prompt: prompts,
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            stop: &config.stop,
            include_stop_str_in_output: config.include_stop_str_in_output,
            n: config.n,
            seed: config.seed,
        };

        debug!(
            prompts = prompts.len(),
            n = config.n,
            url = %self.endpoint(),
            "requesting completions"
        );

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response: CompletionResponse = builder
            .send()
            .await
            .context("sending completion request")?
            .error_for_status()
            .context("completion endpoint returned an error status")?
            .json()
            .await
            .context("decoding completion response")?;

        group_choices(response.choices, prompts.len(), config.n)
    }
}

/// Regroup flat choices (indexed `prompt * n + sample`) per prompt.
fn group_choices(
    mut choices: Vec<CompletionChoice>,
    prompt_count: usize,
    n: usize,
) -> Result<Vec<Vec<String>>> {
    let n = n.max(1);
    ensure!(
        choices.len() == prompt_count * n,
        "expected {} choices for {} prompts, got {}",
        prompt_count * n,
        prompt_count,
        choices.len()
    );

    choices.sort_by_key(|c| c.index);
    let mut grouped = vec![Vec::with_capacity(n); prompt_count];
    for choice in choices {
        let prompt = choice.index / n;
        ensure!(prompt < prompt_count, "choice index {} out of range", choice.index);
        grouped[prompt].push(choice.text);
    }
    if let Some(prompt) = grouped.iter().position(|texts| texts.len() != n) {
        bail!(
            "prompt {prompt} received {} choices, expected {n}",
            grouped[prompt].len()
        );
    }
    Ok(grouped)
}
