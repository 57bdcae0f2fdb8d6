//! Command-line front end: prepare datasets, score completions, evaluate a
//! served model.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand, ValueEnum};
use entag_core::{AnswerMode, RewardBatch, RewardScorer, TagInserter, TraceSink, TracingSink};
use entag_trainer::{
    EvaluationConfig, FileTraceSink, GenerationConfig, OpenAiCompletionsClient, PromptTemplate,
    label_records, load_completions, load_examples, load_span_records, render_prompt,
    run_evaluation, save_examples,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "entag")]
#[command(about = "Tagged-answer supervision and scoring for generative NER")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert span-annotated records into tagged examples
    Prepare {
        /// MRC-style JSON array of span records
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the labeled examples
        #[arg(short, long)]
        output: PathBuf,

        /// Keep records without any annotated span
        #[arg(short, long)]
        all: bool,

        /// Answer layout
        #[arg(short, long, value_enum, default_value_t = Mode::EntityList)]
        mode: Mode,
    },
    /// Score completions against labeled examples on every reward channel
    Score {
        /// Labeled examples written by `prepare`
        #[arg(short, long)]
        examples: PathBuf,

        /// JSONL file of `{"completion": ...}` objects, one per example
        #[arg(short, long)]
        completions: PathBuf,

        /// Append exact-match transcripts to this file instead of the debug log
        #[arg(short, long, env = "ENTAG_TRACE_LOG")]
        trace_log: Option<PathBuf>,
    },
    /// Generate with a served model and report multi-pass F1
    Evaluate {
        /// Labeled examples written by `prepare`
        #[arg(short, long)]
        examples: PathBuf,

        /// Base URL of an OpenAI-compatible completion server
        #[arg(long, env = "ENTAG_ENDPOINT", default_value = "http://localhost:8000")]
        endpoint: String,

        /// Served model name
        #[arg(short, long, env = "ENTAG_MODEL")]
        model: String,

        /// Bearer token for the completion server
        #[arg(long, env = "ENTAG_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Independent passes to average
        #[arg(short, long, default_value_t = 16)]
        passes: usize,

        /// Sampling temperature
        #[arg(short, long, default_value_t = 0.0)]
        temperature: f32,

        /// Generation length limit
        #[arg(long, default_value_t = 2048)]
        max_tokens: usize,

        /// Prompts per request
        #[arg(short, long, default_value_t = 256)]
        batch_size: usize,

        /// Omit worked examples from the prompt
        #[arg(long)]
        zero_shot: bool,

        /// Evaluate only the first N examples
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// `<entity>a, b</entity>`
    EntityList,
    /// The context with each mention wrapped in place
    InlineContext,
}

impl From<Mode> for AnswerMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::EntityList => AnswerMode::EntityList,
            Mode::InlineContext => AnswerMode::InlineContext,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Prepare {
            input,
            output,
            all,
            mode,
        } => {
            let records = load_span_records(&input, !all)?;
            let examples = label_records(&records, &TagInserter::new(mode.into()))?;
            save_examples(&output, &examples)?;
            info!(count = examples.len(), path = %output.display(), "wrote examples");
        }
        Commands::Score {
            examples,
            completions,
            trace_log,
        } => {
            let examples = load_examples(&examples)?;
            let completions = load_completions(&completions)?;

            let sink: Arc<dyn TraceSink> = match trace_log {
                Some(path) => Arc::new(FileTraceSink::create(path)?),
                None => Arc::new(TracingSink),
            };
            let scorer = RewardScorer::new()?.with_trace_sink(sink);

            let prompts: Vec<String> = examples
                .iter()
                .map(|e| render_prompt(e, PromptTemplate::FewShot))
                .collect();
            let answers: Vec<String> = examples.iter().map(|e| e.answer.clone()).collect();
            let batch = RewardBatch::new(&prompts, &completions, &answers)?;

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for rewards in scorer.score_batch(&batch) {
                serde_json::to_writer(&mut out, &rewards)?;
                writeln!(out)?;
            }
            out.flush()?;
        }
        Commands::Evaluate {
            examples,
            endpoint,
            model,
            api_key,
            passes,
            temperature,
            max_tokens,
            batch_size,
            zero_shot,
            limit,
            output,
        } => {
            let mut examples = load_examples(&examples)?;
            if let Some(limit) = limit {
                examples.truncate(limit);
            }
            ensure!(!examples.is_empty(), "no examples to evaluate");

            let template = if zero_shot {
                PromptTemplate::ZeroShot
            } else {
                PromptTemplate::FewShot
            };
            let config = EvaluationConfig::new()
                .with_passes(passes)
                .with_batch_size(batch_size)
                .with_template(template)
                .with_generation(
                    GenerationConfig::new()
                        .with_temperature(temperature)
                        .with_max_tokens(max_tokens),
                );

            info!(examples = examples.len(), %endpoint, %model, passes, "starting evaluation");
            let client = OpenAiCompletionsClient::new(endpoint, model).with_api_key(api_key);
            let report = run_evaluation(&client, &examples, &config).await?;

            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        fs::create_dir_all(parent)?;
                    }
                    let mut file = File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    writeln!(file, "{json}")?;
                    info!(mean_f1 = report.mean_f1, path = %path.display(), "wrote report");
                }
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}
