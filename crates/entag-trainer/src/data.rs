//! Loading span-annotated records and caching derived examples.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use entag_core::{LabeledExample, RawSpanRecord, SpanRecord, TagInserter};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Load span records from an MRC-style JSON array.
///
/// With `possible_only`, records without any annotated start position are
/// dropped before validation.
pub fn load_span_records<P: AsRef<Path>>(
    path: P,
    possible_only: bool,
) -> Result<Vec<SpanRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let raw: Vec<RawSpanRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing span records from {}", path.display()))?;

    let total = raw.len();
    let records = raw
        .into_iter()
        .enumerate()
        .filter(|(_, r)| !possible_only || !r.start_position.is_empty())
        .map(|(position, r)| SpanRecord::from_raw(r, position))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    info!(total, kept = records.len(), path = %path.display(), "loaded span records");
    Ok(records)
}

/// Derive one labeled example per record.
pub fn label_records(
    records: &[SpanRecord],
    inserter: &TagInserter,
) -> Result<Vec<LabeledExample>> {
    let examples = records
        .iter()
        .map(|record| inserter.label(record))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    info!(count = examples.len(), mode = ?inserter.mode(), "labeled examples");
    Ok(examples)
}

/// Write labeled examples as a JSON array, creating parent directories.
pub fn save_examples<P: AsRef<Path>>(path: P, examples: &[LabeledExample]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(
        File::create(path).with_context(|| format!("creating {}", path.display()))?,
    );
    serde_json::to_writer_pretty(&mut writer, examples)?;
    writer.flush()?;
    Ok(())
}

/// Read labeled examples written by [`save_examples`].
pub fn load_examples<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledExample>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let examples = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing examples from {}", path.display()))?;
    Ok(examples)
}

/// One line of a completions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLine {
    pub completion: String,
}

/// Read generated completions, one `{"completion": ...}` object per line.
/// Blank lines are skipped.
pub fn load_completions<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    let mut completions = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: CompletionLine = serde_json::from_str(&line).with_context(|| {
            format!("{}:{}: invalid completion line", path.display(), number + 1)
        })?;
        completions.push(parsed.completion);
    }
    Ok(completions)
}
