//! Observers for scoring transcripts.
//!
//! The exact-match channel reports the first example of every batch it
//! scores. Sinks decide what happens to it; scoring itself stays pure.

use std::fmt;

/// One scored example as seen by the exact-match channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringTrace<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub response: &'a str,
    pub extracted: &'a str,
}

impl fmt::Display for ScoringTrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\n{}\nQuestion:\n{}\nAnswer:\n{}\nResponse:\n{}\nExtracted:\n{}\n",
            "-".repeat(20),
            self.question,
            self.answer,
            self.response,
            self.extracted
        )
    }
}

/// Receives scoring transcripts.
///
/// Implementations are shared across scoring threads and must serialize
/// their own writes.
pub trait TraceSink: Send + Sync {
    fn record(&self, trace: &ScoringTrace<'_>);
}

/// Discards every transcript.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    fn record(&self, _trace: &ScoringTrace<'_>) {}
}

/// Emits transcripts as `debug` events on the `entag::trace` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, trace: &ScoringTrace<'_>) {
        tracing::debug!(
            target: "entag::trace",
            question = trace.question,
            answer = trace.answer,
            response = trace.response,
            extracted = trace.extracted,
            "scored first example of batch"
        );
    }
}
