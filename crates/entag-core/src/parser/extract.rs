//! # Entity Block Extraction
//!
//! Two extraction policies over tag-delimited text: evaluation reads only
//! the terminal block of a generation, reward scoring reads every block.

use regex::Regex;

use super::tags::{ENTITY_CLOSE, ENTITY_OPEN, MENTION_SEPARATOR, split_mentions};
use crate::error::Result;

/// Extracts entity mentions from `<entity>…</entity>` blocks.
///
/// Text without any block is a parse miss and yields an empty list; so does
/// a block with empty content.
#[derive(Debug, Clone)]
pub struct TagParser {
    /// Block content may span lines.
    re_block_multiline: Regex,
    /// Block content stays on one line.
    re_block_line: Regex,
}

impl TagParser {
    /// Constructs a parser with pre-compiled block patterns.
    ///
    /// # Errors
    ///
    /// Returns `EntagError::RegexError` if a pattern fails to compile
    /// (should never happen with the static markers).
    pub fn new() -> Result<Self> {
        let open = regex::escape(ENTITY_OPEN);
        let close = regex::escape(ENTITY_CLOSE);
        Ok(Self {
            re_block_multiline: Regex::new(&format!("(?s){open}(.*?){close}"))?,
            re_block_line: Regex::new(&format!("{open}(.*?){close}"))?,
        })
    }

    /// Last-match policy, used at evaluation time on model generations.
    ///
    /// Only the final block counts: earlier blocks may be echoed few-shot
    /// examples or restated reasoning.
    ///
    /// # Examples
    /// ```
    /// use entag_core::parser::TagParser;
    ///
    /// let parser = TagParser::new().unwrap();
    /// let text = "<entity>Igor</entity> ... <entity>Japan, Syria</entity>";
    /// assert_eq!(parser.extract_last(text), vec!["Japan", "Syria"]);
    /// ```
    #[must_use]
    pub fn extract_last(&self, text: &str) -> Vec<String> {
        self.re_block_multiline
            .captures_iter(text)
            .last()
            .map(|c| split_mentions(&c[1]))
            .unwrap_or_default()
    }

    /// All-match policy, used at reward time on both generation and answer.
    ///
    /// Contents of every single-line block are concatenated, each block
    /// boundary acting as a mention separator, then split.
    #[must_use]
    pub fn extract_all(&self, text: &str) -> Vec<String> {
        let mut joined = String::new();
        for caps in self.re_block_line.captures_iter(text) {
            if !joined.is_empty() {
                joined.push(MENTION_SEPARATOR);
            }
            joined.push_str(&caps[1]);
        }
        split_mentions(&joined)
    }

    /// Whether `text` contains at least one complete entity block.
    #[must_use]
    pub fn has_entity_block(&self, text: &str) -> bool {
        self.re_block_multiline.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> TagParser {
        TagParser::new().unwrap()
    }

    #[test]
    fn last_match_takes_final_block_only() {
        let text = "<entity>Japan, Syria</entity> then <entity>China</entity>";
        assert_eq!(parser().extract_last(text), vec!["China"]);
    }

    #[test]
    fn all_match_concatenates_blocks() {
        let text = "<entity>Japan, Syria</entity> then <entity>China</entity>";
        assert_eq!(parser().extract_all(text), vec!["Japan", "Syria", "China"]);
    }

    #[test]
    fn no_block_is_empty() {
        let p = parser();
        assert!(p.extract_last("no tags here").is_empty());
        assert!(p.extract_all("no tags here").is_empty());
        assert!(!p.has_entity_block("<entity>unterminated"));
    }

    #[test]
    fn empty_block_is_empty_list() {
        let p = parser();
        assert!(p.extract_last("<think>none</think> <entity></entity>").is_empty());
        assert!(p.extract_all("<entity></entity>").is_empty());
        assert!(p.extract_last("<entity>  ,  </entity>").is_empty());
        assert!(p.has_entity_block("<entity></entity>"));
    }

    #[test]
    fn empty_final_block_overrides_earlier_mentions() {
        let text = "<entity>Japan</entity>\n<entity></entity>";
        assert!(parser().extract_last(text).is_empty());
        assert_eq!(parser().extract_all(text), vec!["Japan"]);
    }

    #[test]
    fn mentions_are_trimmed_and_order_kept() {
        let text = "<entity>  Igor Shkvyrin ,FIFA,  Asian Cup </entity>";
        assert_eq!(
            parser().extract_last(text),
            vec!["Igor Shkvyrin", "FIFA", "Asian Cup"]
        );
    }

    #[test]
    fn duplicates_are_kept() {
        let text = "<entity>Japan, Japan</entity>";
        assert_eq!(parser().extract_all(text), vec!["Japan", "Japan"]);
    }

    #[test]
    fn multiline_block_only_seen_by_last_match() {
        let text = "<entity>Japan,\nSyria</entity>";
        assert_eq!(parser().extract_last(text), vec!["Japan", "Syria"]);
        assert!(parser().extract_all(text).is_empty());
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(parser().extract_last("<entity>japan</entity>"), vec!["japan"]);
    }
}
