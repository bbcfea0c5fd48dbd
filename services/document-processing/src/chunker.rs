//! Fixed-size overlapping chunking with optional sentence snapping.
//!
//! All offsets are character offsets, never byte offsets.

use finrisk_utils::{ChunkingConfig, FinRiskResult};

/// Half-open character range `[start, end)` of the chunked text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

/// A span that survived the minimum-length check, with its trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub span: TextSpan,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Fails with a configuration error when `overlap >= chunk_size` or a
    /// size is zero.
    pub fn new(config: ChunkingConfig) -> FinRiskResult<Self> {
        config.ensure_valid()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Computes every chunk span over `text`, before length filtering.
    pub fn split(&self, text: &str) -> Vec<TextSpan> {
        let chars: Vec<char> = text.chars().collect();
        self.split_chars(&chars)
    }

    fn split_chars(&self, chars: &[char]) -> Vec<TextSpan> {
        let total = chars.len();
        let size = self.config.chunk_size;
        let overlap = self.config.overlap;
        let mut spans = Vec::new();
        let mut start = 0;

        while start < total {
            let target_end = (start + size).min(total);
            let mut end = target_end;
            if self.config.sentence_snap && target_end < total {
                if let Some(snapped) = snap_to_sentence(chars, start + size / 2, target_end) {
                    end = snapped;
                }
            }

            spans.push(TextSpan { start, end });
            if end >= total {
                break;
            }

            // Overlap with the chunk just emitted; if that would not move
            // forward, continue from its end instead.
            let next = end.saturating_sub(overlap);
            start = if next > start { next } else { end };
        }

        spans
    }

    /// Splits `text` and keeps chunks whose trimmed length reaches
    /// `min_chunk_length`.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        self.split_chars(&chars)
            .into_iter()
            .filter_map(|span| {
                let raw: String = chars[span.start..span.end].iter().collect();
                let trimmed = raw.trim();
                (trimmed.chars().count() >= self.config.min_chunk_length).then(|| TextChunk {
                    span,
                    text: trimmed.to_string(),
                })
            })
            .collect()
    }
}

/// Searches backward from `target_end - 1` to `lower` for a sentence
/// terminator followed by whitespace; returns the offset just past it.
fn snap_to_sentence(chars: &[char], lower: usize, target_end: usize) -> Option<usize> {
    (lower..target_end).rev().find_map(|i| {
        let terminal = matches!(chars[i], '.' | '?' | '!');
        let followed_by_space = chars.get(i + 1).is_some_and(|c| c.is_whitespace());
        (terminal && followed_by_space).then_some(i + 1)
    })
}

/// Estimated 1-based page for a chunk starting at character `offset` of a
/// text `total_chars` long spread over `page_count` pages:
/// `floor(offset / total_chars * page_count) + 1`, clamped to the page range.
pub fn estimate_page(offset: usize, total_chars: usize, page_count: usize) -> usize {
    if total_chars == 0 || page_count == 0 {
        return 1;
    }
    let slot = (offset as u128 * page_count as u128 / total_chars as u128) as usize;
    (slot + 1).clamp(1, page_count)
}
