//! Fallback path: regex scan for `(...) Tj` and `[...] TJ` operands.
//!
//! When the page tree loads, each page's decompressed content is scanned
//! separately so page numbers survive; otherwise the raw bytes are scanned
//! as one stream.

use finrisk_models::{ExtractionMethod, PageText};
use finrisk_utils::{ExtractionConfig, FinRiskError, FinRiskResult};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::decode::{decode_text_bytes, unescape_literal};
use super::{ExtractionStrategy, PdfSource, Recovered};
use crate::progress::{ProgressEvent, ProgressSink};

/// Literal strings may hold one level of balanced, unescaped parentheses.
static SHOW_OPERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s-u)\(((?:[^()\\]|\\.|\((?:[^()\\]|\\.)*\))*)\)\s*Tj|\[((?:[^\[\]\\]|\\.)*)\]\s*TJ",
    )
    .expect("valid text-show regex")
});

static ARRAY_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s-u)\(((?:[^()\\]|\\.|\((?:[^()\\]|\\.)*\))*)\)|(-?\d+(?:\.\d+)?|-?\.\d+)",
    )
    .expect("valid TJ array regex")
});

const TJ_SPACE_THRESHOLD: f64 = -200.0;

#[derive(Debug, Clone)]
pub struct OperatorScanStrategy {
    min_fragment_chars: usize,
}

impl OperatorScanStrategy {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            min_fragment_chars: config.min_fragment_chars,
        }
    }

    /// Extracts text-show fragments from content bytes, dropping fragments
    /// too short or without any alphanumeric character.
    pub fn scan(&self, bytes: &[u8]) -> String {
        let fragments: Vec<String> = SHOW_OPERATOR
            .captures_iter(bytes)
            .filter_map(|caps| {
                if let Some(literal) = caps.get(1) {
                    Some(decode_text_bytes(&unescape_literal(literal.as_bytes())))
                } else {
                    caps.get(2).map(|array| join_array(array.as_bytes()))
                }
            })
            .map(|fragment| fragment.trim().to_string())
            .filter(|fragment| self.is_textual(fragment))
            .collect();
        fragments.join(" ")
    }

    fn is_textual(&self, fragment: &str) -> bool {
        fragment.chars().count() >= self.min_fragment_chars
            && fragment.chars().any(char::is_alphanumeric)
    }
}

/// Concatenates the string items of a TJ array; a large negative kerning
/// adjustment between items becomes a space.
fn join_array(array: &[u8]) -> String {
    let mut text = String::new();
    for caps in ARRAY_ITEM.captures_iter(array) {
        if let Some(literal) = caps.get(1) {
            text.push_str(&decode_text_bytes(&unescape_literal(literal.as_bytes())));
        } else if let Some(number) = caps.get(2) {
            let value = std::str::from_utf8(number.as_bytes())
                .ok()
                .and_then(|n| n.parse::<f64>().ok());
            if value.is_some_and(|v| v < TJ_SPACE_THRESHOLD) && !text.ends_with(' ') {
                text.push(' ');
            }
        }
    }
    text
}

impl ExtractionStrategy for OperatorScanStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::OperatorScan
    }

    fn extract(
        &self,
        source: &PdfSource<'_>,
        progress: &dyn ProgressSink,
    ) -> FinRiskResult<Option<Recovered>> {
        if let Some(document) = source.document.as_ref() {
            let mut pages = Vec::new();
            for (page_number, page_id) in document.get_pages() {
                if progress.is_cancelled() {
                    return Err(FinRiskError::cancelled("extraction"));
                }
                let Ok(content) = document.get_page_content(page_id) else {
                    continue;
                };
                let text = self.scan(&content);
                progress.on_event(&ProgressEvent::PageExtracted {
                    method: self.method(),
                    page_number,
                    page_count: source.page_count,
                });
                if !text.is_empty() {
                    pages.push(PageText::new(page_number, text));
                }
            }
            if !pages.is_empty() {
                return Ok(Some(Recovered::Pages(pages)));
            }
        }

        let text = self.scan(source.bytes);
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(Recovered::Text(text)))
    }
}
