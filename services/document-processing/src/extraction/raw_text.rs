//! Last-resort path: salvages letter runs from the raw bytes.
//!
//! Output is often word salad; it is still preferred over failing outright.

use finrisk_models::ExtractionMethod;
use finrisk_utils::{ExtractionConfig, FinRiskResult};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::{ExtractionStrategy, PdfSource, Recovered};
use crate::progress::ProgressSink;

/// One word-level run: three letters, then word or punctuation characters.
/// A leading `/` is captured so name objects can be told apart.
static LETTER_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)(/?)([A-Za-z]{3,}[A-Za-z0-9.,;:!?'\-]*)").expect("valid letter-run regex")
});

/// Bare structural tokens that would otherwise survive as runs. Names such
/// as `/Type` are dropped by their slash, and `N N R` references never
/// reach three letters.
const PDF_KEYWORDS: &[&str] = &[
    "PDF",
    "EOF",
    "obj",
    "endobj",
    "stream",
    "endstream",
    "xref",
    "startxref",
    "trailer",
    "true",
    "false",
    "null",
];

#[derive(Debug, Clone)]
pub struct RawTextStrategy {
    min_run_chars: usize,
}

impl RawTextStrategy {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            min_run_chars: config.min_raw_run_chars,
        }
    }

    pub fn salvage(&self, bytes: &[u8]) -> String {
        LETTER_RUN
            .captures_iter(bytes)
            .filter(|caps| caps.get(1).map_or(true, |slash| slash.is_empty()))
            .filter_map(|caps| caps.get(2))
            .map(|run| String::from_utf8_lossy(run.as_bytes()).into_owned())
            .filter(|run| run.chars().count() >= self.min_run_chars && !is_structural(run))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// True when the run's leading letters spell a structural keyword, as in
/// `PDF-1.7` or `startxref`.
fn is_structural(run: &str) -> bool {
    let letters: String = run.chars().take_while(char::is_ascii_alphabetic).collect();
    PDF_KEYWORDS.contains(&letters.as_str())
}

impl ExtractionStrategy for RawTextStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::RawText
    }

    fn extract(
        &self,
        source: &PdfSource<'_>,
        _progress: &dyn ProgressSink,
    ) -> FinRiskResult<Option<Recovered>> {
        let text = self.salvage(source.bytes);
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(Recovered::Text(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> RawTextStrategy {
        RawTextStrategy::new(&ExtractionConfig::default())
    }

    #[test]
    fn test_keeps_long_letter_runs() {
        let bytes = b"\x00\x01Operating losses increased.\xff\xfe ab 12 xy";
        assert_eq!(strategy().salvage(bytes), "Operating losses increased.");
    }

    #[test]
    fn test_drops_short_runs_and_structure() {
        let bytes = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n%%EOF";
        assert_eq!(strategy().salvage(bytes), "");
    }

    #[test]
    fn test_drops_dictionary_bodies() {
        let bytes = b"3 0 obj\n<</Type/Page/Parent 1 0 R/Resources 2 0 R/Contents 4 0 R>>\nendobj\n\
                      trailer\n<</Root 10 0 R/Size 12/Index[0 12]>>\nstartxref\n1024\n%%EOF";
        assert_eq!(strategy().salvage(bytes), "");
    }

    #[test]
    fn test_runs_are_word_level() {
        let bytes = b"/Font 12 0 R Tf (Liquidity pressures) 7 0 R increased.";
        assert_eq!(strategy().salvage(bytes), "Liquidity pressures increased.");
    }

    #[test]
    fn test_no_letter_runs_is_a_miss() {
        let source = PdfSource::new(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n12 0 R 9 9 9", None, 1);
        let result = strategy()
            .extract(&source, &crate::progress::NoopProgress)
            .unwrap();
        assert!(result.is_none());
    }
}
