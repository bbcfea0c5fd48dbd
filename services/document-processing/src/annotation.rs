//! Risk signals attached to chunk metadata.

use finrisk_models::RiskAnnotations;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::relevance::KeywordFilter;

static MONETARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[$€£¥]\s?\d+(?:,\d{3})*(?:\.\d+)?(?:\s?(?:thousand|million|billion|trillion)\b|[KMB]\b)?",
    )
    .expect("valid monetary regex")
});

static PERCENTAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?\s?%").expect("valid percentage regex"));

static SEVERITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:high|medium|low|significant|material|substantial|elevated)\s+risks?\b")
        .expect("valid severity regex")
});

#[derive(Debug, Clone, Default)]
pub struct RiskAnnotator {
    keywords: KeywordFilter,
}

impl RiskAnnotator {
    pub fn new(keywords: KeywordFilter) -> Self {
        Self { keywords }
    }

    pub fn annotate(&self, text: &str) -> RiskAnnotations {
        let mut severity_phrases: Vec<String> = Vec::new();
        for m in SEVERITY.find_iter(text) {
            let phrase = m
                .as_str()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            if !severity_phrases.contains(&phrase) {
                severity_phrases.push(phrase);
            }
        }

        RiskAnnotations {
            matched_keywords: self.keywords.matched_terms(text),
            monetary_amounts: MONETARY.find_iter(text).count(),
            percentages: PERCENTAGE.find_iter(text).count(),
            severity_phrases,
        }
    }
}
