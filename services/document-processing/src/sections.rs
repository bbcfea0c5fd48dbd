//! Page-level section classification for filings such as 10-Ks.

use finrisk_models::{PageText, SectionLabel};
use finrisk_utils::{FinRiskError, FinRiskResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Built-in rules, in priority order. Notes come before the generic
/// financial-statements rule since their headings contain that phrase.
const BUILTIN_RULES: &[(SectionLabel, &str)] = &[
    (
        SectionLabel::RiskFactors,
        r"(?i)item\s*1a\.?[\s:.\-\u{2013}\u{2014}]*risk\s+factors",
    ),
    (
        SectionLabel::Mdna,
        r"(?i)management['\u{2019}]?s\s+discussion\s+and\s+analysis",
    ),
    (
        SectionLabel::Notes,
        r"(?i)notes\s+to\s+(?:the\s+)?(?:consolidated\s+)?financial\s+statements",
    ),
    (
        SectionLabel::FinancialStatements,
        r"(?i)item\s*8\.?[\s:.\-\u{2013}\u{2014}]*financial\s+statements",
    ),
    (SectionLabel::FinancialStatements, r"(?i)financial\s+statements"),
];

static BUILTIN: Lazy<Vec<SectionRule>> = Lazy::new(|| {
    BUILTIN_RULES
        .iter()
        .map(|(label, pattern)| SectionRule {
            label: *label,
            pattern: Regex::new(pattern).expect("valid built-in section pattern"),
        })
        .collect()
});

#[derive(Debug, Clone)]
pub struct SectionRule {
    pub label: SectionLabel,
    pub pattern: Regex,
}

/// Labels a page with the first rule whose pattern matches its content;
/// pages matching nothing are `General`.
#[derive(Debug, Clone)]
pub struct SectionClassifier {
    rules: Vec<SectionRule>,
}

impl Default for SectionClassifier {
    fn default() -> Self {
        Self {
            rules: BUILTIN.to_vec(),
        }
    }
}

impl SectionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: &[(SectionLabel, &str)]) -> FinRiskResult<Self> {
        let rules = rules
            .iter()
            .map(|(label, pattern)| {
                Regex::new(pattern)
                    .map(|pattern| SectionRule {
                        label: *label,
                        pattern,
                    })
                    .map_err(|e| {
                        FinRiskError::configuration(format!(
                            "invalid section pattern '{}': {}",
                            pattern, e
                        ))
                    })
            })
            .collect::<FinRiskResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn classify(&self, content: &str) -> SectionLabel {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(content))
            .map_or(SectionLabel::General, |rule| rule.label)
    }

    pub fn classify_pages(&self, pages: &[PageText]) -> Vec<SectionLabel> {
        pages.iter().map(|page| self.classify(&page.content)).collect()
    }
}

/// Pages kept by section filtering, with their labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSelection {
    pub pages: Vec<PageText>,
    pub labels: Vec<SectionLabel>,
    /// True when nothing matched the allow-list and a prefix was kept.
    pub fallback: bool,
}

/// Keeps pages whose label is allowed, in source order. When none is,
/// keeps the first `fallback_pages` pages instead.
pub fn select_sections(
    pages: &[PageText],
    labels: &[SectionLabel],
    allowed: &[SectionLabel],
    fallback_pages: usize,
) -> SectionSelection {
    let (kept_pages, kept_labels): (Vec<PageText>, Vec<SectionLabel>) = pages
        .iter()
        .zip(labels)
        .filter(|(_, label)| allowed.contains(*label))
        .map(|(page, label)| (page.clone(), *label))
        .unzip();

    if !kept_pages.is_empty() || pages.is_empty() {
        return SectionSelection {
            pages: kept_pages,
            labels: kept_labels,
            fallback: false,
        };
    }

    let take = fallback_pages.min(pages.len());
    SectionSelection {
        pages: pages[..take].to_vec(),
        labels: labels[..take.min(labels.len())].to_vec(),
        fallback: true,
    }
}
