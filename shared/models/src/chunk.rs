//! Chunk models handed to downstream risk analysis.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Document section a page (and the chunks attributed to it) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionLabel {
    #[serde(rename = "Risk Factors")]
    RiskFactors,
    #[serde(rename = "MD&A")]
    Mdna,
    #[serde(rename = "Financial Statements")]
    FinancialStatements,
    #[serde(rename = "Notes")]
    Notes,
    #[serde(rename = "General")]
    General,
}

impl SectionLabel {
    pub const ALL: [SectionLabel; 5] = [
        Self::RiskFactors,
        Self::Mdna,
        Self::FinancialStatements,
        Self::Notes,
        Self::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RiskFactors => "Risk Factors",
            Self::Mdna => "MD&A",
            Self::FinancialStatements => "Financial Statements",
            Self::Notes => "Notes",
            Self::General => "General",
        }
    }
}

impl std::fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionLabel {
    type Err = String;

    /// Accepts display names and a few common aliases, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "risk factors" | "riskfactors" => Ok(Self::RiskFactors),
            "md&a" | "mdna" | "mda" | "management's discussion and analysis" => Ok(Self::Mdna),
            "financial statements" | "financialstatements" => Ok(Self::FinancialStatements),
            "notes" => Ok(Self::Notes),
            "general" => Ok(Self::General),
            _ => Err(format!("unknown section label '{}'", s)),
        }
    }
}

/// Risk signals found in a chunk's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAnnotations {
    pub matched_keywords: Vec<String>,
    pub monetary_amounts: usize,
    pub percentages: usize,
    pub severity_phrases: Vec<String>,
}

impl RiskAnnotations {
    pub fn is_empty(&self) -> bool {
        self.matched_keywords.is_empty()
            && self.monetary_amounts == 0
            && self.percentages == 0
            && self.severity_phrases.is_empty()
    }
}

/// Caller context plus fields derived while chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_id: String,
    pub company_name: String,
    /// Position of the chunk in the unfiltered chunk sequence.
    pub index: usize,
    /// Character offset of the chunk span within the chunked text.
    pub char_start: usize,
    /// Exclusive end offset of the chunk span.
    pub char_end: usize,
    pub annotations: RiskAnnotations,
}

/// The unit of text analyzed downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Trimmed chunk text.
    pub text: String,
    /// Estimated source page (linear interpolation, not authoritative).
    pub page: u32,
    pub section_label: Option<SectionLabel>,
    pub metadata: ChunkMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_label_parsing() {
        assert_eq!("Risk Factors".parse::<SectionLabel>(), Ok(SectionLabel::RiskFactors));
        assert_eq!("risk_factors".parse::<SectionLabel>(), Ok(SectionLabel::RiskFactors));
        assert_eq!("md&a".parse::<SectionLabel>(), Ok(SectionLabel::Mdna));
        assert_eq!("NOTES".parse::<SectionLabel>(), Ok(SectionLabel::Notes));
        assert!("Appendix".parse::<SectionLabel>().is_err());
    }

    #[test]
    fn test_section_label_display_round_trips() {
        for label in SectionLabel::ALL {
            assert_eq!(label.to_string().parse::<SectionLabel>(), Ok(label));
        }
    }

    #[test]
    fn test_section_label_serializes_as_display_name() {
        let json = serde_json::to_string(&SectionLabel::Mdna).unwrap();
        assert_eq!(json, "\"MD&A\"");
    }
}
