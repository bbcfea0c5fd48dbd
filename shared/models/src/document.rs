//! Document-level models: the raw upload, recovered page text and the
//! aggregate handed back to the analysis workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::chunk::Chunk;

/// A PDF upload as received from the calling workflow.
///
/// The byte buffer is opaque at this layer; it is never mutated and is only
/// borrowed by the extractor.
#[derive(Debug, Clone, Validate)]
pub struct RawDocument {
    #[validate(length(min = 1, max = 255, message = "Document id must be between 1 and 255 characters"))]
    pub document_id: String,
    #[validate(length(max = 500, message = "Company name must be at most 500 characters"))]
    pub company_name: String,
    #[validate(length(min = 1, max = 255, message = "File name is required"))]
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(
        document_id: impl Into<String>,
        company_name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            company_name: company_name.into(),
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Creates a document with a fresh UUID v4 identifier.
    pub fn with_generated_id(
        company_name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self::new(Uuid::new_v4().to_string(), company_name, file_name, bytes)
    }

    /// Hex-encoded SHA-256 of the raw bytes.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Text recovered from one physical page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based position of the page in the source document.
    pub page_number: u32,
    /// Whitespace-normalized plain text.
    pub content: String,
}

impl PageText {
    pub fn new(page_number: u32, content: impl Into<String>) -> Self {
        Self {
            page_number,
            content: content.into(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Which extraction path produced the page texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Content-stream walk with coordinate-based line reconstruction.
    PositionedText,
    /// Whole-document text from the `pdf-extract` crate.
    PdfExtract,
    /// Regex scan of text-show operators in the raw bytes.
    OperatorScan,
    /// Letter-run salvage from the raw bytes.
    RawText,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PositionedText => "positioned_text",
            Self::PdfExtract => "pdf_extract",
            Self::OperatorScan => "operator_scan",
            Self::RawText => "raw_text",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the extractor: ordered page texts plus the page count of the
/// source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub pages: Vec<PageText>,
    /// Page count of the source document, which may exceed `pages.len()`
    /// when some pages produced no text.
    pub page_count: usize,
    pub method: ExtractionMethod,
}

impl ExtractedDocument {
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(PageText::char_count).sum()
    }

    /// Pages of the source that yielded no text.
    pub fn missing_pages(&self) -> usize {
        self.page_count.saturating_sub(self.pages.len())
    }

    /// Page contents joined by a single space.
    pub fn full_text(&self) -> String {
        join_pages(&self.pages)
    }
}

/// Joins page contents with a single space, matching the whitespace
/// normalization applied to each page.
pub fn join_pages(pages: &[PageText]) -> String {
    let mut text = String::with_capacity(pages.iter().map(|p| p.content.len() + 1).sum());
    for page in pages {
        if page.content.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&page.content);
    }
    text
}

/// Aggregate returned to the analysis workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub document_id: String,
    pub company_name: String,
    pub file_name: String,
    /// The portion of `text` that was chunked.
    pub content: String,
    /// Full recovered text.
    pub text: String,
    pub paragraphs: Vec<Chunk>,
    pub processed: bool,
    pub page_count: usize,
    pub recovered_pages: usize,
    pub extraction_method: ExtractionMethod,
    pub source_sha256: String,
    pub processed_at: DateTime<Utc>,
}

impl ProcessingResult {
    pub fn chunk_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Caps `text`/`content` length and the number of chunks, keeping the
    /// earliest content. Returns true when anything was cut.
    pub fn truncate_for_transport(&mut self, max_text_chars: usize, max_chunks: usize) -> bool {
        let mut truncated = truncate_chars(&mut self.text, max_text_chars);
        truncated |= truncate_chars(&mut self.content, max_text_chars);
        if self.paragraphs.len() > max_chunks {
            self.paragraphs.truncate(max_chunks);
            truncated = true;
        }
        truncated
    }
}

fn truncate_chars(text: &mut String, max_chars: usize) -> bool {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = RawDocument::new("doc-1", "Acme", "a.pdf", b"%PDF-1.4".to_vec());
        let b = RawDocument::new("doc-2", "Other", "b.pdf", b"%PDF-1.4".to_vec());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_generated_id_is_uuid() {
        let doc = RawDocument::with_generated_id("Acme", "10k.pdf", Vec::new());
        assert!(Uuid::parse_str(&doc.document_id).is_ok());
    }

    #[test]
    fn test_raw_document_validation() {
        let doc = RawDocument::new("", "Acme", "a.pdf", Vec::new());
        assert!(doc.validate().is_err());

        let doc = RawDocument::new("doc-1", "Acme", "a.pdf", Vec::new());
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_join_pages_skips_empty() {
        let pages = vec![
            PageText::new(1, "First page."),
            PageText::new(2, ""),
            PageText::new(3, "Third page."),
        ];
        assert_eq!(join_pages(&pages), "First page. Third page.");
    }

    #[test]
    fn test_missing_pages() {
        let extracted = ExtractedDocument {
            pages: vec![PageText::new(1, "abc"), PageText::new(3, "def")],
            page_count: 3,
            method: ExtractionMethod::PositionedText,
        };
        assert_eq!(extracted.missing_pages(), 1);
        assert_eq!(extracted.total_chars(), 6);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        let mut text = "€€€€".to_string();
        assert!(truncate_chars(&mut text, 2));
        assert_eq!(text, "€€");
        assert!(!truncate_chars(&mut text, 10));
    }
}
