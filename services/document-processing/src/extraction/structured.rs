//! Whole-document text from the `pdf-extract` crate.

use finrisk_models::{ExtractionMethod, PageText};
use finrisk_utils::FinRiskResult;
use tracing::debug;

use super::{ExtractionStrategy, PdfSource, Recovered};
use crate::progress::ProgressSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractStrategy;

impl PdfExtractStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Splits `pdf-extract` output on form feeds. The split is only trusted when
/// it yields exactly one segment per page.
fn split_pages(text: &str, page_count: usize) -> Option<Vec<PageText>> {
    let mut segments: Vec<&str> = text.split('\x0C').collect();
    if segments.len() > 1 && segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }
    if segments.len() != page_count || page_count < 2 {
        return None;
    }
    Some(
        segments
            .into_iter()
            .enumerate()
            .filter(|(_, segment)| !segment.trim().is_empty())
            .map(|(i, segment)| PageText::new(i as u32 + 1, segment))
            .collect(),
    )
}

impl ExtractionStrategy for PdfExtractStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::PdfExtract
    }

    fn quality_gated(&self) -> bool {
        true
    }

    fn extract(
        &self,
        source: &PdfSource<'_>,
        _progress: &dyn ProgressSink,
    ) -> FinRiskResult<Option<Recovered>> {
        let bytes = source.bytes;
        let text = match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                debug!(error = %e, "pdf-extract could not read document");
                return Ok(None);
            }
            Err(_) => {
                debug!("pdf-extract panicked while reading document");
                return Ok(None);
            }
        };

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(match split_pages(&text, source.page_count) {
            Some(pages) => Recovered::Pages(pages),
            None => Recovered::Text(text),
        }))
    }
}
