//! Extractor: turns a PDF byte buffer into ordered page texts.
//!
//! Strategies are tried in order until one recovers at least
//! `min_document_chars` characters of normalized text:
//!
//! 1. [`PositionedTextStrategy`]: content-stream walk with line reconstruction
//! 2. [`PdfExtractStrategy`]: the `pdf-extract` crate
//! 3. [`OperatorScanStrategy`]: regex scan of text-show operators
//! 4. [`RawTextStrategy`]: letter runs salvaged from the raw bytes
//!
//! A strategy that fails or comes up short is never surfaced to the caller;
//! only exhaustion of the whole chain is.

pub mod decode;
pub mod normalize;
pub mod operator_scan;
pub mod pages;
pub mod positioned;
pub mod raw_text;
pub mod structured;

use finrisk_models::{ExtractedDocument, ExtractionMethod, PageText};
use finrisk_utils::{ExtractionConfig, FinRiskError, FinRiskResult};
use lopdf::Document;
use tracing::{debug, info, warn};

use crate::progress::{NoopProgress, ProgressEvent, ProgressSink};

pub use operator_scan::OperatorScanStrategy;
pub use positioned::PositionedTextStrategy;
pub use raw_text::RawTextStrategy;
pub use structured::PdfExtractStrategy;

/// How far into the buffer the `%PDF-` signature may appear.
const SIGNATURE_WINDOW: usize = 1024;

/// The input buffer plus what could be learned about it up front.
pub struct PdfSource<'a> {
    pub bytes: &'a [u8],
    /// Parsed document, when `lopdf` could load the buffer.
    pub document: Option<Document>,
    /// Page count of the source; at least one.
    pub page_count: usize,
}

impl<'a> PdfSource<'a> {
    pub fn new(bytes: &'a [u8], document: Option<Document>, page_count: usize) -> Self {
        Self {
            bytes,
            document,
            page_count: page_count.max(1),
        }
    }

    /// Loads the page tree and counts pages. Fails with a format error when
    /// the buffer neither parses nor carries a PDF signature.
    pub fn load(bytes: &'a [u8]) -> FinRiskResult<Self> {
        let document = match Document::load_mem(bytes) {
            Ok(document) => Some(document),
            Err(e) => {
                debug!(error = %e, "Page tree could not be loaded");
                None
            }
        };

        if document.is_none() && !has_pdf_signature(bytes) {
            return Err(FinRiskError::format(
                "input is not a PDF: no page tree and no %PDF- signature",
            ));
        }

        let page_count = pages::count_pages(bytes, document.as_ref());
        Ok(Self::new(bytes, document, page_count))
    }
}

fn has_pdf_signature(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Raw output of a strategy before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovered {
    /// Text with real page boundaries.
    Pages(Vec<PageText>),
    /// Text for the whole document; pages are synthesized by offset.
    Text(String),
}

/// One step of the extraction chain.
///
/// `Ok(None)` means the strategy found nothing usable; errors are reserved
/// for cancellation.
pub trait ExtractionStrategy: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    /// Whether output must also pass the readability gate.
    fn quality_gated(&self) -> bool {
        false
    }

    fn extract(
        &self,
        source: &PdfSource<'_>,
        progress: &dyn ProgressSink,
    ) -> FinRiskResult<Option<Recovered>>;
}

pub struct Extractor {
    config: ExtractionConfig,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Self {
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> =
            vec![Box::new(PositionedTextStrategy::new(&config))];
        if config.use_pdf_extract {
            strategies.push(Box::new(PdfExtractStrategy::new()));
        }
        strategies.push(Box::new(OperatorScanStrategy::new(&config)));
        strategies.push(Box::new(RawTextStrategy::new(&config)));
        Self { config, strategies }
    }

    /// Builds an extractor with a custom strategy chain.
    pub fn with_strategies(
        config: ExtractionConfig,
        strategies: Vec<Box<dyn ExtractionStrategy>>,
    ) -> Self {
        Self { config, strategies }
    }

    pub fn methods(&self) -> Vec<ExtractionMethod> {
        self.strategies.iter().map(|s| s.method()).collect()
    }

    pub fn extract(&self, bytes: &[u8]) -> FinRiskResult<ExtractedDocument> {
        self.extract_with_progress(bytes, &NoopProgress)
    }

    pub fn extract_with_progress(
        &self,
        bytes: &[u8],
        progress: &dyn ProgressSink,
    ) -> FinRiskResult<ExtractedDocument> {
        let source = PdfSource::load(bytes)?;

        for strategy in &self.strategies {
            if progress.is_cancelled() {
                return Err(FinRiskError::cancelled("extraction"));
            }

            let method = strategy.method();
            progress.on_event(&ProgressEvent::StrategyStarted { method });

            let rejection = match strategy.extract(&source, progress)? {
                None => "no text recovered".to_string(),
                Some(recovered) => {
                    let pages = self.normalize(recovered, source.page_count);
                    match self.check(strategy.as_ref(), &pages) {
                        Ok(()) => {
                            return Ok(self.finish(method, pages, source.page_count, progress))
                        }
                        Err(reason) => reason,
                    }
                }
            };

            debug!(%method, reason = %rejection, "Extraction strategy rejected");
            progress.on_event(&ProgressEvent::StrategyRejected {
                method,
                reason: rejection,
            });
        }

        warn!(page_count = source.page_count, "No extraction strategy recovered text");
        Err(FinRiskError::no_text())
    }

    fn normalize(&self, recovered: Recovered, page_count: usize) -> Vec<PageText> {
        let policy = self.config.character_policy;
        match recovered {
            Recovered::Pages(pages) => pages
                .into_iter()
                .map(|page| {
                    let content = normalize::normalize_text(&page.content, policy);
                    PageText::new(page.page_number, content)
                })
                .filter(|page| !page.content.is_empty())
                .collect(),
            Recovered::Text(text) => {
                pages::distribute(&normalize::normalize_text(&text, policy), page_count)
            }
        }
    }

    fn check(&self, strategy: &dyn ExtractionStrategy, pages: &[PageText]) -> Result<(), String> {
        let total: usize = pages.iter().map(PageText::char_count).sum();
        if total < self.config.min_document_chars {
            return Err(format!(
                "recovered {} characters, below minimum of {}",
                total, self.config.min_document_chars
            ));
        }
        if strategy.quality_gated() {
            let text = finrisk_models::join_pages(pages);
            if !normalize::is_readable(&text) {
                return Err("output failed readability check".to_string());
            }
        }
        Ok(())
    }

    fn finish(
        &self,
        method: ExtractionMethod,
        pages: Vec<PageText>,
        page_count: usize,
        progress: &dyn ProgressSink,
    ) -> ExtractedDocument {
        let extracted = ExtractedDocument {
            pages,
            page_count,
            method,
        };
        if extracted.missing_pages() > 0 {
            warn!(
                %method,
                page_count,
                recovered_pages = extracted.pages.len(),
                "Some pages produced no text"
            );
        }
        info!(
            %method,
            page_count,
            recovered_pages = extracted.pages.len(),
            chars = extracted.total_chars(),
            "Text extracted"
        );
        progress.on_event(&ProgressEvent::ExtractionCompleted {
            method,
            recovered_pages: extracted.pages.len(),
            page_count,
        });
        extracted
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}
