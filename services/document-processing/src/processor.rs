//! Document pipeline: extraction, section labelling, chunking, annotation
//! and relevance filtering.

use chrono::Utc;
use finrisk_models::{
    join_pages, Chunk, ChunkMetadata, PageText, ProcessingResult, RawDocument, SectionLabel,
};
use finrisk_utils::{
    validate_model, AppConfig, ChunkingConfig, ExtractionConfig, FinRiskError, FinRiskResult,
    RelevanceConfig, RelevanceMode,
};
use tracing::{info, instrument, warn};

use crate::annotation::RiskAnnotator;
use crate::chunker::{estimate_page, Chunker};
use crate::extraction::Extractor;
use crate::progress::{NoopProgress, ProgressEvent, ProgressSink};
use crate::relevance::{filter_chunks, KeywordFilter};
use crate::sections::{select_sections, SectionClassifier};

/// Relevance filtering resolved from configuration.
#[derive(Debug, Clone)]
enum RelevancePolicy {
    None,
    Keyword {
        filter: KeywordFilter,
        fallback_chunks: usize,
    },
    Section {
        allowed: Vec<SectionLabel>,
        fallback_pages: usize,
    },
}

impl RelevancePolicy {
    fn from_config(config: &RelevanceConfig, keywords: &KeywordFilter) -> FinRiskResult<Self> {
        match config.mode {
            RelevanceMode::None => Ok(Self::None),
            RelevanceMode::Keyword => {
                if keywords.is_empty() {
                    return Err(FinRiskError::configuration(
                        "keyword relevance mode requires at least one keyword",
                    ));
                }
                Ok(Self::Keyword {
                    filter: keywords.clone(),
                    fallback_chunks: config.fallback_chunks,
                })
            }
            RelevanceMode::Section => {
                let allowed = config
                    .allowed_sections
                    .iter()
                    .map(|name| name.parse::<SectionLabel>().map_err(FinRiskError::configuration))
                    .collect::<FinRiskResult<Vec<_>>>()?;
                if allowed.is_empty() {
                    return Err(FinRiskError::configuration(
                        "section relevance mode requires at least one allowed section",
                    ));
                }
                Ok(Self::Section {
                    allowed,
                    fallback_pages: config.fallback_pages,
                })
            }
        }
    }
}

/// Stateless pipeline; one instance can process any number of documents.
pub struct DocumentProcessor {
    extractor: Extractor,
    chunker: Chunker,
    classifier: SectionClassifier,
    annotator: RiskAnnotator,
    relevance: RelevancePolicy,
}

impl DocumentProcessor {
    /// Validates the chunking and relevance settings before anything runs.
    pub fn new(
        extraction: ExtractionConfig,
        chunking: ChunkingConfig,
        relevance: &RelevanceConfig,
    ) -> FinRiskResult<Self> {
        let chunker = Chunker::new(chunking)?;
        let keywords = KeywordFilter::new(&relevance.keywords);
        let policy = RelevancePolicy::from_config(relevance, &keywords)?;

        Ok(Self {
            extractor: Extractor::new(extraction),
            chunker,
            classifier: SectionClassifier::new(),
            annotator: RiskAnnotator::new(keywords),
            relevance: policy,
        })
    }

    pub fn from_config(config: &AppConfig) -> FinRiskResult<Self> {
        config.ensure_valid()?;
        Self::new(
            config.extraction.clone(),
            config.chunking.clone(),
            &config.relevance,
        )
    }

    /// Replaces the extraction chain.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replaces the section rules.
    pub fn with_classifier(mut self, classifier: SectionClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn process(&self, document: &RawDocument) -> FinRiskResult<ProcessingResult> {
        self.process_with_progress(document, &NoopProgress)
    }

    #[instrument(
        name = "process_document",
        skip_all,
        fields(document_id = %document.document_id, file_name = %document.file_name)
    )]
    pub fn process_with_progress(
        &self,
        document: &RawDocument,
        progress: &dyn ProgressSink,
    ) -> FinRiskResult<ProcessingResult> {
        validate_model(document)?;

        let extracted = self
            .extractor
            .extract_with_progress(&document.bytes, progress)?;
        if progress.is_cancelled() {
            return Err(FinRiskError::cancelled("chunking"));
        }

        let labels = self.classifier.classify_pages(&extracted.pages);
        let text = extracted.full_text();

        let (pages, page_labels) = match &self.relevance {
            RelevancePolicy::Section {
                allowed,
                fallback_pages,
            } => {
                let selection =
                    select_sections(&extracted.pages, &labels, allowed, *fallback_pages);
                if selection.fallback {
                    warn!(
                        kept_pages = selection.pages.len(),
                        "No page matched the allowed sections; keeping leading pages"
                    );
                }
                progress.on_event(&ProgressEvent::FilterApplied {
                    retained: selection.pages.len(),
                    fallback: selection.fallback,
                });
                (selection.pages, selection.labels)
            }
            _ => (extracted.pages.clone(), labels),
        };

        let content = join_pages(&pages);
        let mut chunks = self.build_chunks(document, &content, &pages, &page_labels);
        progress.on_event(&ProgressEvent::ChunkingCompleted {
            chunk_count: chunks.len(),
        });

        if let RelevancePolicy::Keyword {
            filter,
            fallback_chunks,
        } = &self.relevance
        {
            let outcome = filter_chunks(chunks, filter, *fallback_chunks);
            if outcome.fallback {
                warn!(
                    kept_chunks = outcome.chunks.len(),
                    "No chunk matched the relevance keywords; keeping leading chunks"
                );
            }
            progress.on_event(&ProgressEvent::FilterApplied {
                retained: outcome.chunks.len(),
                fallback: outcome.fallback,
            });
            chunks = outcome.chunks;
        }

        info!(
            method = %extracted.method,
            size_bytes = document.size_bytes(),
            page_count = extracted.page_count,
            recovered_pages = extracted.pages.len(),
            chunks = chunks.len(),
            "Document processed"
        );

        Ok(ProcessingResult {
            document_id: document.document_id.clone(),
            company_name: document.company_name.clone(),
            file_name: document.file_name.clone(),
            content,
            text,
            paragraphs: chunks,
            processed: true,
            page_count: extracted.page_count,
            recovered_pages: extracted.pages.len(),
            extraction_method: extracted.method,
            source_sha256: document.fingerprint(),
            processed_at: Utc::now(),
        })
    }

    /// Chunks `content` (the pages joined by single spaces) and attributes
    /// each chunk to a page by its start offset.
    fn build_chunks(
        &self,
        document: &RawDocument,
        content: &str,
        pages: &[PageText],
        labels: &[SectionLabel],
    ) -> Vec<Chunk> {
        let total_chars = content.chars().count();

        self.chunker
            .chunk(content)
            .into_iter()
            .enumerate()
            .map(|(index, piece)| {
                let slot = estimate_page(piece.span.start, total_chars, pages.len()) - 1;
                let annotations = self.annotator.annotate(&piece.text);
                Chunk {
                    page: pages.get(slot).map_or(1, |p| p.page_number),
                    section_label: Some(labels.get(slot).copied().unwrap_or(SectionLabel::General)),
                    metadata: ChunkMetadata {
                        document_id: document.document_id.clone(),
                        company_name: document.company_name.clone(),
                        index,
                        char_start: piece.span.start,
                        char_end: piece.span.end,
                        annotations,
                    },
                    text: piece.text,
                }
            })
            .collect()
    }
}
