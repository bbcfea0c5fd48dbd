//! # FinRisk Document Processing
//!
//! Turns PDF filings into ordered, page-attributed text chunks for risk
//! analysis.
//!
//! - [`extraction`]: PDF bytes to page texts through a chain of strategies
//! - [`chunker`]: overlapping, sentence-aware chunking
//! - [`sections`]: page section labels and section-based selection
//! - [`relevance`]: keyword filtering of chunks
//! - [`annotation`]: per-chunk risk signals
//! - [`processor`]: the end-to-end pipeline
//!
//! ```no_run
//! use finrisk_document_processing::DocumentProcessor;
//! use finrisk_models::RawDocument;
//! use finrisk_utils::AppConfig;
//!
//! # fn main() -> finrisk_utils::FinRiskResult<()> {
//! let config = AppConfig::load()?;
//! let processor = DocumentProcessor::from_config(&config)?;
//! let bytes = std::fs::read("acme-10k.pdf").unwrap_or_default();
//! let document = RawDocument::with_generated_id("Acme Corp", "acme-10k.pdf", bytes);
//!
//! let mut result = processor.process(&document)?;
//! result.truncate_for_transport(config.limits.max_text_chars, config.limits.max_chunks);
//! println!("{}", serde_json::to_string(&result)?);
//! # Ok(())
//! # }
//! ```

pub mod annotation;
pub mod chunker;
pub mod extraction;
pub mod processor;
pub mod progress;
pub mod relevance;
pub mod sections;

pub use annotation::RiskAnnotator;
pub use chunker::{estimate_page, Chunker, TextChunk, TextSpan};
pub use extraction::{ExtractionStrategy, Extractor, PdfSource, Recovered};
pub use processor::DocumentProcessor;
pub use progress::{NoopProgress, ProgressEvent, ProgressSink};
pub use relevance::{filter_chunks, FilterOutcome, KeywordFilter};
pub use sections::{select_sections, SectionClassifier, SectionSelection};
