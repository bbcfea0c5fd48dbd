//! # FinRisk Core Domain Models
//!
//! Data shapes shared by the document-processing pipeline and its callers.
//!
//! ## Key Models
//!
//! - **RawDocument**: the uploaded PDF bytes plus caller-chosen identifiers
//! - **PageText**: whitespace-normalized text recovered from one page
//! - **ExtractedDocument**: ordered page texts and the source page count
//! - **Chunk**: an overlapping window of text with page and section attribution
//! - **ProcessingResult**: the JSON-serializable aggregate returned to callers

pub mod chunk;
pub mod document;


pub use chunk::*;
pub use document::*;
