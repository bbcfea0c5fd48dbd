mod common;

use common::{build_pdf, headed_bytes, prose, raw_document};
use finrisk_document_processing::{
    filter_chunks, Chunker, DocumentProcessor, KeywordFilter, ProgressEvent, SectionClassifier,
};
use finrisk_models::{Chunk, ChunkMetadata, ExtractionMethod, RiskAnnotations, SectionLabel};
use finrisk_utils::{AppConfig, ChunkingConfig, RelevanceMode};
use std::cell::RefCell;

fn processor(config: &AppConfig) -> DocumentProcessor {
    DocumentProcessor::from_config(config).unwrap()
}

fn small_chunks(config: &mut AppConfig) {
    config.chunking = ChunkingConfig {
        chunk_size: 300,
        overlap: 60,
        min_chunk_length: 50,
        sentence_snap: true,
    };
}

#[test]
fn test_fixed_windows_over_2500_chars() {
    let chunker = Chunker::new(ChunkingConfig {
        chunk_size: 1000,
        overlap: 200,
        min_chunk_length: 50,
        sentence_snap: false,
    })
    .unwrap();
    let text: String = "abcdefghij".repeat(250);
    let chunks = chunker.chunk(&text);

    let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.span.start, c.span.end)).collect();
    assert_eq!(spans, vec![(0, 1000), (800, 1800), (1600, 2500)]);
    assert_eq!(chunks[1].text, text.chars().skip(800).take(1000).collect::<String>());
}

#[test]
fn test_first_boundary_falls_after_a_period() {
    let chunker = Chunker::new(ChunkingConfig::default()).unwrap();
    let text: String = "Risk is high. Exposure is moderate. "
        .repeat(40)
        .chars()
        .take(1200)
        .collect();
    let chunks = chunker.chunk(&text);

    let first = &chunks[0];
    assert!(first.text.ends_with('.'));
    assert!(first.span.end > 950 && first.span.end <= 1000);
    assert!(text.chars().nth(first.span.end).is_some_and(char::is_whitespace));
}

#[test]
fn test_keyword_filter_keeps_matching_chunks_in_order() {
    let texts = [
        "Revenue increased across all segments this year.",
        "Currency Risk could reduce reported earnings materially.",
        "We opened a new distribution center in Ohio.",
        "Cybersecurity risk remains a focus of the board.",
        "Employee headcount was broadly unchanged.",
    ];
    let chunks: Vec<Chunk> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| Chunk {
            text: text.to_string(),
            page: 1,
            section_label: Some(SectionLabel::General),
            metadata: ChunkMetadata {
                document_id: "doc".to_string(),
                company_name: "Acme".to_string(),
                index: i + 1,
                char_start: 0,
                char_end: text.len(),
                annotations: RiskAnnotations::default(),
            },
        })
        .collect();

    let outcome = filter_chunks(chunks.clone(), &KeywordFilter::new(["risk"]), 50);
    assert_eq!(outcome.chunks, vec![chunks[1].clone(), chunks[3].clone()]);
}

#[test]
fn test_buffer_without_text_fails_extraction() {
    let document = raw_document(headed_bytes("0 0 612 792 re f 1 0 0 RG"));
    let err = processor(&AppConfig::default()).process(&document).unwrap_err();

    assert!(err.is_no_text());
}

#[test]
fn test_section_filter_falls_back_to_leading_pages() {
    let mut config = AppConfig::default();
    small_chunks(&mut config);
    config.relevance.mode = RelevanceMode::Section;
    config.relevance.allowed_sections = vec!["Risk Factors".to_string()];
    config.relevance.fallback_pages = 2;

    let bytes = build_pdf(&[
        prose("store openings", 4),
        prose("employee programs", 4),
        prose("community grants", 4),
    ]);
    let result = processor(&config).process(&raw_document(bytes)).unwrap();

    assert!(!result.paragraphs.is_empty());
    assert!(result.content.contains("store openings"));
    assert!(result.content.contains("employee programs"));
    assert!(!result.content.contains("community grants"));
    assert!(result.text.contains("community grants"));
    assert!(result.paragraphs.iter().all(|c| c.page <= 2));
}

#[test]
fn test_section_filter_keeps_matching_pages() {
    let mut config = AppConfig::default();
    small_chunks(&mut config);
    config.relevance.mode = RelevanceMode::Section;
    config.relevance.allowed_sections = vec!["Risk Factors".to_string()];

    let mut risk_page = vec!["Item 1A. Risk Factors".to_string()];
    risk_page.extend(prose("commodity price exposure", 6));
    let bytes = build_pdf(&[prose("our history", 4), risk_page, prose("properties", 4)]);
    let result = processor(&config).process(&raw_document(bytes)).unwrap();

    assert!(result.content.starts_with("Item 1A. Risk Factors"));
    assert!(!result.content.contains("our history"));
    assert!(result
        .paragraphs
        .iter()
        .all(|c| c.page == 2 && c.section_label == Some(SectionLabel::RiskFactors)));
}

#[test]
fn test_custom_section_rules_drive_selection() {
    let mut config = AppConfig::default();
    small_chunks(&mut config);
    config.relevance.mode = RelevanceMode::Section;
    config.relevance.allowed_sections = vec!["Notes".to_string()];

    let classifier =
        SectionClassifier::with_rules(&[(SectionLabel::Notes, r"(?i)footnote\s+disclosures")])
            .unwrap();
    let mut footnotes = vec!["Footnote Disclosures".to_string()];
    footnotes.extend(prose("lease commitments", 6));
    let bytes = build_pdf(&[prose("segment results", 6), footnotes]);

    let result = processor(&config)
        .with_classifier(classifier)
        .process(&raw_document(bytes))
        .unwrap();

    assert!(result.content.starts_with("Footnote Disclosures"));
    assert!(result
        .paragraphs
        .iter()
        .all(|c| c.page == 2 && c.section_label == Some(SectionLabel::Notes)));
}

#[test]
fn test_full_pipeline_result_shape() {
    let mut config = AppConfig::default();
    small_chunks(&mut config);

    let mut mdna = vec!["Management's Discussion and Analysis of Financial Condition".to_string()];
    mdna.extend(prose("liquidity risk of $2.5 million or 12%", 6));
    let bytes = build_pdf(&[prose("the business overview", 6), mdna]);
    let document = raw_document(bytes);
    let result = processor(&config).process(&document).unwrap();

    assert!(result.processed);
    assert_eq!(result.document_id, "doc-42");
    assert_eq!(result.company_name, "Acme Holdings");
    assert_eq!(result.file_name, "acme-10k.pdf");
    assert_eq!(result.extraction_method, ExtractionMethod::PositionedText);
    assert_eq!(result.page_count, 2);
    assert_eq!(result.recovered_pages, 2);
    assert_eq!(result.source_sha256, document.fingerprint());
    assert_eq!(result.text, result.content);

    let pages: Vec<u32> = result.paragraphs.iter().map(|c| c.page).collect();
    assert!(pages.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(pages.first(), Some(&1));
    assert_eq!(pages.last(), Some(&2));

    let last = result.paragraphs.last().unwrap();
    assert_eq!(last.section_label, Some(SectionLabel::Mdna));
    assert!(last.metadata.annotations.monetary_amounts > 0);
    assert!(last.metadata.annotations.matched_keywords.contains(&"liquidity".to_string()));
    let indices: Vec<usize> = result.paragraphs.iter().map(|c| c.metadata.index).collect();
    assert_eq!(indices, (0..result.paragraphs.len()).collect::<Vec<_>>());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["processed"], true);
    assert_eq!(json["paragraphs"][0]["metadata"]["document_id"], "doc-42");
}

#[test]
fn test_keyword_mode_drops_unrelated_chunks() {
    let mut config = AppConfig::default();
    small_chunks(&mut config);
    config.relevance.mode = RelevanceMode::Keyword;
    config.relevance.keywords = vec!["hedging".to_string()];

    let bytes = build_pdf(&[prose("office locations", 6), prose("hedging programs", 6)]);
    let result = processor(&config).process(&raw_document(bytes)).unwrap();

    assert!(!result.paragraphs.is_empty());
    assert!(result.paragraphs.iter().all(|c| c.text.contains("hedging")));
    let indices: Vec<usize> = result.paragraphs.iter().map(|c| c.metadata.index).collect();
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_keyword_mode_without_matches_keeps_prefix() {
    let mut config = AppConfig::default();
    small_chunks(&mut config);
    config.relevance.mode = RelevanceMode::Keyword;
    config.relevance.keywords = vec!["derivatives".to_string()];
    config.relevance.fallback_chunks = 2;

    let bytes = build_pdf(&[prose("office locations", 8), prose("retail footprint", 8)]);
    let result = processor(&config).process(&raw_document(bytes)).unwrap();

    let indices: Vec<usize> = result.paragraphs.iter().map(|c| c.metadata.index).collect();
    assert_eq!(indices, vec![0, 1]);
}

#[test]
fn test_truncation_keeps_earliest_content() {
    let mut config = AppConfig::default();
    small_chunks(&mut config);
    let bytes = build_pdf(&[prose("capital allocation", 10), prose("share repurchases", 10)]);
    let mut result = processor(&config).process(&raw_document(bytes)).unwrap();
    let original = result.clone();

    assert!(result.truncate_for_transport(200, 2));
    assert_eq!(result.paragraphs, original.paragraphs[..2].to_vec());
    assert!(original.text.starts_with(&result.text));
    assert_eq!(result.text.chars().count(), 200);
}

#[test]
fn test_pipeline_reports_progress() {
    let mut config = AppConfig::default();
    small_chunks(&mut config);
    let events = RefCell::new(Vec::new());
    let sink = |event: &ProgressEvent| events.borrow_mut().push(event.clone());

    let bytes = build_pdf(&[prose("pension obligations", 6)]);
    let result = processor(&config)
        .process_with_progress(&raw_document(bytes), &sink)
        .unwrap();

    let events = events.into_inner();
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::ChunkingCompleted { chunk_count }) if *chunk_count == result.paragraphs.len()
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::ExtractionCompleted { .. })));
}
