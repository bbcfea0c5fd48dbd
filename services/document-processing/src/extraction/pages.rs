//! Page counting and synthetic page buckets for strategies that cannot
//! recover page boundaries themselves.

use finrisk_models::PageText;
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

static PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)/Type\s*/Page(?:[^A-Za-z]|$)").expect("valid page marker regex"));

/// Page count from the parsed page tree, or from `/Type /Page` markers in the
/// raw bytes when the document could not be loaded. Never below one.
pub fn count_pages(bytes: &[u8], document: Option<&Document>) -> usize {
    let from_tree = document.map(|doc| doc.get_pages().len()).unwrap_or(0);
    if from_tree > 0 {
        return from_tree;
    }
    PAGE_MARKER.find_iter(bytes).count().max(1)
}

/// Splits normalized text into `page_count` buckets proportional to
/// character offset.
///
/// Bucket boundaries are moved forward to the next space so no word is cut;
/// the separating space is dropped, so joining the buckets with single spaces
/// reproduces `text`. Empty buckets are omitted while the numbering of later
/// buckets is kept.
pub fn distribute(text: &str, page_count: usize) -> Vec<PageText> {
    let page_count = page_count.max(1);
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut pages = Vec::new();
    let mut start = 0;

    for index in 0..page_count {
        if start >= total {
            break;
        }
        let mut end = if index + 1 == page_count {
            total
        } else {
            ((index + 1) * total / page_count).max(start)
        };
        while end < total && chars[end] != ' ' {
            end += 1;
        }

        let content: String = chars[start..end].iter().collect();
        let content = content.trim();
        if !content.is_empty() {
            pages.push(PageText::new(index as u32 + 1, content));
        }
        // Skip the separating space.
        start = end + 1;
    }

    pages
}
