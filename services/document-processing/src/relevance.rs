//! Keyword relevance filtering. Filtering only removes chunks; it never
//! reorders them.

use finrisk_models::Chunk;

#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Keywords are lowercased; blank entries and duplicates are dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }
        Self {
            keywords: normalized,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Keywords found in `text`, in configured order.
    pub fn matched_terms(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .cloned()
            .collect()
    }
}

/// Chunks kept by keyword filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub chunks: Vec<Chunk>,
    /// True when nothing matched and the leading chunks were kept instead.
    pub fallback: bool,
}

/// Keeps chunks mentioning at least one keyword. When none does, keeps the
/// first `fallback_chunks` chunks.
pub fn filter_chunks(chunks: Vec<Chunk>, filter: &KeywordFilter, fallback_chunks: usize) -> FilterOutcome {
    let total = chunks.len();
    let mut retained = Vec::new();
    let mut rest = Vec::new();
    for chunk in chunks {
        if filter.matches(&chunk.text) {
            retained.push(chunk);
        } else {
            rest.push(chunk);
        }
    }

    if !retained.is_empty() || total == 0 {
        return FilterOutcome {
            chunks: retained,
            fallback: false,
        };
    }

    rest.truncate(fallback_chunks);
    FilterOutcome {
        chunks: rest,
        fallback: true,
    }
}
