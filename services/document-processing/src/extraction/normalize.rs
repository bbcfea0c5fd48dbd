//! Final text normalization and the readability gate applied to
//! structured extraction output.

use finrisk_utils::CharacterPolicy;

/// Strips control characters, applies the character policy, collapses
/// whitespace runs to one space and trims.
pub fn normalize_text(text: &str, policy: CharacterPolicy) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if ch.is_control() || !policy_allows(policy, ch) {
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }

    out
}

fn policy_allows(policy: CharacterPolicy, ch: char) -> bool {
    match policy {
        CharacterPolicy::Unicode => ch != '\u{FFFD}',
        CharacterPolicy::Latin => matches!(ch, '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{24F}'),
    }
}

/// Rejects output that looks like glyph-id garbage: too few printable
/// characters, or Latin-script words implausibly short or long on average.
///
/// Words without ASCII letters are left out of the word-length check, so
/// unspaced scripts such as CJK are judged on the printable ratio alone.
pub fn is_readable(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    let printable = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_ascii_punctuation() || c.is_whitespace())
        .count();
    if (printable as f64) / (total as f64) <= 0.85 {
        return false;
    }

    let latin_words: Vec<usize> = text
        .split_whitespace()
        .filter(|word| word.chars().any(|c| c.is_ascii_alphabetic()))
        .map(|word| word.chars().count())
        .collect();
    if latin_words.is_empty() {
        return text.chars().any(char::is_alphanumeric);
    }
    let avg_word_len = latin_words.iter().sum::<usize>() as f64 / latin_words.len() as f64;
    avg_word_len > 2.0 && avg_word_len < 15.0
}
