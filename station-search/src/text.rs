//! Text normalization shared by every matching component.
//!
//! Indexing and querying must fold text identically, otherwise a trie path
//! built from "Los Héroes" would never be reached by the query "los heroes".

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Characters that separate tokens, in addition to whitespace.
const TOKEN_SEPARATORS: [char; 3] = ['-', '_', '.'];

/// Normalize text for matching: lowercase, strip diacritics, trim.
///
/// ```
/// use station_search::text::normalize;
///
/// assert_eq!(normalize("  Los Héroes "), "los heroes");
/// assert_eq!(normalize("ÑUÑOA"), "nunoa");
/// ```
pub fn normalize(text: &str) -> String {
    fold(text, false, true)
}

/// Fold text with explicit case and accent handling.
///
/// Diacritics are stripped by canonical decomposition (NFD) followed by
/// dropping combining marks. When accents are kept the text is composed
/// (NFC) instead, so both input forms of "é" compare equal.
pub fn fold(text: &str, case_sensitive: bool, ignore_accents: bool) -> String {
    let cased = if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    };

    let folded: String = if ignore_accents {
        cased.as_str().nfd().filter(|c| !is_combining_mark(*c)).collect()
    } else {
        cased.as_str().nfc().collect()
    };

    folded.trim().to_string()
}

/// Normalize then split into tokens on whitespace, hyphen, underscore and period.
///
/// Empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    split_tokens(&normalize(text))
}

/// Split already-folded text into tokens.
pub fn split_tokens(folded: &str) -> Vec<String> {
    folded
        .split(|c: char| c.is_whitespace() || TOKEN_SEPARATORS.contains(&c))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Length in characters, which is what scoring formulas measure.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Find the first occurrence of `needle` in `haystack` as a character range.
pub fn find_char_range(haystack: &str, needle: &str) -> Option<std::ops::Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    let byte_start = haystack.find(needle)?;
    let start = char_len(&haystack[..byte_start]);
    Some(start..start + char_len(needle))
}

/// Find every non-overlapping occurrence of `needle` as character ranges.
pub fn find_all_char_ranges(haystack: &str, needle: &str) -> Vec<std::ops::Range<usize>> {
    if needle.is_empty() {
        return Vec::new();
    }
    let needle_chars = char_len(needle);
    haystack
        .match_indices(needle)
        .map(|(byte_start, _)| {
            let start = char_len(&haystack[..byte_start]);
            start..start + needle_chars
        })
        .collect()
}
