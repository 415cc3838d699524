// SPDX-License-Identifier: GPL-3.0-only
//! Transcript normalization shared by single-word scoring and phrase evaluation.

/// Punctuation removed before comparing an utterance with its target.
pub const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Leading articles ignored when looking for a minor variant.
pub const ARTICLES: &[&str] = &["a", "an", "the"];

/// Lowercase, drop [`STRIPPED_PUNCTUATION`] and trim surrounding whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// [`normalize`], then drop every character that is not alphanumeric, `_`
/// or whitespace, and collapse inner whitespace to single spaces.
///
/// Sentences come from a recognizer that may add `?`, apostrophes or quotes,
/// none of which should count against a word.
#[must_use]
pub fn normalize_phrase(text: &str) -> String {
    normalize(text)
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduce an already normalized string to the form used for variant matching:
/// a leading article and one trailing `s` are removed.
///
/// A string made only of an article (or only of `s`) reduces to empty.
#[must_use]
pub fn variant_form(normalized: &str) -> String {
    let trimmed = normalized.trim_start();
    let without_article = match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) if ARTICLES.contains(&first) => rest.trim_start(),
        None if ARTICLES.contains(&trimmed) => "",
        _ => trimmed,
    };
    let without_article = without_article.trim_end();
    without_article
        .strip_suffix('s')
        .unwrap_or(without_article)
        .trim_end()
        .to_string()
}
