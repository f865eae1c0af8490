//! English word tokenizer.
//!
//! Splits on whitespace and at punctuation boundaries the way the Penn
//! Treebank tokenizer does: runs of word characters form a token and every
//! other non-space character stands alone. Contractions that carry no
//! apostrophe (`cannot`, `gonna`, ...) are split into their two halves.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+|[^\w\s]").expect("token pattern is valid"));

/// Apostrophe-free contractions and where they split.
const CONTRACTIONS: &[(&str, usize)] = &[
    ("cannot", 3),
    ("gimme", 3),
    ("gonna", 3),
    ("gotta", 3),
    ("lemme", 3),
    ("wanna", 3),
];

/// Tokenize `text` into word and punctuation tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for m in TOKEN.find_iter(text) {
        let word = m.as_str();
        match split_contraction(word) {
            Some((left, right)) => {
                tokens.push(left.to_string());
                tokens.push(right.to_string());
            }
            None => tokens.push(word.to_string()),
        }
    }
    tokens
}

fn split_contraction(word: &str) -> Option<(&str, &str)> {
    CONTRACTIONS
        .iter()
        .find(|(full, _)| word.eq_ignore_ascii_case(full))
        .map(|(_, at)| word.split_at(*at))
}
