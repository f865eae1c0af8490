//! Dictionary-backed morphological lemmatizer.
//!
//! Base forms are kept per part of speech (`data/noun.txt`, `data/verb.txt`,
//! `data/adj.txt`) together with tables of irregular or listed inflections
//! (`data/*.exc`). A token is reduced by, in order:
//!
//! 1. the inflection tables (nouns, then verbs, then adjectives);
//! 2. returning it unchanged if it is a base form of any part of speech;
//! 3. detaching inflectional suffixes and accepting the first candidate found
//!    in the word list of the same part of speech: noun rules, then verb
//!    rules (a doubled final consonant is undoubled after `-ing`/`-ed`, so
//!    `running` → `run`), then adjective rules.
//!
//! The reduction is repeated until it settles, so every returned lemma maps
//! to itself. It stops early rather than produce a stopword (`others` stays
//! `others`). Tokens no rule recognises pass through unchanged.

use super::stopwords::is_stopword;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const NOUNS: &str = include_str!("../../data/noun.txt");
const VERBS: &str = include_str!("../../data/verb.txt");
const ADJECTIVES: &str = include_str!("../../data/adj.txt");
const NOUN_EXCEPTIONS: &str = include_str!("../../data/noun.exc");
const VERB_EXCEPTIONS: &str = include_str!("../../data/verb.exc");
const ADJ_EXCEPTIONS: &str = include_str!("../../data/adj.exc");

const NOUN_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

const VERB_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ied", "y"),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];

const ADJ_RULES: &[(&str, &str)] = &[
    ("er", ""),
    ("est", ""),
    ("er", "e"),
    ("est", "e"),
    ("ier", "y"),
    ("iest", "y"),
];

/// Verb suffixes after which a doubled consonant may be undoubled.
const UNDOUBLE_AFTER: &[&str] = &["ing", "ed"];

/// Upper bound on reduction steps; real chains settle in two or three.
const MAX_STEPS: usize = 8;

static LEMMATIZER: Lazy<Lemmatizer> = Lazy::new(Lemmatizer::load);

/// Lemmatize `token` with the process-wide lemmatizer.
pub fn lemmatize(token: &str) -> &str {
    LEMMATIZER.lemmatize(token)
}

/// Force the word lists to load now instead of on the first token.
pub fn preload() {
    let lemmatizer = Lazy::force(&LEMMATIZER);
    debug!(
        nouns = lemmatizer.nouns.len(),
        verbs = lemmatizer.verbs.len(),
        adjectives = lemmatizer.adjectives.len(),
        exceptions = lemmatizer.exceptions.len(),
        "Lemmatizer loaded"
    );
}

/// Word list and inflection table for one part of speech.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordSource<'a> {
    pub words: &'a str,
    pub exceptions: &'a str,
}

pub struct Lemmatizer {
    nouns: HashSet<String>,
    verbs: HashSet<String>,
    adjectives: HashSet<String>,
    exceptions: HashMap<String, String>,
}

impl Lemmatizer {
    fn load() -> Self {
        Self::from_sources(
            WordSource {
                words: NOUNS,
                exceptions: NOUN_EXCEPTIONS,
            },
            WordSource {
                words: VERBS,
                exceptions: VERB_EXCEPTIONS,
            },
            WordSource {
                words: ADJECTIVES,
                exceptions: ADJ_EXCEPTIONS,
            },
        )
    }

    /// Build a lemmatizer from per-part-of-speech sources. Exception targets
    /// count as base forms of their part of speech even when the word list
    /// omits them. When an inflected form is listed twice, nouns win over
    /// verbs and verbs over adjectives.
    pub fn from_sources(
        nouns: WordSource<'_>,
        verbs: WordSource<'_>,
        adjectives: WordSource<'_>,
    ) -> Self {
        let mut exceptions = HashMap::new();
        let [nouns, verbs, adjectives] = [nouns, verbs, adjectives].map(|source| {
            let mut words: HashSet<String> =
                data_lines(source.words).map(str::to_string).collect();
            for line in data_lines(source.exceptions) {
                let mut parts = line.split_whitespace();
                if let (Some(inflected), Some(base)) = (parts.next(), parts.next()) {
                    words.insert(base.to_string());
                    exceptions
                        .entry(inflected.to_string())
                        .or_insert_with(|| base.to_string());
                }
            }
            words
        });
        Self {
            nouns,
            verbs,
            adjectives,
            exceptions,
        }
    }

    pub fn lemmatize<'a>(&'a self, token: &'a str) -> &'a str {
        let mut current = token;
        for _ in 0..MAX_STEPS {
            let next = self.reduce(current);
            if next == current || is_stopword(next) {
                break;
            }
            current = next;
        }
        current
    }

    /// One reduction step.
    fn reduce<'a>(&'a self, token: &'a str) -> &'a str {
        if let Some(base) = self.exceptions.get(token) {
            return base;
        }
        if self.is_base(token) {
            return token;
        }
        detach(token, NOUN_RULES, &self.nouns, false)
            .or_else(|| detach(token, VERB_RULES, &self.verbs, true))
            .or_else(|| detach(token, ADJ_RULES, &self.adjectives, false))
            .unwrap_or(token)
    }

    fn is_base(&self, token: &str) -> bool {
        self.nouns.contains(token) || self.verbs.contains(token) || self.adjectives.contains(token)
    }
}

fn detach<'a>(
    token: &str,
    rules: &[(&str, &str)],
    words: &'a HashSet<String>,
    undouble_stems: bool,
) -> Option<&'a str> {
    for (suffix, replacement) in rules {
        let Some(stem) = token.strip_suffix(suffix) else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }
        let candidate = format!("{stem}{replacement}");
        if let Some(found) = words.get(&candidate) {
            return Some(found.as_str());
        }
        if undouble_stems && replacement.is_empty() && UNDOUBLE_AFTER.contains(suffix) {
            if let Some(found) = undouble(stem).and_then(|single| words.get(single)) {
                return Some(found.as_str());
            }
        }
    }
    None
}

/// `"runn"` → `Some("run")`; `None` unless the stem ends in a doubled consonant.
fn undouble(stem: &str) -> Option<&str> {
    let mut chars = stem.chars().rev();
    let last = chars.next()?;
    let prev = chars.next()?;
    if last == prev && last.is_ascii_alphabetic() && !"aeiou".contains(last) {
        Some(&stem[..stem.len() - last.len_utf8()])
    } else {
        None
    }
}

fn data_lines(source: &str) -> impl Iterator<Item = &str> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
