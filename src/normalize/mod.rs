//! Text normalization for scraped descriptions.
//!
//! [`normalize`] runs a fixed sequence of steps, each working on the output
//! of the previous one:
//!
//! 1. lowercase
//! 2. delete every run of digits
//! 3. delete every character that is neither a word character nor whitespace
//! 4. tokenize ([`tokenizer`])
//! 5. drop stopwords ([`stopwords`])
//! 6. lemmatize ([`lemmatizer`])
//! 7. join with single spaces
//!
//! The stopword set and the lemmatizer word lists are process-wide and built
//! once; call [`preload`] at startup to pay that cost before the first page.
//!
//! The output is a fixed point: `normalize(&normalize(s)) == normalize(s)`.
//! Page bytes reach [`normalize`] only through [`encoding::decode`], which
//! rejects malformed input instead of replacing it.

pub mod encoding;
pub mod lemmatizer;
pub mod stopwords;
pub mod tokenizer;

use crate::error::NormalizeError;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use lemmatizer::lemmatize;
use stopwords::is_stopword;
use tokenizer::tokenize;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));
static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

/// Load the stopword set and lemmatizer word lists.
pub fn preload() {
    Lazy::force(&DIGITS);
    Lazy::force(&NON_WORD);
    stopwords::preload();
    lemmatizer::preload();
}

/// Normalize one description.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_digits = DIGITS.replace_all(&lowered, "");
    let skeleton = NON_WORD.replace_all(&without_digits, "");

    tokenize(&skeleton)
        .into_iter()
        .filter(|token| !is_stopword(token))
        .map(|token| lemmatize(&token).to_string())
        .join(" ")
}

/// Normalize raw bytes, refusing input that is not UTF-8.
pub fn normalize_bytes(bytes: &[u8]) -> Result<String, NormalizeError> {
    let text = encoding::decode(bytes, None)?;
    Ok(normalize(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLES: &[&str] = &[
        "",
        "12345!!!",
        "The Quick Brown Foxes Are RUNNING!",
        "Hello World.",
        "  Testing 123  ",
        "Others said the 2nd-quarter results were DISAPPOINTING, 4.5% down.",
        "Prime Minister's office: 'We cannot comment', officials said on Monday.",
        "Floods in Sindh displaced 1,200 families; relief camps are gonna open.",
        "Ünïcödé façade — naïve café! ½ ٣ digits",
        "snake_case and C++ (or C#) aren't the same",
        "The children went to the cities' biggest museums.",
        "Readers watched protesters clash as flower showers fell during negotiations.",
    ];

    /// Mostly words that the lemmatizer knows, mixed with noise.
    fn sentence() -> impl Strategy<Value = String> {
        let word = prop_oneof![
            prop::sample::select(vec![
                "Running", "readers", "the", "Cities", "others", "went", "biggest", "GONNA",
                "cannot", "protesters", "flowers", "news", "manner", "clashed", "are", "evenings",
            ])
            .prop_map(str::to_string),
            "[a-zA-Z]{1,12}",
            "[0-9.,;:!?'()_-]{1,4}",
            any::<String>(),
        ];
        prop::collection::vec(word, 0..12).prop_map(|words| words.join(" "))
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn test_digits_and_punctuation_only() {
        assert_eq!(normalize("12345!!!"), "");
        assert_eq!(normalize("3.14, 2.71; (42)"), "");
    }

    #[test]
    fn test_reference_sentence() {
        assert_eq!(
            normalize("The Quick Brown Foxes Are RUNNING!"),
            "quick brown fox run"
        );
    }

    #[test]
    fn test_news_sentence() {
        assert_eq!(
            normalize(SAMPLES[11]),
            "reader watch protester clash flower shower fall negotiation"
        );
    }

    #[test]
    fn test_digits_inside_words_are_removed() {
        assert_eq!(normalize("covid19 g20"), "covid g");
    }

    #[test]
    fn test_samples_are_fixed_points() {
        for sample in SAMPLES {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "{sample:?}");
        }
    }

    #[test]
    fn test_single_space_separators() {
        let out = normalize("  flood   warning\n\nissued  ");
        assert!(!out.starts_with(' '));
        assert!(!out.ends_with(' '));
        assert!(!out.contains("  "));
    }

    #[test]
    fn test_lemma_that_is_a_stopword_is_kept_as_surface_form() {
        assert_eq!(normalize("others"), "others");
    }

    #[test]
    fn test_contraction_halves_are_filtered() {
        assert_eq!(normalize("We cannot"), "");
    }

    #[test]
    fn test_normalize_bytes() {
        assert_eq!(normalize_bytes(b"Testing 123").unwrap(), normalize("Testing"));
        let err = normalize_bytes(&[b'o', b'k', 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidUtf8 { offset: 2 }));
    }

    proptest! {
        #[test]
        fn prop_no_digits_or_punctuation(s in sentence()) {
            let out = normalize(&s);
            prop_assert!(!DIGITS.is_match(&out), "{:?} -> {:?}", s, out);
            prop_assert!(!NON_WORD.is_match(&out), "{:?} -> {:?}", s, out);
        }

        #[test]
        fn prop_no_stopwords(s in sentence()) {
            let out = normalize(&s);
            for token in out.split(' ').filter(|t| !t.is_empty()) {
                prop_assert!(!is_stopword(token), "{:?} survived in {:?}", token, out);
            }
        }

        #[test]
        fn prop_idempotent(s in sentence()) {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_idempotent_on_arbitrary_unicode(s in any::<String>()) {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
