//! Tokenization policy shared by index build and query time.
//!
//! An [`Analyzer`] turns text into index terms:
//!
//! - **Word terms** — Unicode-lowercased maximal runs of alphanumeric
//!   characters. Single-character words are kept.
//! - **Sub-word terms** (optional, on by default) — character 2- and
//!   3-grams of each word padded with one space on either side, so
//!   `"pricing"` and `"price"` share features and a one-letter query can
//!   still match a long run of that letter.
//!
//! Sub-word terms carry a `#` prefix and word terms never contain `#`,
//! so the two families cannot collide.
//!
//! The [`LexicalIndex`](crate::index::LexicalIndex) stores the analyzer it
//! was built with and reuses it for queries.

use serde::Deserialize;

const SUBWORD_PREFIX: char = '#';
const NGRAM_MIN: usize = 2;
const NGRAM_MAX: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Analyzer {
    /// Emit padded character n-grams in addition to whole words.
    #[serde(default = "default_subword")]
    pub subword_ngrams: bool,
}

fn default_subword() -> bool {
    true
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            subword_ngrams: true,
        }
    }
}

impl Analyzer {
    /// Analyzer emitting whole-word terms only.
    pub fn words_only() -> Self {
        Self {
            subword_ngrams: false,
        }
    }

    /// Produce the ordered list of terms for `text`, duplicates included.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let words = tokenize(text);
        if !self.subword_ngrams {
            return words;
        }

        let mut terms = Vec::with_capacity(words.len() * 6);
        for word in words {
            push_ngrams(&word, &mut terms);
            terms.push(word);
        }
        terms
    }
}

/// Split text into lowercase alphanumeric words.
///
/// ```rust
/// use docent_core::analyzer::tokenize;
///
/// assert_eq!(tokenize("What's the PRICE? 49$"), vec!["what", "s", "the", "price", "49"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn push_ngrams(word: &str, out: &mut Vec<String>) {
    let padded: Vec<char> = std::iter::once(' ')
        .chain(word.chars())
        .chain(std::iter::once(' '))
        .collect();

    for n in NGRAM_MIN..=NGRAM_MAX {
        if padded.len() < n {
            break;
        }
        for window in padded.windows(n) {
            let mut gram = String::with_capacity(n + 1);
            gram.push(SUBWORD_PREFIX);
            gram.extend(window);
            out.push(gram);
        }
    }
}
