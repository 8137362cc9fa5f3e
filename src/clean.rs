//! Tokenization and noise filtering.
//!
//! Free text and keywords go through two different cleaning pipelines:
//! free text is split at word boundaries, lowercased and run through a
//! [`Stoplist`]; keywords are taken whole and only normalised by
//! [`clean_keyword`].

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stop_words::{LANGUAGE, get};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
use crate::ngram::NgramOrder;

/// Where the language stopwords come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwordSource {
    /// The NLTK English list shipped with the `stop-words` crate
    #[default]
    English,
    /// No language stopwords
    None,
}

impl StopwordSource {
    fn words(self) -> Vec<String> {
        match self {
            StopwordSource::English => get(LANGUAGE::English)
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            StopwordSource::None => Vec::new(),
        }
    }
}

const PUNCTUATION: &[&str] = &[".", ",", ")", "(", ":", ";", "©", "%"];

const PUBLISHER_TERMS: &[&str] = &[
    "elsevier",
    "ltd",
    "b.v",
    "inc",
    "springer",
    "verlag",
    "gmbh",
    "wiley",
    "periodicals",
    "llc",
    "taylor",
    "francis",
    "mdpi",
    "licensee",
    "copyright",
    "rights",
    "reserved",
    "published",
    "publishing",
];

const UNIGRAM_EXCLUDED: &[&str] = &["1", "2", "3"];

/// Everything the noise filter removes, as one explicit value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextCleaningConfig {
    pub language: StopwordSource,
    pub punctuation: BTreeSet<String>,
    pub publisher_terms: BTreeSet<String>,
    /// Only dropped when counting single words
    pub unigram_excluded: BTreeSet<String>,
    pub extra_stopwords: BTreeSet<String>,
}

impl Default for TextCleaningConfig {
    fn default() -> Self {
        Self {
            language: StopwordSource::English,
            punctuation: to_set(PUNCTUATION),
            publisher_terms: to_set(PUBLISHER_TERMS),
            unigram_excluded: to_set(UNIGRAM_EXCLUDED),
            extra_stopwords: BTreeSet::new(),
        }
    }
}

impl TextCleaningConfig {
    /// A configuration that filters nothing.
    pub fn empty() -> Self {
        Self {
            language: StopwordSource::None,
            punctuation: BTreeSet::new(),
            publisher_terms: BTreeSet::new(),
            unigram_excluded: BTreeSet::new(),
            extra_stopwords: BTreeSet::new(),
        }
    }

    /// Reads a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| Error::format(path.display().to_string(), e))
    }

    /// Adds the words of a stopword file (one per line) to `extra_stopwords`.
    pub fn with_stopword_file(mut self, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.extra_stopwords.extend(
            text.lines()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty()),
        );
        Ok(self)
    }

    /// Builds the stoplist used for n-grams of the given order.
    pub fn stoplist(&self, order: NgramOrder) -> Stoplist {
        let mut words: HashSet<String> = self.language.words().into_iter().collect();
        words.extend(self.punctuation.iter().cloned());
        words.extend(self.publisher_terms.iter().map(|t| t.to_lowercase()));
        words.extend(self.extra_stopwords.iter().map(|t| t.to_lowercase()));
        if order.get() == 1 {
            words.extend(self.unigram_excluded.iter().cloned());
        }
        Stoplist { words }
    }
}

fn to_set(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Immutable set of lowercase tokens that never get counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stoplist {
    words: HashSet<String>,
}

impl Stoplist {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

const DASHES: &[&str] = &["-", "\u{2010}", "\u{2011}", "\u{2013}", "\u{2014}"];

fn is_word(piece: &str) -> bool {
    piece.chars().any(char::is_alphanumeric)
}

/// Splits text at Unicode word boundaries, lowercases every piece and drops
/// whitespace and stoplisted tokens. Token order is preserved.
///
/// Words linked by a hyphen with no surrounding space ("long-term",
/// "COVID-19") stay one token; a dash standing on its own is dropped.
///
/// # Example
/// ```
/// use bibliostat::{Stoplist, tokenize_and_filter};
/// let stop = Stoplist::from_words([".", "of"]);
/// let tokens = tokenize_and_filter("A study of DNA.", &stop);
/// assert_eq!(tokens, vec!["a", "study", "dna"]);
/// ```
pub fn tokenize_and_filter(text: &str, stoplist: &Stoplist) -> Vec<String> {
    let pieces: Vec<&str> = text.split_word_bounds().collect();
    let mut words: Vec<String> = Vec::new();
    // whether the last entry of `words` ends right before the current piece
    let mut open_word = false;
    let mut i = 0;
    while i < pieces.len() {
        let piece = pieces[i];
        if DASHES.contains(&piece) {
            let next = pieces.get(i + 1).copied().filter(|n| is_word(n));
            match (open_word, next, words.last_mut()) {
                (true, Some(next), Some(last)) => {
                    last.push_str(piece);
                    last.push_str(next);
                    i += 2;
                    continue;
                }
                _ => open_word = false,
            }
        } else if piece.trim().is_empty() {
            open_word = false;
        } else {
            open_word = is_word(piece);
            words.push(piece.to_string());
        }
        i += 1;
    }

    words
        .into_iter()
        .map(|w| w.to_lowercase())
        .filter(|token| !stoplist.contains(token))
        .collect()
}

/// Normalises a keyword: `*` markers removed, then lowercased, then trimmed.
/// The keyword is never split.
pub fn clean_keyword(keyword: &str) -> String {
    keyword.replace('*', "").to_lowercase().trim().to_string()
}
