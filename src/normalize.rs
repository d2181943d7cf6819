use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter::FromIterator;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::errors::StopWordsLoadingError;

lazy_static! {
    static ref DIGIT_GROUPS: Regex = Regex::new(r"^\d+\s\d+$").unwrap();
}

/// Bring a piece of text into the form the knowledge base is indexed by.
///
/// The text is lowercased, accents are stripped by decomposing it and dropping
/// everything outside of ASCII, and whatever is left that isn't a letter, a
/// digit or whitespace is removed. Two digit groups separated by a single
/// space are glued together, so `"12 345"` becomes `"12345"`.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace())
        .collect();

    let mut normalized = stripped.trim().to_owned();
    if DIGIT_GROUPS.is_match(&normalized) {
        normalized.retain(|c| c != ' ');
    }
    normalized
}

/// Normalize a record, drop its stop words and split it into tokens.
pub fn tokenize(record: &str, stop_words: &StopWords) -> Vec<String> {
    normalize(record)
        .split_whitespace()
        .filter(|word| !stop_words.contains(word))
        .map(str::to_owned)
        .collect()
}

/// Words that carry no attribute evidence and are removed before blocking.
///
/// Load these once at startup and pass them around; nothing in this crate
/// rereads stop word files on its own.
#[derive(Debug, Default, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a stop word list from a file with one word per line.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StopWordsLoadingError> {
        let mut stop_words = Self::new();
        stop_words.extend_from_file(path)?;
        Ok(stop_words)
    }

    /// Add the words of another list, e.g. for a second language.
    pub fn extend_from_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<&mut Self, StopWordsLoadingError> {
        let file = File::open(path)?;
        self.extend_from_reader(BufReader::new(file))
    }

    pub fn extend_from_reader<R: BufRead>(
        &mut self,
        reader: R,
    ) -> Result<&mut Self, StopWordsLoadingError> {
        for line in reader.lines() {
            self.insert(&line?);
        }

        Ok(self)
    }

    /// Add a word to the list. Words are normalized the same way records are,
    /// so `"não"` also removes `"nao"`.
    pub fn insert(&mut self, word: &str) {
        let word = normalize(word);
        if !word.is_empty() {
            self.words.insert(word);
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Keep only the words of `text` that aren't stop words.
    pub fn remove_from(&self, text: &str) -> String {
        let kept: Vec<_> = text
            .split_whitespace()
            .filter(|word| !self.contains(word))
            .collect();
        kept.join(" ")
    }
}

impl<S: AsRef<str>> FromIterator<S> for StopWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut stop_words = Self::new();
        for word in iter {
            stop_words.insert(word.as_ref());
        }
        stop_words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_case_accents_and_punctuation() {
        assert_eq!(normalize("  São João, Nº 12!  "), "sao joao n 12");
        assert_eq!(normalize("Ação-Rápida"), "acaorapida");
    }

    #[test]
    fn glues_two_digit_groups() {
        assert_eq!(normalize("12 345"), "12345");
        assert_eq!(normalize("(31) 3333"), "313333");
        assert_eq!(normalize("1 2 3"), "1 2 3");
        assert_eq!(normalize("rua 12"), "rua 12");
        assert_eq!(normalize("12\t345"), "12\t345");
    }

    #[test]
    fn drops_stop_words_when_tokenizing() {
        let stop_words: StopWords = vec!["de", "da", "the"].into_iter().collect();
        assert_eq!(
            tokenize("Casa DA Praia de Copacabana", &stop_words),
            vec!["casa", "praia", "copacabana"]
        );
        assert!(tokenize("de da", &stop_words).is_empty());
    }

    #[test]
    fn stop_words_are_normalized_on_load() {
        let mut stop_words = StopWords::new();
        stop_words
            .extend_from_reader("Não\n\n  \nÀs\n".as_bytes())
            .unwrap();
        assert_eq!(stop_words.len(), 2);
        assert!(stop_words.contains("nao"));
        assert!(stop_words.contains("as"));
        assert_eq!(stop_words.remove_from("nao tem as casas"), "tem casas");
    }
}
