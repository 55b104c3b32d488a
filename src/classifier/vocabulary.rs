// src/classifier/vocabulary.rs - Lexical highlight table

use std::collections::HashMap;

use crate::classifier::text;
use crate::types::VocabularyHit;

/// Immutable word-to-replacement table, case-folded at load time. An empty
/// table makes the highlight rule inert rather than an error.
#[derive(Debug, Clone, Default)]
pub struct VocabularyTable {
    entries: HashMap<String, String>,
}

impl VocabularyTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `(source, replacement)` pairs. Keys are lowered; when the
    /// same key appears more than once, the last pair wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut entries = HashMap::new();
        for (word, suggestion) in pairs {
            entries.insert(word.to_lowercase(), suggestion);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn suggestion_for(&self, word: &str) -> Option<&str> {
        self.entries.get(word).map(String::as_str)
    }

    /// All distinct vocabulary words present in the text, in first-occurrence
    /// order, each paired with its suggested replacement.
    pub fn find_in(&self, content: &str) -> Vec<VocabularyHit> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<VocabularyHit> = Vec::new();
        for word in text::letter_words(content) {
            if let Some(suggestion) = self.entries.get(&word) {
                if !hits.iter().any(|hit| hit.word == word) {
                    hits.push(VocabularyHit {
                        word,
                        suggestion: suggestion.clone(),
                    });
                }
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> VocabularyTable {
        VocabularyTable::from_pairs([
            ("сало".to_string(), "мило".to_string()),
            ("Привет".to_string(), "привіт".to_string()),
        ])
    }

    #[test]
    fn finds_words_next_to_punctuation() {
        let hits = table().find_in("Хто любить сало?");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].word, "сало");
        assert_eq!(hits[0].suggestion, "мило");
    }

    #[test]
    fn repeated_word_reported_once() {
        let hits = table().find_in("сало сало САЛО");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn keys_are_case_folded_at_load() {
        assert_eq!(table().suggestion_for("привет"), Some("привіт"));
        assert_eq!(table().find_in("ну Привет тебе").len(), 1);
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let table = VocabularyTable::from_pairs([
            ("сало".to_string(), "перше".to_string()),
            ("сало".to_string(), "друге".to_string()),
        ]);
        assert_eq!(table.suggestion_for("сало"), Some("друге"));
    }

    #[test]
    fn empty_table_is_inert() {
        assert!(VocabularyTable::empty().find_in("будь-який текст").is_empty());
    }
}
