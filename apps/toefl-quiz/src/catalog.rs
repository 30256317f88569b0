//! Vocabulary catalog: bundled words or a user-supplied JSON list.

use crate::models::{RankFilter, VocabularyEntry};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read word list: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse word list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only list of vocabulary entries in catalog order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<VocabularyEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<VocabularyEntry>) -> Self {
        Self { entries }
    }

    /// The word list compiled into the binary.
    pub fn bundled() -> Self {
        Self::new(bundled_words())
    }

    /// Load a JSON array of `{word, meaning, rank}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let entries: Vec<VocabularyEntry> = serde_json::from_str(content)?;
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries passing the filter, in catalog order.
    pub fn filter(&self, filter: RankFilter) -> Vec<&VocabularyEntry> {
        self.entries.iter().filter(|e| filter.matches(e)).collect()
    }

    pub fn count_rank(&self, rank: u8) -> usize {
        self.entries.iter().filter(|e| e.rank == rank).count()
    }
}

fn bundled_words() -> Vec<VocabularyEntry> {
    const WORDS: &[(&str, &str, u8)] = &[
        ("abundant", "existing in large quantities", 1),
        ("accurate", "correct in all details", 1),
        ("adequate", "enough for a particular purpose", 1),
        ("apparent", "clearly visible or understood", 1),
        ("approach", "a way of dealing with something", 1),
        ("assume", "to accept as true without proof", 1),
        ("benefit", "an advantage gained from something", 1),
        ("consequence", "a result of an action", 1),
        ("decline", "to become smaller or fewer", 1),
        ("evident", "plain or obvious", 1),
        ("feature", "a distinctive attribute", 1),
        ("rapid", "happening in a short time", 1),
        ("alter", "to change in character or composition", 2),
        ("anticipate", "to expect or predict", 2),
        ("comprehensive", "including nearly all elements", 2),
        ("contemporary", "belonging to the present time", 2),
        ("diminish", "to make or become less", 2),
        ("distinct", "recognizably different", 2),
        ("emerge", "to become apparent or prominent", 2),
        ("enhance", "to improve the quality of", 2),
        ("fluctuate", "to rise and fall irregularly", 2),
        ("inevitable", "certain to happen", 2),
        ("substantial", "of considerable importance or size", 2),
        ("vary", "to differ in size or amount", 2),
        ("aggregate", "a whole formed by combining parts", 3),
        ("ambiguous", "open to more than one interpretation", 3),
        ("coherent", "logical and consistent", 3),
        ("deplete", "to use up the supply of", 3),
        ("disperse", "to spread over a wide area", 3),
        ("elicit", "to draw out a response", 3),
        ("empirical", "based on observation or experience", 3),
        ("hypothesis", "a proposed explanation", 3),
        ("inherent", "existing as a permanent quality", 3),
        ("mitigate", "to make less severe", 3),
        ("precede", "to come before in time", 3),
        ("subsequent", "coming after something", 3),
        ("arbitrary", "based on random choice", 4),
        ("corroborate", "to confirm or give support to", 4),
        ("discrepancy", "a lack of compatibility between facts", 4),
        ("exacerbate", "to make a problem worse", 4),
        ("ephemeral", "lasting for a very short time", 4),
        ("juxtapose", "to place close together for contrast", 4),
        ("paradigm", "a typical example or pattern", 4),
        ("proliferate", "to increase rapidly in number", 4),
        ("scrutinize", "to examine closely", 4),
        ("tenuous", "very weak or slight", 4),
        ("ubiquitous", "present everywhere", 4),
        ("venerable", "accorded great respect due to age", 4),
    ];

    WORDS
        .iter()
        .map(|(word, meaning, rank)| VocabularyEntry::new(*word, *meaning, *rank))
        .collect()
}
